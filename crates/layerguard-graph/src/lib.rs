//! layerguard graph
//!
//! Turns a Go source tree (or a JSON description of one) into a frozen,
//! layer-classified package dependency graph.

pub mod builder;
pub mod description;
pub mod error;
pub mod graph;
pub mod package;
pub mod source;

pub use builder::{parse_module_path, GraphBuilder};
pub use description::{DescribedPackage, DescribedReference, Description};
pub use error::InputError;
pub use graph::{is_stdlib_path, resolve_target, EdgeLocation, EdgeTarget, Graph, ReferenceEdge};
pub use package::{
    is_exported, EdgeKind, FunctionDecl, InterfaceDecl, Package, PackageId, PackageRecord, Param, RawReference, TypeRef,
};
pub use source::{ScanError, SourceFile, SourceScanner};
