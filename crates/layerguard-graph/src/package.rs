//! Package model: declarations and references extracted from one package

use layerguard_core::{Classification, Layer, Location};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Package identifier: path relative to the analyzed root, `/`-separated.
/// The root directory itself is `"."`.
pub type PackageId = String;

/// Kind of a package-level reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    Import,
    TypeReference,
    Call,
}

impl Default for EdgeKind {
    fn default() -> Self {
        Self::Import
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::TypeReference => write!(f, "type-reference"),
            Self::Call => write!(f, "call"),
        }
    }
}

/// Go exports identifiers that start with an upper-case letter
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

/// A function parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub type_text: String,
}

/// A package-qualified type name appearing in a signature
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Import path of the qualifying package
    pub import_path: String,

    /// Type identifier inside that package
    pub name: String,
}

/// A function, method or interface method spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,

    /// Receiver type name for methods (pointer and type parameters stripped)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,

    #[serde(default)]
    pub params: Vec<Param>,

    /// Result list as written, e.g. `(*catalog.Product, error)`
    #[serde(default)]
    pub results: String,

    /// Qualified types used in parameters and results
    #[serde(default)]
    pub type_refs: Vec<TypeRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl FunctionDecl {
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }

    /// `Receiver.Name` for methods, `Name` otherwise
    pub fn qualified_name(&self) -> String {
        match &self.receiver {
            Some(receiver) => format!("{}.{}", receiver, self.name),
            None => self.name.clone(),
        }
    }

    /// Type of the first parameter, if any
    pub fn first_param_type(&self) -> Option<&str> {
        self.params.first().map(|p| p.type_text.as_str())
    }
}

/// An interface type declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,

    #[serde(default)]
    pub methods: Vec<FunctionDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// A package node in the frozen graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,

    /// Declared package name (`package catalog`)
    pub name: String,

    pub layer: Layer,

    pub classification: Classification,

    pub files: Vec<String>,

    pub exported_types: BTreeSet<String>,

    pub interfaces: Vec<InterfaceDecl>,

    pub functions: Vec<FunctionDecl>,

    /// Set when the package could not be scanned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl Package {
    pub fn declares_type(&self, name: &str) -> bool {
        self.exported_types.contains(name)
    }
}

/// An unresolved reference as found in source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReference {
    pub import_path: String,
    pub kind: EdgeKind,
    pub location: Location,
}

/// Partial per-package record produced by one scanning task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageRecord {
    pub id: PackageId,
    pub name: String,
    pub files: Vec<String>,
    pub annotation: Option<Layer>,
    pub exported_types: BTreeSet<String>,
    pub interfaces: Vec<InterfaceDecl>,
    pub functions: Vec<FunctionDecl>,
    pub references: Vec<RawReference>,
    pub parse_error: Option<String>,
}

impl PackageRecord {
    /// A package that could not be scanned keeps only its id, files and error
    pub fn unparseable(id: PackageId, files: Vec<String>, error: String) -> Self {
        Self {
            id,
            files,
            parse_error: Some(error),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_names() {
        assert!(is_exported("Product"));
        assert!(!is_exported("product"));
        assert!(!is_exported("_Product"));
        assert!(!is_exported(""));
    }

    #[test]
    fn qualified_method_name() {
        let decl = FunctionDecl {
            name: "GetProduct".to_string(),
            receiver: Some("Handler".to_string()),
            params: vec![Param { name: Some("ctx".to_string()), type_text: "context.Context".to_string() }],
            results: "(*catalog.Product, error)".to_string(),
            type_refs: Vec::new(),
            location: None,
        };

        assert_eq!(decl.qualified_name(), "Handler.GetProduct");
        assert_eq!(decl.first_param_type(), Some("context.Context"));
        assert!(decl.is_exported());
    }

    #[test]
    fn edge_kind_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&EdgeKind::TypeReference).unwrap(), "\"type-reference\"");
    }
}
