//! layerguard core
//!
//! Core domain model with stable, versioned types.
//! Never rename violation codes - they are part of the public API.

pub mod diagnostic;
pub mod layer;
pub mod pattern;
pub mod report;
pub mod config;

pub use diagnostic::{Violation, ViolationCode, Severity, Location, Subject};
pub use layer::{Layer, LayerClassifier, Classification, classify};
pub use pattern::GlobPattern;
pub use report::{Report, ReportVersion, ReportSummary, AnalysisStatus, ExitStatus};
pub use config::{Config, ConfigError, LayerMapping, RulesConfig, SeverityThreshold, AllowlistRules};
