//! Violation codes and violation records
//!
//! IMPORTANT: Violation codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Violation code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    // Classification (0xxx)
    /// No layer pattern or annotation matched the package
    PackageLayerUnknown,

    /// The package could not be scanned and was recorded as Unknown
    PackageParseError,

    // Layering (1xxx)
    /// An edge points from an inner layer to an outer layer
    LayerDependencyDirection,

    /// A domain package depends on something other than the standard library
    DomainExternalDependency,

    // Boundaries (2xxx)
    /// A domain type appears in the public signature of an outer-layer function
    DtoBoundaryLeak,

    /// A repository-like interface is declared outside the domain layer
    RepositoryMisplaced,

    /// A service method does not take the context type as first parameter
    ContextNotPropagated,

    // General (9xxx)
    /// Informational message from a custom rule
    Info,
}

impl ViolationCode {
    /// Every registered code, in registry order
    pub const ALL: [ViolationCode; 8] = [
        Self::PackageLayerUnknown,
        Self::PackageParseError,
        Self::LayerDependencyDirection,
        Self::DomainExternalDependency,
        Self::DtoBoundaryLeak,
        Self::RepositoryMisplaced,
        Self::ContextNotPropagated,
        Self::Info,
    ];

    /// Get the violation code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PackageLayerUnknown => "PACKAGE_LAYER_UNKNOWN",
            Self::PackageParseError => "PACKAGE_PARSE_ERROR",
            Self::LayerDependencyDirection => "LAYER_DEPENDENCY_DIRECTION",
            Self::DomainExternalDependency => "DOMAIN_EXTERNAL_DEPENDENCY",
            Self::DtoBoundaryLeak => "DTO_BOUNDARY_LEAK",
            Self::RepositoryMisplaced => "REPOSITORY_MISPLACED",
            Self::ContextNotPropagated => "CONTEXT_NOT_PROPAGATED",
            Self::Info => "INFO",
        }
    }

    /// Look up a code by its stable string identifier
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == code)
    }
}

impl std::fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Violation severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - blocking issue that should fail CI
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location in a file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to the analyzed root
    pub file: String,

    /// Optional line number (1-indexed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Location {
    /// Create a new location with just a file path
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }

    /// Create a location with file and line number
    pub fn with_line(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file, line),
            None => write!(f, "{}", self.file),
        }
    }
}

/// What a violation is about
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    /// A dependency edge between two packages (target may be an external import path)
    Edge { source: String, target: String },

    /// A whole package
    Package { package: String },

    /// A named declaration inside a package
    Declaration { package: String, name: String },
}

impl Subject {
    pub fn edge(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Edge {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn package(package: impl Into<String>) -> Self {
        Self::Package {
            package: package.into(),
        }
    }

    pub fn declaration(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Declaration {
            package: package.into(),
            name: name.into(),
        }
    }

    /// The package the subject lives in
    pub fn package_id(&self) -> &str {
        match self {
            Self::Edge { source, .. } => source,
            Self::Package { package } | Self::Declaration { package, .. } => package,
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Edge { source, target } => write!(f, "{} -> {}", source, target),
            Self::Package { package } => write!(f, "{}", package),
            Self::Declaration { package, name } => write!(f, "{}.{}", package, name),
        }
    }
}

/// A rule violation with structured metadata
///
/// Violations are data: rules return them, they are never raised as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Identifier of the rule that produced this violation
    pub rule: String,

    /// Stable violation code
    pub code: ViolationCode,

    /// Severity level
    pub severity: Severity,

    /// Offending edge, package or declaration
    pub subject: Subject,

    /// Human-readable message
    pub message: String,

    /// Source location (best-effort)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    /// Expected value (for comparison violations)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// Actual value (for comparison violations)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl Violation {
    /// Create a new violation with minimal fields
    pub fn new(
        rule: impl Into<String>,
        code: ViolationCode,
        severity: Severity,
        subject: Subject,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            code,
            severity,
            subject,
            message: message.into(),
            location: None,
            expected: None,
            actual: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the location if one is known
    pub fn with_optional_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// Set expected/actual values
    pub fn with_comparison(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    /// File this violation is reported against, falling back to the package id
    pub fn file(&self) -> &str {
        self.location
            .as_ref()
            .map(|l| l.file.as_str())
            .unwrap_or_else(|| self.subject.package_id())
    }
}
