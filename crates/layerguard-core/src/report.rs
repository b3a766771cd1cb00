//! Report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.
//!
//! The report carries no timestamp: analyzing an unchanged tree twice must
//! produce byte-identical output.

use serde::{Deserialize, Serialize};
use crate::diagnostic::{Severity, Violation};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Whether every rule ran to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisStatus {
    Complete,

    /// The run was aborted; the report holds no violations
    Incomplete { reason: String },
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of violations
    pub total: usize,

    /// Number of errors
    pub errors: usize,

    /// Number of warnings
    pub warnings: usize,

    /// Number of info messages
    pub info: usize,

    /// Number of packages in the graph
    pub packages_analyzed: usize,

    /// Number of collapsed reference edges in the graph
    pub edges_analyzed: usize,

    /// Number of rules evaluated
    pub rules_evaluated: usize,
}

/// Process exit status derived from a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// No blocking violations
    Success,

    /// Error-severity violations (or warnings with fail-on-warning)
    Violations,

    /// Configuration or input error
    InvalidInput,

    /// Analysis did not complete
    Incomplete,
}

impl ExitStatus {
    pub fn code(&self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Violations => 1,
            Self::InvalidInput => 2,
            Self::Incomplete => 3,
        }
    }
}

/// Check report (report.json v1)
///
/// This is the stable output format.
/// All fields are versioned and backward-compatible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Completion status
    pub status: AnalysisStatus,

    /// Analyzed root as given on the command line
    pub root: String,

    /// SHA-256 of the frozen dependency graph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_digest: Option<String>,

    /// Summary statistics
    pub summary: ReportSummary,

    /// All violations, ordered by rule priority then discovery order
    pub violations: Vec<Violation>,
}

impl Report {
    /// Create a new empty, complete report
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            status: AnalysisStatus::Complete,
            root: root.into(),
            graph_digest: None,
            summary: ReportSummary::default(),
            violations: Vec::new(),
        }
    }

    /// Create a complete report from violations
    pub fn from_violations(root: impl Into<String>, violations: Vec<Violation>) -> Self {
        let mut report = Self::new(root);
        for violation in violations {
            report.add_violation(violation);
        }
        report
    }

    /// Create a report for a run that did not finish
    pub fn incomplete(root: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: AnalysisStatus::Incomplete {
                reason: reason.into(),
            },
            ..Self::new(root)
        }
    }

    /// Record graph statistics
    pub fn with_graph_stats(mut self, packages: usize, edges: usize, rules: usize, digest: String) -> Self {
        self.summary.packages_analyzed = packages;
        self.summary.edges_analyzed = edges;
        self.summary.rules_evaluated = rules;
        self.graph_digest = Some(digest);
        self
    }

    /// Add a violation to the report
    pub fn add_violation(&mut self, violation: Violation) {
        match violation.severity {
            Severity::Error => self.summary.errors += 1,
            Severity::Warn => self.summary.warnings += 1,
            Severity::Info => self.summary.info += 1,
        }

        self.summary.total += 1;
        self.violations.push(violation);
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Check if the report has any warnings
    pub fn has_warnings(&self) -> bool {
        self.summary.warnings > 0
    }

    pub fn is_complete(&self) -> bool {
        self.status == AnalysisStatus::Complete
    }

    /// Exit status for this report
    pub fn exit_status(&self, fail_on_warning: bool) -> ExitStatus {
        if !self.is_complete() {
            ExitStatus::Incomplete
        } else if self.has_errors() || (fail_on_warning && self.has_warnings()) {
            ExitStatus::Violations
        } else {
            ExitStatus::Success
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
