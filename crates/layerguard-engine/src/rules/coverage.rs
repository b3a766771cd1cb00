//! Layer coverage: packages the classifier could not place

use layerguard_core::{Layer, Location, Severity, Subject, Violation, ViolationCode};
use layerguard_graph::Graph;

use crate::rule::{Rule, RuleScope};

/// Reports unparseable packages and packages with no layer
#[derive(Debug, Clone, Default)]
pub struct LayerCoverageRule {
    fail_closed: bool,
}

impl LayerCoverageRule {
    pub fn new(fail_closed: bool) -> Self {
        Self { fail_closed }
    }

    fn severity(&self) -> Severity {
        if self.fail_closed {
            Severity::Error
        } else {
            Severity::Warn
        }
    }
}

impl Rule for LayerCoverageRule {
    fn id(&self) -> &'static str {
        "layer-coverage"
    }

    fn codes(&self) -> &'static [ViolationCode] {
        &[ViolationCode::PackageParseError, ViolationCode::PackageLayerUnknown]
    }

    fn description(&self) -> &'static str {
        "every package is scanned and assigned a layer"
    }

    fn scope(&self) -> RuleScope {
        RuleScope::AllPackages
    }

    fn check(&self, graph: &Graph) -> Vec<Violation> {
        let mut violations = Vec::new();

        for package in graph.packages() {
            let location = package.files.first().map(Location::new);

            if let Some(error) = &package.parse_error {
                violations.push(
                    Violation::new(
                        self.id(),
                        ViolationCode::PackageParseError,
                        self.severity(),
                        Subject::package(&package.id),
                        format!("Package '{}' could not be scanned and is treated as unknown: {}", package.id, error),
                    )
                    .with_optional_location(location),
                );
            } else if package.layer == Layer::Unknown {
                violations.push(
                    Violation::new(
                        self.id(),
                        ViolationCode::PackageLayerUnknown,
                        self.severity(),
                        Subject::package(&package.id),
                        format!("Package '{}' matches no layer pattern or annotation", package.id),
                    )
                    .with_optional_location(location),
                );
            }
        }

        violations
    }
}
