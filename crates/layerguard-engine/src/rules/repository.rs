//! Repository placement: ports are declared by the domain

use layerguard_core::config::{compile_regex, RepositoryPlacementConfig};
use layerguard_core::{ConfigError, Layer, Severity, Subject, Violation, ViolationCode};
use layerguard_graph::Graph;
use regex::Regex;

use crate::rule::{Rule, RuleScope};

#[derive(Debug, Clone)]
pub struct RepositoryPlacementRule {
    pattern: Regex,
}

impl RepositoryPlacementRule {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    pub fn from_config(config: &RepositoryPlacementConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(compile_regex(&config.pattern)?))
    }
}

impl Rule for RepositoryPlacementRule {
    fn id(&self) -> &'static str {
        "repository-placement"
    }

    fn codes(&self) -> &'static [ViolationCode] {
        &[ViolationCode::RepositoryMisplaced]
    }

    fn description(&self) -> &'static str {
        "repository interfaces are declared in domain packages"
    }

    fn scope(&self) -> RuleScope {
        RuleScope::DeclarationsOutside(Layer::Domain)
    }

    fn check(&self, graph: &Graph) -> Vec<Violation> {
        let mut violations = Vec::new();

        for package in graph.packages().filter(|p| p.layer != Layer::Domain) {
            for interface in package.interfaces.iter().filter(|i| self.pattern.is_match(&i.name)) {
                violations.push(
                    Violation::new(
                        self.id(),
                        ViolationCode::RepositoryMisplaced,
                        Severity::Error,
                        Subject::declaration(&package.id, &interface.name),
                        format!(
                            "Repository interface {} is declared in {} package '{}'; declare it in the domain layer",
                            interface.name, package.layer, package.id
                        ),
                    )
                    .with_optional_location(interface.location.clone())
                    .with_comparison(Layer::Domain.to_string(), package.layer.to_string()),
                );
            }
        }

        violations
    }
}
