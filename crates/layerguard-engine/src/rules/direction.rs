//! Dependency direction: edges only point inward

use layerguard_core::{Severity, Subject, Violation, ViolationCode};
use layerguard_graph::Graph;

use crate::rule::{Rule, RuleScope};

/// Flags every internal edge from an inner layer to an outer one.
///
/// Edges touching an Unknown package and edges to external import paths
/// are never flagged here.
#[derive(Debug, Clone, Default)]
pub struct DependencyDirectionRule;

impl Rule for DependencyDirectionRule {
    fn id(&self) -> &'static str {
        "dependency-direction"
    }

    fn codes(&self) -> &'static [ViolationCode] {
        &[ViolationCode::LayerDependencyDirection]
    }

    fn description(&self) -> &'static str {
        "dependencies point inward: domain < usecase < interface < infrastructure"
    }

    fn scope(&self) -> RuleScope {
        RuleScope::LayerPair
    }

    fn check(&self, graph: &Graph) -> Vec<Violation> {
        let mut violations = Vec::new();

        for edge in graph.edges() {
            let Some(target) = edge.target.internal() else {
                continue;
            };

            let source_layer = graph.layer_of(&edge.source);
            let target_layer = graph.layer_of(target);

            if source_layer.may_depend_on(target_layer) != Some(false) {
                continue;
            }

            let message = format!(
                "{} package '{}' depends on outer {} package '{}'",
                source_layer, edge.source, target_layer, target
            );

            violations.push(
                Violation::new(
                    self.id(),
                    ViolationCode::LayerDependencyDirection,
                    Severity::Error,
                    Subject::edge(&edge.source, target),
                    message,
                )
                .with_optional_location(edge.first_location())
                .with_comparison(format!("{} or an inner layer", source_layer), target_layer.to_string()),
            );
        }

        violations
    }
}
