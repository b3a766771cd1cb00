//! Zero-dependency domain

use layerguard_core::config::DomainPurityConfig;
use layerguard_core::{ConfigError, GlobPattern, Layer, Severity, Subject, Violation, ViolationCode};
use layerguard_graph::{EdgeTarget, Graph, ReferenceEdge};

use crate::rule::{Rule, RuleScope};

/// Domain packages may only reach the standard library, the configured
/// allowlist and (optionally) other domain packages
#[derive(Debug, Clone)]
pub struct DomainPurityRule {
    allow: Vec<GlobPattern>,
    allow_intra_domain: bool,
}

impl DomainPurityRule {
    pub fn new(allow: Vec<GlobPattern>, allow_intra_domain: bool) -> Self {
        Self {
            allow,
            allow_intra_domain,
        }
    }

    pub fn from_config(config: &DomainPurityConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(GlobPattern::compile_all(&config.allow)?, config.allow_intra_domain))
    }

    fn is_permitted(&self, graph: &Graph, edge: &ReferenceEdge) -> bool {
        match &edge.target {
            EdgeTarget::External { stdlib: true, .. } => true,
            EdgeTarget::Internal { package } if self.allow_intra_domain && graph.layer_of(package) == Layer::Domain => {
                true
            }
            target => self.allow.iter().any(|p| p.matches(target.name())),
        }
    }
}

impl Default for DomainPurityRule {
    fn default() -> Self {
        Self::new(Vec::new(), true)
    }
}

impl Rule for DomainPurityRule {
    fn id(&self) -> &'static str {
        "domain-purity"
    }

    fn codes(&self) -> &'static [ViolationCode] {
        &[ViolationCode::DomainExternalDependency]
    }

    fn description(&self) -> &'static str {
        "domain packages depend on the standard library only"
    }

    fn scope(&self) -> RuleScope {
        RuleScope::EdgesFrom(Layer::Domain)
    }

    fn check(&self, graph: &Graph) -> Vec<Violation> {
        graph
            .edges()
            .iter()
            .filter(|edge| graph.layer_of(&edge.source) == Layer::Domain)
            .filter(|edge| !self.is_permitted(graph, edge))
            .map(|edge| {
                let what = match &edge.target {
                    EdgeTarget::Internal { package } => format!("{} package '{}'", graph.layer_of(package), package),
                    EdgeTarget::External { path, .. } => format!("external module '{}'", path),
                };

                Violation::new(
                    self.id(),
                    ViolationCode::DomainExternalDependency,
                    Severity::Error,
                    Subject::edge(&edge.source, edge.target.name()),
                    format!("Domain package '{}' depends on {}", edge.source, what),
                )
                .with_optional_location(edge.first_location())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{graph, SHOP};

    fn subjects(violations: &[Violation]) -> Vec<String> {
        violations.iter().map(|v| v.subject.to_string()).collect()
    }

    #[test]
    fn external_and_outer_edges_flagged() {
        let violations = DomainPurityRule::default().check(&graph(SHOP));

        assert_eq!(
            subjects(&violations),
            vec!["domain/order -> github.com/google/uuid", "domain/order -> usecase/dto"]
        );
        assert!(violations[1].message.contains("usecase package 'usecase/dto'"));
    }

    #[test]
    fn allowlist_by_path_and_glob() {
        let rule = DomainPurityRule::new(GlobPattern::compile_all(&["github.com/google/**".to_string()]).unwrap(), true);
        let violations = rule.check(&graph(SHOP));

        assert_eq!(subjects(&violations), vec!["domain/order -> usecase/dto"]);
    }

    #[test]
    fn intra_domain_edges_can_be_forbidden() {
        let rule = DomainPurityRule::new(Vec::new(), false);
        let violations = rule.check(&graph(SHOP));

        assert!(subjects(&violations).contains(&"domain/order -> domain/catalog".to_string()));
    }

    #[test]
    fn stdlib_only_domain_is_clean() {
        let graph = graph(SHOP);
        let violations = DomainPurityRule::default().check(&graph);

        assert!(violations.iter().all(|v| v.subject.package_id() != "domain/catalog"));
    }
}
