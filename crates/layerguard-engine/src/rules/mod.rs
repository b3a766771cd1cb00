//! Built-in rules, in evaluation priority order

pub mod context;
pub mod coverage;
pub mod direction;
pub mod domain_purity;
pub mod dto_boundary;
pub mod repository;

pub use context::ContextPropagationRule;
pub use coverage::LayerCoverageRule;
pub use direction::DependencyDirectionRule;
pub use domain_purity::DomainPurityRule;
pub use dto_boundary::DtoBoundaryRule;
pub use repository::RepositoryPlacementRule;

use layerguard_core::{Config, ConfigError};
use std::sync::Arc;

use crate::rule::Rule;

/// A built-in rule and whether the configuration enables it
#[derive(Clone)]
pub struct RegisteredRule {
    pub rule: Arc<dyn Rule>,
    pub enabled: bool,
}

/// Every built-in rule, compiled from `config`, in priority order
pub fn builtin(config: &Config) -> Result<Vec<RegisteredRule>, ConfigError> {
    let rules = &config.rules;

    Ok(vec![
        RegisteredRule {
            rule: Arc::new(LayerCoverageRule::new(config.fail_closed)),
            enabled: rules.layer_coverage.enabled,
        },
        RegisteredRule {
            rule: Arc::new(DependencyDirectionRule),
            enabled: rules.dependency_direction.enabled,
        },
        RegisteredRule {
            rule: Arc::new(DomainPurityRule::from_config(&rules.domain_purity)?),
            enabled: rules.domain_purity.enabled,
        },
        RegisteredRule {
            rule: Arc::new(DtoBoundaryRule::from_config(&rules.dto_boundary)?),
            enabled: rules.dto_boundary.enabled,
        },
        RegisteredRule {
            rule: Arc::new(RepositoryPlacementRule::from_config(&rules.repository_placement)?),
            enabled: rules.repository_placement.enabled,
        },
        RegisteredRule {
            rule: Arc::new(ContextPropagationRule::from_config(&rules.context_propagation)?),
            enabled: rules.context_propagation.enabled,
        },
    ])
}
