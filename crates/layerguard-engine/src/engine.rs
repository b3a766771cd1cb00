//! Rule engine
//!
//! Holds the enabled rules in priority order and evaluates them against a
//! frozen graph. Output order is fixed: rule priority first, then each rule's
//! own edge discovery order, whatever order the parallel tasks finish in.

use layerguard_core::{Config, ConfigError, SeverityThreshold, Violation};
use layerguard_graph::Graph;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::rule::Rule;
use crate::rules;

#[derive(Clone, Default)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn Rule>>,
    severity: SeverityThreshold,
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.rules.iter().map(|r| r.id()).collect();
        f.debug_struct("RuleEngine")
            .field("rules", &ids)
            .field("severity", &self.severity)
            .finish()
    }
}

impl RuleEngine {
    /// Empty engine applying the given severity overrides
    pub fn new(severity: SeverityThreshold) -> Self {
        Self {
            rules: Vec::new(),
            severity,
        }
    }

    /// Engine with every enabled built-in rule
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let rules = rules::builtin(config)?
            .into_iter()
            .filter(|r| r.enabled)
            .map(|r| r.rule)
            .collect();

        Ok(Self {
            rules,
            severity: config.severity.clone(),
        })
    }

    /// Register a rule after the existing ones
    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate every rule on the current thread
    pub fn evaluate(&self, graph: &Graph) -> Vec<Violation> {
        self.rules
            .iter()
            .flat_map(|rule| self.run_rule(rule.as_ref(), graph))
            .collect()
    }

    /// Evaluate every rule as its own blocking task over the shared graph
    pub async fn evaluate_parallel(&self, graph: Arc<Graph>) -> Result<Vec<Violation>, tokio::task::JoinError> {
        let mut tasks = JoinSet::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let rule = Arc::clone(rule);
            let graph = Arc::clone(&graph);
            tasks.spawn_blocking(move || (index, rule.check(&graph)));
        }

        let mut results: Vec<Vec<Violation>> = vec![Vec::new(); self.rules.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, violations) = joined?;
            results[index] = violations;
        }

        Ok(self
            .rules
            .iter()
            .zip(results)
            .flat_map(|(rule, violations)| self.finish(rule.as_ref(), violations))
            .collect())
    }

    fn run_rule(&self, rule: &dyn Rule, graph: &Graph) -> Vec<Violation> {
        self.finish(rule, rule.check(graph))
    }

    /// Apply severity overrides to one rule's output
    fn finish(&self, rule: &dyn Rule, mut violations: Vec<Violation>) -> Vec<Violation> {
        tracing::debug!(rule = rule.id(), violations = violations.len(), "Rule evaluated");

        for violation in &mut violations {
            violation.severity = self.severity.get_severity(violation.code, violation.severity);
        }
        violations
    }
}
