//! layerguard engine
//!
//! Rule evaluation over a frozen package graph:
//! - the `Rule` trait and the built-in rules
//! - the rule engine (priority order, severity overrides, parallel evaluation)
//! - the analysis pipeline with its overall time limit

pub mod analysis;
pub mod engine;
pub mod rule;
pub mod rules;

#[cfg(test)]
mod testing;

pub use analysis::{AnalysisError, Analyzer};
pub use engine::RuleEngine;
pub use rule::{Rule, RuleScope};
pub use rules::RegisteredRule;
