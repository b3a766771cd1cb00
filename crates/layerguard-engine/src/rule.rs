//! The `Rule` trait
//!
//! A rule is a pure function over the frozen graph plus its own compiled
//! configuration. Rules never see each other and never mutate shared state,
//! which is what lets the engine run them in parallel.

use layerguard_core::{Layer, Violation, ViolationCode};
use layerguard_graph::Graph;

/// What a rule looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// Every package, whatever its layer
    AllPackages,

    /// Edges between two classified packages
    LayerPair,

    /// Outgoing edges of packages in one layer
    EdgesFrom(Layer),

    /// Declarations inside packages of the listed layers
    Declarations(&'static [Layer]),

    /// Declarations inside packages outside the listed layer
    DeclarationsOutside(Layer),
}

impl std::fmt::Display for RuleScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllPackages => write!(f, "all packages"),
            Self::LayerPair => write!(f, "edges between classified layers"),
            Self::EdgesFrom(layer) => write!(f, "edges from {} packages", layer),
            Self::Declarations(layers) => {
                let names: Vec<&str> = layers.iter().map(|l| l.as_str()).collect();
                write!(f, "declarations in {} packages", names.join("/"))
            }
            Self::DeclarationsOutside(layer) => write!(f, "declarations outside {} packages", layer),
        }
    }
}

/// A conformance rule
pub trait Rule: Send + Sync {
    /// Stable kebab-case identifier, e.g. `dependency-direction`
    fn id(&self) -> &'static str;

    /// Codes this rule can produce
    fn codes(&self) -> &'static [ViolationCode];

    /// One-line description
    fn description(&self) -> &'static str;

    fn scope(&self) -> RuleScope;

    /// Evaluate the rule. Violations come back in edge discovery order.
    fn check(&self, graph: &Graph) -> Vec<Violation>;
}
