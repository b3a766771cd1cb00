//! DTO boundary: domain types stay out of outer-layer public signatures
//!
//! Detection is by signature-name matching. Each qualified type in the
//! parameters or results of an exported function is resolved through the
//! declaring file's imports; it is a leak when it lands on a Domain package
//! that declares an exported type of that name.

use layerguard_core::config::{compile_regex, DtoBoundaryConfig};
use layerguard_core::{ConfigError, Layer, Severity, Subject, Violation, ViolationCode};
use layerguard_graph::{is_exported, FunctionDecl, Graph};
use regex::Regex;

use crate::rule::{Rule, RuleScope};

const OUTER_LAYERS: &[Layer] = &[Layer::Interface, Layer::Infrastructure];

#[derive(Debug, Clone, Default)]
pub struct DtoBoundaryRule {
    exempt_receivers: Option<Regex>,
}

impl DtoBoundaryRule {
    pub fn new(exempt_receivers: Option<Regex>) -> Self {
        Self { exempt_receivers }
    }

    pub fn from_config(config: &DtoBoundaryConfig) -> Result<Self, ConfigError> {
        let exempt = config.exempt_receivers.as_deref().map(compile_regex).transpose()?;
        Ok(Self::new(exempt))
    }

    /// Exported, reachable from outside the package, and not exempt
    fn is_public(&self, decl: &FunctionDecl) -> bool {
        if !decl.is_exported() {
            return false;
        }

        match &decl.receiver {
            None => true,
            Some(receiver) => {
                is_exported(receiver) && !self.exempt_receivers.as_ref().is_some_and(|re| re.is_match(receiver))
            }
        }
    }
}

impl Rule for DtoBoundaryRule {
    fn id(&self) -> &'static str {
        "dto-boundary"
    }

    fn codes(&self) -> &'static [ViolationCode] {
        &[ViolationCode::DtoBoundaryLeak]
    }

    fn description(&self) -> &'static str {
        "interface and infrastructure APIs expose DTOs, not domain types"
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Declarations(OUTER_LAYERS)
    }

    fn check(&self, graph: &Graph) -> Vec<Violation> {
        let mut violations = Vec::new();

        for package in graph.packages().filter(|p| OUTER_LAYERS.contains(&p.layer)) {
            for decl in package.functions.iter().filter(|d| self.is_public(d)) {
                for type_ref in &decl.type_refs {
                    let target = graph.resolve_import(&type_ref.import_path);
                    let Some(domain) = target.internal().and_then(|id| graph.package(id)) else {
                        continue;
                    };
                    if domain.layer != Layer::Domain || !domain.declares_type(&type_ref.name) {
                        continue;
                    }

                    let kind = if decl.receiver.is_some() { "method" } else { "function" };
                    let message = format!(
                        "Exported {} {} of {} package '{}' exposes domain type {}.{}",
                        kind,
                        decl.qualified_name(),
                        package.layer,
                        package.id,
                        domain.name,
                        type_ref.name
                    );

                    violations.push(
                        Violation::new(
                            self.id(),
                            ViolationCode::DtoBoundaryLeak,
                            Severity::Warn,
                            Subject::edge(&package.id, &domain.id),
                            message,
                        )
                        .with_optional_location(decl.location.clone())
                        .with_comparison("a DTO or primitive type", format!("{}.{}", domain.name, type_ref.name)),
                    );
                }
            }
        }

        violations
    }
}
