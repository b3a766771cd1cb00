//! Context propagation for service methods

use layerguard_core::config::{compile_regex, ContextPropagationConfig};
use layerguard_core::{ConfigError, Layer, Severity, Subject, Violation, ViolationCode};
use layerguard_graph::{FunctionDecl, Graph, Package};
use regex::Regex;

use crate::rule::{Rule, RuleScope};

const SERVICE_LAYERS: &[Layer] = &[Layer::Usecase, Layer::Interface];

/// Exported methods of service-like types, and method specs of service-like
/// interfaces, take the context type first
#[derive(Debug, Clone)]
pub struct ContextPropagationRule {
    service_pattern: Regex,
    context_type: String,
}

impl ContextPropagationRule {
    pub fn new(service_pattern: Regex, context_type: impl Into<String>) -> Self {
        Self {
            service_pattern,
            context_type: context_type.into(),
        }
    }

    pub fn from_config(config: &ContextPropagationConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            compile_regex(&config.service_pattern)?,
            config.context_type.trim(),
        ))
    }

    fn check_method(&self, package: &Package, decl: &FunctionDecl, violations: &mut Vec<Violation>) {
        let first = decl.first_param_type().map(str::trim);
        if first == Some(self.context_type.as_str()) {
            return;
        }

        let actual = first.unwrap_or("no parameters").to_string();
        violations.push(
            Violation::new(
                self.id(),
                ViolationCode::ContextNotPropagated,
                Severity::Warn,
                Subject::declaration(&package.id, decl.qualified_name()),
                format!(
                    "{} in {} package '{}' must take {} as its first parameter",
                    decl.qualified_name(),
                    package.layer,
                    package.id,
                    self.context_type
                ),
            )
            .with_optional_location(decl.location.clone())
            .with_comparison(self.context_type.clone(), actual),
        );
    }
}

impl Rule for ContextPropagationRule {
    fn id(&self) -> &'static str {
        "context-propagation"
    }

    fn codes(&self) -> &'static [ViolationCode] {
        &[ViolationCode::ContextNotPropagated]
    }

    fn description(&self) -> &'static str {
        "service methods take a context as their first parameter"
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Declarations(SERVICE_LAYERS)
    }

    fn check(&self, graph: &Graph) -> Vec<Violation> {
        let mut violations = Vec::new();

        for package in graph.packages().filter(|p| SERVICE_LAYERS.contains(&p.layer)) {
            for decl in &package.functions {
                let is_service = decl
                    .receiver
                    .as_deref()
                    .is_some_and(|r| self.service_pattern.is_match(r));
                if is_service && decl.is_exported() {
                    self.check_method(package, decl, &mut violations);
                }
            }

            for interface in package.interfaces.iter().filter(|i| self.service_pattern.is_match(&i.name)) {
                for method in interface.methods.iter().filter(|m| m.is_exported()) {
                    self.check_method(package, method, &mut violations);
                }
            }
        }

        violations
    }
}
