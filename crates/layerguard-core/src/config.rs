//! Configuration schema (layerguard.toml)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::diagnostic::{Severity, ViolationCode};
use crate::layer::{Layer, LayerClassifier};
use crate::pattern::GlobPattern;

/// One path-pattern to layer mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerMapping {
    /// Package path glob
    pub pattern: String,

    /// Layer assigned to matching packages
    pub layer: Layer,
}

impl LayerMapping {
    pub fn new(pattern: impl Into<String>, layer: Layer) -> Self {
        Self {
            pattern: pattern.into(),
            layer,
        }
    }
}

/// Mappings used when the configuration declares none
pub fn default_layer_mappings() -> Vec<LayerMapping> {
    vec![
        LayerMapping::new("**/domain/**", Layer::Domain),
        LayerMapping::new("**/entity/**", Layer::Domain),
        LayerMapping::new("**/usecase/**", Layer::Usecase),
        LayerMapping::new("**/application/**", Layer::Usecase),
        LayerMapping::new("**/interface/**", Layer::Interface),
        LayerMapping::new("**/adapter/**", Layer::Interface),
        LayerMapping::new("**/infrastructure/**", Layer::Infrastructure),
        LayerMapping::new("**/infra/**", Layer::Infrastructure),
        LayerMapping::new("cmd/**", Layer::Infrastructure),
    ]
}

fn enabled() -> bool {
    true
}

/// Rule 1: inward-only dependencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyDirectionConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
}

impl Default for DependencyDirectionConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Rule 2: the domain layer only uses the standard library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainPurityConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,

    /// Import paths (globs) a domain package may use besides the standard library
    #[serde(default)]
    pub allow: Vec<String>,

    /// Allow domain packages to depend on other domain packages
    #[serde(default = "enabled")]
    pub allow_intra_domain: bool,
}

impl Default for DomainPurityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow: Vec::new(),
            allow_intra_domain: true,
        }
    }
}

/// Rule 3: domain types stay out of outer-layer public signatures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DtoBoundaryConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,

    /// Receiver type names (regex) whose methods may expose domain types,
    /// e.g. repository implementations satisfying a domain port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exempt_receivers: Option<String>,
}

impl Default for DtoBoundaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exempt_receivers: None,
        }
    }
}

/// Rule 4: repository interfaces live in the domain layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryPlacementConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,

    /// Interface names (regex) treated as repositories
    #[serde(default = "default_repository_pattern")]
    pub pattern: String,
}

fn default_repository_pattern() -> String {
    "Repository$".to_string()
}

impl Default for RepositoryPlacementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pattern: default_repository_pattern(),
        }
    }
}

/// Rule 5: service methods take a context first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextPropagationConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Type names (regex) whose methods are checked
    #[serde(default = "default_service_pattern")]
    pub service_pattern: String,

    /// Required type of the first parameter
    #[serde(default = "default_context_type")]
    pub context_type: String,
}

fn default_service_pattern() -> String {
    "(Service|UseCase|Usecase|Handler)$".to_string()
}

fn default_context_type() -> String {
    "context.Context".to_string()
}

impl Default for ContextPropagationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_pattern: default_service_pattern(),
            context_type: default_context_type(),
        }
    }
}

/// Unknown-layer and unparseable package reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerCoverageConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
}

impl Default for LayerCoverageConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Per-rule toggles and options
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    #[serde(default)]
    pub layer_coverage: LayerCoverageConfig,

    #[serde(default)]
    pub dependency_direction: DependencyDirectionConfig,

    #[serde(default)]
    pub domain_purity: DomainPurityConfig,

    #[serde(default)]
    pub dto_boundary: DtoBoundaryConfig,

    #[serde(default)]
    pub repository_placement: RepositoryPlacementConfig,

    #[serde(default)]
    pub context_propagation: ContextPropagationConfig,
}

/// Severity overrides for specific violation codes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityThreshold {
    /// Map of violation code to severity override
    #[serde(default)]
    pub overrides: BTreeMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a violation code, or default
    pub fn get_severity(&self, code: ViolationCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: ViolationCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }
}

/// Packages excluded from analysis
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllowlistRules {
    /// Completely skip these packages (glob patterns)
    #[serde(default)]
    pub skip_packages: Vec<String>,
}

impl AllowlistRules {
    /// Compile the skip list
    pub fn compile(&self) -> Result<Vec<GlobPattern>, ConfigError> {
        GlobPattern::compile_all(&self.skip_packages)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Report Unknown-layer packages as errors instead of warnings
    #[serde(default)]
    pub fail_closed: bool,

    /// Treat warnings as failures for the exit status
    #[serde(default)]
    pub fail_on_warning: bool,

    /// Overall analysis bound in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Also scan `_test.go` files
    #[serde(default)]
    pub include_tests: bool,

    /// Ordered layer mappings; first match wins
    #[serde(default = "default_layer_mappings")]
    pub layers: Vec<LayerMapping>,

    /// Rule toggles
    #[serde(default)]
    pub rules: RulesConfig,

    /// Severity thresholds
    #[serde(default)]
    pub severity: SeverityThreshold,

    /// Allowlist rules
    #[serde(default)]
    pub allowlist: AllowlistRules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fail_closed: false,
            fail_on_warning: false,
            timeout_secs: None,
            include_tests: false,
            layers: default_layer_mappings(),
            rules: RulesConfig::default(),
            severity: SeverityThreshold::default(),
            allowlist: AllowlistRules::default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Compile every pattern and check every value so bad configuration
    /// is rejected before analysis starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        LayerClassifier::new(&self.layers)?;
        self.allowlist.compile()?;
        GlobPattern::compile_all(&self.rules.domain_purity.allow)?;

        if let Some(exempt) = &self.rules.dto_boundary.exempt_receivers {
            compile_regex(exempt)?;
        }
        compile_regex(&self.rules.repository_placement.pattern)?;
        compile_regex(&self.rules.context_propagation.service_pattern)?;

        if self.rules.context_propagation.context_type.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "rules.context_propagation.context_type must not be empty".to_string(),
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        for code in self.severity.overrides.keys() {
            if ViolationCode::parse(code).is_none() {
                return Err(ConfigError::InvalidValue(format!(
                    "unknown violation code '{}' in severity.overrides",
                    code
                )));
            }
        }

        Ok(())
    }

    /// Overall analysis bound, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Compile a name pattern from configuration
pub fn compile_regex(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
