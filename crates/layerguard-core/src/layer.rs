//! Architectural layers and the path-based layer classifier

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, LayerMapping};
use crate::pattern::GlobPattern;

/// Clean-Architecture layer, innermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Domain,
    Usecase,
    Interface,
    Infrastructure,
    /// No pattern or annotation matched
    Unknown,
}

impl Layer {
    /// Position in the dependency order (Domain innermost). Unknown has none.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::Domain => Some(0),
            Self::Usecase => Some(1),
            Self::Interface => Some(2),
            Self::Infrastructure => Some(3),
            Self::Unknown => None,
        }
    }

    /// True when a dependency from `self` onto `target` points inward or sideways.
    ///
    /// Returns `None` when either side is Unknown.
    pub fn may_depend_on(&self, target: Layer) -> Option<bool> {
        Some(target.rank()? <= self.rank()?)
    }

    pub fn is_known(&self) -> bool {
        self.rank().is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Usecase => "usecase",
            Self::Interface => "interface",
            Self::Infrastructure => "infrastructure",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "domain" | "entity" => Ok(Self::Domain),
            "usecase" | "application" => Ok(Self::Usecase),
            "interface" | "adapter" => Ok(Self::Interface),
            "infrastructure" | "infra" => Ok(Self::Infrastructure),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown layer '{}'", other)),
        }
    }
}

/// How a package received its layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Classification {
    /// Explicit annotation in source or description
    Annotation,

    /// First matching path pattern
    Pattern { pattern: String },

    /// Nothing matched
    Unmatched,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Annotation => write!(f, "annotation"),
            Self::Pattern { pattern } => write!(f, "pattern {}", pattern),
            Self::Unmatched => write!(f, "unmatched"),
        }
    }
}

/// Ordered path-pattern to layer mappings; first match wins
#[derive(Debug, Clone)]
pub struct LayerClassifier {
    mappings: Vec<(GlobPattern, Layer)>,
}

impl LayerClassifier {
    /// Compile the configured mappings
    pub fn new(mappings: &[LayerMapping]) -> Result<Self, ConfigError> {
        let mappings = mappings
            .iter()
            .map(|m| Ok((GlobPattern::new(&m.pattern)?, m.layer)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { mappings })
    }

    /// Classify a package path by pattern only
    pub fn classify(&self, package_path: &str) -> Layer {
        self.classify_with_source(package_path, None).0
    }

    /// Classify a package, letting an explicit annotation win over patterns
    pub fn classify_with_source(&self, package_path: &str, annotation: Option<Layer>) -> (Layer, Classification) {
        if let Some(layer) = annotation {
            return (layer, Classification::Annotation);
        }

        self.mappings
            .iter()
            .find(|(pattern, _)| pattern.matches(package_path))
            .map(|(pattern, layer)| {
                (
                    *layer,
                    Classification::Pattern {
                        pattern: pattern.as_str().to_string(),
                    },
                )
            })
            .unwrap_or((Layer::Unknown, Classification::Unmatched))
    }
}

/// `classify(packagePath, heuristics) -> Layer`
pub fn classify(package_path: &str, heuristics: &LayerClassifier) -> Layer {
    heuristics.classify(package_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_layer_mappings;

    #[test]
    fn dependency_order() {
        assert_eq!(Layer::Infrastructure.may_depend_on(Layer::Domain), Some(true));
        assert_eq!(Layer::Usecase.may_depend_on(Layer::Usecase), Some(true));
        assert_eq!(Layer::Domain.may_depend_on(Layer::Usecase), Some(false));
        assert_eq!(Layer::Interface.may_depend_on(Layer::Infrastructure), Some(false));
        assert_eq!(Layer::Unknown.may_depend_on(Layer::Domain), None);
    }

    #[test]
    fn default_mappings_classify_guide_layout() {
        let classifier = LayerClassifier::new(&default_layer_mappings()).unwrap();

        assert_eq!(classify("domain/catalog", &classifier), Layer::Domain);
        assert_eq!(classify("internal/domain/catalog", &classifier), Layer::Domain);
        assert_eq!(classify("usecase/dto", &classifier), Layer::Usecase);
        assert_eq!(classify("interface/out/persistence", &classifier), Layer::Interface);
        assert_eq!(classify("infrastructure/db", &classifier), Layer::Infrastructure);
        assert_eq!(classify("cmd/server", &classifier), Layer::Infrastructure);
        assert_eq!(classify("tools/gen", &classifier), Layer::Unknown);
    }

    #[test]
    fn first_match_wins() {
        let classifier = LayerClassifier::new(&[
            LayerMapping::new("domain/legacy/**", Layer::Infrastructure),
            LayerMapping::new("domain/**", Layer::Domain),
        ])
        .unwrap();

        assert_eq!(classifier.classify("domain/legacy/orders"), Layer::Infrastructure);
        assert_eq!(classifier.classify("domain/orders"), Layer::Domain);
    }

    #[test]
    fn annotation_overrides_patterns() {
        let classifier = LayerClassifier::new(&default_layer_mappings()).unwrap();
        let (layer, source) = classifier.classify_with_source("domain/catalog", Some(Layer::Usecase));

        assert_eq!(layer, Layer::Usecase);
        assert_eq!(source, Classification::Annotation);

        let (_, source) = classifier.classify_with_source("domain/catalog", None);
        assert_eq!(source, Classification::Pattern { pattern: "**/domain/**".to_string() });
    }

    #[test]
    fn malformed_mapping_fails_fast() {
        let result = LayerClassifier::new(&[LayerMapping::new("domain//x", Layer::Domain)]);
        assert!(result.is_err());
    }

    #[test]
    fn layer_names_parse() {
        assert_eq!("Domain".parse::<Layer>(), Ok(Layer::Domain));
        assert_eq!("infra".parse::<Layer>(), Ok(Layer::Infrastructure));
        assert!("presentation".parse::<Layer>().is_err());
    }
}
