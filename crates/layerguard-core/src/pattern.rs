//! Path glob patterns
//!
//! Patterns are `/`-separated. `*` matches within one segment, `?` matches a
//! single non-separator character and a `**` segment matches zero or more
//! whole segments. Every pattern is compiled to an anchored regex once, when
//! the configuration is loaded.

use regex::Regex;

use crate::config::ConfigError;

/// A compiled path glob
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a glob, rejecting malformed patterns
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if pattern.starts_with('/') {
            return Err(invalid("pattern must be relative"));
        }

        let segments: Vec<&str> = pattern.split('/').collect();
        let mut out = String::from("^");
        let mut need_separator = false;

        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(invalid("pattern contains an empty segment"));
            }

            if *segment == "**" {
                if i > 0 && segments[i - 1] == "**" {
                    return Err(invalid("consecutive '**' segments"));
                }

                let last = i == segments.len() - 1;
                if segments.len() == 1 {
                    out.push_str(".*");
                } else if i == 0 {
                    out.push_str("(?:[^/]+/)*");
                } else if last {
                    out.push_str("(?:/[^/]+)*");
                } else {
                    out.push_str("/(?:[^/]+/)*");
                }
                need_separator = false;
                continue;
            }

            if segment.contains("**") {
                return Err(invalid("'**' must be a whole segment"));
            }

            if need_separator {
                out.push('/');
            }

            for ch in segment.chars() {
                match ch {
                    '*' => out.push_str("[^/]*"),
                    '?' => out.push_str("[^/]"),
                    c if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '~' | '+') => {
                        out.push_str(&regex::escape(&c.to_string()));
                    }
                    c => return Err(invalid(&format!("unsupported character '{}'", c))),
                }
            }
            need_separator = true;
        }

        out.push('$');

        let regex = Regex::new(&out).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Compile a list of globs, failing on the first malformed one
    pub fn compile_all(patterns: &[String]) -> Result<Vec<Self>, ConfigError> {
        patterns.iter().map(|p| Self::new(p)).collect()
    }

    /// Check a `/`-separated path against the pattern
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// The pattern as written in configuration
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}
