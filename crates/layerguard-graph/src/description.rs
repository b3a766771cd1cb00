//! Already-parsed codebase descriptions
//!
//! A JSON document listing packages, their declarations and references, for
//! codebases scanned by some other tool.

use layerguard_core::{Layer, Location};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::InputError;
use crate::package::{is_exported, EdgeKind, FunctionDecl, InterfaceDecl, PackageRecord, RawReference};

/// Description document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Description {
    /// Module path used to resolve reference targets
    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub packages: Vec<DescribedPackage>,
}

/// One package of a description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescribedPackage {
    /// Package id, relative to the root
    pub path: String,

    /// Package name; defaults to the last path element
    #[serde(default)]
    pub name: Option<String>,

    /// Explicit layer annotation
    #[serde(default)]
    pub layer: Option<Layer>,

    #[serde(default)]
    pub files: Vec<String>,

    /// Declared type names (exported ones are kept)
    #[serde(default)]
    pub types: Vec<String>,

    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,

    #[serde(default)]
    pub functions: Vec<FunctionDecl>,

    #[serde(default)]
    pub references: Vec<DescribedReference>,
}

/// One reference of a described package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescribedReference {
    /// Import path or package id of the target
    pub target: String,

    #[serde(default)]
    pub kind: EdgeKind,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub line: Option<usize>,
}

impl Description {
    /// Load a description from file
    pub fn from_file(path: &Path) -> Result<Self, InputError> {
        let contents = std::fs::read_to_string(path).map_err(|e| InputError::io(path, e))?;

        Self::from_json(&contents)
    }

    /// Parse a description from a JSON string
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        serde_json::from_str(json).map_err(|e| InputError::Description(e.to_string()))
    }

    /// Convert into scanner-equivalent records
    ///
    /// With a `module`, targets naming a described package id are rewritten
    /// to the full import path so they resolve like scanned imports.
    pub fn into_records(self) -> Result<Vec<PackageRecord>, InputError> {
        let ids: BTreeSet<String> = self.packages.iter().map(|p| p.path.clone()).collect();
        let module = self.module;
        let qualify = |target: String| -> String {
            match module.as_deref() {
                Some(module) if ids.contains(&target) => {
                    if target == "." {
                        module.to_string()
                    } else {
                        format!("{}/{}", module, target)
                    }
                }
                _ => target,
            }
        };

        let mut seen = BTreeSet::new();
        let mut records = Vec::with_capacity(self.packages.len());

        for package in self.packages {
            if package.path.is_empty() {
                return Err(InputError::Description("package with empty path".to_string()));
            }
            if !seen.insert(package.path.clone()) {
                return Err(InputError::Description(format!("duplicate package '{}'", package.path)));
            }

            let default_file = package.files.first().cloned().unwrap_or_else(|| package.path.clone());
            let references = package
                .references
                .into_iter()
                .map(|r| RawReference {
                    import_path: qualify(r.target),
                    kind: r.kind,
                    location: Location {
                        file: r.file.unwrap_or_else(|| default_file.clone()),
                        line: r.line,
                    },
                })
                .collect();

            let mut functions = package.functions;
            let mut interfaces = package.interfaces;
            for decl in functions
                .iter_mut()
                .chain(interfaces.iter_mut().flat_map(|i| i.methods.iter_mut()))
            {
                for type_ref in &mut decl.type_refs {
                    type_ref.import_path = qualify(std::mem::take(&mut type_ref.import_path));
                }
            }

            let exported_types = package
                .types
                .into_iter()
                .chain(interfaces.iter().map(|i| i.name.clone()))
                .filter(|n| is_exported(n))
                .collect();

            let name = package
                .name
                .unwrap_or_else(|| package.path.rsplit('/').next().unwrap_or(&package.path).to_string());

            records.push(PackageRecord {
                id: package.path,
                name,
                files: package.files,
                annotation: package.layer,
                exported_types,
                interfaces,
                functions,
                references,
                parse_error: None,
            });
        }

        Ok(records)
    }
}
