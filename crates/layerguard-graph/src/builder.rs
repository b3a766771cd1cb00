//! Graph construction
//!
//! Packages are discovered with walkdir, scanned in parallel on the blocking
//! pool, then assembled into a [`Graph`] in sorted package order so the result
//! never depends on task completion order.

use layerguard_core::{Classification, Config, ConfigError, GlobPattern, Layer, LayerClassifier};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use walkdir::WalkDir;

use crate::description::Description;
use crate::error::InputError;
use crate::graph::{resolve_target, EdgeLocation, EdgeTarget, Graph, ReferenceEdge};
use crate::package::{Package, PackageId, PackageRecord};
use crate::source::{SourceFile, SourceScanner};

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &["vendor", "testdata"];

/// Builds a frozen [`Graph`] from a source tree or a description file
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    classifier: LayerClassifier,
    skip: Vec<GlobPattern>,
    include_tests: bool,
    scanner: Arc<SourceScanner>,
}

impl GraphBuilder {
    pub fn new(classifier: LayerClassifier) -> Self {
        Self {
            classifier,
            skip: Vec::new(),
            include_tests: false,
            scanner: Arc::new(SourceScanner::new()),
        }
    }

    /// Builder configured from the layer mappings and allowlist of `config`
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            skip: config.allowlist.compile()?,
            include_tests: config.include_tests,
            ..Self::new(LayerClassifier::new(&config.layers)?)
        })
    }

    pub fn with_skip(mut self, skip: Vec<GlobPattern>) -> Self {
        self.skip = skip;
        self
    }

    pub fn include_tests(mut self, include: bool) -> Self {
        self.include_tests = include;
        self
    }

    /// Build from a directory, or from a `.json` description file
    pub async fn build(&self, input: &Path) -> Result<Graph, InputError> {
        if input.is_file() && input.extension().is_some_and(|ext| ext == "json") {
            let description = Description::from_file(input)?;
            return self.build_description(description);
        }

        self.build_tree(input).await
    }

    /// Scan a Go source tree
    pub async fn build_tree(&self, root: &Path) -> Result<Graph, InputError> {
        if !root.is_dir() {
            return Err(InputError::RootNotFound(root.to_path_buf()));
        }

        let module = read_module_path(root)?;

        let discovery_root = root.to_path_buf();
        let skip = self.skip.clone();
        let include_tests = self.include_tests;
        let packages = tokio::task::spawn_blocking(move || discover(&discovery_root, &skip, include_tests))
            .await
            .map_err(|e| InputError::TaskFailed(e.to_string()))??;

        tracing::debug!(root = %root.display(), packages = packages.len(), "Discovered packages");

        let mut tasks = JoinSet::new();
        for (id, files) in packages {
            let scanner = Arc::clone(&self.scanner);
            let root = root.to_path_buf();
            tasks.spawn_blocking(move || {
                let sources = files.iter().map(|file| read_source(&root, file)).collect();
                scanner.scan_package(id, sources)
            });
        }

        let mut records = Vec::new();
        while let Some(result) = tasks.join_next().await {
            let record = result.map_err(|e| InputError::TaskFailed(e.to_string()))?;
            if let Some(error) = &record.parse_error {
                tracing::warn!(package = %record.id, error = %error, "Package could not be scanned");
            }
            records.push(record);
        }

        Ok(self.assemble(module, records))
    }

    /// Build from an already-parsed description
    pub fn build_description(&self, description: Description) -> Result<Graph, InputError> {
        let module = description.module.clone();
        let records = description
            .into_records()?
            .into_iter()
            .filter(|r| !self.is_skipped(&r.id))
            .collect();

        Ok(self.assemble(module, records))
    }

    fn is_skipped(&self, id: &str) -> bool {
        self.skip.iter().any(|p| p.matches(id))
    }

    /// Classify records and collapse their references into edges
    pub fn assemble(&self, module: Option<String>, mut records: Vec<PackageRecord>) -> Graph {
        records.sort_by(|a, b| a.id.cmp(&b.id));

        let ids: BTreeMap<PackageId, ()> = records.iter().map(|r| (r.id.clone(), ())).collect();

        let mut packages = BTreeMap::new();
        let mut edges: Vec<ReferenceEdge> = Vec::new();
        let mut edge_index: HashMap<(PackageId, EdgeTarget), usize> = HashMap::new();

        for record in records {
            let (layer, classification) = if record.parse_error.is_some() {
                (Layer::Unknown, Classification::Unmatched)
            } else {
                self.classifier.classify_with_source(&record.id, record.annotation)
            };

            tracing::debug!(package = %record.id, layer = %layer, by = %classification, "Classified package");

            for reference in record.references {
                let target = resolve_target(module.as_deref(), &ids, &reference.import_path);
                if target.internal() == Some(record.id.as_str()) {
                    continue;
                }

                let location = EdgeLocation {
                    location: reference.location,
                    kind: reference.kind,
                };

                match edge_index.get(&(record.id.clone(), target.clone())) {
                    Some(&i) => edges[i].locations.push(location),
                    None => {
                        edge_index.insert((record.id.clone(), target.clone()), edges.len());
                        edges.push(ReferenceEdge {
                            source: record.id.clone(),
                            target,
                            kind: reference.kind,
                            locations: vec![location],
                        });
                    }
                }
            }

            let name = if record.name.is_empty() {
                record.id.rsplit('/').next().unwrap_or(&record.id).to_string()
            } else {
                record.name
            };

            packages.insert(
                record.id.clone(),
                Package {
                    id: record.id,
                    name,
                    layer,
                    classification,
                    files: record.files,
                    exported_types: record.exported_types,
                    interfaces: record.interfaces,
                    functions: record.functions,
                    parse_error: record.parse_error,
                },
            );
        }

        tracing::info!(packages = packages.len(), edges = edges.len(), "Built dependency graph");

        Graph::new(module, packages, edges)
    }
}

/// `module` directive of a go.mod file
pub fn parse_module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or(line).trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches('"');
        (!path.is_empty()).then(|| path.to_string())
    })
}

fn read_module_path(root: &Path) -> Result<Option<String>, InputError> {
    let go_mod = root.join("go.mod");
    if !go_mod.is_file() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&go_mod).map_err(|e| InputError::io(&go_mod, e))?;
    Ok(parse_module_path(&contents))
}

fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_') || SKIPPED_DIRS.contains(&name)
}

fn slash_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Package id of a directory: its `/`-separated path relative to the root
fn package_id(relative: &Path) -> PackageId {
    let id = slash_path(relative);
    if id.is_empty() {
        ".".to_string()
    } else {
        id
    }
}

/// Group Go files by directory
fn discover(
    root: &Path,
    skip: &[GlobPattern],
    include_tests: bool,
) -> Result<BTreeMap<PackageId, Vec<PathBuf>>, InputError> {
    let mut packages: BTreeMap<PackageId, Vec<PathBuf>> = BTreeMap::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !is_skipped_dir(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = entry.map_err(|e| InputError::Walk(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(".go") || (!include_tests && name.ends_with("_test.go")) {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let id = package_id(relative.parent().unwrap_or(Path::new("")));
        if skip.iter().any(|p| p.matches(&id)) {
            continue;
        }

        packages.entry(id).or_default().push(relative.to_path_buf());
    }

    Ok(packages)
}

fn read_source(root: &Path, relative: &Path) -> SourceFile {
    let path = slash_path(relative);
    let content = match std::fs::read(root.join(relative)) {
        Ok(bytes) => String::from_utf8(bytes).map_err(|_| "file is not valid UTF-8".to_string()),
        Err(e) => Err(e.to_string()),
    };

    SourceFile { path, content }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{EdgeKind, RawReference};
    use layerguard_core::config::default_layer_mappings;
    use layerguard_core::Location;
    use pretty_assertions::assert_eq;

    fn builder() -> GraphBuilder {
        GraphBuilder::new(LayerClassifier::new(&default_layer_mappings()).unwrap())
    }

    fn record(id: &str, references: &[(&str, EdgeKind, usize)]) -> PackageRecord {
        PackageRecord {
            id: id.to_string(),
            name: id.rsplit('/').next().unwrap().to_string(),
            files: vec![format!("{}/a.go", id)],
            references: references
                .iter()
                .map(|(path, kind, line)| RawReference {
                    import_path: path.to_string(),
                    kind: *kind,
                    location: Location::with_line(format!("{}/a.go", id), *line),
                })
                .collect(),
            ..PackageRecord::default()
        }
    }

    #[test]
    fn module_directive() {
        assert_eq!(parse_module_path("module example.com/shop\n\ngo 1.22\n"), Some("example.com/shop".to_string()));
        assert_eq!(parse_module_path("// comment\nmodule \"shop\" // quoted\n"), Some("shop".to_string()));
        assert_eq!(parse_module_path("modules x\n"), None);
        assert_eq!(parse_module_path("go 1.22\n"), None);
    }

    #[test]
    fn package_ids() {
        assert_eq!(package_id(Path::new("")), ".");
        assert_eq!(package_id(Path::new("domain/catalog")), "domain/catalog");
    }

    #[test]
    fn edges_collapse_per_target() {
        let records = vec![
            record(
                "usecase/catalog",
                &[
                    ("example.com/shop/domain/catalog", EdgeKind::Import, 3),
                    ("context", EdgeKind::Import, 4),
                    ("example.com/shop/domain/catalog", EdgeKind::Call, 12),
                    ("example.com/shop/usecase/catalog", EdgeKind::Import, 5),
                ],
            ),
            record("domain/catalog", &[]),
        ];

        let graph = builder().assemble(Some("example.com/shop".to_string()), records);

        assert_eq!(graph.package_count(), 2);
        assert_eq!(graph.edges().len(), 2);

        let edge = &graph.edges()[0];
        assert_eq!(edge.target, EdgeTarget::Internal { package: "domain/catalog".to_string() });
        assert_eq!(edge.kind, EdgeKind::Import);
        assert_eq!(
            edge.locations.iter().map(|l| (l.location.line, l.kind)).collect::<Vec<_>>(),
            vec![(Some(3), EdgeKind::Import), (Some(12), EdgeKind::Call)]
        );
        assert!(graph.edges()[1].target.is_stdlib());
        assert_eq!(graph.layer_of("usecase/catalog"), Layer::Usecase);
    }

    #[test]
    fn unparseable_packages_are_unknown() {
        let mut broken = PackageRecord::unparseable(
            "domain/broken".to_string(),
            vec!["domain/broken/a.go".to_string()],
            "missing package clause".to_string(),
        );
        broken.annotation = Some(Layer::Domain);

        let graph = builder().assemble(None, vec![broken]);
        let package = graph.package("domain/broken").unwrap();

        assert_eq!(package.layer, Layer::Unknown);
        assert_eq!(package.classification, Classification::Unmatched);
        assert_eq!(package.name, "broken");
    }

    #[test]
    fn annotation_wins_over_patterns() {
        let mut record = record("domain/adapters", &[]);
        record.annotation = Some(Layer::Infrastructure);

        let graph = builder().assemble(None, vec![record]);
        let package = graph.package("domain/adapters").unwrap();

        assert_eq!(package.layer, Layer::Infrastructure);
        assert_eq!(package.classification, Classification::Annotation);
    }

    #[test]
    fn assembly_order_does_not_matter() {
        let a = record("usecase/a", &[("shop/domain/x", EdgeKind::Import, 1)]);
        let b = record("domain/x", &[]);
        let c = record("interface/c", &[("shop/usecase/a", EdgeKind::Import, 2)]);

        let first = builder().assemble(None, vec![a.clone(), b.clone(), c.clone()]);
        let second = builder().assemble(None, vec![c, b, a]);

        assert_eq!(first, second);
        assert_eq!(first.digest().unwrap(), second.digest().unwrap());
    }

    #[test]
    fn description_skip_list() {
        let description = Description::from_json(
            r#"{ "packages": [ { "path": "domain/catalog" }, { "path": "gen/mocks" } ] }"#,
        )
        .unwrap();

        let graph = builder()
            .with_skip(vec![GlobPattern::new("gen/**").unwrap()])
            .build_description(description)
            .unwrap();

        assert_eq!(graph.packages().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec!["domain/catalog"]);
    }

    #[tokio::test]
    async fn missing_root_is_an_input_error() {
        let result = builder().build(Path::new("/definitely/not/here")).await;
        assert!(matches!(result, Err(InputError::RootNotFound(_))));
    }
}
