//! Package dependency graph
//!
//! Built once, then frozen: rules only ever see `&Graph`.

use layerguard_core::{Layer, Location};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::package::{EdgeKind, Package, PackageId};

/// Where an edge points
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeTarget {
    /// A package inside the analyzed tree
    Internal { package: PackageId },

    /// An import path outside the analyzed tree
    External { path: String, stdlib: bool },
}

impl EdgeTarget {
    /// Package id or import path
    pub fn name(&self) -> &str {
        match self {
            Self::Internal { package } => package,
            Self::External { path, .. } => path,
        }
    }

    pub fn internal(&self) -> Option<&str> {
        match self {
            Self::Internal { package } => Some(package),
            Self::External { .. } => None,
        }
    }

    pub fn is_stdlib(&self) -> bool {
        matches!(self, Self::External { stdlib: true, .. })
    }
}

/// One occurrence of a reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeLocation {
    #[serde(flatten)]
    pub location: Location,

    pub kind: EdgeKind,
}

/// A collapsed directed dependency between a package and a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub source: PackageId,

    pub target: EdgeTarget,

    /// Kind of the first occurrence discovered (imports come first)
    pub kind: EdgeKind,

    /// Every occurrence, in discovery order
    pub locations: Vec<EdgeLocation>,
}

impl ReferenceEdge {
    pub fn is_external(&self) -> bool {
        self.target.internal().is_none()
    }

    /// Location used when reporting on this edge
    pub fn first_location(&self) -> Option<Location> {
        self.locations.first().map(|l| l.location.clone())
    }
}

/// Frozen package graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Graph {
    module: Option<String>,

    packages: BTreeMap<PackageId, Package>,

    /// Edges in discovery order
    edges: Vec<ReferenceEdge>,

    /// Forward index: package -> indices of its outgoing edges
    #[serde(skip)]
    outgoing: BTreeMap<PackageId, Vec<usize>>,

    /// Reverse index: package -> indices of edges pointing at it
    #[serde(skip)]
    incoming: BTreeMap<PackageId, Vec<usize>>,
}

impl Graph {
    /// Freeze packages and edges into a graph
    pub fn new(module: Option<String>, packages: BTreeMap<PackageId, Package>, edges: Vec<ReferenceEdge>) -> Self {
        let mut outgoing: BTreeMap<PackageId, Vec<usize>> = BTreeMap::new();
        let mut incoming: BTreeMap<PackageId, Vec<usize>> = BTreeMap::new();

        for (i, edge) in edges.iter().enumerate() {
            outgoing.entry(edge.source.clone()).or_default().push(i);
            if let Some(target) = edge.target.internal() {
                incoming.entry(target.to_string()).or_default().push(i);
            }
        }

        Self {
            module,
            packages,
            edges,
            outgoing,
            incoming,
        }
    }

    /// Module path from go.mod or the description, if known
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// All packages, ordered by id
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn package(&self, id: &str) -> Option<&Package> {
        self.packages.get(id)
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Layer of a package; Unknown when the id is not in the graph
    pub fn layer_of(&self, id: &str) -> Layer {
        self.packages.get(id).map(|p| p.layer).unwrap_or(Layer::Unknown)
    }

    /// All edges in discovery order
    pub fn edges(&self) -> &[ReferenceEdge] {
        &self.edges
    }

    /// Outgoing edges of a package, in discovery order
    pub fn edges_from<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a ReferenceEdge> + 'a {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    /// Packages that depend on `id`
    pub fn dependents(&self, id: &str) -> Vec<&PackageId> {
        self.incoming
            .get(id)
            .map(|indices| indices.iter().map(|&i| &self.edges[i].source).collect())
            .unwrap_or_default()
    }

    /// Resolve an import path against the packages of this graph
    pub fn resolve_import(&self, import_path: &str) -> EdgeTarget {
        resolve_target(self.module.as_deref(), &self.packages, import_path)
    }

    /// SHA-256 over the canonical JSON form of the graph
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let canonical = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }
}

/// Go convention: standard-library import paths have no dot in their first element
pub fn is_stdlib_path(import_path: &str, module: Option<&str>) -> bool {
    let first = import_path.split('/').next().unwrap_or(import_path);
    if first.is_empty() || first.contains('.') {
        return false;
    }

    // A module path without a dot (`module shop`) shadows that first element.
    let module_first = module.and_then(|m| m.split('/').next());
    module_first != Some(first)
}

/// Resolve an import path to an internal package or an external target
pub fn resolve_target<V>(module: Option<&str>, packages: &BTreeMap<PackageId, V>, import_path: &str) -> EdgeTarget {
    if let Some(module) = module {
        if import_path == module && packages.contains_key(".") {
            return EdgeTarget::Internal { package: ".".to_string() };
        }
        if let Some(rest) = import_path.strip_prefix(module).and_then(|r| r.strip_prefix('/')) {
            if packages.contains_key(rest) {
                return EdgeTarget::Internal { package: rest.to_string() };
            }
        }
    } else if let Some(id) = packages
        .keys()
        .filter(|id| id.as_str() != "." && (import_path == id.as_str() || import_path.ends_with(&format!("/{}", id))))
        .max_by_key(|id| id.len())
    {
        return EdgeTarget::Internal { package: id.clone() };
    }

    EdgeTarget::External {
        path: import_path.to_string(),
        stdlib: is_stdlib_path(import_path, module),
    }
}
