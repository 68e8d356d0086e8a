//! Graph type definitions.
//!
//! - `DependencyGraph`: the file-level graph
//! - `FileNode`: one Terraform file
//! - `DependencyEdge`: "file A calls a module whose directory holds file B"

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Node identifier: the file's path relative to the repository root, `/`-separated.
pub type NodeId = String;

/// Kind of node. Only files exist today; the field is kept in exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    File,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
        }
    }
}

/// A Terraform file in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Absolute (or root-joined) path on disk
    pub path: PathBuf,
    /// Natural-language summary, once generated
    pub description: Option<String>,
}

/// Kind of edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    ModuleDependency,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModuleDependency => write!(f, "module_dependency"),
        }
    }
}

/// Edge payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub kind: EdgeKind,
    /// Label of the `module` block that created the edge
    pub module_name: String,
}

/// A resolved edge, for iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeView<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub edge: &'a DependencyEdge,
}

/// Directed graph of Terraform files and their module dependencies.
///
/// ```text
/// DependencyGraph
/// ├── inner: DiGraph<FileNode, DependencyEdge>
/// └── index: HashMap<NodeId, NodeIndex>  // lookup by relative path
/// ```
///
/// There is at most one edge per ordered pair of nodes; adding an edge
/// that already exists replaces its payload.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    inner: DiGraph<FileNode, DependencyEdge>,
    index: HashMap<NodeId, NodeIndex>,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file node, or return the existing one's index.
    pub fn add_file(&mut self, id: impl Into<NodeId>, path: impl Into<PathBuf>) -> NodeIndex {
        let id = id.into();
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }

        let idx = self.inner.add_node(FileNode {
            id: id.clone(),
            kind: NodeKind::File,
            path: path.into(),
            description: None,
        });
        self.index.insert(id, idx);
        idx
    }

    /// Add or replace the edge `source -> target`.
    ///
    /// Returns false if either endpoint is not in the graph.
    pub fn add_dependency(&mut self, source: &str, target: &str, module_name: &str) -> bool {
        let (Some(&from), Some(&to)) = (self.index.get(source), self.index.get(target)) else {
            return false;
        };

        self.inner.update_edge(
            from,
            to,
            DependencyEdge {
                kind: EdgeKind::ModuleDependency,
                module_name: module_name.to_string(),
            },
        );
        true
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&FileNode> {
        self.index.get(id).map(|&idx| &self.inner[idx])
    }

    /// Set a node's description. Returns false for unknown ids.
    pub fn set_description(&mut self, id: &str, description: impl Into<String>) -> bool {
        match self.index.get(id) {
            Some(&idx) => {
                self.inner[idx].description = Some(description.into());
                true
            }
            None => false,
        }
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &FileNode> {
        self.inner.node_weights()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.inner.edge_references().map(|e| EdgeView {
            source: &self.inner[e.source()].id,
            target: &self.inner[e.target()].id,
            edge: e.weight(),
        })
    }

    /// Outgoing edges of `id` as `(target, module_name)`, in insertion order.
    #[must_use]
    pub fn dependencies_of(&self, id: &str) -> Vec<(&str, &DependencyEdge)> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Incoming edges of `id` as `(source, module_name)`, in insertion order.
    #[must_use]
    pub fn dependents_of(&self, id: &str) -> Vec<(&str, &DependencyEdge)> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<(&str, &DependencyEdge)> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };

        // petgraph walks adjacency lists newest-first.
        let mut out: Vec<_> = self
            .inner
            .edges_directed(idx, direction)
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (e.id(), self.inner[other].id.as_str(), e.weight())
            })
            .collect();
        out.sort_by_key(|(edge_id, _, _)| *edge_id);
        out.into_iter().map(|(_, other, edge)| (other, edge)).collect()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.add_file("main.tf", "/repo/main.tf");
        graph.add_file("modules/net/main.tf", "/repo/modules/net/main.tf");
        graph.add_file("modules/net/outputs.tf", "/repo/modules/net/outputs.tf");
        graph
    }

    #[test]
    fn test_add_file_is_idempotent() {
        let mut graph = sample();
        let first = graph.add_file("main.tf", "/elsewhere/main.tf");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.node("main.tf").unwrap().path, PathBuf::from("/repo/main.tf"));
        assert_eq!(first, graph.add_file("main.tf", "/repo/main.tf"));
    }

    #[test]
    fn test_edges_replace_payload() {
        let mut graph = sample();
        assert!(graph.add_dependency("main.tf", "modules/net/main.tf", "net"));
        assert!(graph.add_dependency("main.tf", "modules/net/main.tf", "network"));
        assert_eq!(graph.edge_count(), 1);

        let deps = graph.dependencies_of("main.tf");
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].0, "modules/net/main.tf");
        assert_eq!(deps[0].1.module_name, "network");
    }

    #[test]
    fn test_unknown_endpoints() {
        let mut graph = sample();
        assert!(!graph.add_dependency("main.tf", "missing.tf", "x"));
        assert!(!graph.set_description("missing.tf", "nope"));
        assert!(graph.dependencies_of("missing.tf").is_empty());
    }

    #[test]
    fn test_neighbors_in_insertion_order() {
        let mut graph = sample();
        graph.add_dependency("main.tf", "modules/net/main.tf", "net");
        graph.add_dependency("main.tf", "modules/net/outputs.tf", "net");

        let targets: Vec<&str> = graph.dependencies_of("main.tf").into_iter().map(|(t, _)| t).collect();
        assert_eq!(targets, vec!["modules/net/main.tf", "modules/net/outputs.tf"]);

        let sources: Vec<&str> = graph.dependents_of("modules/net/outputs.tf").into_iter().map(|(s, _)| s).collect();
        assert_eq!(sources, vec!["main.tf"]);
    }

    #[test]
    fn test_descriptions() {
        let mut graph = sample();
        assert!(graph.node("main.tf").unwrap().description.is_none());
        assert!(graph.set_description("main.tf", "Root configuration"));
        assert_eq!(graph.node("main.tf").unwrap().description.as_deref(), Some("Root configuration"));
    }
}
