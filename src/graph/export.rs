//! Graph export functionality.
//!
//! Exports the dependency graph as text for storage, tooling and prompts.

use crate::err;
use crate::error::Result;
use crate::graph::types::DependencyGraph;
use crate::types::GraphFormat;
use serde::Serialize;

/// Export the dependency graph to the specified format.
///
/// # Supported Formats
///
/// - **JSON**: `{nodes, edges, metadata}` for programmatic access
/// - **DOT**: Graphviz DOT format
/// - **Mermaid**: Mermaid diagram syntax for documentation
/// - **Text**: the `Files:` / `Dependencies:` outline used in prompts
///
/// # Example
///
/// ```rust
/// use tfscope::graph::{export_graph, DependencyGraph};
/// use tfscope::types::GraphFormat;
///
/// let mut graph = DependencyGraph::new();
/// graph.add_file("main.tf", "/repo/main.tf");
/// let text = export_graph(&graph, GraphFormat::Text).unwrap();
/// assert_eq!(text, "Files:\n- main.tf\n\nDependencies:\n");
/// ```
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export_graph(graph: &DependencyGraph, format: GraphFormat) -> Result<String> {
    match format {
        GraphFormat::Json => export_json(graph),
        GraphFormat::Dot => Ok(export_dot(graph)),
        GraphFormat::Mermaid => Ok(export_mermaid(graph)),
        GraphFormat::Text => Ok(export_text(graph)),
    }
}

fn export_json(graph: &DependencyGraph) -> Result<String> {
    #[derive(Serialize)]
    struct JsonGraph<'a> {
        nodes: Vec<JsonNode<'a>>,
        edges: Vec<JsonEdge<'a>>,
        metadata: JsonMetadata,
    }

    #[derive(Serialize)]
    struct JsonNode<'a> {
        id: &'a str,
        #[serde(rename = "type")]
        node_type: String,
        path: String,
        description: Option<&'a str>,
    }

    #[derive(Serialize)]
    struct JsonEdge<'a> {
        source: &'a str,
        target: &'a str,
        #[serde(rename = "type")]
        edge_type: String,
        module_name: &'a str,
    }

    #[derive(Serialize)]
    struct JsonMetadata {
        total_nodes: usize,
        total_edges: usize,
        described_nodes: usize,
    }

    let nodes: Vec<JsonNode<'_>> = graph
        .nodes()
        .map(|n| JsonNode {
            id: &n.id,
            node_type: n.kind.to_string(),
            path: n.path.to_string_lossy().into_owned(),
            description: n.description.as_deref(),
        })
        .collect();

    let edges: Vec<JsonEdge<'_>> = graph
        .edges()
        .map(|e| JsonEdge {
            source: e.source,
            target: e.target,
            edge_type: e.edge.kind.to_string(),
            module_name: &e.edge.module_name,
        })
        .collect();

    let json_graph = JsonGraph {
        metadata: JsonMetadata {
            total_nodes: nodes.len(),
            total_edges: edges.len(),
            described_nodes: nodes.iter().filter(|n| n.description.is_some()).count(),
        },
        nodes,
        edges,
    };

    serde_json::to_string_pretty(&json_graph).map_err(|e| err!(ReportGeneration {
        message: format!("Failed to serialize graph to JSON: {e}"),
    }))
}

fn export_dot(graph: &DependencyGraph) -> String {
    let mut dot = String::from("digraph terraform {\n");
    dot.push_str("    rankdir=LR;\n");
    dot.push_str("    node [shape=box, style=rounded];\n\n");

    for node in graph.nodes() {
        let id = escape_dot_string(&node.id);
        dot.push_str(&format!("    \"{id}\";\n"));
    }
    dot.push('\n');

    for edge in graph.edges() {
        dot.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
            escape_dot_string(edge.source),
            escape_dot_string(edge.target),
            escape_dot_string(&edge.edge.module_name),
        ));
    }

    dot.push_str("}\n");
    dot
}

fn export_mermaid(graph: &DependencyGraph) -> String {
    let mut mermaid = String::from("graph LR\n");

    for node in graph.nodes() {
        let id = sanitize_mermaid_id(&node.id);
        let label = escape_mermaid_string(&node.id);
        mermaid.push_str(&format!("    {id}[\"{label}\"]\n"));
    }

    if graph.edge_count() > 0 {
        mermaid.push('\n');
    }
    for edge in graph.edges() {
        mermaid.push_str(&format!(
            "    {} -->|{}| {}\n",
            sanitize_mermaid_id(edge.source),
            escape_mermaid_string(&edge.edge.module_name),
            sanitize_mermaid_id(edge.target),
        ));
    }

    mermaid
}

fn export_text(graph: &DependencyGraph) -> String {
    let mut text = String::from("Files:\n");
    for node in graph.nodes() {
        text.push_str(&format!("- {}\n", node.id));
    }

    text.push_str("\nDependencies:\n");
    for edge in graph.edges() {
        text.push_str(&format!(
            "- {} -> {} (module: {})\n",
            edge.source, edge.target, edge.edge.module_name
        ));
    }
    text
}

/// Escape a string for use inside a quoted DOT id or label.
fn escape_dot_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Sanitize a string for use as a Mermaid node ID.
fn sanitize_mermaid_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Escape a string for use in Mermaid labels.
fn escape_mermaid_string(s: &str) -> String {
    s.replace('"', "'").replace('|', "/").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_test_graph() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.add_file("main.tf", "/repo/main.tf");
        graph.add_file("modules/net/main.tf", "/repo/modules/net/main.tf");
        graph.add_dependency("main.tf", "modules/net/main.tf", "net");
        graph.set_description("main.tf", "Root module wiring the network.");
        graph
    }

    #[test]
    fn test_export_json_shape() {
        let json = export_json(&create_test_graph()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["nodes"][0]["id"], "main.tf");
        assert_eq!(parsed["nodes"][0]["type"], "file");
        assert_eq!(parsed["nodes"][0]["path"], "/repo/main.tf");
        assert_eq!(parsed["nodes"][0]["description"], "Root module wiring the network.");
        assert!(parsed["nodes"][1]["description"].is_null());

        assert_eq!(parsed["edges"][0]["source"], "main.tf");
        assert_eq!(parsed["edges"][0]["target"], "modules/net/main.tf");
        assert_eq!(parsed["edges"][0]["type"], "module_dependency");
        assert_eq!(parsed["edges"][0]["module_name"], "net");

        assert_eq!(parsed["metadata"]["total_nodes"], 2);
        assert_eq!(parsed["metadata"]["described_nodes"], 1);
    }

    #[test]
    fn test_export_text_outline() {
        let text = export_text(&create_test_graph());
        assert_eq!(
            text,
            "Files:\n- main.tf\n- modules/net/main.tf\n\nDependencies:\n- main.tf -> modules/net/main.tf (module: net)\n"
        );
    }

    #[test]
    fn test_export_dot() {
        let dot = export_dot(&create_test_graph());
        assert!(dot.starts_with("digraph terraform {"));
        assert!(dot.contains("\"main.tf\" -> \"modules/net/main.tf\" [label=\"net\"];"));
    }

    #[test]
    fn test_export_mermaid() {
        let mermaid = export_mermaid(&create_test_graph());
        assert!(mermaid.starts_with("graph LR\n"));
        assert!(mermaid.contains("main_tf[\"main.tf\"]"));
        assert!(mermaid.contains("main_tf -->|net| modules_net_main_tf"));
    }

    #[test]
    fn test_escape_helpers() {
        assert_eq!(escape_dot_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(sanitize_mermaid_id("modules/vpc-a/main.tf"), "modules_vpc_a_main_tf");
    }
}
