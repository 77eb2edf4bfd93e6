//! Export utilities for versions
//!
//! DOT rendering of a version's graph and root-based filtering. JSON export
//! is serde on [`VersionSnapshot`].

use crate::attrs::Attributes;
use crate::store::{TreeEdge, TreeNode, VersionSnapshot};
use crate::traversal::GraphTraversal;
use std::fmt::Write;

/// Configuration for DOT export
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Title for the graph; defaults to the version label
    pub title: Option<String>,
    /// Attribute used as the node label. The whole attribute object is
    /// shown when unset or missing on a node.
    pub node_label_key: Option<String>,
    /// Attribute shown on edges
    pub edge_label_key: String,
    /// Include node IDs in labels
    pub show_ids: bool,
    /// Orientation: "TB" (top-bottom), "LR" (left-right)
    pub rankdir: String,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            title: None,
            node_label_key: None,
            edge_label_key: "type".to_string(),
            show_ids: true,
            rankdir: "TB".to_string(),
        }
    }
}

/// Escape a string for DOT labels
fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Truncate to `max_chars` characters, marking the cut with "..."
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Display text for one attribute value: strings unquoted, the rest as JSON
fn attr_text(data: &Attributes, key: &str) -> Option<String> {
    data.get(key).map(|value| match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    })
}

fn node_label(node: &TreeNode, config: &DotConfig) -> String {
    let body = config
        .node_label_key
        .as_deref()
        .and_then(|key| attr_text(&node.data, key))
        .unwrap_or_else(|| node.data.to_json());

    let mut label = String::new();
    if config.show_ids {
        label.push_str(&format!("[{}] ", node.id));
    }
    label.push_str(&truncate(&body, 40));
    label
}

fn edge_attrs(edge: &TreeEdge, config: &DotConfig) -> String {
    match attr_text(&edge.data, &config.edge_label_key) {
        Some(text) => format!(" [label=\"{}\"]", escape_dot(&truncate(&text, 30))),
        None => String::new(),
    }
}

fn render(snapshot: &VersionSnapshot, config: &DotConfig) -> Result<String, std::fmt::Error> {
    let mut dot = String::new();
    let title = config
        .title
        .clone()
        .unwrap_or_else(|| snapshot.version.label());

    // Graph header
    writeln!(dot, "digraph Version{} {{", snapshot.version.id)?;
    writeln!(dot, "  rankdir={};", config.rankdir)?;
    writeln!(dot, "  node [fontname=\"Arial\" fontsize=10 shape=\"box\" style=\"rounded,filled\"];")?;
    writeln!(dot, "  edge [fontname=\"Arial\" fontsize=9];")?;
    writeln!(dot, "  label=\"{}\";", escape_dot(&title))?;
    writeln!(dot, "  labelloc=t;")?;
    writeln!(dot)?;

    let fill = if snapshot.version.is_tagged() { "#E6E6FA" } else { "#F5F5F5" };
    for node in &snapshot.nodes {
        writeln!(
            dot,
            "  {} [label=\"{}\" fillcolor=\"{}\"];",
            node.id,
            escape_dot(&node_label(node, config)),
            fill
        )?;
    }

    writeln!(dot)?;

    for edge in &snapshot.edges {
        writeln!(
            dot,
            "  {} -> {}{};",
            edge.incoming_node_id,
            edge.outgoing_node_id,
            edge_attrs(edge, config)
        )?;
    }

    writeln!(dot, "}}")?;
    Ok(dot)
}

/// Render a version's graph in DOT format
pub fn version_to_dot(snapshot: &VersionSnapshot, config: &DotConfig) -> String {
    // Writing into a String cannot fail
    render(snapshot, config).unwrap_or_default()
}

/// Keep only the nodes reachable from `root_ids`, and the edges between them
pub fn filter_snapshot_from_roots(snapshot: &VersionSnapshot, root_ids: &[i32]) -> VersionSnapshot {
    let reachable = GraphTraversal::from_snapshot(snapshot).reachable_from(root_ids);

    let nodes: Vec<TreeNode> = snapshot
        .nodes
        .iter()
        .filter(|n| reachable.contains(&n.id))
        .cloned()
        .collect();

    let edges: Vec<TreeEdge> = snapshot
        .edges
        .iter()
        .filter(|e| reachable.contains(&e.incoming_node_id) && reachable.contains(&e.outgoing_node_id))
        .cloned()
        .collect();

    VersionSnapshot {
        version: snapshot.version.clone(),
        nodes,
        edges,
    }
}
