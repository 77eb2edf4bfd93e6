//! Records and repository traits
//!
//! The versioning engine talks to persistence only through [`GraphStore`]
//! (nodes and edges of a version) and [`VersionStore`] (trees, versions,
//! tags). [`Repository`] adds the atomic scope a full clone needs.
//!
//! Implementations: [`crate::db`] (SQLite via Diesel) and
//! [`crate::memory::MemoryStore`].

use crate::attrs::Attributes;
use crate::error::Result;
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Records
// ============================================================================

/// A named root object owning a lineage of versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub id: i32,
    pub name: String,
    pub created_at: String,
}

/// Snapshot of a tree's node/edge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeVersion {
    pub id: i32,
    pub tree_id: i32,
    pub parent_version_id: Option<i32>,
    /// Unique per tree; `None` for working versions
    pub tag: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
    pub tag_created_at: Option<String>,
}

impl TreeVersion {
    pub fn is_tagged(&self) -> bool {
        self.tag.is_some()
    }

    pub fn is_root(&self) -> bool {
        self.parent_version_id.is_none()
    }

    /// Short human label: the tag if any, else `#id`
    pub fn label(&self) -> String {
        match &self.tag {
            Some(tag) => tag.clone(),
            None => format!("#{}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: i32,
    pub version_id: i32,
    pub data: Attributes,
    pub created_at: String,
}

/// Directed edge `incoming_node_id -> outgoing_node_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEdge {
    pub id: i32,
    pub version_id: i32,
    pub incoming_node_id: i32,
    pub outgoing_node_id: i32,
    pub data: Attributes,
    pub created_at: String,
}

/// A version together with its full node and edge set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub version: TreeVersion,
    pub nodes: Vec<TreeNode>,
    pub edges: Vec<TreeEdge>,
}

// ============================================================================
// Insert payloads
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct NewTree<'a> {
    pub name: &'a str,
    pub created_at: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct NewTreeVersion<'a> {
    pub tree_id: i32,
    pub parent_version_id: Option<i32>,
    pub tag: Option<&'a str>,
    pub description: Option<&'a str>,
    pub created_at: &'a str,
    pub tag_created_at: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewTreeNode<'a> {
    pub version_id: i32,
    pub data: &'a Attributes,
    pub created_at: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct NewTreeEdge<'a> {
    pub version_id: i32,
    pub incoming_node_id: i32,
    pub outgoing_node_id: i32,
    pub data: &'a Attributes,
    pub created_at: &'a str,
}

// ============================================================================
// Repository traits
// ============================================================================

/// Persistence of node and edge records scoped to a version.
///
/// Sequences come back in insertion (id) order.
pub trait GraphStore {
    fn get_node(&mut self, id: i32) -> Result<Option<TreeNode>>;

    fn nodes_by_version(&mut self, version_id: i32) -> Result<Vec<TreeNode>>;

    fn edges_by_version(&mut self, version_id: i32) -> Result<Vec<TreeEdge>>;

    /// Edges leaving `node_id`
    fn edges_by_incoming_node(&mut self, node_id: i32) -> Result<Vec<TreeEdge>>;

    /// Edges arriving at `node_id`
    fn edges_by_outgoing_node(&mut self, node_id: i32) -> Result<Vec<TreeEdge>>;

    fn insert_node(&mut self, node: NewTreeNode<'_>) -> Result<TreeNode>;

    fn insert_edge(&mut self, edge: NewTreeEdge<'_>) -> Result<TreeEdge>;
}

/// Persistence of trees, versions, parent links and tags
pub trait VersionStore {
    fn insert_tree(&mut self, tree: NewTree<'_>) -> Result<Tree>;

    fn get_tree(&mut self, id: i32) -> Result<Option<Tree>>;

    fn trees_by_name(&mut self, name: &str) -> Result<Vec<Tree>>;

    fn list_trees(&mut self) -> Result<Vec<Tree>>;

    /// Delete a tree with all of its versions, nodes and edges.
    /// Returns false if the tree did not exist.
    fn delete_tree(&mut self, id: i32) -> Result<bool>;

    fn get_version(&mut self, id: i32) -> Result<Option<TreeVersion>>;

    /// Version with the greatest `created_at` (id breaks ties)
    fn latest_by_tree(&mut self, tree_id: i32) -> Result<Option<TreeVersion>>;

    /// Tag lookup, always scoped to one tree
    fn get_by_tag(&mut self, tree_id: i32, tag: &str) -> Result<Option<TreeVersion>>;

    /// All versions of a tree, oldest first
    fn versions_by_tree(&mut self, tree_id: i32) -> Result<Vec<TreeVersion>>;

    fn insert_version(&mut self, version: NewTreeVersion<'_>) -> Result<TreeVersion>;
}

/// A store that can run a group of writes atomically
pub trait Repository: GraphStore + VersionStore {
    /// Run `f`; all of its writes become visible together, or none do if it fails.
    fn atomic<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>;
}

// ============================================================================
// Timestamps
// ============================================================================

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current UTC time, fixed-width so string order is chronological
pub fn timestamp_now() -> String {
    format_timestamp(Utc::now().trunc_subsecs(6))
}

/// Current time, bumped past `floor` when the clock has not moved beyond it
pub fn timestamp_after(floor: Option<&str>) -> String {
    let now = Utc::now().trunc_subsecs(6);
    let floor = floor
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));

    match floor {
        Some(f) if now <= f => format_timestamp(f + Duration::microseconds(1)),
        _ => format_timestamp(now),
    }
}
