//! In-memory repository
//!
//! Keeps every table in a `BTreeMap` keyed by id, so enumeration order
//! matches the SQLite store. `atomic` snapshots the whole store and puts the
//! snapshot back when the closure fails.

use crate::error::Result;
use crate::store::{
    GraphStore, NewTree, NewTreeEdge, NewTreeNode, NewTreeVersion, Repository, Tree, TreeEdge,
    TreeNode, TreeVersion, VersionStore,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    trees: BTreeMap<i32, Tree>,
    versions: BTreeMap<i32, TreeVersion>,
    nodes: BTreeMap<i32, TreeNode>,
    edges: BTreeMap<i32, TreeEdge>,
    next_id: NextIds,
}

#[derive(Debug, Clone, Default)]
struct NextIds {
    tree: i32,
    version: i32,
    node: i32,
    edge: i32,
}

fn bump(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

impl GraphStore for MemoryStore {
    fn get_node(&mut self, id: i32) -> Result<Option<TreeNode>> {
        Ok(self.nodes.get(&id).cloned())
    }

    fn nodes_by_version(&mut self, version_id: i32) -> Result<Vec<TreeNode>> {
        Ok(self
            .nodes
            .values()
            .filter(|n| n.version_id == version_id)
            .cloned()
            .collect())
    }

    fn edges_by_version(&mut self, version_id: i32) -> Result<Vec<TreeEdge>> {
        Ok(self
            .edges
            .values()
            .filter(|e| e.version_id == version_id)
            .cloned()
            .collect())
    }

    fn edges_by_incoming_node(&mut self, node_id: i32) -> Result<Vec<TreeEdge>> {
        Ok(self
            .edges
            .values()
            .filter(|e| e.incoming_node_id == node_id)
            .cloned()
            .collect())
    }

    fn edges_by_outgoing_node(&mut self, node_id: i32) -> Result<Vec<TreeEdge>> {
        Ok(self
            .edges
            .values()
            .filter(|e| e.outgoing_node_id == node_id)
            .cloned()
            .collect())
    }

    fn insert_node(&mut self, node: NewTreeNode<'_>) -> Result<TreeNode> {
        let id = bump(&mut self.next_id.node);
        let record = TreeNode {
            id,
            version_id: node.version_id,
            data: node.data.clone(),
            created_at: node.created_at.to_string(),
        };
        self.nodes.insert(id, record.clone());
        Ok(record)
    }

    fn insert_edge(&mut self, edge: NewTreeEdge<'_>) -> Result<TreeEdge> {
        let id = bump(&mut self.next_id.edge);
        let record = TreeEdge {
            id,
            version_id: edge.version_id,
            incoming_node_id: edge.incoming_node_id,
            outgoing_node_id: edge.outgoing_node_id,
            data: edge.data.clone(),
            created_at: edge.created_at.to_string(),
        };
        self.edges.insert(id, record.clone());
        Ok(record)
    }
}

impl VersionStore for MemoryStore {
    fn insert_tree(&mut self, tree: NewTree<'_>) -> Result<Tree> {
        let id = bump(&mut self.next_id.tree);
        let record = Tree {
            id,
            name: tree.name.to_string(),
            created_at: tree.created_at.to_string(),
        };
        self.trees.insert(id, record.clone());
        Ok(record)
    }

    fn get_tree(&mut self, id: i32) -> Result<Option<Tree>> {
        Ok(self.trees.get(&id).cloned())
    }

    fn trees_by_name(&mut self, name: &str) -> Result<Vec<Tree>> {
        Ok(self.trees.values().filter(|t| t.name == name).cloned().collect())
    }

    fn list_trees(&mut self) -> Result<Vec<Tree>> {
        Ok(self.trees.values().cloned().collect())
    }

    fn delete_tree(&mut self, id: i32) -> Result<bool> {
        if self.trees.remove(&id).is_none() {
            return Ok(false);
        }
        let version_ids: Vec<i32> = self
            .versions
            .values()
            .filter(|v| v.tree_id == id)
            .map(|v| v.id)
            .collect();

        self.edges.retain(|_, e| !version_ids.contains(&e.version_id));
        self.nodes.retain(|_, n| !version_ids.contains(&n.version_id));
        self.versions.retain(|_, v| v.tree_id != id);
        Ok(true)
    }

    fn get_version(&mut self, id: i32) -> Result<Option<TreeVersion>> {
        Ok(self.versions.get(&id).cloned())
    }

    fn latest_by_tree(&mut self, tree_id: i32) -> Result<Option<TreeVersion>> {
        Ok(self
            .versions
            .values()
            .filter(|v| v.tree_id == tree_id)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    fn get_by_tag(&mut self, tree_id: i32, tag: &str) -> Result<Option<TreeVersion>> {
        Ok(self
            .versions
            .values()
            .find(|v| v.tree_id == tree_id && v.tag.as_deref() == Some(tag))
            .cloned())
    }

    fn versions_by_tree(&mut self, tree_id: i32) -> Result<Vec<TreeVersion>> {
        let mut versions: Vec<TreeVersion> = self
            .versions
            .values()
            .filter(|v| v.tree_id == tree_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(versions)
    }

    fn insert_version(&mut self, version: NewTreeVersion<'_>) -> Result<TreeVersion> {
        let id = bump(&mut self.next_id.version);
        let record = TreeVersion {
            id,
            tree_id: version.tree_id,
            parent_version_id: version.parent_version_id,
            tag: version.tag.map(str::to_string),
            description: version.description.map(str::to_string),
            created_at: version.created_at.to_string(),
            tag_created_at: version.tag_created_at.map(str::to_string),
        };
        self.versions.insert(id, record.clone());
        Ok(record)
    }
}

impl Repository for MemoryStore {
    fn atomic<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let snapshot = self.clone();
        let outcome = f(self);
        if outcome.is_err() {
            *self = snapshot;
        }
        outcome
    }
}
