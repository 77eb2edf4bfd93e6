//! Tree facade: tag, branch and restore on a named tree

use crate::attrs::Attributes;
use crate::engine::{ClonedVersion, VersioningEngine};
use crate::error::Result;
use crate::store::{Repository, Tree, TreeEdge, TreeNode, TreeVersion};
use crate::traversal::GraphTraversal;

/// A tree bound to an engine.
///
/// The working version is always the tree's latest version; tags, branches
/// and restores add a new latest version cloned from the resolved source.
pub struct VersionedTree<'r, R> {
    engine: VersioningEngine<'r, R>,
    tree: Tree,
}

impl<'r, R: Repository> VersionedTree<'r, R> {
    /// Create a new tree (and its root version) through `engine`
    pub fn create(mut engine: VersioningEngine<'r, R>, name: &str, root_tag: Option<&str>) -> Result<Self> {
        let (tree, _) = engine.create_tree(name, root_tag)?;
        Ok(Self { engine, tree })
    }

    /// Bind to an existing tree
    pub fn open(mut engine: VersioningEngine<'r, R>, tree_id: i32) -> Result<Self> {
        let tree = engine.get_tree(tree_id)?;
        Ok(Self { engine, tree })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn id(&self) -> i32 {
        self.tree.id
    }

    pub fn engine(&mut self) -> &mut VersioningEngine<'r, R> {
        &mut self.engine
    }

    pub fn latest_version(&mut self) -> Result<TreeVersion> {
        self.engine.latest_version(self.tree.id)
    }

    pub fn versions(&mut self) -> Result<Vec<TreeVersion>> {
        self.engine.versions(self.tree.id)
    }

    pub fn resolve_tag(&mut self, tag: &str) -> Result<TreeVersion> {
        self.engine.resolve_tag(self.tree.id, tag)
    }

    /// Freeze the latest version under `tag` as a new version
    pub fn create_tag(&mut self, tag: &str, description: &str) -> Result<ClonedVersion> {
        self.engine.clone_latest(self.tree.id, Some(tag), description)
    }

    /// New untagged working version cloned from the tagged one
    pub fn branch_from_tag(&mut self, tag: &str) -> Result<ClonedVersion> {
        self.clone_from_tag(tag, &format!("New version from tag {}", tag))
    }

    /// Same clone as [`branch_from_tag`](Self::branch_from_tag); the restored
    /// copy becomes the latest version.
    pub fn restore_from_tag(&mut self, tag: &str) -> Result<ClonedVersion> {
        self.clone_from_tag(tag, &format!("Restored version from tag {}", tag))
    }

    fn clone_from_tag(&mut self, tag: &str, description: &str) -> Result<ClonedVersion> {
        let source = self.resolve_tag(tag)?;
        self.engine.clone_version(source.id, None, description)
    }

    /// Append a node to the working version
    pub fn add_node(&mut self, data: Attributes) -> Result<TreeNode> {
        self.engine.add_node_to_latest(self.tree.id, data)
    }

    /// Append an edge to the working version
    pub fn add_edge(&mut self, from: i32, to: i32, data: Attributes) -> Result<TreeEdge> {
        self.engine.add_edge_to_latest(self.tree.id, from, to, data)
    }

    /// Traversal over the working version
    pub fn traversal(&mut self) -> Result<GraphTraversal> {
        let latest = self.latest_version()?;
        GraphTraversal::load(self.engine.repo(), latest.id)
    }

    /// Traversal over the version carrying `tag`
    pub fn traversal_at(&mut self, tag: &str) -> Result<GraphTraversal> {
        let version = self.resolve_tag(tag)?;
        GraphTraversal::load(self.engine.repo(), version.id)
    }
}
