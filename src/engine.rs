//! Versioning engine
//!
//! Derives new versions from existing ones. Every branch, tag or restore is a
//! node-split in the version forest: the source version gets a new child
//! that holds a full structural copy of its nodes and edges. History is
//! never rewritten.
//!
//! Cloning runs inside [`Repository::atomic`], so a failure part way through
//! (including a [`KastleError::DanglingReference`]) leaves no orphan version,
//! node or edge behind.

use crate::attrs::Attributes;
use crate::error::{KastleError, Result};
use crate::store::{
    timestamp_after, timestamp_now, GraphStore, NewTree, NewTreeEdge, NewTreeNode,
    NewTreeVersion, Repository, Tree, TreeEdge, TreeNode, TreeVersion, VersionSnapshot,
    VersionStore,
};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Validation switches for mutating operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Reject edges whose endpoints live in another version
    pub strict_edges: bool,
    /// Reject new nodes/edges on tagged versions
    pub freeze_tagged: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strict_edges: true,
            freeze_tagged: false,
        }
    }
}

/// Result of [`VersioningEngine::clone_version`]
#[derive(Debug, Clone)]
pub struct ClonedVersion {
    pub snapshot: VersionSnapshot,
    /// Source node id -> cloned node id
    pub node_map: BTreeMap<i32, i32>,
}

impl ClonedVersion {
    pub fn version(&self) -> &TreeVersion {
        &self.snapshot.version
    }

    pub fn into_version(self) -> TreeVersion {
        self.snapshot.version
    }
}

/// Creates versions, resolves tags and appends to working versions
pub struct VersioningEngine<'r, R> {
    repo: &'r mut R,
    options: EngineOptions,
}

impl<'r, R: Repository> VersioningEngine<'r, R> {
    pub fn new(repo: &'r mut R) -> Self {
        Self::with_options(repo, EngineOptions::default())
    }

    pub fn with_options(repo: &'r mut R, options: EngineOptions) -> Self {
        Self { repo, options }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Direct access to the underlying store (reads, traversal loading)
    pub fn repo(&mut self) -> &mut R {
        self.repo
    }

    // ========================================================================
    // Trees
    // ========================================================================

    /// Create a tree together with its root version
    pub fn create_tree(&mut self, name: &str, root_tag: Option<&str>) -> Result<(Tree, TreeVersion)> {
        if name.trim().is_empty() {
            return Err(KastleError::InvalidInput("tree name must not be empty".to_string()));
        }
        if let Some(tag) = root_tag {
            validate_tag(tag)?;
        }

        let (tree, root) = self.repo.atomic(|repo| {
            let now = timestamp_now();
            let tree = repo.insert_tree(NewTree { name, created_at: &now })?;
            let root = repo.insert_version(NewTreeVersion {
                tree_id: tree.id,
                parent_version_id: None,
                tag: root_tag,
                description: Some("Initial version"),
                created_at: &now,
                tag_created_at: root_tag.map(|_| now.as_str()),
            })?;
            Ok((tree, root))
        })?;

        info!(tree_id = tree.id, version_id = root.id, tree = name, "created tree");
        Ok((tree, root))
    }

    pub fn get_tree(&mut self, tree_id: i32) -> Result<Tree> {
        self.repo
            .get_tree(tree_id)?
            .ok_or(KastleError::TreeNotFound(tree_id))
    }

    /// All versions of a tree, oldest first
    pub fn versions(&mut self, tree_id: i32) -> Result<Vec<TreeVersion>> {
        self.get_tree(tree_id)?;
        self.repo.versions_by_tree(tree_id)
    }

    // ========================================================================
    // Versions
    // ========================================================================

    pub fn get_version(&mut self, version_id: i32) -> Result<TreeVersion> {
        self.repo
            .get_version(version_id)?
            .ok_or(KastleError::VersionNotFound(version_id))
    }

    /// Copy every node and edge of `source` into a new child version.
    ///
    /// Nodes get fresh ids; edge endpoints are translated through the
    /// old-id -> new-id table built while copying nodes.
    pub fn clone_version(
        &mut self,
        source: i32,
        new_tag: Option<&str>,
        description: &str,
    ) -> Result<ClonedVersion> {
        if let Some(tag) = new_tag {
            validate_tag(tag)?;
        }
        let cloned = self
            .repo
            .atomic(|repo| clone_into_new_version(repo, source, new_tag, description))?;
        log_clone(&cloned);
        Ok(cloned)
    }

    /// Clone whatever is the tree's latest version when the write lock is
    /// held, so concurrent writers always extend a single line.
    pub fn clone_latest(
        &mut self,
        tree_id: i32,
        new_tag: Option<&str>,
        description: &str,
    ) -> Result<ClonedVersion> {
        if let Some(tag) = new_tag {
            validate_tag(tag)?;
        }
        let cloned = self.repo.atomic(|repo| {
            let source = latest_of(repo, tree_id)?;
            clone_into_new_version(repo, source.id, new_tag, description)
        })?;
        log_clone(&cloned);
        Ok(cloned)
    }

    /// Version of `tree_id` carrying `tag`
    pub fn resolve_tag(&mut self, tree_id: i32, tag: &str) -> Result<TreeVersion> {
        self.get_tree(tree_id)?;
        self.repo
            .get_by_tag(tree_id, tag)?
            .ok_or_else(|| KastleError::TagNotFound {
                tree_id,
                tag: tag.to_string(),
            })
    }

    /// Most recently created version of the tree
    pub fn latest_version(&mut self, tree_id: i32) -> Result<TreeVersion> {
        latest_of(&mut *self.repo, tree_id)
    }

    /// The version followed by its ancestors, ending at the root
    pub fn lineage(&mut self, version_id: i32) -> Result<Vec<TreeVersion>> {
        let mut chain = vec![self.get_version(version_id)?];
        let mut seen = HashSet::from([version_id]);

        while let Some(parent_id) = chain.last().and_then(|v| v.parent_version_id) {
            if !seen.insert(parent_id) {
                warn!(version_id, parent_id, "version lineage loops back on itself");
                break;
            }
            chain.push(self.get_version(parent_id)?);
        }
        Ok(chain)
    }

    /// A version with all of its nodes and edges
    pub fn snapshot(&mut self, version_id: i32) -> Result<VersionSnapshot> {
        let version = self.get_version(version_id)?;
        let nodes = self.repo.nodes_by_version(version_id)?;
        let edges = self.repo.edges_by_version(version_id)?;
        Ok(VersionSnapshot { version, nodes, edges })
    }

    // ========================================================================
    // Nodes and edges
    // ========================================================================

    pub fn get_node(&mut self, node_id: i32) -> Result<TreeNode> {
        self.repo
            .get_node(node_id)?
            .ok_or(KastleError::NodeNotFound(node_id))
    }

    /// Append a node to an existing version
    pub fn add_node(&mut self, version_id: i32, data: Attributes) -> Result<TreeNode> {
        let options = self.options;
        self.repo
            .atomic(|repo| append_node(repo, version_id, &data, options))
    }

    /// Append a node to the tree's latest version, resolved under the write lock
    pub fn add_node_to_latest(&mut self, tree_id: i32, data: Attributes) -> Result<TreeNode> {
        let options = self.options;
        self.repo.atomic(|repo| {
            let latest = latest_of(repo, tree_id)?;
            append_node(repo, latest.id, &data, options)
        })
    }

    /// Append a directed edge `from -> to` to an existing version
    pub fn add_edge(&mut self, version_id: i32, from: i32, to: i32, data: Attributes) -> Result<TreeEdge> {
        let options = self.options;
        self.repo
            .atomic(|repo| append_edge(repo, version_id, from, to, &data, options))
    }

    /// Append an edge to the tree's latest version, resolved under the write lock
    pub fn add_edge_to_latest(&mut self, tree_id: i32, from: i32, to: i32, data: Attributes) -> Result<TreeEdge> {
        let options = self.options;
        self.repo.atomic(|repo| {
            let latest = latest_of(repo, tree_id)?;
            append_edge(repo, latest.id, from, to, &data, options)
        })
    }

    /// Nodes reached by one outgoing edge of `node_id`
    pub fn child_nodes(&mut self, node_id: i32) -> Result<Vec<TreeNode>> {
        self.get_node(node_id)?;
        let edges = self.repo.edges_by_incoming_node(node_id)?;
        self.nodes_for(edges.iter().map(|e| e.outgoing_node_id))
    }

    /// Nodes with an edge pointing at `node_id`
    pub fn parent_nodes(&mut self, node_id: i32) -> Result<Vec<TreeNode>> {
        self.get_node(node_id)?;
        let edges = self.repo.edges_by_outgoing_node(node_id)?;
        self.nodes_for(edges.iter().map(|e| e.incoming_node_id))
    }

    fn nodes_for(&mut self, ids: impl Iterator<Item = i32>) -> Result<Vec<TreeNode>> {
        let mut nodes = Vec::new();
        for id in ids {
            if let Some(node) = self.repo.get_node(id)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }
}

fn validate_tag(tag: &str) -> Result<()> {
    if tag.trim().is_empty() {
        return Err(KastleError::InvalidInput("tag must not be empty".to_string()));
    }
    if tag.trim() != tag {
        return Err(KastleError::InvalidInput(format!(
            "tag '{}' has leading or trailing whitespace",
            tag
        )));
    }
    Ok(())
}

fn latest_of<R: VersionStore>(repo: &mut R, tree_id: i32) -> Result<TreeVersion> {
    repo.get_tree(tree_id)?.ok_or(KastleError::TreeNotFound(tree_id))?;
    repo.latest_by_tree(tree_id)?.ok_or(KastleError::NoVersionsExist(tree_id))
}

fn log_clone(cloned: &ClonedVersion) {
    let version = cloned.version();
    info!(
        source = version.parent_version_id.unwrap_or_default(),
        version_id = version.id,
        tag = version.tag.as_deref().unwrap_or(""),
        nodes = cloned.snapshot.nodes.len(),
        edges = cloned.snapshot.edges.len(),
        "created version"
    );
}

fn append_node<R: GraphStore + VersionStore>(
    repo: &mut R,
    version_id: i32,
    data: &Attributes,
    options: EngineOptions,
) -> Result<TreeNode> {
    writable_version(repo, version_id, options)?;
    let now = timestamp_now();
    let node = repo.insert_node(NewTreeNode {
        version_id,
        data,
        created_at: &now,
    })?;
    debug!(version_id, node_id = node.id, "added node");
    Ok(node)
}

fn append_edge<R: GraphStore + VersionStore>(
    repo: &mut R,
    version_id: i32,
    from: i32,
    to: i32,
    data: &Attributes,
    options: EngineOptions,
) -> Result<TreeEdge> {
    writable_version(repo, version_id, options)?;

    for node_id in [from, to] {
        let node = repo
            .get_node(node_id)?
            .ok_or(KastleError::NodeNotFound(node_id))?;
        if options.strict_edges && node.version_id != version_id {
            return Err(KastleError::CrossVersionReference {
                node_id,
                node_version: node.version_id,
                version_id,
            });
        }
    }

    let now = timestamp_now();
    let edge = repo.insert_edge(NewTreeEdge {
        version_id,
        incoming_node_id: from,
        outgoing_node_id: to,
        data,
        created_at: &now,
    })?;
    debug!(version_id, edge_id = edge.id, from, to, "added edge");
    Ok(edge)
}

fn writable_version<R: VersionStore>(repo: &mut R, version_id: i32, options: EngineOptions) -> Result<TreeVersion> {
    let version = repo
        .get_version(version_id)?
        .ok_or(KastleError::VersionNotFound(version_id))?;
    if options.freeze_tagged && version.is_tagged() {
        return Err(KastleError::FrozenVersion(version_id));
    }
    Ok(version)
}

fn clone_into_new_version<R: GraphStore + VersionStore>(
    repo: &mut R,
    source_id: i32,
    new_tag: Option<&str>,
    description: &str,
) -> Result<ClonedVersion> {
    let source = repo
        .get_version(source_id)?
        .ok_or(KastleError::VersionNotFound(source_id))?;

    if let Some(tag) = new_tag {
        if repo.get_by_tag(source.tree_id, tag)?.is_some() {
            return Err(KastleError::DuplicateTag {
                tree_id: source.tree_id,
                tag: tag.to_string(),
            });
        }
    }

    // New version must sort after its parent and after the current latest
    let floor = match repo.latest_by_tree(source.tree_id)? {
        Some(latest) if latest.created_at > source.created_at => latest.created_at,
        _ => source.created_at.clone(),
    };
    let created_at = timestamp_after(Some(&floor));

    let version = repo.insert_version(NewTreeVersion {
        tree_id: source.tree_id,
        parent_version_id: Some(source.id),
        tag: new_tag,
        description: Some(description),
        created_at: &created_at,
        tag_created_at: new_tag.map(|_| created_at.as_str()),
    })?;

    let source_nodes = repo.nodes_by_version(source.id)?;
    debug!(source = source.id, target = version.id, count = source_nodes.len(), "cloning nodes");

    let mut node_map = BTreeMap::new();
    let mut nodes = Vec::with_capacity(source_nodes.len());
    for node in &source_nodes {
        let copy = repo.insert_node(NewTreeNode {
            version_id: version.id,
            data: &node.data,
            created_at: &created_at,
        })?;
        node_map.insert(node.id, copy.id);
        nodes.push(copy);
    }

    let source_edges = repo.edges_by_version(source.id)?;
    debug!(source = source.id, target = version.id, count = source_edges.len(), "cloning edges");

    let mut edges = Vec::with_capacity(source_edges.len());
    for edge in &source_edges {
        let incoming = remap(&node_map, edge, edge.incoming_node_id)?;
        let outgoing = remap(&node_map, edge, edge.outgoing_node_id)?;
        edges.push(repo.insert_edge(NewTreeEdge {
            version_id: version.id,
            incoming_node_id: incoming,
            outgoing_node_id: outgoing,
            data: &edge.data,
            created_at: &created_at,
        })?);
    }

    Ok(ClonedVersion {
        snapshot: VersionSnapshot { version, nodes, edges },
        node_map,
    })
}

fn remap(node_map: &BTreeMap<i32, i32>, edge: &TreeEdge, node_id: i32) -> Result<i32> {
    node_map.get(&node_id).copied().ok_or_else(|| {
        warn!(edge_id = edge.id, node_id, "edge endpoint missing from cloned version");
        KastleError::DanglingReference {
            edge_id: edge.id,
            node_id,
        }
    })
}
