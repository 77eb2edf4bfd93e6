//! Error types for kastle operations.

use thiserror::Error;

/// Result type alias for kastle operations.
pub type Result<T> = std::result::Result<T, KastleError>;

/// Main error type for the versioning engine and its stores.
#[derive(Error, Debug)]
pub enum KastleError {
    /// No tree with this id.
    #[error("Tree {0} not found")]
    TreeNotFound(i32),

    /// No version with this id.
    #[error("Version {0} not found")]
    VersionNotFound(i32),

    /// No node with this id.
    #[error("Node {0} not found")]
    NodeNotFound(i32),

    /// No version in the tree carries this tag.
    #[error("No version with tag '{tag}' found in tree {tree_id}")]
    TagNotFound { tree_id: i32, tag: String },

    /// Tag or latest-version query on a tree without versions.
    #[error("No versions exist in tree {0}")]
    NoVersionsExist(i32),

    /// An edge points at a node that was not part of the cloned version.
    /// This is an internal consistency failure, never a user error.
    #[error("Edge {edge_id} references node {node_id} outside its version")]
    DanglingReference { edge_id: i32, node_id: i32 },

    /// An edge endpoint belongs to a different version than the edge.
    #[error("Node {node_id} belongs to version {node_version}, not version {version_id}")]
    CrossVersionReference {
        node_id: i32,
        node_version: i32,
        version_id: i32,
    },

    /// The tag is already used by another version of the same tree.
    #[error("Tag '{tag}' already exists in tree {tree_id}")]
    DuplicateTag { tree_id: i32, tag: String },

    /// The version is tagged and no longer accepts new nodes or edges.
    #[error("Version {0} is tagged and cannot be modified")]
    FrozenVersion(i32),

    /// No tree has this name.
    #[error("No tree named '{0}'")]
    UnknownTree(String),

    /// A tree name matched more than one tree.
    #[error("Tree name '{0}' is ambiguous; use the tree id")]
    AmbiguousTree(String),

    /// Malformed input at the API boundary (e.g. attribute data).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KastleError {
    /// True for every "something is absent" error.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            KastleError::TreeNotFound(_)
                | KastleError::UnknownTree(_)
                | KastleError::VersionNotFound(_)
                | KastleError::NodeNotFound(_)
                | KastleError::TagNotFound { .. }
                | KastleError::NoVersionsExist(_)
        )
    }

    /// True for internal invariant violations that indicate a defect.
    pub fn is_internal(&self) -> bool {
        matches!(self, KastleError::DanglingReference { .. })
    }
}
