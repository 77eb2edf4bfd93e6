//! Kastle - versioned directed graphs
//!
//! A tree is a named history of versions. Each version owns a directed
//! graph of attributed nodes and edges. Tagging, branching and restoring all
//! clone a whole version into a new one, so tagged versions stay untouched
//! while work continues on the latest version.
//!
//! # Layers
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `store` | Records and the `GraphStore`/`VersionStore` repository traits |
//! | `memory` | In-memory repository |
//! | `db` | SQLite repository (diesel + r2d2) |
//! | `engine` | Version cloning, tags, node/edge mutation |
//! | `traversal` | Depth-first walk and path finding within one version |
//! | `tree` | Tag / branch / restore facade on a named tree |
//! | `export` | DOT rendering of a version |
//!
//! # Quick Start
//!
//! ```no_run
//! use kastle::{Attributes, MemoryStore, VersionedTree, VersioningEngine};
//!
//! let mut store = MemoryStore::new();
//! let engine = VersioningEngine::new(&mut store);
//! let mut tree = VersionedTree::create(engine, "Root Configuration", Some("v1.0")).unwrap();
//!
//! let a = tree.add_node(Attributes::new().with("setting", "value1")).unwrap();
//! let b = tree.add_node(Attributes::new().with("setting", "value2")).unwrap();
//! tree.add_edge(a.id, b.id, Attributes::new().with("type", "dependency")).unwrap();
//!
//! tree.create_tag("release-v1.0", "First stable release").unwrap();
//! let restored = tree.restore_from_tag("release-v1.0").unwrap();
//! println!("restored into version {}", restored.version().id);
//! ```

pub mod attrs;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod export;
pub mod init;
pub mod memory;
pub mod schema;
pub mod store;
pub mod traversal;
pub mod tree;

pub use attrs::Attributes;
pub use config::Config;
pub use db::{Database, StoreSchema, StoredSchema, CURRENT_SCHEMA};
pub use engine::{ClonedVersion, EngineOptions, VersioningEngine};
pub use error::{KastleError, Result};
pub use export::{filter_snapshot_from_roots, version_to_dot, DotConfig};
pub use memory::MemoryStore;
pub use store::{
    GraphStore, Repository, Tree, TreeEdge, TreeNode, TreeVersion, VersionSnapshot, VersionStore,
};
pub use traversal::{FoundPath, GraphTraversal};
pub use tree::VersionedTree;
