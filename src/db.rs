//! SQLite database with Diesel ORM
//!
//! Stores trees, their versions and each version's nodes and edges.
//! `SqliteConnection` implements the repository traits, so the versioning
//! engine runs directly on a pooled connection.

use crate::attrs::Attributes;
use crate::config::Config;
use crate::engine::{EngineOptions, VersioningEngine};
use crate::error::{KastleError, Result};
use crate::schema::*;
use crate::store::{
    GraphStore, NewTree, NewTreeEdge, NewTreeNode, NewTreeVersion, Repository, Tree, TreeEdge,
    TreeNode, TreeVersion, VersionSnapshot, VersionStore,
};
use crate::traversal::GraphTraversal;
use crate::tree::VersionedTree;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{Builder, ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Walk up directory tree to find .kastle folder (like git finds .git)
/// Can be overridden with KASTLE_DB_PATH env var or `database.path` in config
fn get_db_path(config: &Config) -> PathBuf {
    // Check env var first - always takes priority
    if let Ok(path) = std::env::var("KASTLE_DB_PATH") {
        return PathBuf::from(path);
    }

    if let Some(path) = &config.database.path {
        return path.clone();
    }

    // Walk up directory tree to find .kastle folder
    if let Ok(current_dir) = std::env::current_dir() {
        let mut dir = current_dir.as_path();
        loop {
            let kastle_dir = dir.join(".kastle");
            if kastle_dir.exists() && kastle_dir.is_dir() {
                return kastle_dir.join("kastle.db");
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break, // Reached filesystem root
            }
        }
    }

    // No .kastle found - default to current directory
    // (kastle init will create it here)
    PathBuf::from(".kastle/kastle.db")
}

/// Current schema version for kastle
pub const CURRENT_SCHEMA: StoreSchema = StoreSchema {
    major: 1,
    minor: 0,
    patch: 0,
    name: "versioned-tree",
    features: &["trees", "tree_versions", "tree_nodes", "tree_edges", "scoped_tags"],
};

/// Describes the version and capabilities of the schema
#[derive(Debug, Clone)]
pub struct StoreSchema {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub name: &'static str,
    pub features: &'static [&'static str],
}

impl StoreSchema {
    pub fn version_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

}

impl std::fmt::Display for StoreSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{} ({})", self.version_string(), self.name)
    }
}

// ============================================================================
// Diesel Models
// ============================================================================

/// Insertable schema version
#[derive(Insertable)]
#[diesel(table_name = schema_versions)]
struct NewSchemaVersion<'a> {
    version: &'a str,
    name: &'a str,
    features: &'a str,
    introduced_at: &'a str,
}

/// Queryable schema version
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = schema_versions)]
pub struct StoredSchema {
    pub id: i32,
    pub version: String,
    pub name: String,
    pub features: String,
    pub introduced_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = trees)]
struct NewTreeRow<'a> {
    name: &'a str,
    created_at: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = trees)]
struct TreeRow {
    id: i32,
    name: String,
    created_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = tree_versions)]
struct NewVersionRow<'a> {
    tree_id: i32,
    parent_version_id: Option<i32>,
    tag: Option<&'a str>,
    description: Option<&'a str>,
    created_at: &'a str,
    tag_created_at: Option<&'a str>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = tree_versions)]
struct VersionRow {
    id: i32,
    tree_id: i32,
    parent_version_id: Option<i32>,
    tag: Option<String>,
    description: Option<String>,
    created_at: String,
    tag_created_at: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = tree_nodes)]
struct NewNodeRow<'a> {
    version_id: i32,
    data_json: &'a str,
    created_at: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = tree_nodes)]
struct NodeRow {
    id: i32,
    version_id: i32,
    data_json: String,
    created_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = tree_edges)]
struct NewEdgeRow<'a> {
    version_id: i32,
    incoming_node_id: i32,
    outgoing_node_id: i32,
    data_json: &'a str,
    created_at: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = tree_edges)]
struct EdgeRow {
    id: i32,
    version_id: i32,
    incoming_node_id: i32,
    outgoing_node_id: i32,
    data_json: String,
    created_at: String,
}

impl From<TreeRow> for Tree {
    fn from(row: TreeRow) -> Self {
        Tree {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

impl From<VersionRow> for TreeVersion {
    fn from(row: VersionRow) -> Self {
        TreeVersion {
            id: row.id,
            tree_id: row.tree_id,
            parent_version_id: row.parent_version_id,
            tag: row.tag,
            description: row.description,
            created_at: row.created_at,
            tag_created_at: row.tag_created_at,
        }
    }
}

/// Stored attribute column back into an attribute bag
fn parse_stored(data_json: &str) -> Result<Attributes> {
    let value: serde_json::Value = serde_json::from_str(data_json)?;
    Attributes::try_from(value)
}

impl TryFrom<NodeRow> for TreeNode {
    type Error = KastleError;

    fn try_from(row: NodeRow) -> Result<Self> {
        Ok(TreeNode {
            id: row.id,
            version_id: row.version_id,
            data: parse_stored(&row.data_json)?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<EdgeRow> for TreeEdge {
    type Error = KastleError;

    fn try_from(row: EdgeRow) -> Result<Self> {
        Ok(TreeEdge {
            id: row.id,
            version_id: row.version_id,
            incoming_node_id: row.incoming_node_id,
            outgoing_node_id: row.outgoing_node_id,
            data: parse_stored(&row.data_json)?,
            created_at: row.created_at,
        })
    }
}

fn nodes_from_rows(rows: Vec<NodeRow>) -> Result<Vec<TreeNode>> {
    rows.into_iter().map(TreeNode::try_from).collect()
}

fn edges_from_rows(rows: Vec<EdgeRow>) -> Result<Vec<TreeEdge>> {
    rows.into_iter().map(TreeEdge::try_from).collect()
}

fn last_insert_id(conn: &mut SqliteConnection) -> Result<i32> {
    let id: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>("last_insert_rowid()"))
        .first(conn)?;
    Ok(id)
}

// ============================================================================
// Repository implementation
// ============================================================================

impl GraphStore for SqliteConnection {
    fn get_node(&mut self, id: i32) -> Result<Option<TreeNode>> {
        let row = tree_nodes::table
            .filter(tree_nodes::id.eq(id))
            .first::<NodeRow>(self)
            .optional()?;
        row.map(TreeNode::try_from).transpose()
    }

    fn nodes_by_version(&mut self, version_id: i32) -> Result<Vec<TreeNode>> {
        let rows = tree_nodes::table
            .filter(tree_nodes::version_id.eq(version_id))
            .order(tree_nodes::id.asc())
            .load::<NodeRow>(self)?;
        nodes_from_rows(rows)
    }

    fn edges_by_version(&mut self, version_id: i32) -> Result<Vec<TreeEdge>> {
        let rows = tree_edges::table
            .filter(tree_edges::version_id.eq(version_id))
            .order(tree_edges::id.asc())
            .load::<EdgeRow>(self)?;
        edges_from_rows(rows)
    }

    fn edges_by_incoming_node(&mut self, node_id: i32) -> Result<Vec<TreeEdge>> {
        let rows = tree_edges::table
            .filter(tree_edges::incoming_node_id.eq(node_id))
            .order(tree_edges::id.asc())
            .load::<EdgeRow>(self)?;
        edges_from_rows(rows)
    }

    fn edges_by_outgoing_node(&mut self, node_id: i32) -> Result<Vec<TreeEdge>> {
        let rows = tree_edges::table
            .filter(tree_edges::outgoing_node_id.eq(node_id))
            .order(tree_edges::id.asc())
            .load::<EdgeRow>(self)?;
        edges_from_rows(rows)
    }

    fn insert_node(&mut self, node: NewTreeNode<'_>) -> Result<TreeNode> {
        let data_json = node.data.to_json();
        diesel::insert_into(tree_nodes::table)
            .values(&NewNodeRow {
                version_id: node.version_id,
                data_json: &data_json,
                created_at: node.created_at,
            })
            .execute(self)?;

        Ok(TreeNode {
            id: last_insert_id(self)?,
            version_id: node.version_id,
            data: node.data.clone(),
            created_at: node.created_at.to_string(),
        })
    }

    fn insert_edge(&mut self, edge: NewTreeEdge<'_>) -> Result<TreeEdge> {
        let data_json = edge.data.to_json();
        diesel::insert_into(tree_edges::table)
            .values(&NewEdgeRow {
                version_id: edge.version_id,
                incoming_node_id: edge.incoming_node_id,
                outgoing_node_id: edge.outgoing_node_id,
                data_json: &data_json,
                created_at: edge.created_at,
            })
            .execute(self)?;

        Ok(TreeEdge {
            id: last_insert_id(self)?,
            version_id: edge.version_id,
            incoming_node_id: edge.incoming_node_id,
            outgoing_node_id: edge.outgoing_node_id,
            data: edge.data.clone(),
            created_at: edge.created_at.to_string(),
        })
    }
}

impl VersionStore for SqliteConnection {
    fn insert_tree(&mut self, tree: NewTree<'_>) -> Result<Tree> {
        diesel::insert_into(trees::table)
            .values(&NewTreeRow {
                name: tree.name,
                created_at: tree.created_at,
            })
            .execute(self)?;

        Ok(Tree {
            id: last_insert_id(self)?,
            name: tree.name.to_string(),
            created_at: tree.created_at.to_string(),
        })
    }

    fn get_tree(&mut self, id: i32) -> Result<Option<Tree>> {
        let row = trees::table
            .filter(trees::id.eq(id))
            .first::<TreeRow>(self)
            .optional()?;
        Ok(row.map(Tree::from))
    }

    fn trees_by_name(&mut self, name: &str) -> Result<Vec<Tree>> {
        let rows = trees::table
            .filter(trees::name.eq(name))
            .order(trees::id.asc())
            .load::<TreeRow>(self)?;
        Ok(rows.into_iter().map(Tree::from).collect())
    }

    fn list_trees(&mut self) -> Result<Vec<Tree>> {
        let rows = trees::table.order(trees::id.asc()).load::<TreeRow>(self)?;
        Ok(rows.into_iter().map(Tree::from).collect())
    }

    fn delete_tree(&mut self, id: i32) -> Result<bool> {
        let version_ids: Vec<i32> = tree_versions::table
            .filter(tree_versions::tree_id.eq(id))
            .select(tree_versions::id)
            .load(self)?;

        diesel::delete(tree_edges::table.filter(tree_edges::version_id.eq_any(version_ids.clone())))
            .execute(self)?;
        diesel::delete(tree_nodes::table.filter(tree_nodes::version_id.eq_any(version_ids)))
            .execute(self)?;
        diesel::delete(tree_versions::table.filter(tree_versions::tree_id.eq(id))).execute(self)?;
        let removed = diesel::delete(trees::table.filter(trees::id.eq(id))).execute(self)?;

        Ok(removed > 0)
    }

    fn get_version(&mut self, id: i32) -> Result<Option<TreeVersion>> {
        let row = tree_versions::table
            .filter(tree_versions::id.eq(id))
            .first::<VersionRow>(self)
            .optional()?;
        Ok(row.map(TreeVersion::from))
    }

    fn latest_by_tree(&mut self, tree_id: i32) -> Result<Option<TreeVersion>> {
        let row = tree_versions::table
            .filter(tree_versions::tree_id.eq(tree_id))
            .order((tree_versions::created_at.desc(), tree_versions::id.desc()))
            .first::<VersionRow>(self)
            .optional()?;
        Ok(row.map(TreeVersion::from))
    }

    fn get_by_tag(&mut self, tree_id: i32, tag: &str) -> Result<Option<TreeVersion>> {
        let row = tree_versions::table
            .filter(tree_versions::tree_id.eq(tree_id))
            .filter(tree_versions::tag.eq(tag))
            .first::<VersionRow>(self)
            .optional()?;
        Ok(row.map(TreeVersion::from))
    }

    fn versions_by_tree(&mut self, tree_id: i32) -> Result<Vec<TreeVersion>> {
        let rows = tree_versions::table
            .filter(tree_versions::tree_id.eq(tree_id))
            .order((tree_versions::created_at.asc(), tree_versions::id.asc()))
            .load::<VersionRow>(self)?;
        Ok(rows.into_iter().map(TreeVersion::from).collect())
    }

    fn insert_version(&mut self, version: NewTreeVersion<'_>) -> Result<TreeVersion> {
        diesel::insert_into(tree_versions::table)
            .values(&NewVersionRow {
                tree_id: version.tree_id,
                parent_version_id: version.parent_version_id,
                tag: version.tag,
                description: version.description,
                created_at: version.created_at,
                tag_created_at: version.tag_created_at,
            })
            .execute(self)?;

        Ok(TreeVersion {
            id: last_insert_id(self)?,
            tree_id: version.tree_id,
            parent_version_id: version.parent_version_id,
            tag: version.tag.map(str::to_string),
            description: version.description.map(str::to_string),
            created_at: version.created_at.to_string(),
            tag_created_at: version.tag_created_at.map(str::to_string),
        })
    }
}

impl Repository for SqliteConnection {
    /// `BEGIN IMMEDIATE` takes the write lock up front, so concurrent writers
    /// queue on the busy timeout instead of failing mid-clone. Not reentrant.
    fn atomic<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.immediate_transaction(f)
    }
}

// ============================================================================
// Database Connection
// ============================================================================

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Per-connection pragmas applied when the pool hands out a connection
#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Database connection wrapper with connection pool
pub struct Database {
    pool: DbPool,
    options: EngineOptions,
}

impl Database {
    /// Get the database path that will be used
    pub fn db_path() -> PathBuf {
        get_db_path(&Config::load())
    }

    /// Open database at default path (respects KASTLE_DB_PATH env var)
    pub fn open() -> Result<Self> {
        Self::open_with_config(&Config::load())
    }

    /// Open the database named by `config`, with its engine options
    pub fn open_with_config(config: &Config) -> Result<Self> {
        let path = get_db_path(config);
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| KastleError::Connection(format!("{}: {}", parent.display(), e)))?;
            }
        }
        Ok(Self::open_at(&path)?.with_options(config.engine_options()))
    }

    /// Open database at specified path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let builder = Pool::builder().max_size(5);
        Self::build(&path_str, builder)
    }

    /// Private in-memory database. Single connection that is never retired:
    /// every new connection to `:memory:` is a separate, empty database.
    pub fn open_in_memory() -> Result<Self> {
        let builder = Pool::builder()
            .max_size(1)
            .min_idle(Some(1))
            .max_lifetime(None)
            .idle_timeout(None);
        Self::build(":memory:", builder)
    }

    fn build(url: &str, builder: Builder<ConnectionManager<SqliteConnection>>) -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(url);
        let pool = builder
            .connection_customizer(Box::new(ConnectionPragmas { busy_timeout_ms: 5_000 }))
            .build(manager)?;

        let db = Self {
            pool,
            options: EngineOptions::default(),
        };
        db.init_schema()?;
        debug!(url, "database ready");
        Ok(db)
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    fn get_conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    fn init_schema(&self) -> Result<()> {
        let mut conn = self.get_conn()?;

        // Run raw SQL to create tables if they don't exist
        conn.batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS schema_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                version TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                features TEXT NOT NULL,
                introduced_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS trees (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tree_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                tree_id INTEGER NOT NULL,
                parent_version_id INTEGER,
                tag TEXT,
                description TEXT,
                created_at TEXT NOT NULL,
                tag_created_at TEXT,
                FOREIGN KEY (tree_id) REFERENCES trees(id),
                FOREIGN KEY (parent_version_id) REFERENCES tree_versions(id)
            );

            CREATE TABLE IF NOT EXISTS tree_nodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                version_id INTEGER NOT NULL,
                data_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (version_id) REFERENCES tree_versions(id)
            );

            CREATE TABLE IF NOT EXISTS tree_edges (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                version_id INTEGER NOT NULL,
                incoming_node_id INTEGER NOT NULL,
                outgoing_node_id INTEGER NOT NULL,
                data_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (version_id) REFERENCES tree_versions(id),
                FOREIGN KEY (incoming_node_id) REFERENCES tree_nodes(id),
                FOREIGN KEY (outgoing_node_id) REFERENCES tree_nodes(id)
            );

            CREATE INDEX IF NOT EXISTS idx_versions_tree_created ON tree_versions(tree_id, created_at);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_versions_tree_tag ON tree_versions(tree_id, tag) WHERE tag IS NOT NULL;
            CREATE INDEX IF NOT EXISTS idx_trees_name ON trees(name);
            CREATE INDEX IF NOT EXISTS idx_nodes_version ON tree_nodes(version_id);
            CREATE INDEX IF NOT EXISTS idx_edges_version ON tree_edges(version_id);
            CREATE INDEX IF NOT EXISTS idx_edges_incoming ON tree_edges(incoming_node_id);
            CREATE INDEX IF NOT EXISTS idx_edges_outgoing ON tree_edges(outgoing_node_id);
            "#,
        )?;

        // Register current schema
        self.register_schema(&mut *conn, &CURRENT_SCHEMA)
    }

    fn register_schema(&self, conn: &mut SqliteConnection, schema: &StoreSchema) -> Result<()> {
        let now = crate::store::timestamp_now();
        let features_json = serde_json::to_string(&schema.features)?;

        let new_schema = NewSchemaVersion {
            version: &schema.version_string(),
            name: schema.name,
            features: &features_json,
            introduced_at: &now,
        };

        diesel::insert_or_ignore_into(schema_versions::table)
            .values(&new_schema)
            .execute(conn)?;

        Ok(())
    }

    /// Schema versions recorded in this database
    pub fn stored_schemas(&self) -> Result<Vec<StoredSchema>> {
        let mut conn = self.get_conn()?;
        let schemas = schema_versions::table
            .order(schema_versions::id.asc())
            .load::<StoredSchema>(&mut conn)?;
        Ok(schemas)
    }

    // ========================================================================
    // Repository access
    // ========================================================================

    /// Run `f` against one pooled connection
    pub fn with_repo<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        let mut conn = self.get_conn()?;
        f(&mut *conn)
    }

    /// Run `f` with a versioning engine using this database's options
    pub fn with_engine<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut VersioningEngine<'_, SqliteConnection>) -> Result<T>,
    {
        let options = self.options;
        self.with_repo(|conn| f(&mut VersioningEngine::with_options(conn, options)))
    }

    /// Run `f` on an existing tree
    pub fn with_tree<T, F>(&self, tree_id: i32, f: F) -> Result<T>
    where
        F: FnOnce(&mut VersionedTree<'_, SqliteConnection>) -> Result<T>,
    {
        let options = self.options;
        self.with_repo(|conn| {
            let mut tree = VersionedTree::open(VersioningEngine::with_options(conn, options), tree_id)?;
            f(&mut tree)
        })
    }

    // ========================================================================
    // Tree Operations
    // ========================================================================

    /// Create a tree and its root version
    pub fn create_tree(&self, name: &str, root_tag: Option<&str>) -> Result<(Tree, TreeVersion)> {
        self.with_engine(|engine| engine.create_tree(name, root_tag))
    }

    pub fn open_tree(&self, tree_id: i32) -> Result<Tree> {
        self.with_engine(|engine| engine.get_tree(tree_id))
    }

    pub fn list_trees(&self) -> Result<Vec<Tree>> {
        self.with_repo(|conn| conn.list_trees())
    }

    /// Look a tree up by numeric id or by name
    pub fn find_tree(&self, name_or_id: &str) -> Result<Tree> {
        let id = name_or_id.parse::<i32>().ok();
        if let Some(id) = id {
            match self.open_tree(id) {
                Err(KastleError::TreeNotFound(_)) => {}
                other => return other,
            }
        }
        let mut matches = self.with_repo(|conn| conn.trees_by_name(name_or_id))?;
        match matches.len() {
            0 => Err(match id {
                Some(id) => KastleError::TreeNotFound(id),
                None => KastleError::UnknownTree(name_or_id.to_string()),
            }),
            1 => Ok(matches.remove(0)),
            _ => Err(KastleError::AmbiguousTree(name_or_id.to_string())),
        }
    }

    /// Delete a tree with all versions, nodes and edges
    pub fn delete_tree(&self, tree_id: i32) -> Result<bool> {
        self.with_repo(|conn| conn.atomic(|tx| tx.delete_tree(tree_id)))
    }

    /// A version with all of its nodes and edges
    pub fn snapshot(&self, version_id: i32) -> Result<VersionSnapshot> {
        self.with_engine(|engine| engine.snapshot(version_id))
    }

    /// Traversal index over one version
    pub fn traversal(&self, version_id: i32) -> Result<GraphTraversal> {
        self.with_engine(|engine| {
            engine.get_version(version_id)?;
            GraphTraversal::load(engine.repo(), version_id)
        })
    }
}
