use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use kastle::{
    version_to_dot, Attributes, Config, Database, DotConfig, KastleError, Repository, TreeNode,
    TreeVersion, VersionedTree, VersioningEngine,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "kastle")]
#[command(author, version, about = "Versioned directed graphs - tag, branch and restore node/edge trees")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize kastle in the current directory
    Init,

    /// Create, list and delete trees
    Tree {
        #[command(subcommand)]
        action: TreeCommand,
    },

    /// List the versions of a tree, oldest first
    Versions {
        /// Tree name or id
        tree: String,
    },

    /// Tag the latest version (clones it into a new tagged version)
    Tag {
        /// Tree name or id
        tree: String,
        /// Tag name, unique within the tree
        tag: String,
        /// Version description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Start a new untagged version from a tagged one
    Branch {
        /// Tree name or id
        tree: String,
        /// Tag to branch from
        tag: String,
    },

    /// Restore a tagged version as the new latest version
    Restore {
        /// Tree name or id
        tree: String,
        /// Tag to restore
        tag: String,
    },

    /// Add nodes
    Node {
        #[command(subcommand)]
        action: NodeCommand,
    },

    /// Add edges
    Edge {
        #[command(subcommand)]
        action: EdgeCommand,
    },

    /// Direct children (or parents) of a node
    Children {
        /// Node id
        node: i32,
        /// Show parents instead of children
        #[arg(long)]
        parents: bool,
    },

    /// Depth-first walk from a node
    Walk {
        /// Tree name or id
        tree: String,
        /// Start node id
        start: i32,
        #[command(flatten)]
        at: VersionSelector,
    },

    /// Find a path between two nodes
    Path {
        /// Tree name or id
        tree: String,
        /// Start node id
        from: i32,
        /// End node id
        to: i32,
        #[command(flatten)]
        at: VersionSelector,
    },

    /// Show a version's nodes and edges
    Show {
        /// Tree name or id
        tree: String,
        #[command(flatten)]
        at: VersionSelector,
        /// Output Graphviz DOT
        #[arg(long, conflicts_with = "json")]
        dot: bool,
        /// Output JSON
        #[arg(long)]
        json: bool,
        /// Only nodes reachable from these node ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        roots: Vec<i32>,
        /// Attribute used as the node label in DOT output
        #[arg(long)]
        label: Option<String>,
    },

    /// Build the "Root Configuration" sample tree
    Demo,

    /// Generate shell completions
    Completion {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum TreeCommand {
    /// Create a tree with its root version
    Create {
        name: String,
        /// Tag for the root version
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// List all trees
    List,
    /// Delete a tree with all of its versions
    Delete {
        /// Tree name or id
        tree: String,
    },
}

#[derive(Subcommand, Debug)]
enum NodeCommand {
    /// Add a node
    Add {
        /// Tree name or id
        tree: String,
        /// Attribute data as a JSON object
        #[arg(default_value = "{}")]
        data: String,
        #[command(flatten)]
        at: VersionSelector,
    },
}

#[derive(Subcommand, Debug)]
enum EdgeCommand {
    /// Add an edge
    Add {
        /// Tree name or id
        tree: String,
        /// Source node id
        from: i32,
        /// Target node id
        to: i32,
        /// Attribute data as a JSON object
        #[arg(long, default_value = "{}")]
        data: String,
        #[command(flatten)]
        at: VersionSelector,
    },
}

/// Picks a version of the tree; the latest one by default
#[derive(Args, Debug, Clone)]
struct VersionSelector {
    /// Use the version carrying this tag
    #[arg(long, conflicts_with = "version_id")]
    tag: Option<String>,
    /// Use this version id
    #[arg(long = "version-id")]
    version_id: Option<i32>,
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load();
    init_logging(&config);

    let result = match cli.command {
        Command::Init => kastle::init::init_project(),
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "kastle", &mut std::io::stdout());
            Ok(())
        }
        command => run(command, &config).map_err(|e| e.to_string()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

/// RUST_LOG wins over the configured filter; logs go to stderr
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(command: Command, config: &Config) -> kastle::Result<()> {
    let db = Database::open_with_config(config)?;

    match command {
        Command::Tree { action } => match action {
            TreeCommand::Create { name, tag } => {
                let (tree, root) = db.create_tree(&name, tag.as_deref())?;
                println!(
                    "{} tree {} '{}' (root version {})",
                    "Created".green(),
                    tree.id,
                    tree.name,
                    root.label()
                );
            }
            TreeCommand::List => {
                let trees = db.list_trees()?;
                if trees.is_empty() {
                    println!("No trees. Create one with {}", "kastle tree create <name>".cyan());
                }
                for tree in trees {
                    println!("{:>4}  {}  {}", tree.id, tree.name.bold(), tree.created_at.dimmed());
                }
            }
            TreeCommand::Delete { tree } => {
                let tree = db.find_tree(&tree)?;
                if !db.delete_tree(tree.id)? {
                    return Err(KastleError::TreeNotFound(tree.id));
                }
                println!("{} tree {} '{}'", "Deleted".red(), tree.id, tree.name);
            }
        },

        Command::Versions { tree } => {
            let tree = db.find_tree(&tree)?;
            let versions = db.with_tree(tree.id, |t| t.versions())?;
            let latest_id = versions.last().map(|v| v.id);
            println!("{} ({} versions)", tree.name.bold(), versions.len());
            for version in &versions {
                print_version(version, Some(version.id) == latest_id);
            }
        }

        Command::Tag { tree, tag, description } => {
            let tree = db.find_tree(&tree)?;
            let cloned = db.with_tree(tree.id, |t| t.create_tag(&tag, &description))?;
            println!(
                "{} version {} as '{}' ({} nodes, {} edges)",
                "Tagged".green(),
                cloned.version().id,
                tag,
                cloned.snapshot.nodes.len(),
                cloned.snapshot.edges.len()
            );
        }

        Command::Branch { tree, tag } => {
            let tree = db.find_tree(&tree)?;
            let cloned = db.with_tree(tree.id, |t| t.branch_from_tag(&tag))?;
            println!("{} version {} from tag '{}'", "Branched".green(), cloned.version().id, tag);
        }

        Command::Restore { tree, tag } => {
            let tree = db.find_tree(&tree)?;
            let cloned = db.with_tree(tree.id, |t| t.restore_from_tag(&tag))?;
            println!("{} tag '{}' as version {}", "Restored".green(), tag, cloned.version().id);
        }

        Command::Node { action: NodeCommand::Add { tree, data, at } } => {
            let tree = db.find_tree(&tree)?;
            let data = Attributes::parse(&data)?;
            let node = db.with_engine(|engine| match explicit_version(engine, tree.id, &at)? {
                Some(version) => engine.add_node(version.id, data),
                None => engine.add_node_to_latest(tree.id, data),
            })?;
            println!("{} node {} in version {}", "Created".green(), node.id, node.version_id);
        }

        Command::Edge { action: EdgeCommand::Add { tree, from, to, data, at } } => {
            let tree = db.find_tree(&tree)?;
            let data = Attributes::parse(&data)?;
            let edge = db.with_engine(|engine| match explicit_version(engine, tree.id, &at)? {
                Some(version) => engine.add_edge(version.id, from, to, data),
                None => engine.add_edge_to_latest(tree.id, from, to, data),
            })?;
            println!(
                "{} edge {}: {} -> {}",
                "Created".green(),
                edge.id,
                edge.incoming_node_id,
                edge.outgoing_node_id
            );
        }

        Command::Children { node, parents } => {
            let nodes = db.with_engine(|engine| {
                if parents {
                    engine.parent_nodes(node)
                } else {
                    engine.child_nodes(node)
                }
            })?;
            for n in &nodes {
                print_node(n);
            }
        }

        Command::Walk { tree, start, at } => {
            let tree = db.find_tree(&tree)?;
            let version = db.with_engine(|engine| select_version(engine, tree.id, &at))?;
            let traversal = db.traversal(version.id)?;
            let visited = traversal.depth_first_walk(start, print_node)?;
            println!("Visited {} nodes in version {}", visited, version.label());
        }

        Command::Path { tree, from, to, at } => {
            let tree = db.find_tree(&tree)?;
            let version = db.with_engine(|engine| select_version(engine, tree.id, &at))?;
            let path = db.traversal(version.id)?.find_path(from, to)?;
            if path.found {
                let hops: Vec<String> = path.nodes.iter().map(|id| id.to_string()).collect();
                println!("{} {}", "Path:".green(), hops.join(" -> "));
            } else {
                println!("No path from {} to {}", from, to);
            }
        }

        Command::Show { tree, at, dot, json, roots, label } => {
            let tree = db.find_tree(&tree)?;
            let version = db.with_engine(|engine| select_version(engine, tree.id, &at))?;
            let mut snapshot = db.snapshot(version.id)?;
            if !roots.is_empty() {
                snapshot = kastle::filter_snapshot_from_roots(&snapshot, &roots);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else if dot {
                let config = DotConfig {
                    title: Some(format!("{} @ {}", tree.name, version.label())),
                    node_label_key: label,
                    ..DotConfig::default()
                };
                print!("{}", version_to_dot(&snapshot, &config));
            } else {
                print_version(&snapshot.version, false);
                println!("\n{} ({})", "Nodes".bold(), snapshot.nodes.len());
                for node in &snapshot.nodes {
                    print_node(node);
                }
                println!("\n{} ({})", "Edges".bold(), snapshot.edges.len());
                for edge in &snapshot.edges {
                    println!(
                        "{:>6}  {} -> {}  {}",
                        edge.id, edge.incoming_node_id, edge.outgoing_node_id, edge.data
                    );
                }
            }
        }

        Command::Demo => run_demo(&db)?,

        Command::Init | Command::Completion { .. } => {}
    }

    Ok(())
}

/// Resolve `--tag` / `--version-id`, falling back to the latest version
fn select_version<R: Repository>(
    engine: &mut VersioningEngine<'_, R>,
    tree_id: i32,
    at: &VersionSelector,
) -> kastle::Result<TreeVersion> {
    match explicit_version(engine, tree_id, at)? {
        Some(version) => Ok(version),
        None => engine.latest_version(tree_id),
    }
}

/// The version named by `--tag` / `--version-id`, if either was given
fn explicit_version<R: Repository>(
    engine: &mut VersioningEngine<'_, R>,
    tree_id: i32,
    at: &VersionSelector,
) -> kastle::Result<Option<TreeVersion>> {
    if let Some(tag) = &at.tag {
        return engine.resolve_tag(tree_id, tag).map(Some);
    }
    if let Some(version_id) = at.version_id {
        let version = engine.get_version(version_id)?;
        if version.tree_id != tree_id {
            return Err(KastleError::InvalidInput(format!(
                "Version {} does not belong to tree {}",
                version_id, tree_id
            )));
        }
        return Ok(Some(version));
    }
    Ok(None)
}

fn print_version(version: &TreeVersion, latest: bool) {
    let marker = if latest { "*".green().bold() } else { " ".normal() };
    let tag = match &version.tag {
        Some(tag) => format!("[{}]", tag).yellow(),
        None => "".normal(),
    };
    let parent = version
        .parent_version_id
        .map(|p| format!("<- {}", p))
        .unwrap_or_else(|| "root".to_string());
    println!(
        "{} {:>4} {} {}  {}  {}",
        marker,
        version.id,
        tag,
        parent.dimmed(),
        version.description.as_deref().unwrap_or(""),
        version.created_at.dimmed()
    );
}

fn print_node(node: &TreeNode) {
    println!("{:>6}  {}", node.id.to_string().cyan(), node.data);
}

/// Tag and restore walkthrough on a fresh "Root Configuration" tree
fn run_demo(db: &Database) -> kastle::Result<()> {
    let options = db.options();
    db.with_repo(|conn| {
        let engine = VersioningEngine::with_options(conn, options);
        let mut tree = VersionedTree::create(engine, "Root Configuration", Some("v1.0"))?;
        println!("{} tree {} '{}'", "Created".green(), tree.id(), tree.tree().name);

        let first = tree.add_node(Attributes::new().with("setting", "value1"))?;
        let second = tree.add_node(Attributes::new().with("setting", "value2"))?;
        tree.add_edge(first.id, second.id, Attributes::new().with("type", "dependency"))?;
        println!("   nodes {} -> {}", first.id, second.id);

        let tagged = tree.create_tag("release-v1.0", "First stable release")?;
        println!("{} version {} as 'release-v1.0'", "Tagged".green(), tagged.version().id);

        let restored = tree.restore_from_tag("release-v1.0")?;
        println!("{} 'release-v1.0' as version {}", "Restored".green(), restored.version().id);

        let traversal = tree.traversal()?;
        if let Some(root) = restored.snapshot.nodes.first() {
            println!("\n{}", "Walk from first node".bold());
            traversal.depth_first_walk(root.id, print_node)?;
        }

        println!("\n{}", "Versions".bold());
        let versions = tree.versions()?;
        let latest_id = versions.last().map(|v| v.id);
        for version in &versions {
            print_version(version, Some(version.id) == latest_id);
        }
        Ok(())
    })
}
