//! Project initialization for kastle
//!
//! Creates the .kastle directory, a default config.toml and the database.

use crate::db::Database;
use colored::Colorize;
use std::fs;
use std::path::Path;

const CONFIG_TOML: &str = r#"# Kastle configuration

[database]
# Explicit database file. KASTLE_DB_PATH overrides this.
# path = ".kastle/kastle.db"

[versioning]
# Reject edges whose endpoints belong to another version
strict_edges = true
# Reject new nodes and edges on tagged versions
freeze_tagged = false

[logging]
# tracing filter directive; RUST_LOG overrides this
filter = "warn"
"#;

/// Initialize kastle in the current directory
pub fn init_project() -> Result<(), String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Could not get current directory: {}", e))?;
    init_project_at(&cwd)
}

/// Initialize kastle in `root`
pub fn init_project_at(root: &Path) -> Result<(), String> {
    println!("\n{}", "Initializing Kastle...".cyan().bold());
    println!("   Directory: {}\n", root.display());

    let kastle_dir = root.join(".kastle");
    create_dir_if_missing(&kastle_dir)?;

    let config_path = kastle_dir.join("config.toml");
    write_file_if_missing(&config_path, CONFIG_TOML, ".kastle/config.toml")?;

    // Opening the database creates the tables
    let db_path = kastle_dir.join("kastle.db");
    let existed = db_path.exists();
    let db = Database::open_at(&db_path).map_err(|e| format!("Could not create database: {}", e))?;
    if existed {
        println!("   {} .kastle/kastle.db (already exists)", "Skipping".yellow());
    } else {
        println!("   {} .kastle/kastle.db", "Creating".green());
    }
    println!("   {} {}", "Schema".cyan(), schema_status(&db)?);

    add_to_gitignore(root)?;

    println!("\n{}", "Kastle initialized!".green().bold());
    println!("\nNext steps:");
    println!("  1. Run {} to create a tree", "kastle tree create <name>".cyan());
    println!("  2. Run {} to try the sample tree", "kastle demo".cyan());
    println!();

    Ok(())
}

/// Newest schema recorded in the database, e.g. `v1.0.0 (versioned-tree)`
fn schema_status(db: &Database) -> Result<String, String> {
    let schemas = db
        .stored_schemas()
        .map_err(|e| format!("Could not read schema versions: {}", e))?;
    match schemas.last() {
        Some(schema) => Ok(format!("v{} ({})", schema.version, schema.name)),
        None => Err("Database has no recorded schema".to_string()),
    }
}

fn create_dir_if_missing(path: &Path) -> Result<(), String> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| format!("Could not create {}: {}", path.display(), e))?;
        println!("   {} {}", "Creating".green(), path.display());
    }
    Ok(())
}

fn write_file_if_missing(path: &Path, content: &str, display_name: &str) -> Result<(), String> {
    if path.exists() {
        println!("   {} {} (already exists)", "Skipping".yellow(), display_name);
    } else {
        fs::write(path, content)
            .map_err(|e| format!("Could not write {}: {}", display_name, e))?;
        println!("   {} {}", "Creating".green(), display_name);
    }
    Ok(())
}

fn add_to_gitignore(root: &Path) -> Result<(), String> {
    let gitignore_path = root.join(".gitignore");
    let entry = ".kastle/";

    if gitignore_path.exists() {
        let existing = fs::read_to_string(&gitignore_path)
            .map_err(|e| format!("Could not read .gitignore: {}", e))?;

        if existing.lines().any(|line| line.trim() == entry || line.trim() == ".kastle") {
            return Ok(());
        }

        let new_content = format!("{}\n\n# Kastle database (local)\n{}\n", existing.trim_end(), entry);
        fs::write(&gitignore_path, new_content)
            .map_err(|e| format!("Could not update .gitignore: {}", e))?;
        println!("   {} .gitignore (added .kastle/)", "Updated".green());
    } else {
        let content = format!("# Kastle database (local)\n{}\n", entry);
        fs::write(&gitignore_path, content)
            .map_err(|e| format!("Could not create .gitignore: {}", e))?;
        println!("   {} .gitignore", "Creating".green());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::CURRENT_SCHEMA;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_layout() {
        let dir = TempDir::new().unwrap();
        init_project_at(dir.path()).unwrap();

        assert!(dir.path().join(".kastle/kastle.db").exists());
        let config_text = fs::read_to_string(dir.path().join(".kastle/config.toml")).unwrap();
        let config: Config = toml::from_str(&config_text).unwrap();
        assert!(config.versioning.strict_edges);
        assert_eq!(config.logging.filter, "warn");

        let gitignore = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert!(gitignore.contains(".kastle/"));
    }

    #[test]
    fn test_schema_status_reports_current_schema() {
        let dir = TempDir::new().unwrap();
        init_project_at(dir.path()).unwrap();

        let db = Database::open_at(dir.path().join(".kastle/kastle.db")).unwrap();
        assert_eq!(schema_status(&db).unwrap(), CURRENT_SCHEMA.to_string());
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "target/\n").unwrap();
        init_project_at(dir.path()).unwrap();
        init_project_at(dir.path()).unwrap();

        let gitignore = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert!(gitignore.starts_with("target/"));
        assert_eq!(gitignore.matches(".kastle/").count(), 1);
    }
}
