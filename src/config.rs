//! Configuration file support for kastle
//!
//! Reads from .kastle/config.toml

use crate::engine::EngineOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Database location
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Validation rules applied when versions are modified
    #[serde(default)]
    pub versioning: VersioningConfig,

    /// Log filter for the command-line tool
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct DatabaseConfig {
    /// Explicit database file. KASTLE_DB_PATH still takes priority.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Versioning rules
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VersioningConfig {
    /// Reject edges whose endpoints belong to another version
    /// Default: true
    #[serde(default = "default_true")]
    pub strict_edges: bool,

    /// Reject new nodes/edges on tagged versions
    /// Default: false
    #[serde(default)]
    pub freeze_tagged: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// tracing-subscriber EnvFilter directive; RUST_LOG overrides it
    /// Default: "warn"
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_true() -> bool {
    true
}

fn default_filter() -> String {
    "warn".to_string()
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            strict_edges: true,
            freeze_tagged: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Config {
    /// Load config from .kastle/config.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Self {
        if let Some(path) = Self::find_config_path() {
            if let Ok(contents) = std::fs::read_to_string(&path) {
                if let Ok(config) = toml::from_str(&contents) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".kastle").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            strict_edges: self.versioning.strict_edges,
            freeze_tagged: self.versioning.freeze_tagged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.path.is_none());
        assert_eq!(config.logging.filter, "warn");
        assert_eq!(config.engine_options(), EngineOptions::default());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[database]
path = "/tmp/graphs.db"

[versioning]
freeze_tagged = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/graphs.db")));
        let options = config.engine_options();
        assert!(options.freeze_tagged);
        assert!(options.strict_edges);
    }
}
