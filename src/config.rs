#![forbid(unsafe_code)]

//! TOML configuration for the compiler and the connection defaults.
//!
//! ```toml
//! [compiler]
//! symmetry = "break"            # break | preserve | dedup
//! prune_redundant_labels = true
//! node_prefix = "n"
//! relation_prefix = "r"
//!
//! [connection]
//! uri = "neo4j://localhost:7687"
//! user = "neo4j"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::{CompilerOptions, SymmetryPolicy};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "GRAPHSKETCH_CONFIG";

/// Failures while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Config path.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// `compiler.symmetry` names no known policy.
    #[error("compiler.symmetry value '{value}' is invalid (expected break, preserve, or dedup)")]
    InvalidSymmetry {
        /// Rejected value.
        value: String,
    },
    /// A variable prefix is not usable as a Cypher identifier.
    #[error("compiler.{key} value '{value}' is invalid: {reason}")]
    InvalidPrefix {
        /// Offending key.
        key: &'static str,
        /// Rejected value.
        value: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Informational connection defaults for external drivers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database URI.
    pub uri: Option<String>,
    /// User name.
    pub user: Option<String>,
}

/// Loaded configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SketchConfig {
    path: Option<PathBuf>,
    /// Compiler options.
    pub compiler: CompilerOptions,
    /// Connection defaults.
    pub connection: ConnectionConfig,
}

impl SketchConfig {
    /// Loads from `explicit`, else `$GRAPHSKETCH_CONFIG`, else the default
    /// location. A missing file yields the defaults.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(default_config_path);
        let mut config = match path.as_deref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => Self::default(),
        };
        config.path = path;
        Ok(config)
    }

    /// Parses TOML text. `path` is only used in error messages.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        convert(raw)
    }

    /// File the configuration was looked up at, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// `<config dir>/graphsketch/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("graphsketch").join("config.toml"))
}

fn read_file(path: &Path) -> Result<SketchConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    SketchConfig::from_toml_str(&contents, path)
}

fn convert(raw: RawConfig) -> Result<SketchConfig, ConfigError> {
    let defaults = CompilerOptions::default();
    let symmetry = match raw.compiler.symmetry {
        Some(value) => value
            .parse::<SymmetryPolicy>()
            .map_err(|_| ConfigError::InvalidSymmetry { value })?,
        None => defaults.symmetry,
    };
    let node_prefix = raw.compiler.node_prefix.unwrap_or(defaults.node_prefix);
    let relation_prefix = raw
        .compiler
        .relation_prefix
        .unwrap_or(defaults.relation_prefix);
    check_prefix("node_prefix", &node_prefix)?;
    check_prefix("relation_prefix", &relation_prefix)?;
    if node_prefix.starts_with(relation_prefix.as_str())
        || relation_prefix.starts_with(node_prefix.as_str())
    {
        return Err(ConfigError::InvalidPrefix {
            key: "relation_prefix",
            value: relation_prefix,
            reason: "node and relation prefixes must not extend one another",
        });
    }

    Ok(SketchConfig {
        path: None,
        compiler: CompilerOptions {
            symmetry,
            prune_redundant_labels: raw
                .compiler
                .prune_redundant_labels
                .unwrap_or(defaults.prune_redundant_labels),
            node_prefix,
            relation_prefix,
        },
        connection: raw.connection,
    })
}

fn check_prefix(key: &'static str, value: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let reason = match chars.next() {
        None => Some("must not be empty"),
        Some(first) if !(first.is_ascii_alphabetic() || first == '_') => {
            Some("must start with a letter or underscore")
        }
        Some(_) if !chars.all(|c| c.is_ascii_alphabetic() || c == '_') => {
            Some("may only contain letters and underscores")
        }
        Some(_) => None,
    };
    match reason {
        Some(reason) => Err(ConfigError::InvalidPrefix {
            key,
            value: value.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    compiler: RawCompiler,
    #[serde(default)]
    connection: ConnectionConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCompiler {
    symmetry: Option<String>,
    prune_redundant_labels: Option<bool>,
    node_prefix: Option<String>,
    relation_prefix: Option<String>,
}
