//! Configuration model and layered loading.

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Configuration file looked for in the working directory when no explicit
/// path is given.
pub const DEFAULT_CONFIG_FILE: &str = "scribe.toml";
/// Environment variables prefixed with this override file values.
pub const ENV_PREFIX: &str = "SCRIBE_";

const DEFAULT_RECENT_LIMIT: usize = 10;

/// One configured storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// SQLite-backed store on the local filesystem.
    Local { name: String, path: PathBuf },
    /// Remote content host, attached at runtime by the embedding
    /// application.
    Host {
        name: String,
        endpoint: String,
        #[serde(default)]
        root: Option<String>,
    },
}

impl BackendConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Local { name, .. } | Self::Host { name, .. } => name,
        }
    }
}

/// Fully merged application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where durable state lives: databases, the auto-save slot, the
    /// recent-files registry.
    pub data_dir: PathBuf,
    /// Scratch directory for the temp asset cache.
    pub temp_dir: PathBuf,
    /// When set, every save also drops an exported package here.
    pub export_dir: Option<PathBuf>,
    /// Auto-save slot filename, relative to `data_dir`.
    pub autosave_file: String,
    /// Recent-files registry filename, relative to `data_dir`.
    pub recent_file: String,
    /// Maximum number of recent-files entries kept.
    pub recent_limit: usize,
    pub backends: Vec<BackendConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let dirs = ProjectDirs::from("dev", "scribe", "scribe");
        let data_dir = match &dirs {
            Some(dirs) => dirs.data_dir().to_path_buf(),
            None => PathBuf::from("."),
        };
        let temp_dir = match &dirs {
            Some(dirs) => dirs.cache_dir().join("assets"),
            None => std::env::temp_dir().join("scribe-assets"),
        };
        Self {
            temp_dir,
            export_dir: None,
            autosave_file: "autosave.json".to_string(),
            recent_file: "recent.json".to_string(),
            recent_limit: DEFAULT_RECENT_LIMIT,
            backends: vec![BackendConfig::Local { name: "local".to_string(), path: data_dir.join("scribe.db") }],
            data_dir,
        }
    }
}

impl Config {
    /// Load configuration in layers: built-in defaults, then a TOML file
    /// (the given path, or `scribe.toml` in the working directory), then
    /// `SCRIBE_*` environment variables. Later layers win.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let toml = match file {
            Some(path) => Toml::file_exact(path),
            None => Toml::file(DEFAULT_CONFIG_FILE),
        };
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(toml)
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| exn::Exn::from(ErrorKind::Figment(e)))?;
        config.validate()?;
        tracing::debug!(backends = config.backends.len(), "configuration loaded");
        Ok(config)
    }

    /// Structural checks that figment cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.recent_limit == 0 {
            exn::bail!(ErrorKind::ZeroRecentLimit);
        }
        let mut names = HashSet::new();
        for backend in &self.backends {
            if !names.insert(backend.name()) {
                exn::bail!(ErrorKind::DuplicateBackend(backend.name().to_string()));
            }
        }
        Ok(())
    }
}
