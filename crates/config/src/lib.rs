//! Layered configuration for scribe.
//!
//! Defaults derived from platform directories, overridden by a TOML file,
//! overridden again by `SCRIBE_*` environment variables.

mod config;
pub mod error;

pub use crate::config::{BackendConfig, Config, DEFAULT_CONFIG_FILE, ENV_PREFIX};
