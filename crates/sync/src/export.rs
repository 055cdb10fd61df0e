//! Export target seam.
//!
//! Where an encoded package lands when the user asks to "save a copy" is a
//! host-application concern (a directory here, a download prompt in a
//! browser shell). The manager only sees the [`ExportTarget`] trait.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Receives a fully encoded package under a caller-chosen name.
#[async_trait]
pub trait ExportTarget: Send + Sync {
    async fn export(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Writes packages into a flat directory.
#[derive(Debug, Clone)]
pub struct DirExport {
    dir: PathBuf,
}

impl DirExport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ExportTarget for DirExport {
    async fn export(&self, name: &str, bytes: &[u8]) -> Result<()> {
        if name.is_empty() || name.contains(['/', '\\', '\0']) || name == "." || name == ".." {
            exn::bail!(ErrorKind::InvalidName(name.to_string()));
        }
        fs::create_dir_all(&self.dir).await.map_err(ErrorKind::Io)?;
        let path = self.dir.join(name);
        fs::write(&path, bytes).await.map_err(ErrorKind::Io)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "exported package");
        Ok(())
    }
}
