// ABOUTME: Output writers that persist rendered templates
// ABOUTME: FileWriter replaces the whole target file using a fixed permission mode

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::{OutputError, Result};

/// Permission mode for newly created target files (subject to the process umask)
pub const DEFAULT_FILE_MODE: u32 = 0o666;

#[async_trait]
pub trait OutputWriter: Send + Sync {
    /// Replace the full contents of `target` with `content`
    async fn write(&self, target: &Path, content: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileWriter {
    mode: u32,
}

impl Default for FileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FileWriter {
    pub fn new() -> Self {
        Self {
            mode: DEFAULT_FILE_MODE,
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }
}

#[async_trait]
impl OutputWriter for FileWriter {
    async fn write(&self, target: &Path, content: &str) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .mode(self.mode)
            .open(target)
            .await
            .map_err(|source| OutputError::Open {
                path: target.to_path_buf(),
                source,
            })?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|source| OutputError::Write {
                path: target.to_path_buf(),
                source,
            })?;

        file.flush().await.map_err(|source| OutputError::Write {
            path: target.to_path_buf(),
            source,
        })?;

        debug!("Output written to {} ({} bytes)", target.display(), content.len());
        Ok(())
    }
}
