//! Saving finished recordings

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::error::{OrbitError, Result};

/// Where a finished recording goes
#[async_trait]
pub trait SaveTarget: Send + Sync {
    /// Ask for a destination; `None` means the user cancelled
    async fn prompt_save_path(&self, suggested_name: &str) -> Option<PathBuf>;

    /// Write the whole recording to `path`
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;
}

/// Default file name for a recording finished at `now`: `vid-<unix millis>.<ext>`
pub fn suggested_file_name(ext: &str, now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("vid-{}.{}", millis, ext)
}

/// Saves every recording into one directory without prompting
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    directory: PathBuf,
}

impl DirectorySaver {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[async_trait]
impl SaveTarget for DirectorySaver {
    async fn prompt_save_path(&self, suggested_name: &str) -> Option<PathBuf> {
        Some(self.directory.join(suggested_name))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    OrbitError::save(format!("Failed to create {:?}: {}", parent, e))
                })?;
            }
        }

        debug!("Writing {} bytes to {:?}", data.len(), path);
        tokio::fs::write(path, &data)
            .await
            .map_err(|e| OrbitError::save(format!("Failed to write {:?}: {}", path, e)))?;

        info!("Recording saved to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_suggested_file_name() {
        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        assert_eq!(suggested_file_name("webm", at), "vid-1700000000123.webm");
    }

    #[tokio::test]
    async fn test_directory_saver_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DirectorySaver::new(dir.path().join("recordings"));

        let path = saver.prompt_save_path("vid-1.webm").await.unwrap();
        saver
            .write_file(&path, Bytes::from_static(b"webm"))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"webm");
    }
}
