//! Filesystem object store for previously uploaded audio.
//!
//! Resolves client-supplied storage references under a single base
//! directory. Read failures are classified so the dispatcher can report a
//! missing object distinctly from a permission failure; the dedicated read
//! timeout is applied by the dispatcher, not here.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

use scribe_core::{Error, ObjectStore, Result};

/// Filesystem storage backend rooted at a base directory.
pub struct FilesystemStore {
    base_path: PathBuf,
}

impl FilesystemStore {
    /// Create a new filesystem store with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Resolve a storage reference to a path under the base directory.
    ///
    /// Rejects absolute references and any `..` component; a reference must
    /// not be able to escape the store.
    fn full_path(&self, reference: &str) -> Result<PathBuf> {
        let rel = Path::new(reference);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(Error::InvalidInput(format!(
                "Invalid storage reference: {}",
                reference
            )));
        }
        Ok(self.base_path.join(rel))
    }

    /// Validate that the store's base directory exists and is readable.
    /// Catches misconfiguration at startup instead of on the first request.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        fs::read_dir(&self.base_path)
            .await
            .map(|_| ())
            .map_err(|e| format!("read_dir({:?}): {}", self.base_path, e))
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path)?;
        debug!(
            subsystem = "db",
            component = "object_store",
            op = "read",
            storage_path = %path,
            "Object store read"
        );

        fs::read(&full_path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::StorageNotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                Error::StoragePermissionDenied(path.to_string())
            }
            _ => Error::Io(e),
        })
    }
}
