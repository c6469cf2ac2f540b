// src/utils/media.rs

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use url::Url;

use crate::error::AppError;

/// Object storage for uploaded media.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Persist `bytes` under `dir` with a generated file name.
    /// Returns the storage path (e.g. `posts/<uuid>.png`).
    async fn store(&self, dir: &str, bytes: &[u8], extension: &str) -> Result<String, AppError>;

    /// Publicly resolvable URL of a stored path.
    fn url_for(&self, path: &str) -> String;

    async fn delete(&self, path: &str) -> Result<(), AppError>;
}

/// Stores media on the local disk and resolves it against a public base URL.
/// The router serves `root` under `/storage`.
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
    base_url: Url,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Result<Self, AppError> {
        // Url::join drops the last segment unless the base ends with '/'
        let normalized = if public_url.ends_with('/') {
            public_url.to_string()
        } else {
            format!("{}/", public_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| AppError::InternalServerError(format!("Invalid PUBLIC_URL: {}", e)))?;

        Ok(Self {
            root: root.into(),
            base_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a storage path below `root`, refusing anything that escapes it.
    fn resolve(&self, path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::BadRequest(format!("Invalid media path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store(&self, dir: &str, bytes: &[u8], extension: &str) -> Result<String, AppError> {
        let path = format!("{}/{}.{}", dir, uuid::Uuid::new_v4(), extension);
        let target = self.resolve(&path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        }
        tokio::fs::write(&target, bytes).await.map_err(|e| {
            tracing::error!("Failed to write media {}: {:?}", target.display(), e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(path)
    }

    fn url_for(&self, path: &str) -> String {
        match self.base_url.join(path) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.base_url, path),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), AppError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::InternalServerError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_joins_onto_public_base() {
        let storage = LocalMediaStorage::new("/tmp/unused", "http://cdn.test/storage").unwrap();
        assert_eq!(
            storage.url_for("posts/a.png"),
            "http://cdn.test/storage/posts/a.png"
        );
    }

    #[tokio::test]
    async fn store_then_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), "http://localhost/storage/").unwrap();

        let path = storage.store("posts", b"\x89PNG", "png").await.unwrap();
        assert!(path.starts_with("posts/") && path.ends_with(".png"));
        assert!(storage.root().join(&path).exists());

        storage.delete(&path).await.unwrap();
        assert!(!storage.root().join(&path).exists());
        // already gone
        storage.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_paths_outside_root() {
        let storage = LocalMediaStorage::new("/tmp/unused", "http://localhost/storage/").unwrap();
        assert!(storage.delete("../etc/passwd").await.is_err());
    }
}
