use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

/// Blob storage for profile images, keyed by an opaque string recorded on
/// the user record.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>>;
}

/// Filesystem-backed store; keys become file names under `root`.
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create image dir {}", root.display()))?;
        Ok(Self { root })
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn put(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.root.join(key);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write image {}", path.display()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        let path = self.root.join(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::from(e).context(format!("read image {}", path.display()))),
        }
    }
}

/// In-memory store used by tests and `AppState::in_memory`.
#[derive(Default)]
pub struct MemoryImageStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        self.objects.write().insert(key.to_string(), body);
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        Ok(self.objects.read().get(key).cloned())
    }
}
