//! Local on-disk artifact cache
//!
//! Layout: `<cache_root>/<lowercase component>/<dotted-decimal>.tar.gz`.
//! Entries are created on first successful download and never mutated.
//! Presence is the only validity check; no checksums are kept. Eviction is
//! a manual concern (`prebake cache clear`).

use crate::error::{PrebakeError, PrebakeResult};
use crate::store::{ArtifactKey, ARCHIVE_EXT};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, warn};

/// Distinguishes staging files of concurrent in-process writers
static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// A cached artifact archive on local disk
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Lowercase component name (parent directory)
    pub component: String,
    /// Archive file name
    pub file_name: String,
    /// Absolute path to the archive
    pub path: PathBuf,
    /// Archive size in bytes
    pub size_bytes: u64,
}

/// Format bytes as human-readable size (e.g., "1.5 GB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// On-disk cache keyed by [`ArtifactKey`]
#[derive(Debug, Clone)]
pub struct LocalCacheStore {
    root: PathBuf,
}

impl LocalCacheStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path an entry for this key would occupy
    pub fn entry_path(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Whether an entry for this key exists
    pub async fn has(&self, key: &ArtifactKey) -> bool {
        fs::try_exists(self.entry_path(key)).await.unwrap_or(false)
    }

    /// Path to the cached archive, if present
    pub async fn get(&self, key: &ArtifactKey) -> Option<PathBuf> {
        let path = self.entry_path(key);
        if fs::try_exists(&path).await.unwrap_or(false) {
            Some(path)
        } else {
            None
        }
    }

    /// Move a staged archive into the cache, atomically.
    ///
    /// Idempotent: an existing entry for the key is trusted and the staged
    /// file is discarded. The staged file must live on the same filesystem
    /// as the cache root for the rename to be atomic; [`staging_path`]
    /// provides a suitable location.
    ///
    /// [`staging_path`]: Self::staging_path
    pub async fn put(&self, key: &ArtifactKey, staged: &Path) -> PrebakeResult<PathBuf> {
        let dest = self.entry_path(key);

        if fs::try_exists(&dest).await.unwrap_or(false) {
            debug!("Cache entry already present for {}, keeping it", key);
            let _ = fs::remove_file(staged).await;
            return Ok(dest);
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PrebakeError::cache_write(parent, e.to_string()))?;
        }

        fs::rename(staged, &dest)
            .await
            .map_err(|e| PrebakeError::cache_write(&dest, e.to_string()))?;

        debug!("Cached {} at {}", key, dest.display());
        Ok(dest)
    }

    /// A per-attempt staging path next to the final entry location.
    ///
    /// Downloads land here first so a partial write is never observable at
    /// the entry path. The name carries the process id and a process-wide
    /// sequence number, so concurrent same-key writers (across processes or
    /// within one) stage under distinct names and race only on the final
    /// rename.
    pub fn staging_path(&self, key: &ArtifactKey) -> PathBuf {
        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        let file = format!(
            ".tmp-{}-{}-{}",
            std::process::id(),
            seq,
            key.file_name()
        );
        self.root.join(&key.component).join(file)
    }

    /// Ensure the staging location's parent directory exists
    pub async fn prepare_staging(&self, key: &ArtifactKey) -> PrebakeResult<PathBuf> {
        let staged = self.staging_path(key);
        if let Some(parent) = staged.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PrebakeError::cache_write(parent, e.to_string()))?;
        }
        Ok(staged)
    }

    /// Remove an entry whose archive turned out to be unusable, so a later
    /// `has` cannot trust it.
    pub async fn discard(&self, key: &ArtifactKey) -> PrebakeResult<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => {
                warn!("Discarded unusable cache entry {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PrebakeError::cache_write(&path, e.to_string())),
        }
    }

    /// Enumerate all cached archives
    pub async fn entries(&self) -> PrebakeResult<Vec<CacheEntry>> {
        let mut entries = Vec::new();

        let mut components = match fs::read_dir(&self.root).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(PrebakeError::io("reading cache root", e)),
        };

        while let Ok(Some(component_dir)) = components.next_entry().await {
            let component_path = component_dir.path();
            if !component_path.is_dir() {
                continue;
            }
            let component = component_dir.file_name().to_string_lossy().to_string();

            let mut archives = match fs::read_dir(&component_path).await {
                Ok(d) => d,
                Err(_) => continue,
            };
            while let Ok(Some(archive)) = archives.next_entry().await {
                let file_name = archive.file_name().to_string_lossy().to_string();
                // Skip staging leftovers and foreign files
                if file_name.starts_with(".tmp-") || !file_name.ends_with(ARCHIVE_EXT) {
                    continue;
                }
                let size_bytes = archive.metadata().await.map(|m| m.len()).unwrap_or(0);
                entries.push(CacheEntry {
                    component: component.clone(),
                    file_name,
                    path: archive.path(),
                    size_bytes,
                });
            }
        }

        entries.sort_by(|a, b| (&a.component, &a.file_name).cmp(&(&b.component, &b.file_name)));
        Ok(entries)
    }

    /// Remove every cached archive, returning the number removed
    pub async fn clear(&self) -> PrebakeResult<usize> {
        let entries = self.entries().await?;
        let count = entries.len();
        for entry in entries {
            fs::remove_file(&entry.path)
                .await
                .map_err(|e| PrebakeError::cache_write(&entry.path, e.to_string()))?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionDescriptor;
    use tempfile::TempDir;

    fn key() -> ArtifactKey {
        let version = VersionDescriptor::from_revision("aabbccdd").unwrap();
        ArtifactKey::new("libfoo", version)
    }

    async fn stage(store: &LocalCacheStore, key: &ArtifactKey, contents: &[u8]) -> PathBuf {
        let staged = store.prepare_staging(key).await.unwrap();
        fs::write(&staged, contents).await.unwrap();
        staged
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(2 * 1024 * 1024 * 1024), "2.0 GB");
    }

    #[tokio::test]
    async fn has_and_get_on_empty_store() {
        let temp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(temp.path());

        assert!(!store.has(&key()).await);
        assert!(store.get(&key()).await.is_none());
    }

    #[tokio::test]
    async fn put_then_get() {
        let temp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(temp.path());
        let key = key();

        let staged = stage(&store, &key, b"archive bytes").await;
        let dest = store.put(&key, &staged).await.unwrap();

        assert!(store.has(&key).await);
        assert_eq!(store.get(&key).await.unwrap(), dest);
        assert_eq!(
            dest,
            temp.path().join("libfoo").join("170.187.204.221.tar.gz")
        );
        // Staged file was consumed by the rename
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn put_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(temp.path());
        let key = key();

        let first = stage(&store, &key, b"original").await;
        store.put(&key, &first).await.unwrap();

        let second = stage(&store, &key, b"different").await;
        let dest = store.put(&key, &second).await.unwrap();

        // Existing entry trusted, second staged file discarded
        assert_eq!(fs::read(&dest).await.unwrap(), b"original");
        assert!(!second.exists());
    }

    #[tokio::test]
    async fn same_key_writers_stage_under_distinct_names() {
        let temp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(temp.path());
        let key = key();

        assert_ne!(store.staging_path(&key), store.staging_path(&key));
    }

    #[tokio::test]
    async fn concurrent_same_key_puts_keep_one_intact_copy() {
        let temp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(temp.path());
        let key = key();

        let a = stage(&store, &key, b"writer a").await;
        let b = stage(&store, &key, b"writer b").await;

        let (ra, rb) = tokio::join!(store.put(&key, &a), store.put(&key, &b));
        ra.unwrap();
        rb.unwrap();

        // Whichever rename won, the entry is one writer's bytes in full
        let bytes = fs::read(store.get(&key).await.unwrap()).await.unwrap();
        assert!(bytes.as_slice() == b"writer a" || bytes.as_slice() == b"writer b");
    }

    #[tokio::test]
    async fn discard_removes_entry() {
        let temp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(temp.path());
        let key = key();

        let staged = stage(&store, &key, b"corrupt").await;
        store.put(&key, &staged).await.unwrap();
        assert!(store.has(&key).await);

        store.discard(&key).await.unwrap();
        assert!(!store.has(&key).await);
    }

    #[tokio::test]
    async fn discard_missing_entry_is_ok() {
        let temp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(temp.path());
        store.discard(&key()).await.unwrap();
    }

    #[tokio::test]
    async fn entries_skips_staging_files() {
        let temp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(temp.path());
        let key = key();

        let staged = stage(&store, &key, b"bytes").await;
        store.put(&key, &staged).await.unwrap();
        // A leftover staging file from a crashed writer
        fs::write(
            temp.path().join("libfoo").join(".tmp-999-x.tar.gz"),
            b"partial",
        )
        .await
        .unwrap();

        let entries = store.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].component, "libfoo");
        assert_eq!(entries[0].file_name, "170.187.204.221.tar.gz");
        assert_eq!(entries[0].size_bytes, 5);
    }

    #[tokio::test]
    async fn entries_on_missing_root() {
        let temp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(temp.path().join("nonexistent"));
        assert!(store.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let temp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(temp.path());
        let key = key();

        let staged = stage(&store, &key, b"bytes").await;
        store.put(&key, &staged).await.unwrap();

        let removed = store.clear().await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.entries().await.unwrap().is_empty());
    }
}
