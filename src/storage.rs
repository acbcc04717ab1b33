//! Content-addressed image storage.
//!
//! Uploads are staged under `<ns>/temp/` with a name derived from the
//! original filename and the upload time, then promoted to
//! `<ns>/<group>/<sha256>.<ext>` once the staged bytes have been hashed.
//! Byte-identical uploads within a group resolve to the same stored path.

use std::{
    collections::{BTreeMap, HashSet},
    io,
    path::{Component, Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};

/// Hierarchical blob storage addressed by `/`-separated relative paths.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()>;

    async fn exists(&self, path: &str) -> io::Result<bool>;

    async fn read(&self, path: &str) -> io::Result<Vec<u8>>;

    /// File names (not sub-directories) directly under `dir`.
    async fn list_dir(&self, dir: &str) -> io::Result<Vec<String>>;

    /// Deleting a missing path is not an error.
    async fn delete(&self, path: &str) -> io::Result<()>;
}

/// Blob store rooted at a local directory, normally `MEDIA_ROOT`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let rel = Path::new(path);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing non-relative blob path {path}"),
            ));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(full, bytes).await
    }

    async fn exists(&self, path: &str) -> io::Result<bool> {
        tokio::fs::try_exists(self.resolve(path)?).await
    }

    async fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.resolve(path)?).await
    }

    async fn list_dir(&self, dir: &str) -> io::Result<Vec<String>> {
        let full = self.resolve(dir)?;
        let mut entries = match tokio::fs::read_dir(&full).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, path: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.resolve(path)?).await {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// In-process blob store. Reads can be made to fail to exercise degraded naming.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn paths(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        self.lock().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn exists(&self, path: &str) -> io::Result<bool> {
        Ok(self.lock().contains_key(path))
    }

    async fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::other("reads disabled"));
        }
        self.lock()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    async fn list_dir(&self, dir: &str) -> io::Result<Vec<String>> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        Ok(self
            .lock()
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    async fn delete(&self, path: &str) -> io::Result<()> {
        self.lock().remove(path);
        Ok(())
    }
}

/// Which folder family an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Style family main image, grouped by style code.
    Main,
    /// Promotional image, grouped by style code.
    Promo,
    /// Additional gallery images, grouped by style code.
    Gallery,
    /// Color swatch image, grouped by color.
    Color,
}

impl ImageKind {
    fn group_dir(self, ns: &str, key: &str) -> String {
        match self {
            ImageKind::Main => format!("{ns}/{key}"),
            ImageKind::Promo => format!("{ns}/{key}/promo"),
            ImageKind::Gallery => format!("{ns}/{key}/images"),
            ImageKind::Color => format!("{ns}/colors/{key}"),
        }
    }

    fn temp_dir(self, ns: &str) -> String {
        match self {
            ImageKind::Main => format!("{ns}/temp"),
            ImageKind::Promo => format!("{ns}/temp/promo"),
            ImageKind::Gallery => format!("{ns}/temp/images"),
            ImageKind::Color => format!("{ns}/temp/colors"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: String,
    /// Content digest, absent when the upload could not be read back.
    pub hash: Option<String>,
    /// An identical file was already stored; nothing new was written.
    pub reused: bool,
    pub degraded: bool,
}

/// Keeps alphanumerics, `_` and `-`.
pub fn sanitize_group_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn file_stem(name: &str) -> &str {
    name.split_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

#[derive(Clone)]
pub struct ImageStore {
    blobs: Arc<dyn BlobStore>,
    namespace: String,
    public_prefix: String,
}

impl ImageStore {
    pub fn new(blobs: Arc<dyn BlobStore>, namespace: &str, public_prefix: &str) -> Self {
        Self {
            blobs,
            namespace: namespace.trim_matches('/').to_string(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// The same store writing under a different top-level folder.
    pub fn with_namespace(&self, namespace: &str) -> Self {
        Self {
            blobs: Arc::clone(&self.blobs),
            namespace: namespace.trim_matches('/').to_string(),
            public_prefix: self.public_prefix.clone(),
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_prefix, path.trim_start_matches('/'))
    }

    pub fn group_dir(&self, kind: ImageKind, group_key: &str) -> Option<String> {
        let key = sanitize_group_key(group_key);
        (!key.is_empty()).then(|| kind.group_dir(&self.namespace, &key))
    }

    pub async fn store_image(
        &self,
        bytes: &[u8],
        kind: ImageKind,
        group_key: &str,
        original_filename: &str,
    ) -> io::Result<StoredImage> {
        let ext = extension_of(original_filename);
        let staged_name = content_hash(
            format!(
                "{original_filename}{}",
                Utc::now().timestamp_nanos_opt().unwrap_or_default()
            )
            .as_bytes(),
        );
        let staged = format!("{}/{staged_name}{ext}", kind.temp_dir(&self.namespace));
        self.blobs.write(&staged, bytes).await?;

        let Some(dir) = self.group_dir(kind, group_key) else {
            return Ok(StoredImage {
                path: staged,
                hash: None,
                reused: false,
                degraded: false,
            });
        };

        let content = match self.blobs.read(&staged).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %staged,
                    "could not read staged upload, keeping timestamp-derived name without dedup"
                );
                return Ok(StoredImage {
                    path: staged,
                    hash: None,
                    reused: false,
                    degraded: true,
                });
            }
        };

        let hash = content_hash(&content);
        let canonical = format!("{dir}/{hash}{ext}");
        let existing = if self.blobs.exists(&canonical).await? {
            Some(canonical.clone())
        } else {
            self.find_in_dir(&dir, &hash, &content).await?
        };

        let stored = match existing {
            Some(path) => StoredImage {
                path,
                hash: Some(hash),
                reused: true,
                degraded: false,
            },
            None => {
                self.blobs.write(&canonical, &content).await?;
                StoredImage {
                    path: canonical,
                    hash: Some(hash),
                    reused: false,
                    degraded: false,
                }
            }
        };

        if let Err(err) = self.blobs.delete(&staged).await {
            tracing::warn!(error = %err, path = %staged, "failed to remove staged upload");
        }
        Ok(stored)
    }

    /// Locate a byte-identical file already stored for this group.
    pub async fn find_existing(
        &self,
        bytes: &[u8],
        kind: ImageKind,
        group_key: &str,
    ) -> io::Result<Option<String>> {
        let Some(dir) = self.group_dir(kind, group_key) else {
            return Ok(None);
        };
        self.find_in_dir(&dir, &content_hash(bytes), bytes).await
    }

    async fn find_in_dir(&self, dir: &str, hash: &str, bytes: &[u8]) -> io::Result<Option<String>> {
        let names = self.blobs.list_dir(dir).await?;
        if let Some(name) = names.iter().find(|name| file_stem(name) == hash) {
            return Ok(Some(format!("{dir}/{name}")));
        }
        // Legacy uploads were not named after their digest.
        for name in &names {
            let path = format!("{dir}/{name}");
            match self.blobs.read(&path).await {
                Ok(candidate) if candidate == bytes => return Ok(Some(path)),
                Ok(_) => {}
                Err(err) => tracing::debug!(error = %err, path = %path, "skipping unreadable file"),
            }
        }
        Ok(None)
    }

    /// Remove every file in the group folder except `keep` and anything in
    /// `referenced`. Sub-folders are untouched.
    pub async fn prune_group(
        &self,
        kind: ImageKind,
        group_key: &str,
        keep: &str,
        referenced: &HashSet<String>,
    ) -> io::Result<usize> {
        let Some(dir) = self.group_dir(kind, group_key) else {
            return Ok(0);
        };
        let mut removed = 0;
        for name in self.blobs.list_dir(&dir).await? {
            let path = format!("{dir}/{name}");
            if path == keep || referenced.contains(&path) {
                continue;
            }
            match self.blobs.delete(&path).await {
                Ok(()) => {
                    removed += 1;
                    tracing::info!(path = %path, group = %group_key, "pruned duplicate image");
                }
                Err(err) => tracing::warn!(error = %err, path = %path, "failed to prune image"),
            }
        }
        Ok(removed)
    }

    pub async fn delete(&self, path: &str) -> io::Result<()> {
        self.blobs.delete(path).await
    }
}
