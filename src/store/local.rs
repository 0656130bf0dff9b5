//! Local directory backend: every object is a file under `root`, its key
//! being the `/`-separated path relative to `root`.

use super::ObjectStore;
use crate::error::{BlobmutxError, Result};
use async_trait::async_trait;
use atomic_write_file::AtomicWriteFile;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        LocalFsStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(BlobmutxError::store("resolve", key, "key is not a relative path"));
        }
        Ok(self.root.join(relative))
    }
}

async fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) => fs::create_dir_all(dir).await,
        None => Ok(()),
    }
}

fn join_error(op: &'static str, key: &str, e: tokio::task::JoinError) -> BlobmutxError {
    BlobmutxError::store(op, key, e)
}

#[async_trait]
impl ObjectStore for LocalFsStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let root = self.root.clone();
        let owned_prefix = prefix.to_string();

        tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            if !root.exists() {
                return Ok(Vec::new());
            }
            let mut keys = Vec::new();
            for entry in WalkDir::new(&root).min_depth(1) {
                let entry = entry.map_err(|e| BlobmutxError::store("list", &owned_prefix, e))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(&root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(&owned_prefix) {
                    keys.push(key);
                }
            }
            Ok(keys)
        })
        .await
        .map_err(|e| join_error("list", prefix, e))?
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(BlobmutxError::not_found(key)),
            Err(e) => Err(BlobmutxError::store("get", key, e)),
        }
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        create_parent(&path)
            .await
            .map_err(|e| BlobmutxError::store("put", key, e))?;

        let len = data.len();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut file = AtomicWriteFile::open(&path)?;
            file.write_all(&data)?;
            file.commit()
        })
        .await
        .map_err(|e| join_error("put", key, e))?
        .map_err(|e| BlobmutxError::store("put", key, e))?;

        debug!("Stored {} byte(s) at {}", len, key);
        Ok(())
    }

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<()> {
        let src = self.path_for(src_key)?;
        let dst = self.path_for(dst_key)?;
        create_parent(&dst)
            .await
            .map_err(|e| BlobmutxError::store("copy", dst_key, e))?;

        match fs::copy(&src, &dst).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(BlobmutxError::not_found(src_key)),
            Err(e) => Err(BlobmutxError::store("copy", src_key, e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BlobmutxError::store("delete", key, e)),
        }
    }

    async fn head_exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BlobmutxError::store("head", key, e)),
        }
    }
}
