//! Hierarchical filesystem view over a flat object store.
//!
//! The store has no directories: a directory is any prefix that some key
//! continues with `/`, and a path with no object of its own is reported as
//! a directory. Multi-object operations are not transactional.

mod batch;
pub mod path;

pub use batch::BatchOutcome;

use crate::error::Result;
use crate::store::ObjectStore;
use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    is_directory: bool,
}

impl Stat {
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    pub fn is_file(&self) -> bool {
        !self.is_directory
    }
}

#[derive(Clone)]
pub struct VirtualFs {
    store: Arc<dyn ObjectStore>,
}

impl VirtualFs {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        VirtualFs { store }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Names of the immediate children of `dir`, sorted and deduplicated.
    pub async fn readdir(&self, dir: &str) -> Result<Vec<String>> {
        let prefix = path::dir_prefix(path::to_key(dir));
        let keys = self.store.list(&prefix).await?;

        let children: BTreeSet<String> = keys
            .iter()
            .filter_map(|key| key.strip_prefix(prefix.as_str()))
            .filter_map(|rest| rest.split(path::SEP).find(|segment| !segment.is_empty()))
            .map(str::to_string)
            .collect();
        Ok(children.into_iter().collect())
    }

    pub async fn read_file(&self, file: &str) -> Result<Vec<u8>> {
        self.store.get(path::to_key(file)).await
    }

    pub async fn write_file(&self, file: &str, data: &[u8]) -> Result<()> {
        self.store.put(path::to_key(file), data).await
    }

    /// Read-modify-write; a missing file counts as empty. Not atomic.
    pub async fn append_file(&self, file: &str, data: &[u8]) -> Result<()> {
        let key = path::to_key(file);
        let mut content = match self.store.get(key).await {
            Ok(existing) => existing,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };
        content.extend_from_slice(data);
        self.store.put(key, &content).await
    }

    /// Copy every object under `from` to the same relative key under `to`,
    /// then delete the original. Objects whose copy fails stay in place.
    pub async fn rename(&self, from: &str, to: &str) -> Result<BatchOutcome> {
        let from_key = path::to_key(from);
        let to_key = path::to_key(to);
        if from_key == to_key {
            return Ok(BatchOutcome::default());
        }

        let keys = self.objects_under(from_key).await?;
        debug!("Renaming {} object(s) from '{}' to '{}'", keys.len(), from_key, to_key);

        let moves = keys.into_iter().map(|key| async move {
            let target = format!("{}{}", to_key, &key[from_key.len()..]);
            let result = match self.store.copy(&key, &target).await {
                Ok(()) => self.store.delete(&key).await,
                Err(e) => Err(e),
            };
            (key, result)
        });

        Ok(self.collect("rename", join_all(moves).await))
    }

    pub async fn exists(&self, file: &str) -> Result<bool> {
        self.store.head_exists(path::to_key(file)).await
    }

    /// A path without an object of its own is reported as a directory,
    /// whether or not anything lives below it.
    pub async fn stat(&self, file: &str) -> Result<Stat> {
        let found = self.exists(file).await?;
        Ok(Stat {
            is_directory: !found,
        })
    }

    /// Directories exist implicitly.
    pub async fn mkdir(&self, _dir: &str) -> Result<()> {
        Ok(())
    }

    /// Delete every object under `target`.
    pub async fn remove(&self, target: &str) -> Result<BatchOutcome> {
        let keys = self.objects_under(path::to_key(target)).await?;
        debug!("Removing {} object(s) under '{}'", keys.len(), target);

        let deletes = keys.into_iter().map(|key| async move {
            let result = self.store.delete(&key).await;
            (key, result)
        });

        Ok(self.collect("remove", join_all(deletes).await))
    }

    async fn objects_under(&self, prefix: &str) -> Result<Vec<String>> {
        let keys = self.store.list(prefix).await?;
        Ok(keys
            .into_iter()
            .filter(|key| path::is_under(key, prefix))
            .collect())
    }

    fn collect(&self, op: &str, results: Vec<(String, Result<()>)>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (key, result) in results {
            if let Err(e) = &result {
                warn!("{} failed for {}: {}", op, key, e);
            }
            outcome.record(key, result);
        }
        outcome
    }
}
