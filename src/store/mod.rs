//! Key-addressed blob storage backing the virtual filesystem.
//!
//! - `s3`: Amazon S3 bucket
//! - `local`: files under a local root directory
//! - `memory`: in-process map, for tests and embedding

use crate::error::Result;
use async_trait::async_trait;

pub mod local;
pub mod memory;
pub mod s3;

pub use local::LocalFsStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// All keys starting with `prefix`, in no particular order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Fails with `NotFound` when the key is absent.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Metadata-only probe.
    async fn head_exists(&self, key: &str) -> Result<bool>;
}
