//! Object-store backed virtual filesystem with a cross-process lock
//! arbitrated through a FIFO message queue.

pub mod config;
pub mod error;
pub mod identity;
pub mod lock;
pub mod queue;
pub mod session;
pub mod store;
pub mod utils;
pub mod vfs;

pub use config::{Config, ConfigOptions};
pub use error::{BlobmutxError, Result};
pub use identity::InstanceId;
pub use lock::{AcquireOptions, DistributedLock, LockHandle, LockSettings, PollStrategy};
pub use session::Session;
pub use vfs::{BatchOutcome, Stat, VirtualFs};
