mod acquisition;
mod options;
mod request;

pub use acquisition::{DistributedLock, LockHandle, LockSettings, DEFAULT_GROUP_ID};
pub use options::{AcquireOptions, PollStrategy};
pub use request::LockRequest;
