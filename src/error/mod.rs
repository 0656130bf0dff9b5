mod types;

pub use types::{BlobmutxError, Result};

// Re-export for convenience
pub use BlobmutxError as Error;
pub use BlobmutxError as ErrorKind;
