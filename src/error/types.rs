use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobmutxError {
    #[error("Missing required configuration '{field}' (env {})", env_name(.field))]
    Configuration { field: &'static str },

    #[error("Object not found: {key}")]
    NotFound { key: String },

    #[error("Object store {op} failed for '{key}': {message}")]
    Store {
        op: &'static str,
        key: String,
        message: String,
    },

    #[error("Queue {op} failed: {message}")]
    Broker { op: &'static str, message: String },

    #[error("Malformed lock request '{body}': {source}")]
    MalformedRequest {
        body: String,
        source: serde_json::Error,
    },

    #[error("{op} failed for {}", join_keys(.failed))]
    PartialFailure { op: &'static str, failed: Vec<String> },

    #[error("Failed to acquire lock: timeout after {duration:?}")]
    LockTimeout { duration: Duration },

    #[error("Invalid duration format '{input}': {message}")]
    InvalidDuration { input: String, message: String },

    #[error("Lock acquisition cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn env_name(field: &str) -> String {
    format!("BLOBMUTX_{}", field.to_ascii_uppercase())
}

fn join_keys(keys: &[String]) -> String {
    format!("{} object(s): {}", keys.len(), keys.join(", "))
}

impl BlobmutxError {
    pub fn exit_code(&self) -> i32 {
        match self {
            BlobmutxError::LockTimeout { .. } => 2,
            BlobmutxError::Cancelled => 3,
            BlobmutxError::Io(e) if e.kind() == io::ErrorKind::Interrupted => 3,
            _ => 1,
        }
    }

    pub fn store(op: &'static str, key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        BlobmutxError::Store {
            op,
            key: key.into(),
            message: err.to_string(),
        }
    }

    pub fn broker(op: &'static str, err: impl std::fmt::Display) -> Self {
        BlobmutxError::Broker {
            op,
            message: err.to_string(),
        }
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        BlobmutxError::NotFound { key: key.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobmutxError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, BlobmutxError>;
