use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fingerprint of this runtime instance, used to recognize our own lock
/// requests in the shared queue. Carries no security guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId(String);

impl InstanceId {
    /// Hash host name and install location into a stable identifier.
    pub fn derive(host: &str, install_location: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(host.as_bytes());
        hasher.update(install_location.to_string_lossy().as_bytes());
        InstanceId(format!("{:x}", hasher.finalize()))
    }

    /// Identity of the current process: this host plus the directory the
    /// running executable was installed in.
    pub fn current() -> Result<Self> {
        let host = hostname::get()?.to_string_lossy().into_owned();
        let location = install_location()?;
        let id = Self::derive(&host, &location);
        debug!("Instance identity {} (host: {}, location: {})", id, host, location.display());
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for InstanceId {
    fn from(value: String) -> Self {
        InstanceId(value)
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        InstanceId(value.to_string())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn install_location() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let exe = exe.canonicalize().unwrap_or(exe);
    Ok(exe.parent().map(Path::to_path_buf).unwrap_or(exe))
}
