use crate::error::{BlobmutxError, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;

pub const DEFAULT_REGION: &str = "eu-west-1";
pub const DEFAULT_BUCKET: &str = "jsrtest";
pub const DEFAULT_QUEUE_NAME: &str = "test.fifo";

/// Raw, unvalidated options as supplied by the caller (CLI flags, env, code).
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub queue_name: Option<String>,
}

/// Validated connection settings for the remote store and broker.
#[derive(Clone)]
pub struct Config {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
    pub queue_name: String,
}

impl Config {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Result<Self> {
        Self::from_options(ConfigOptions {
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            ..Default::default()
        })
    }

    /// Validate required credentials and fill in defaults.
    pub fn from_options(options: ConfigOptions) -> Result<Self> {
        let access_key_id = required(options.access_key_id, "access_key_id")?;
        let secret_access_key = required(options.secret_access_key, "secret_access_key")?;

        Ok(Config {
            access_key_id,
            secret_access_key,
            region: non_empty(options.region).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            bucket: non_empty(options.bucket).unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            queue_name: non_empty(options.queue_name)
                .unwrap_or_else(|| DEFAULT_QUEUE_NAME.to_string()),
        })
    }
}

impl Config {
    /// Shared AWS settings for the S3 and SQS clients, using the configured
    /// static credentials rather than the ambient provider chain.
    pub async fn sdk_config(&self) -> SdkConfig {
        let credentials = Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            None,
            None,
            "blobmutx",
        );
        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("queue_name", &self.queue_name)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    non_empty(value).ok_or(BlobmutxError::Configuration { field })
}
