//! S3 bucket backend built on aws-sdk-s3.

use super::ObjectStore;
use crate::config::Config;
use crate::error::{BlobmutxError, Result};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        S3Store {
            client,
            bucket: bucket.into(),
        }
    }

    pub async fn connect(config: &Config) -> Self {
        let sdk_config = config.sdk_config().await;
        Self::new(Client::new(&sdk_config), config.bucket.clone())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        // Each page holds at most 1000 keys.
        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| BlobmutxError::store("list", prefix, DisplayErrorContext(e)))?;

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match output.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        debug!("Listed {} object(s) under '{}'", keys.len(), prefix);
        Ok(keys)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    return Err(BlobmutxError::not_found(key));
                }
                return Err(BlobmutxError::store(
                    "get",
                    key,
                    DisplayErrorContext(service_error),
                ));
            }
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| BlobmutxError::store("get", key, e))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| BlobmutxError::store("put", key, DisplayErrorContext(e)))?;
        Ok(())
    }

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<()> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(copy_source(&self.bucket, src_key))
            .key(dst_key)
            .send()
            .await
            .map_err(|e| BlobmutxError::store("copy", src_key, DisplayErrorContext(e)))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| BlobmutxError::store("delete", key, DisplayErrorContext(e)))?;
        Ok(())
    }

    async fn head_exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(BlobmutxError::store(
                        "head",
                        key,
                        DisplayErrorContext(service_error),
                    ))
                }
            }
        }
    }
}

/// `bucket/key` with the key URL-encoded, as CopyObject expects.
fn copy_source(bucket: &str, key: &str) -> String {
    let mut encoded = String::with_capacity(bucket.len() + key.len() + 1);
    encoded.push_str(bucket);
    encoded.push('/');
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_source_keeps_separators() {
        assert_eq!(copy_source("bucket", "a/b/c.txt"), "bucket/a/b/c.txt");
    }

    #[test]
    fn test_copy_source_encodes_reserved_bytes() {
        assert_eq!(copy_source("bucket", "my file+1"), "bucket/my%20file%2B1");
    }
}
