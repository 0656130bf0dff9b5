use crate::error::{BlobmutxError, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Queue message body announcing one acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest {
    pub instance_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub lock_id: String,
}

impl LockRequest {
    pub fn new(instance_id: impl Into<String>, lock_id: impl Into<String>) -> Self {
        LockRequest {
            instance_id: instance_id.into(),
            lock_id: lock_id.into(),
        }
    }

    pub fn to_body(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| BlobmutxError::MalformedRequest {
            body: format!("{:?}", self),
            source: e,
        })
    }

    pub fn from_body(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| BlobmutxError::MalformedRequest {
            body: body.to_string(),
            source: e,
        })
    }
}

// Older publishers sent numeric, millisecond-based lock ids.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
