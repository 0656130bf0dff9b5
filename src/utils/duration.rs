use crate::error::{BlobmutxError, Result};
use std::time::Duration;

/// Parse a duration string like "250ms", "30s", "5m", "2h"
/// Defaults to seconds if no unit specified
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if s.is_empty() {
        return Err(invalid(s, "empty string"));
    }

    let (num_str, millis_per_unit) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, 1)
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 1_000)
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 60 * 1_000)
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 60 * 60 * 1_000)
    } else {
        // No unit, assume seconds
        (s, 1_000)
    };

    let value: u64 = num_str
        .parse()
        .map_err(|_| invalid(s, "expected format: NUMBER[ms|s|m|h] (e.g., '250ms', '30s', '5m')"))?;

    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| invalid(s, "value too large"))
}

fn invalid(input: &str, message: &str) -> BlobmutxError {
    BlobmutxError::InvalidDuration {
        input: input.to_string(),
        message: message.to_string(),
    }
}
