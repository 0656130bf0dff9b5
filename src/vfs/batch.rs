use crate::error::{BlobmutxError, Result};

/// Per-object result of a multi-object operation. Sub-operations are
/// independent: a failure does not undo or stop the others.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Source keys fully processed.
    pub completed: Vec<String>,
    /// Source keys that failed, with the first error hit for each.
    pub failed: Vec<(String, BlobmutxError)>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_keys(&self) -> Vec<String> {
        self.failed.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Collapse into `PartialFailure` naming every failed key.
    pub fn into_result(self, op: &'static str) -> Result<Vec<String>> {
        if self.failed.is_empty() {
            return Ok(self.completed);
        }
        Err(BlobmutxError::PartialFailure {
            op,
            failed: self.failed_keys(),
        })
    }

    pub(crate) fn record(&mut self, key: String, result: Result<()>) {
        match result {
            Ok(()) => self.completed.push(key),
            Err(e) => self.failed.push((key, e)),
        }
    }
}
