//! Shape of one failure handed to [`crate::FailedRecordQueue::enqueue`].

use std::collections::BTreeMap;
use syncbridge_core::FieldFailure;

/// Everything the syncer knows about why an upsert or validation attempt
/// failed. `http_status` is `None` for validation failures that never
/// reached the adapter.
#[derive(Debug, Clone)]
pub struct Failure {
    pub message: String,
    pub http_status: Option<u16>,
    pub failed_fields: BTreeMap<String, FieldFailure>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            http_status: None,
            failed_fields: BTreeMap::new(),
        }
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_failed_fields(mut self, fields: BTreeMap<String, FieldFailure>) -> Self {
        self.failed_fields = fields;
        self
    }
}
