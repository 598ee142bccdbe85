//! Bounded ring buffer of recent outbound calls, read by the control
//! plane's `/api-calls` endpoint (SPEC_FULL §6 addendum). One
//! [`ApiCallLog`] is shared by every host stack a [`crate::SyncHttpClient`]
//! builds.

use std::collections::VecDeque;
use std::sync::Mutex;
use syncbridge_core::ApiCallRecord;

const CAPACITY: usize = 500;

pub struct ApiCallLog {
    records: Mutex<VecDeque<ApiCallRecord>>,
}

/// Filters accepted by `GET /api-calls` (spec §4.8).
#[derive(Debug, Clone, Default)]
pub struct ApiCallFilter {
    pub service: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<u16>,
    pub errors_only: bool,
    pub limit: usize,
}

impl ApiCallLog {
    pub fn new() -> Self {
        Self { records: Mutex::new(VecDeque::with_capacity(CAPACITY)) }
    }

    pub fn push(&self, record: ApiCallRecord) {
        let mut records = self.records.lock().unwrap();
        if records.len() >= CAPACITY {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Most recent calls first, matching the filter.
    pub fn query(&self, filter: &ApiCallFilter) -> Vec<ApiCallRecord> {
        let records = self.records.lock().unwrap();
        let limit = if filter.limit == 0 { CAPACITY } else { filter.limit };
        records
            .iter()
            .rev()
            .filter(|r| filter.service.as_deref().map_or(true, |s| r.service == s))
            .filter(|r| filter.method.as_deref().map_or(true, |m| r.method.eq_ignore_ascii_case(m)))
            .filter(|r| filter.status_code.map_or(true, |c| r.status_code == Some(c)))
            .filter(|r| !filter.errors_only || r.error.is_some())
            .take(limit)
            .cloned()
            .collect()
    }
}

impl Default for ApiCallLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(service: &str, status: Option<u16>, error: Option<&str>) -> ApiCallRecord {
        ApiCallRecord {
            id: Uuid::now_v7(),
            service: service.to_string(),
            method: "GET".to_string(),
            path_template: "/x".to_string(),
            status_code: status,
            elapsed_ms: 1,
            attempt: 1,
            correlation_id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn query_filters_to_errors_only() {
        let log = ApiCallLog::new();
        log.push(record("target", Some(200), None));
        log.push(record("target", Some(503), Some("boom")));

        let filter = ApiCallFilter { errors_only: true, ..Default::default() };
        let results = log.query(&filter);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status_code, Some(503));
    }

    #[test]
    fn ring_buffer_drops_oldest_past_capacity() {
        let log = ApiCallLog::new();
        for i in 0..CAPACITY + 10 {
            log.push(record(&format!("svc{i}"), Some(200), None));
        }
        let results = log.query(&ApiCallFilter::default());
        assert_eq!(results.len(), CAPACITY);
        assert_eq!(results[0].service, format!("svc{}", CAPACITY + 9));
    }
}
