//! Append-only error log (spec §6: `output/errors/error_log.jsonl`),
//! mirroring [`crate::change_tracker::ChangeTracker`]'s dated-file
//! pattern but as one running file rather than one per day — the
//! `/errors/suggestions` endpoint (spec §4.8) reads it back and buckets
//! by age, so a single file it can scan and trim is simpler than
//! reassembling a day's worth of `changes/*.jsonl` shards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use syncbridge_core::EntityType;

/// One logged error occurrence, independent of whether it triggered a
/// notification — `ErrorWindow` dedupes notifications by cooldown, but
/// `/errors/suggestions` aggregates over every occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedError {
    pub timestamp: DateTime<Utc>,
    pub error_code: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub message: String,
}

pub struct ErrorLog {
    output_dir: PathBuf,
}

impl ErrorLog {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    pub async fn append(&self, entry: LoggedError) {
        let dir = self.output_dir.join("errors");
        let path = dir.join("error_log.jsonl");
        let line = serde_json::to_string(&entry).unwrap_or_default();

        let _ = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
            writeln!(file, "{line}")?;
            Ok(())
        })
        .await;
    }

    /// Reads every logged error, newest first, no older than `since`.
    /// Best-effort: a missing or unreadable file yields an empty list
    /// rather than an error — there's nothing to suggest about errors
    /// before the process's first one.
    pub fn read_since(&self, since: DateTime<Utc>) -> Vec<LoggedError> {
        let path = self.output_dir.join("errors").join("error_log.jsonl");
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Vec::new();
        };

        let mut entries: Vec<LoggedError> = contents
            .lines()
            .filter_map(|line| serde_json::from_str::<LoggedError>(line).ok())
            .filter(|entry| entry.timestamp >= since)
            .collect();
        entries.reverse();
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: &'static str, entity_type: EntityType) -> LoggedError {
        LoggedError { timestamp: Utc::now(), error_code: code, entity_type, entity_id: "1".into(), message: "boom".into() }
    }

    #[tokio::test]
    async fn appended_entries_round_trip_through_read_since() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(dir.path());
        let since = Utc::now() - chrono::Duration::hours(1);

        log.append(entry("transport", EntityType::Employee)).await;
        log.append(entry("conflict", EntityType::Vehicle)).await;

        let entries = log.read_since(since);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].error_code, "conflict");
    }

    #[test]
    fn missing_file_reads_as_empty_rather_than_erroring() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(dir.path());
        assert!(log.read_since(Utc::now() - chrono::Duration::hours(1)).is_empty());
    }

    #[tokio::test]
    async fn entries_older_than_the_cutoff_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(dir.path());
        log.append(entry("transport", EntityType::Employee)).await;

        let future_cutoff = Utc::now() + chrono::Duration::hours(1);
        assert!(log.read_since(future_cutoff).is_empty());
    }
}
