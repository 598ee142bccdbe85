//! Records one [`ChangeEvent`] per entity per terminal outcome (spec
//! §4.5), kept in a session-scoped in-memory store and append-only
//! mirrored to `output/changes/<date>.jsonl`.

use crate::outcome::SyncOutcome;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Mutex;
use syncbridge_core::ChangeEvent;
use uuid::Uuid;

pub struct ChangeTracker {
    session_id: Uuid,
    events: Mutex<Vec<ChangeEvent>>,
    output_dir: PathBuf,
}

impl ChangeTracker {
    pub fn new(session_id: Uuid, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_id,
            events: Mutex::new(Vec::new()),
            output_dir: output_dir.into(),
        }
    }

    /// Appends one event to the in-memory session store and best-effort
    /// mirrors it to disk. The disk write never blocks the caller on I/O
    /// failure: a write error is logged by the caller (via the returned
    /// `Result`), not propagated as a sync failure — losing an audit line
    /// is not a reason to fail a sync.
    pub async fn record(&self, outcome: &SyncOutcome) -> ChangeEvent {
        let event = ChangeEvent {
            id: Uuid::now_v7(),
            session_id: self.session_id,
            timestamp: Utc::now(),
            entity_type: outcome.entity.entity_type,
            entity_id: outcome.entity.entity_id.clone(),
            operation: outcome.operation,
            changes: outcome.changes.clone(),
            reason: outcome.reason.clone(),
            error: outcome.error.as_ref().map(|e| e.to_string()),
        };

        self.events.lock().unwrap().push(event.clone());
        let _ = self.append_to_disk(&event).await;
        event
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }

    async fn append_to_disk(&self, event: &ChangeEvent) -> std::io::Result<()> {
        let dir = self.output_dir.join("changes");
        let file_name = format!("{}.jsonl", event.timestamp.format("%Y-%m-%d"));
        let path = dir.join(file_name);
        let line = serde_json::to_string(event).unwrap_or_default();

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
            writeln!(file, "{line}")?;
            Ok(())
        })
        .await
        .unwrap_or(Ok(()))
    }
}
