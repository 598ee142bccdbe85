//! `GET /export/{report}?format=json|csv&hours=N` (spec §4.8): dumps one
//! of the control plane's own read models over a time window. `report`
//! is one of `changes`, `errors`, `audit`, `failed_records` — the four
//! things this service keeps a durable or in-memory history of.

use crate::auth::Operator;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use syncbridge_core::AuditAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default = "default_hours")]
    pub hours: i64,
}

fn default_hours() -> i64 {
    24
}

pub async fn export(
    State(state): State<AppState>,
    operator: Operator,
    Path(report): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let since = Utc::now() - chrono::Duration::hours(query.hours.max(1));

    let rows: Vec<Vec<(String, String)>> = match report.as_str() {
        "errors" => state
            .error_log
            .read_since(since)
            .into_iter()
            .map(|e| {
                vec![
                    ("timestamp".into(), e.timestamp.to_rfc3339()),
                    ("error_code".into(), e.error_code.to_string()),
                    ("entity_type".into(), e.entity_type.to_string()),
                    ("entity_id".into(), e.entity_id),
                    ("message".into(), e.message),
                ]
            })
            .collect(),
        "audit" => state
            .audit
            .recent(None, 0)
            .into_iter()
            .filter(|e| e.timestamp >= since)
            .map(|e| {
                vec![
                    ("timestamp".into(), e.timestamp.to_rfc3339()),
                    ("user".into(), e.user),
                    ("action".into(), format!("{:?}", e.action)),
                    ("resource".into(), e.resource),
                ]
            })
            .collect(),
        "failed_records" => state
            .queue
            .list(&Default::default(), syncbridge_queue::Paging { offset: 0, limit: usize::MAX })
            .items
            .into_iter()
            .filter(|r| r.last_failed_at >= since)
            .map(|r| {
                vec![
                    ("entity_type".into(), r.entity_type.to_string()),
                    ("entity_id".into(), r.entity_id),
                    ("attempt_count".into(), r.attempt_count.to_string()),
                    ("last_failed_at".into(), r.last_failed_at.to_rfc3339()),
                    ("last_error_message".into(), r.last_error_message),
                ]
            })
            .collect(),
        "changes" => read_change_log(&state.output_dir, since),
        other => return Err(ApiError::NotFound(format!("unknown export report '{other}'"))),
    };

    state.audit.record(&operator.0, AuditAction::Export, &report, None);

    match query.format {
        ExportFormat::Json => {
            let objects: Vec<serde_json::Value> = rows
                .into_iter()
                .map(|row| serde_json::Value::Object(row.into_iter().map(|(k, v)| (k, serde_json::Value::String(v))).collect()))
                .collect();
            Ok(axum::Json(objects).into_response())
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            if let Some(first) = rows.first() {
                let header: Vec<&str> = first.iter().map(|(k, _)| k.as_str()).collect();
                writer.write_record(&header).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            }
            for row in &rows {
                let values: Vec<&str> = row.iter().map(|(_, v)| v.as_str()).collect();
                writer.write_record(&values).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            }
            let bytes = writer.into_inner().map_err(|e| ApiError::BadRequest(e.to_string()))?;
            Ok(([(header::CONTENT_TYPE, "text/csv")], bytes).into_response())
        }
    }
}

fn read_change_log(output_dir: &std::path::Path, since: chrono::DateTime<Utc>) -> Vec<Vec<(String, String)>> {
    let dir = output_dir.join("changes");
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for entry in entries.flatten() {
        let Ok(contents) = std::fs::read_to_string(entry.path()) else { continue };
        for line in contents.lines() {
            let Ok(event) = serde_json::from_str::<syncbridge_core::ChangeEvent>(line) else { continue };
            if event.timestamp < since {
                continue;
            }
            rows.push(vec![
                ("timestamp".into(), event.timestamp.to_rfc3339()),
                ("entity_type".into(), event.entity_type.to_string()),
                ("entity_id".into(), event.entity_id),
                ("operation".into(), format!("{:?}", event.operation)),
                ("reason".into(), event.reason.unwrap_or_default()),
            ]);
        }
    }
    rows.sort_by(|a, b| a[0].1.cmp(&b[0].1));
    rows
}
