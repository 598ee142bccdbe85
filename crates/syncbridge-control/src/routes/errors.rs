//! `GET /errors/suggestions?hours=N` (spec §4.8, §7): aggregates
//! `ErrorLog` occurrences over the window into per-`(error_code,
//! entity_type)` buckets, and assigns a severity from occurrence count,
//! age, and a fixed per-code weight.

use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use syncbridge_core::EntityType;

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    #[serde(default = "default_hours")]
    pub hours: i64,
}

fn default_hours() -> i64 {
    24
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// Fixed weight per error code: how dangerous one occurrence of this
/// error is, independent of how often it recurs. `auth_failed` aborts a
/// syncer outright, so it starts near the top of the scale; `data_missing`
/// is routine enough to default to the lowest weight.
fn code_weight(code: &str) -> f64 {
    match code {
        "auth_failed" => 5.0,
        "dependency_unavailable" => 4.0,
        "conflict" => 3.0,
        "validation_failed" => 2.0,
        "transport" | "rate_limited" => 1.5,
        "data_missing" => 1.0,
        _ => 2.0,
    }
}

fn severity_of(score: f64) -> Severity {
    if score >= 15.0 {
        Severity::High
    } else if score >= 5.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[derive(Debug, Serialize)]
struct Suggestion {
    error_code: String,
    entity_type: EntityType,
    occurrences: usize,
    oldest: chrono::DateTime<Utc>,
    newest: chrono::DateTime<Utc>,
    severity: Severity,
    sample_message: String,
}

pub async fn suggestions(State(state): State<AppState>, Query(query): Query<SuggestionsQuery>) -> Json<serde_json::Value> {
    let since = Utc::now() - chrono::Duration::hours(query.hours.max(1));
    let entries = state.error_log.read_since(since);

    let mut grouped: HashMap<(&str, EntityType), Vec<&syncbridge_tracker::LoggedError>> = HashMap::new();
    for entry in &entries {
        grouped.entry((entry.error_code.as_str(), entry.entity_type)).or_default().push(entry);
    }

    let mut suggestions: Vec<Suggestion> = grouped
        .into_iter()
        .map(|((code, entity_type), occurrences)| {
            let count = occurrences.len();
            let newest = occurrences.iter().map(|e| e.timestamp).max().unwrap();
            let oldest = occurrences.iter().map(|e| e.timestamp).min().unwrap();
            let age_hours = (Utc::now() - oldest).num_minutes() as f64 / 60.0;
            let score = count as f64 * code_weight(code) * (1.0 + age_hours / 24.0).min(3.0);
            Suggestion {
                error_code: code.to_string(),
                entity_type,
                occurrences: count,
                oldest,
                newest,
                severity: severity_of(score),
                sample_message: occurrences[0].message.clone(),
            }
        })
        .collect();

    suggestions.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    Json(json!({ "suggestions": suggestions, "window_hours": query.hours }))
}
