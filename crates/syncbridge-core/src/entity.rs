//! The closed entity-type set and the `Entity` envelope (spec §3).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The closed set of entity types the engine knows how to reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Employee,
    Vehicle,
    Department,
    Job,
    Title,
    AssetType,
    Role,
    Site,
}

impl EntityType {
    /// All entity types, in the dependency order mandated by §4.7:
    /// sites → departments → titles → roles → asset_types → employees →
    /// vehicles → jobs.
    pub const SYNC_ORDER: [EntityType; 8] = [
        EntityType::Site,
        EntityType::Department,
        EntityType::Title,
        EntityType::Role,
        EntityType::AssetType,
        EntityType::Employee,
        EntityType::Vehicle,
        EntityType::Job,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Employee => "employee",
            EntityType::Vehicle => "vehicle",
            EntityType::Department => "department",
            EntityType::Job => "job",
            EntityType::Title => "title",
            EntityType::AssetType => "asset_type",
            EntityType::Role => "role",
            EntityType::Site => "site",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the `as_str()` spelling back into an `EntityType`, used by the
/// control plane's path/query parameters (e.g. `/diff/{entity_type}/...`).
impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::SYNC_ORDER
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown entity type: {s}"))
    }
}

/// One entity as seen by the engine: a source payload, an optional mirror
/// of what the target currently holds, and a fingerprint used for
/// idempotent-upsert comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: EntityType,
    /// Stable within `entity_type`; the business id used for upsert/delete.
    pub entity_id: String,
    pub source_payload: Value,
    pub target_payload: Option<Value>,
    /// A stable hash over the normalized fields, used to detect no-op
    /// updates (see [`fingerprint`]).
    pub fingerprint: String,
}

/// Computes a deterministic fingerprint over a JSON payload's normalized
/// fields. Two payloads with the same `(field, value)` pairs — regardless
/// of key order — fingerprint identically, which is what makes upsert
/// idempotent under repeated, unchanged syncs (spec §8).
pub fn fingerprint(payload: &Value) -> String {
    use std::collections::BTreeMap;
    use std::hash::{Hash, Hasher};

    fn normalize(value: &Value, out: &mut BTreeMap<String, String>, prefix: &str) {
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    normalize(v, out, &key);
                }
            }
            Value::Null => {
                out.insert(prefix.to_string(), String::new());
            }
            other => {
                out.insert(prefix.to_string(), other.to_string());
            }
        }
    }

    let mut fields = BTreeMap::new();
    normalize(payload, &mut fields, "");

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for (k, v) in &fields {
        k.hash(&mut hasher);
        v.hash(&mut hasher);
    }
    format!("{:016x}", hasher.finish())
}
