//! Computes the create/update/skip/delete delta between a source and
//! target listing for one entity type (spec §4.7 step 2).

use std::collections::BTreeMap;
use syncbridge_adapters::ListedRecord;
use syncbridge_core::fingerprint;

pub struct Delta {
    pub to_create: Vec<ListedRecord>,
    /// `(source record, previous target payload)` pairs.
    pub to_update: Vec<(ListedRecord, serde_json::Value)>,
    /// Source records whose fingerprint matches the target unchanged.
    pub to_skip: Vec<ListedRecord>,
    /// Target records with no source counterpart. Only acted on when the
    /// `deletes_enabled` policy is on (off by default, per spec §4.7).
    pub to_delete: Vec<ListedRecord>,
}

/// Builds an index by business id, then computes the four-way split.
/// Fingerprint mismatch is what distinguishes `to_update` from `to_skip`
/// — an unchanged fingerprint never produces a write (spec §8's
/// idempotent-upsert property).
pub fn compute(source: &[ListedRecord], target: &[ListedRecord]) -> Delta {
    let target_by_id: BTreeMap<&str, &ListedRecord> = target.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut to_create = Vec::new();
    let mut to_update = Vec::new();
    let mut to_skip = Vec::new();

    for record in source {
        match target_by_id.get(record.id.as_str()) {
            None => to_create.push(record.clone()),
            Some(existing) => {
                if fingerprint(&record.payload) == fingerprint(&existing.payload) {
                    to_skip.push(record.clone());
                } else {
                    to_update.push((record.clone(), existing.payload.clone()));
                }
            }
        }
    }

    let source_ids: std::collections::BTreeSet<&str> = source.iter().map(|r| r.id.as_str()).collect();
    let to_delete = target.iter().filter(|r| !source_ids.contains(r.id.as_str())).cloned().collect();

    Delta { to_create, to_update, to_skip, to_delete }
}
