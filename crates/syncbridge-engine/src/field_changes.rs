//! Builds the `field -> {before, after}` map attached to `created`/`updated`
//! [`syncbridge_core::ChangeEvent`]s (spec §3).

use serde_json::Value;
use std::collections::BTreeMap;
use syncbridge_core::FieldChange;

pub fn diff_fields(before: Option<&Value>, after: &Value) -> BTreeMap<String, FieldChange> {
    let empty = serde_json::Map::new();
    let before_map = before.and_then(Value::as_object).unwrap_or(&empty);
    let after_map = after.as_object().unwrap_or(&empty);

    let mut changes = BTreeMap::new();
    let mut fields: std::collections::BTreeSet<&String> = before_map.keys().collect();
    fields.extend(after_map.keys());

    for field in fields {
        let before_value = before_map.get(field).cloned();
        let after_value = after_map.get(field).cloned();
        if before_value != after_value {
            changes.insert(field.clone(), FieldChange { before: before_value, after: after_value });
        }
    }
    changes
}
