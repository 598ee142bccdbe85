//! The validator itself: a pure function over `(EntityType, RawPayload,
//! ValidatorConfig)` (spec §4.4's implementation note), so the idempotence
//! property in spec §8 holds by construction — there's no hidden state to
//! make it hold accidentally.

use crate::config::ValidatorConfig;
use crate::outcome::{AppliedRepair, RepairKind, ValidationError, ValidationOutcome};
use crate::rules::{rules_for, FieldKind, Repair};
use serde_json::Value;
use syncbridge_core::EntityType;

/// Runs every rule for `entity_type` over `payload` and returns the
/// normalized/repaired result plus a record of what changed.
pub fn validate(entity_type: EntityType, payload: &Value, config: &ValidatorConfig) -> ValidationOutcome {
    let mut map = payload.as_object().cloned().unwrap_or_default();
    let mut repairs: Vec<AppliedRepair> = Vec::new();
    let mut errors: Vec<ValidationError> = Vec::new();
    let rules = rules_for(entity_type);

    for rule in rules {
        if let Some(Value::Null) = map.get(rule.field) {
            map.remove(rule.field);
            if rule.repairs.contains(&Repair::DropNull) {
                repairs.push(AppliedRepair {
                    field: rule.field.to_string(),
                    repair: RepairKind::NullRemoved,
                });
            }
        }

        if rule.normalize {
            if let Some(Value::String(s)) = map.get(rule.field) {
                let trimmed = s.trim();
                if trimmed != s {
                    let trimmed = trimmed.to_string();
                    map.insert(rule.field.to_string(), Value::String(trimmed));
                    if rule.repairs.contains(&Repair::Trim) {
                        repairs.push(AppliedRepair {
                            field: rule.field.to_string(),
                            repair: RepairKind::Trimmed,
                        });
                    }
                }
            }
        }

        match rule.kind {
            FieldKind::Email => {
                if let Some(Value::String(s)) = map.get(rule.field) {
                    if !is_valid_email(s) {
                        errors.push(ValidationError {
                            field: rule.field.to_string(),
                            message: format!("'{s}' is not a valid email address"),
                        });
                    }
                }
            }
            FieldKind::Phone => {
                let invalid = matches!(map.get(rule.field), Some(Value::String(s)) if !is_valid_phone(s));
                if invalid {
                    map.remove(rule.field);
                    if rule.repairs.contains(&Repair::DropInvalidPhone) {
                        repairs.push(AppliedRepair {
                            field: rule.field.to_string(),
                            repair: RepairKind::DroppedInvalidPhone,
                        });
                    }
                }
            }
            FieldKind::Text => {}
        }
    }

    apply_name_and_email_defaults(entity_type, &mut map, &mut repairs, config);

    for rule in rules {
        if rule.required && !matches!(map.get(rule.field), Some(v) if !v.is_null()) {
            errors.push(ValidationError {
                field: rule.field.to_string(),
                message: "required field is missing".to_string(),
            });
        }
    }

    // Stable ordering by field name (spec §4.4).
    repairs.sort_by(|a, b| a.field.cmp(&b.field));

    ValidationOutcome {
        valid: errors.is_empty(),
        payload: Value::Object(map),
        repairs,
        errors,
    }
}

/// `first_name`/`last_name` default to `"Unknown"`; once both are present
/// (original or defaulted), a missing email is synthesized as
/// `firstname.lastname@<configured-domain>` (spec §4.4). Only applies to
/// entity types whose rule table actually declares these repairs.
fn apply_name_and_email_defaults(
    entity_type: EntityType,
    map: &mut serde_json::Map<String, Value>,
    repairs: &mut Vec<AppliedRepair>,
    config: &ValidatorConfig,
) {
    if entity_type != EntityType::Employee {
        return;
    }

    for field in ["first_name", "last_name"] {
        if !matches!(map.get(field), Some(Value::String(s)) if !s.is_empty()) {
            map.insert(field.to_string(), Value::String("Unknown".to_string()));
            repairs.push(AppliedRepair {
                field: field.to_string(),
                repair: RepairKind::DefaultedUnknown,
            });
        }
    }

    let has_email = matches!(map.get("email"), Some(Value::String(s)) if !s.is_empty());
    if !has_email {
        if let (Some(Value::String(first)), Some(Value::String(last))) =
            (map.get("first_name").cloned(), map.get("last_name").cloned())
        {
            let synthesized = format!("{}.{}@{}", first.to_lowercase(), last.to_lowercase(), config.email_domain);
            map.insert("email".to_string(), Value::String(synthesized));
            repairs.push(AppliedRepair {
                field: "email".to_string(),
                repair: RepairKind::SynthesizedEmail,
            });
        }
    }
}

fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.') && !value.contains(' ')
}

fn is_valid_phone(value: &str) -> bool {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    let allowed_chars = value.chars().all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '+'));
    allowed_chars && (7..=15).contains(&digits.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ValidatorConfig {
        ValidatorConfig { email_domain: "example.com".to_string() }
    }

    #[test]
    fn trims_and_drops_explicit_nulls() {
        let payload = json!({"first_name": "  Jane  ", "last_name": "Doe", "phone": Value::Null});
        let outcome = validate(EntityType::Employee, &payload, &config());
        assert_eq!(outcome.payload["first_name"], "Jane");
        assert!(outcome.payload.get("phone").is_none());
        assert!(outcome.repairs.iter().any(|r| r.field == "first_name" && r.repair == RepairKind::Trimmed));
        assert!(outcome.repairs.iter().any(|r| r.field == "phone" && r.repair == RepairKind::NullRemoved));
    }

    #[test]
    fn defaults_missing_names_and_synthesizes_email() {
        let payload = json!({});
        let outcome = validate(EntityType::Employee, &payload, &config());
        assert_eq!(outcome.payload["first_name"], "Unknown");
        assert_eq!(outcome.payload["last_name"], "Unknown");
        assert_eq!(outcome.payload["email"], "unknown.unknown@example.com");
        assert!(outcome.valid);
    }

    #[test]
    fn invalid_phone_is_dropped_not_failed() {
        let payload = json!({"first_name": "Jane", "last_name": "Doe", "phone": "not-a-phone"});
        let outcome = validate(EntityType::Employee, &payload, &config());
        assert!(outcome.valid);
        assert!(outcome.payload.get("phone").is_none());
        assert!(outcome.repairs.iter().any(|r| r.repair == RepairKind::DroppedInvalidPhone));
    }

    #[test]
    fn invalid_email_format_is_an_error() {
        let payload = json!({"first_name": "Jane", "last_name": "Doe", "email": "not-an-email"});
        let outcome = validate(EntityType::Employee, &payload, &config());
        assert!(!outcome.valid);
        assert_eq!(outcome.errors[0].field, "email");
    }

    #[test]
    fn repairs_are_sorted_by_field_name() {
        let payload = json!({"phone": Value::Null});
        let outcome = validate(EntityType::Employee, &payload, &config());
        let fields: Vec<_> = outcome.repairs.iter().map(|r| r.field.as_str()).collect();
        let mut sorted = fields.clone();
        sorted.sort();
        assert_eq!(fields, sorted);
    }

    #[test]
    fn same_input_produces_identical_output_every_time() {
        let payload = json!({"first_name": " Jane ", "last_name": "Doe"});
        let a = validate(EntityType::Employee, &payload, &config());
        let b = validate(EntityType::Employee, &payload, &config());
        assert_eq!(a.payload, b.payload);
        assert_eq!(a.repairs.len(), b.repairs.len());
    }

    #[test]
    fn missing_required_field_on_default_entity_type_is_an_error() {
        let outcome = validate(EntityType::Site, &json!({}), &config());
        assert!(!outcome.valid);
        assert_eq!(outcome.errors[0].field, "name");
    }

    proptest::proptest! {
        #[test]
        fn validating_twice_is_the_same_as_validating_once(
            first in "[A-Za-z ]{0,20}",
            last in "[A-Za-z ]{0,20}",
        ) {
            let payload = json!({"first_name": first, "last_name": last});
            let once = validate(EntityType::Employee, &payload, &config());
            let twice = validate(EntityType::Employee, &once.payload, &config());
            prop_assert_eq!(once.payload, twice.payload);
        }
    }
}
