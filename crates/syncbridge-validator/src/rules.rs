//! Per-entity field descriptors (spec §4.4): validation is data, not code,
//! so a new entity type is onboarded by adding a table here rather than a
//! new function.

use syncbridge_core::EntityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// Trims surrounding whitespace from a string field.
    Trim,
    /// An explicit JSON `null` is removed rather than treated as a value.
    DropNull,
    /// `first_name`/`last_name` default to the literal `"Unknown"` when
    /// missing (spec §4.4).
    DefaultUnknown,
    /// Synthesizes `firstname.lastname@<domain>` once both names are
    /// present after repair.
    SynthesizeEmail,
    /// An invalid phone number is dropped rather than failing the record.
    DropInvalidPhone,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub normalize: bool,
    pub kind: FieldKind,
    pub repairs: &'static [Repair],
    /// Fields with `duplicate_key: true` are the natural key the sync
    /// engine's `fingerprint` comparison is most sensitive to; validation
    /// doesn't treat them specially beyond normalizing before that
    /// comparison happens.
    pub duplicate_key: bool,
}

const EMPLOYEE_RULES: &[FieldRule] = &[
    FieldRule {
        field: "first_name",
        required: false,
        normalize: true,
        kind: FieldKind::Text,
        repairs: &[Repair::Trim, Repair::DropNull, Repair::DefaultUnknown],
        duplicate_key: true,
    },
    FieldRule {
        field: "last_name",
        required: false,
        normalize: true,
        kind: FieldKind::Text,
        repairs: &[Repair::Trim, Repair::DropNull, Repair::DefaultUnknown],
        duplicate_key: true,
    },
    FieldRule {
        field: "email",
        required: false,
        normalize: true,
        kind: FieldKind::Email,
        repairs: &[Repair::Trim, Repair::DropNull, Repair::SynthesizeEmail],
        duplicate_key: true,
    },
    FieldRule {
        field: "phone",
        required: false,
        normalize: true,
        kind: FieldKind::Phone,
        repairs: &[Repair::Trim, Repair::DropNull, Repair::DropInvalidPhone],
        duplicate_key: false,
    },
];

const DEFAULT_RULES: &[FieldRule] = &[FieldRule {
    field: "name",
    required: true,
    normalize: true,
    kind: FieldKind::Text,
    repairs: &[Repair::Trim, Repair::DropNull],
    duplicate_key: true,
}];

/// The field descriptors for one entity type. Only `Employee` has the
/// full name/email/phone repair set spec §4.4 describes in detail; every
/// other entity type is validated against a minimal `name`-required table
/// until a richer one is needed.
pub fn rules_for(entity_type: EntityType) -> &'static [FieldRule] {
    match entity_type {
        EntityType::Employee => EMPLOYEE_RULES,
        _ => DEFAULT_RULES,
    }
}
