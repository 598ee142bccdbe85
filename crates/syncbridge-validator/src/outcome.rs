//! The `{valid, payload, repairs, errors}` outcome shape (spec §4.4).

use crate::rules::Repair;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRepair {
    pub field: String,
    pub repair: RepairKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairKind {
    Trimmed,
    NullRemoved,
    DefaultedUnknown,
    SynthesizedEmail,
    DroppedInvalidPhone,
}

impl From<Repair> for RepairKind {
    fn from(repair: Repair) -> Self {
        match repair {
            Repair::Trim => RepairKind::Trimmed,
            Repair::DropNull => RepairKind::NullRemoved,
            Repair::DefaultUnknown => RepairKind::DefaultedUnknown,
            Repair::SynthesizeEmail => RepairKind::SynthesizedEmail,
            Repair::DropInvalidPhone => RepairKind::DroppedInvalidPhone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub payload: Value,
    /// Stable ordering by field name (spec §4.4's determinism requirement).
    pub repairs: Vec<AppliedRepair>,
    pub errors: Vec<ValidationError>,
}
