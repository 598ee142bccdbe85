//! Data validator / transformer (spec §4.4): a pure function from
//! `(EntityType, RawPayload, ValidatorConfig)` to a `ValidationOutcome`,
//! driven by a data table of [`FieldRule`]s rather than per-entity code.

mod config;
mod outcome;
mod rules;
mod validate;

pub use config::ValidatorConfig;
pub use outcome::{AppliedRepair, RepairKind, ValidationError, ValidationOutcome};
pub use rules::{rules_for, FieldKind, FieldRule, Repair};
pub use validate::validate;
