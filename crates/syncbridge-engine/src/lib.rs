//! The sync engine (spec §4.7): a session controller that sequences
//! per-entity syncers in dependency order, serializes runs, and answers
//! to a scheduler tick or a manual control-plane trigger.

mod controller;
mod diff;
mod field_changes;
mod mapping;
mod scheduler;
mod syncer;

pub use controller::{SessionController, SessionSnapshot, TriggerError, TriggerOutcome};
pub use diff::Delta;
pub use field_changes::diff_fields;
pub use mapping::{entities_for, source_for};
pub use scheduler::Scheduler;
pub use syncer::{EntitySyncer, EntitySyncerFactory, DEADLINE_EXCEEDED_REASON, ORPHAN_REASON};
