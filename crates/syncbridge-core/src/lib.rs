//! Shared types and infrastructure for the syncbridge workspace:
//! - The entity model and closed error taxonomy (spec §3, §7)
//! - The event-listener system used by the cache and tracker
//! - The settings & secret resolver (spec §2.1)

pub mod entity;
pub mod error;
pub mod events;
pub mod session;
pub mod settings;

pub use entity::{fingerprint, Entity, EntityType};
pub use error::{ErrorEnvelope, SyncError};
pub use events::{EventListener, EventListeners, FnListener, TrackerEvent};
pub use session::{
    ApiCallRecord, AuditAction, AuditEntry, ChangeEvent, DependencyHealth, FailedRecord,
    FailedRecordState, FieldChange, FieldFailure, HealthStatus, Notification, NotificationStatus,
    Operation, PauseState, SessionCounts, SessionStatus, SyncSession, SyncType,
};
pub use settings::{EndpointCredential, Secret, Settings, SettingsBuilder};
