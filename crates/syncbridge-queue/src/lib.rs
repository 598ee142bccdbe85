//! Durable failed-record queue (spec §4.6): entities that failed
//! validation or upsert land here with attempt counters and the last
//! error, until a manual or automatic retry clears them.

mod failure;
mod filter;
mod queue;
mod resync;

pub use failure::Failure;
pub use filter::{Page, Paging, QueueFilter};
pub use queue::{FailedRecordQueue, RetryOutcome};
pub use resync::Resync;
