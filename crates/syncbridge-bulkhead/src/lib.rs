//! Per-host concurrency cap for the syncbridge HTTP client.
//!
//! Each [`BulkheadLayer`] guards exactly one host with a semaphore sized to
//! `Settings::entity_concurrency` (or a per-host override). `syncbridge-http`
//! keeps one of these per host, alongside its token bucket, so a slow
//! dependency's in-flight requests never starve requests to a healthy one.
//!
//! # Basic example
//!
//! ```rust
//! use tower::ServiceBuilder;
//! use syncbridge_bulkhead::BulkheadConfig;
//! use syncbridge_core::SyncError;
//!
//! # async fn example() {
//! let layer = BulkheadConfig::builder()
//!     .max_concurrent_calls(8)
//!     .host("erp.example.com")
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service_fn(|req: String| async move { Ok::<_, SyncError>(req) });
//! # let _ = service;
//! # }
//! ```
//!
//! # Event listeners
//!
//! ```rust
//! use tower::ServiceBuilder;
//! use syncbridge_bulkhead::BulkheadConfig;
//! use syncbridge_core::SyncError;
//!
//! # async fn example() {
//! let layer = BulkheadConfig::builder()
//!     .max_concurrent_calls(8)
//!     .host("erp.example.com")
//!     .on_call_permitted(|concurrent| {
//!         println!("call permitted ({concurrent} concurrent)");
//!     })
//!     .on_call_rejected(|max| {
//!         println!("call rejected (max {max} concurrent)");
//!     })
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service_fn(|req: String| async move { Ok::<_, SyncError>(req) });
//! # let _ = service;
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod layer;
pub mod service;

pub use config::{BulkheadConfig, BulkheadConfigBuilder};
pub use error::{BulkheadError, Result};
pub use events::BulkheadEvent;
pub use layer::BulkheadLayer;
pub use service::Bulkhead;
