//! Typed read/write adapters over the four dependencies this service
//! reconciles (spec §4.3): the writable safety-management target, and the
//! read-only fleet, directory, and ERP sources.
//!
//! All four implement the same [`EntityAdapter`] trait so the sync engine
//! never branches on which dependency it's talking to.

mod adapter;
mod directory_auth;
mod erp;
mod http_adapter;
mod kind;

pub use adapter::{read_only_write_error, DeleteOutcome, EntityAdapter, ListedRecord, WriteOutcome};
pub use directory_auth::fetch_client_credentials_token;
pub use erp::ErpAdapter;
pub use http_adapter::HttpAdapter;
pub use kind::AdapterKind;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_target_is_writable() {
        assert!(AdapterKind::Target.is_writable());
        assert!(!AdapterKind::Fleet.is_writable());
        assert!(!AdapterKind::Directory.is_writable());
        assert!(!AdapterKind::Erp.is_writable());
    }

    #[test]
    fn read_only_write_error_names_the_adapter() {
        let err = read_only_write_error(AdapterKind::Fleet);
        assert!(err.to_string().contains("fleet"));
    }
}
