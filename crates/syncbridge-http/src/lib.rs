//! Rate-limited HTTP client for the sync engine's adapters (spec §4.1).
//!
//! Every external dependency (target, fleet-management, directory) is a
//! [`HostConfig`] whose calls flow through a per-host `tower::Service`
//! stack: a token-bucket rate limiter, a concurrency-capping bulkhead, a
//! hard per-call timeout, and a retry layer, in that order, wrapping a
//! `reqwest`-backed [`Transport`]. One [`SyncHttpClient`] owns all of a
//! process's host stacks, built lazily and reused across calls.
//!
//! ```no_run
//! use syncbridge_http::{HostConfig, SyncHttpClient};
//! use syncbridge_http::{HttpMethod, HttpRequest};
//! use syncbridge_core::Settings;
//!
//! # async fn example() -> Result<(), syncbridge_core::SyncError> {
//! let settings = Settings::default();
//! let client = SyncHttpClient::new(reqwest::Client::new(), settings.max_response_bytes);
//! let host = HostConfig::from_settings("target.example.com", &settings);
//!
//! let req = HttpRequest::new(
//!     HttpMethod::Get,
//!     "target.example.com",
//!     "https://target.example.com/employees",
//!     "/employees",
//! );
//! let response = client.send(&host, req).await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

mod call_log;
mod client;
mod config;
mod health;
mod request;
mod transport;

pub use call_log::{ApiCallFilter, ApiCallLog};
pub use client::SyncHttpClient;
pub use config::HostConfig;
pub use health::DependencyHealthRegistry;
pub use request::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::Transport;

#[cfg(test)]
mod tests {
    use super::*;
    use syncbridge_core::{Settings, SyncError};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn builds_and_reuses_one_stack_per_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .mount(&server)
            .await;

        let settings = Settings::default();
        let client = SyncHttpClient::new(reqwest::Client::new(), settings.max_response_bytes);
        let host = HostConfig::from_settings(server.address().to_string(), &settings);

        let req = HttpRequest::new(HttpMethod::Get, host.host.clone(), format!("{}/ping", server.uri()), "/ping");
        let response = client.send(&host, req.clone()).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"pong");

        // Second call against the same host reuses the cached stack rather
        // than rebuilding it — this would panic on a bucket/semaphore
        // double-init bug if it didn't.
        let response = client.send(&host, req).await.unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn server_errors_are_retried_and_then_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut settings = Settings::default();
        settings.max_attempts = 2;
        settings.base_backoff = std::time::Duration::from_millis(1);
        let client = SyncHttpClient::new(reqwest::Client::new(), settings.max_response_bytes);
        let host = HostConfig::from_settings(server.address().to_string(), &settings);

        let req = HttpRequest::new(HttpMethod::Get, host.host.clone(), format!("{}/flaky", server.uri()), "/flaky");
        let result = client.send(&host, req).await;
        assert!(matches!(
            result.unwrap_err(),
            SyncError::DependencyUnavailable { .. }
        ));
    }

    #[test]
    fn get_and_delete_are_naturally_idempotent() {
        let req = HttpRequest::new(HttpMethod::Get, "h", "http://h/x", "/x");
        assert!(req.is_idempotent());

        let req = HttpRequest::new(HttpMethod::Post, "h", "http://h/x", "/x");
        assert!(!req.is_idempotent());

        let req = HttpRequest::new(HttpMethod::Post, "h", "http://h/x", "/x")
            .with_idempotency_key("abc-123");
        assert!(req.is_idempotent());
    }
}
