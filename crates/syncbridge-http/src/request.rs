//! The request/response envelope that flows through the resilience stack.
//!
//! A plain `reqwest::Request` doesn't carry enough context for the
//! structured per-call log event spec §4.1 asks for (path template,
//! correlation id, attempt count), so adapters build one of these instead
//! and the [`crate::Transport`] at the bottom of the stack turns it into an
//! actual wire call.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// §4.1: only safe methods, or a `POST` carrying an idempotency key,
    /// are retried past a connect-time failure.
    pub fn is_naturally_idempotent(self) -> bool {
        !matches!(self, HttpMethod::Post | HttpMethod::Patch)
    }
}

/// One logical HTTP call. Cloned once per retry attempt by
/// `syncbridge-retry`; the shared `attempt` counter lets the transport
/// report which physical attempt a given wire call was.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub host: String,
    pub url: String,
    /// Route shape with path parameters elided (`/employees/{id}`), used in
    /// logs and metrics instead of the literal URL so cardinality stays
    /// bounded.
    pub path_template: String,
    pub body: Option<Vec<u8>>,
    pub idempotency_key: Option<String>,
    pub bearer_token: Option<String>,
    pub correlation_id: Uuid,
    attempt: Arc<AtomicU32>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, host: impl Into<String>, url: impl Into<String>, path_template: impl Into<String>) -> Self {
        Self {
            method,
            host: host.into(),
            url: url.into(),
            path_template: path_template.into(),
            body: None,
            idempotency_key: None,
            bearer_token: None,
            correlation_id: Uuid::now_v7(),
            attempt: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_json_body(mut self, body: &impl serde::Serialize) -> serde_json::Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Per §4.1: a non-idempotent `POST`/`PATCH` without an idempotency key
    /// is capped to a single attempt, since a retry after a connect
    /// failure can't prove the first attempt never reached the server.
    pub fn is_idempotent(&self) -> bool {
        self.method.is_naturally_idempotent() || self.idempotency_key.is_some()
    }

    /// Called by the transport on every physical send; returns the attempt
    /// number for the structured log event (1-based).
    pub(crate) fn next_attempt(&self) -> u32 {
        self.attempt.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}
