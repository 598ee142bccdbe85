//! The innermost `tower::Service`: turns an [`HttpRequest`] into a real
//! `reqwest` call, truncating oversized responses and mapping failures
//! into the shared [`SyncError`] taxonomy (spec §7) directly — everything
//! above this layer only ever sees `SyncError`.

use crate::request::{HttpRequest, HttpResponse};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::StreamExt;
use std::task::{Context, Poll};
use std::time::Instant;
use syncbridge_core::SyncError;
use tower::Service;

#[cfg(feature = "tracing")]
use tracing::info;

#[derive(Clone)]
pub struct Transport {
    client: reqwest::Client,
    max_response_bytes: u64,
}

impl Transport {
    pub fn new(client: reqwest::Client, max_response_bytes: u64) -> Self {
        Self {
            client,
            max_response_bytes,
        }
    }
}

impl Service<HttpRequest> for Transport {
    type Response = HttpResponse;
    type Error = SyncError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        let client = self.client.clone();
        let max_response_bytes = self.max_response_bytes;

        Box::pin(async move {
            let attempt = req.next_attempt();
            let start = Instant::now();

            let mut builder = client.request(req.method.as_reqwest(), &req.url);
            if let Some(body) = req.body.clone() {
                builder = builder
                    .header("content-type", "application/json")
                    .body(body);
            }
            if let Some(key) = &req.idempotency_key {
                builder = builder.header("idempotency-key", key.clone());
            }
            if let Some(token) = &req.bearer_token {
                builder = builder.bearer_auth(token);
            }
            builder = builder.header("x-correlation-id", req.correlation_id.to_string());

            let result = client_send(builder, max_response_bytes).await;
            let elapsed = start.elapsed();

            #[cfg(feature = "tracing")]
            info!(
                method = req.method.as_str(),
                host = %req.host,
                path = %req.path_template,
                attempt,
                elapsed_ms = elapsed.as_millis() as u64,
                correlation_id = %req.correlation_id,
                status = result.as_ref().ok().map(|r: &HttpResponse| r.status),
                "http call",
            );

            result.map_err(|err| annotate_host(err, &req.host))
        })
    }
}

async fn client_send(
    builder: reqwest::RequestBuilder,
    max_response_bytes: u64,
) -> Result<HttpResponse, SyncError> {
    let response = builder.send().await.map_err(|err| SyncError::Transport {
        host: err.url().map(|u| u.to_string()).unwrap_or_default(),
        message: err.to_string(),
    })?;

    let status = response.status();
    let mut stream = response.bytes_stream();
    let mut body = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk: Bytes = chunk.map_err(|err| SyncError::Transport {
            host: String::new(),
            message: err.to_string(),
        })?;
        if body.len() as u64 + chunk.len() as u64 > max_response_bytes {
            let remaining = (max_response_bytes - body.len() as u64) as usize;
            body.extend_from_slice(&chunk[..remaining.min(chunk.len())]);
            break;
        }
        body.extend_from_slice(&chunk);
    }

    status_to_result(status.as_u16(), body)
}

/// Maps an HTTP status into the taxonomy per §7: 429 and 5xx (other than
/// 501/505, which indicate a permanently unsupported request, not a
/// transient failure) are retried upstream; everything else surfaces as-is.
fn status_to_result(status: u16, body: Vec<u8>) -> Result<HttpResponse, SyncError> {
    match status {
        200..=299 => Ok(HttpResponse { status, body }),
        429 => Err(SyncError::RateLimited {
            host: String::new(),
            retry_after: None,
        }),
        501 | 505 => Ok(HttpResponse { status, body }),
        500..=599 => Err(SyncError::DependencyUnavailable {
            service: String::new(),
            message: format!("upstream returned {status}"),
        }),
        401 | 403 => Err(SyncError::AuthFailed {
            service: String::new(),
        }),
        _ => Ok(HttpResponse { status, body }),
    }
}

fn annotate_host(err: SyncError, host: &str) -> SyncError {
    match err {
        SyncError::Transport { message, .. } => SyncError::Transport {
            host: host.to_string(),
            message,
        },
        SyncError::RateLimited { retry_after, .. } => SyncError::RateLimited {
            host: host.to_string(),
            retry_after,
        },
        SyncError::DependencyUnavailable { message, .. } => SyncError::DependencyUnavailable {
            service: host.to_string(),
            message,
        },
        SyncError::AuthFailed { .. } => SyncError::AuthFailed {
            service: host.to_string(),
        },
        other => other,
    }
}
