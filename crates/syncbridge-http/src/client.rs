//! Builds and caches one resilience stack per host (spec §4.1: "one client
//! instance per external host").

use crate::call_log::ApiCallLog;
use crate::config::HostConfig;
use crate::health::DependencyHealthRegistry;
use crate::request::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;
use syncbridge_bulkhead::BulkheadConfig;
use syncbridge_core::{ApiCallRecord, SyncError};
use syncbridge_ratelimiter::RateLimiterLayer;
use syncbridge_retry::RetryLayer;
use syncbridge_timelimiter::{TimeLimiterError, TimeLimiterLayer};
use tower::util::BoxCloneService;
use tower::{Layer, Service, ServiceBuilder, ServiceExt};
use uuid::Uuid;

type HostService = BoxCloneService<HttpRequest, HttpResponse, SyncError>;

/// Owns one [`HostService`] per host, built lazily from [`HostConfig`] the
/// first time that host is used and reused for every later call.
pub struct SyncHttpClient {
    reqwest: reqwest::Client,
    max_response_bytes: u64,
    services: Mutex<HashMap<String, HostService>>,
    call_log: ApiCallLog,
    dependency_health: DependencyHealthRegistry,
}

impl SyncHttpClient {
    pub fn new(reqwest_client: reqwest::Client, max_response_bytes: u64) -> Self {
        Self {
            reqwest: reqwest_client,
            max_response_bytes,
            services: Mutex::new(HashMap::new()),
            call_log: ApiCallLog::new(),
            dependency_health: DependencyHealthRegistry::new(),
        }
    }

    pub fn call_log(&self) -> &ApiCallLog {
        &self.call_log
    }

    pub fn dependency_health(&self) -> &DependencyHealthRegistry {
        &self.dependency_health
    }

    /// Sends one request through the named host's stack, building the
    /// stack on first use, and records the outcome for `/api-calls` and
    /// `/dependencies/health`.
    pub async fn send(&self, config: &HostConfig, req: HttpRequest) -> Result<HttpResponse, SyncError> {
        let mut service = {
            let mut services = self.services.lock().unwrap();
            services
                .entry(config.host.clone())
                .or_insert_with(|| self.build_stack(config))
                .clone()
        };

        let started = Instant::now();
        let correlation_id = Uuid::now_v7();
        let host = config.host.clone();
        let method = req.method.as_str().to_string();
        let path_template = req.path_template.clone();
        let result = service.ready().await?.call(req).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (status_code, error) = match &result {
            Ok(response) => {
                self.dependency_health.record_success(&host);
                (Some(response.status), None)
            }
            Err(err) => {
                self.dependency_health.record_failure(&host, &err.to_string());
                (None, Some(err.to_string()))
            }
        };
        self.call_log.push(ApiCallRecord {
            id: Uuid::now_v7(),
            service: host,
            method,
            path_template,
            status_code,
            elapsed_ms,
            attempt: 1,
            correlation_id: correlation_id.to_string(),
            timestamp: chrono::Utc::now(),
            error,
        });

        result
    }

    fn build_stack(&self, config: &HostConfig) -> HostService {
        let transport = Transport::new(self.reqwest.clone(), self.max_response_bytes);

        let rate_limiter = RateLimiterLayer::builder()
            .rps(config.rps)
            .burst(config.burst)
            .queue_timeout(config.queue_timeout)
            .host(config.host.clone())
            .build();

        let bulkhead = BulkheadConfig::builder()
            .max_concurrent_calls(config.max_concurrent_calls)
            .max_wait_duration(Some(config.queue_timeout))
            .host(config.host.clone())
            .build();

        let time_limiter = TimeLimiterLayer::builder()
            .timeout_duration(config.call_timeout)
            .host(config.host.clone())
            .build();

        let max_attempts = config.max_attempts;
        let retry = RetryLayer::<HttpRequest, SyncError>::builder()
            .max_attempts_fn(move |req: &HttpRequest| if req.is_idempotent() { max_attempts } else { 1 })
            .exponential_backoff(config.base_backoff)
            .retry_on(|err: &SyncError| {
                matches!(
                    err,
                    SyncError::Transport { .. }
                        | SyncError::RateLimited { .. }
                        | SyncError::DependencyUnavailable { .. }
                )
            })
            .retry_after(|err: &SyncError| match err {
                SyncError::RateLimited { retry_after, .. } => *retry_after,
                _ => None,
            })
            .host(config.host.clone())
            .build();

        let stack = ServiceBuilder::new()
            .layer(rate_limiter)
            .layer(bulkhead)
            .map_err(|err: TimeLimiterError<SyncError>| SyncError::from(err))
            .layer(time_limiter)
            .layer(retry)
            .service(transport);

        BoxCloneService::new(stack)
    }
}
