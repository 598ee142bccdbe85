//! REST adapter used for the target, fleet, and directory dependencies
//! (spec §4.3): each is a JSON HTTP API keyed by entity type, differing
//! only in base URL, bearer token, and whether writes are allowed.

use crate::adapter::{read_only_write_error, DeleteOutcome, EntityAdapter, ListedRecord, WriteOutcome};
use crate::kind::AdapterKind;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use syncbridge_core::{EntityType, SyncError};
use syncbridge_http::{HostConfig, HttpMethod, HttpRequest, SyncHttpClient};

/// Page size requested per `list_all` call. A hard cap on the number of
/// pages walked keeps a misbehaving dependency (one that never returns an
/// empty page) from looping a syncer forever.
const PAGE_SIZE: u32 = 200;
const MAX_PAGES: u32 = 5_000;

#[derive(Deserialize)]
struct Page {
    items: Vec<Value>,
    #[serde(default)]
    next_page: Option<u32>,
}

pub struct HttpAdapter {
    kind: AdapterKind,
    client: std::sync::Arc<SyncHttpClient>,
    host: HostConfig,
    base_url: String,
    token: String,
}

impl HttpAdapter {
    pub fn new(
        kind: AdapterKind,
        client: std::sync::Arc<SyncHttpClient>,
        host: HostConfig,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            client,
            host,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, req: HttpRequest) -> HttpRequest {
        if self.token.is_empty() {
            req
        } else {
            req.with_bearer_token(self.token.clone())
        }
    }
}

#[async_trait]
impl EntityAdapter for HttpAdapter {
    fn kind(&self) -> AdapterKind {
        self.kind
    }

    async fn list_all(&self, entity_type: EntityType) -> Result<Vec<ListedRecord>, SyncError> {
        let mut out = Vec::new();
        let mut page = 0u32;

        loop {
            if page >= MAX_PAGES {
                return Err(SyncError::Internal {
                    message: format!("{} exceeded {MAX_PAGES} pages listing {entity_type}", self.kind),
                });
            }

            let path = format!("/{}s?page={page}&page_size={PAGE_SIZE}", entity_type.as_str());
            let req = self.authed(HttpRequest::new(
                HttpMethod::Get,
                self.host.host.clone(),
                self.url(&path),
                format!("/{}s", entity_type.as_str()),
            ));
            let response = self.client.send(&self.host, req).await?;
            let parsed: Page = response
                .json()
                .map_err(|err| SyncError::Internal {
                    message: format!("malformed list page from {}: {err}", self.kind),
                })?;

            let done = parsed.items.is_empty();
            for item in parsed.items {
                let id = item
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| SyncError::DataMissing {
                        message: format!("{} record missing an id field", entity_type),
                    })?;
                out.push(ListedRecord { id, payload: item });
            }

            if done || parsed.next_page.is_none() {
                break;
            }
            page = parsed.next_page.unwrap();
        }

        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    async fn get_by_id(&self, entity_type: EntityType, id: &str) -> Result<Option<Value>, SyncError> {
        let path = format!("/{}s/{id}", entity_type.as_str());
        let req = self.authed(HttpRequest::new(HttpMethod::Get, self.host.host.clone(), self.url(&path), format!("/{}s/{{id}}", entity_type.as_str())));

        match self.client.send(&self.host, req).await {
            Ok(response) if response.status == 404 => Ok(None),
            Ok(response) => response
                .json::<Value>()
                .map(Some)
                .map_err(|err| SyncError::Internal {
                    message: format!("malformed record from {}: {err}", self.kind),
                }),
            Err(err) => Err(err),
        }
    }

    async fn upsert(
        &self,
        entity_type: EntityType,
        id: &str,
        payload: &Value,
        idempotency_key: &str,
    ) -> Result<WriteOutcome, SyncError> {
        if !self.kind.is_writable() {
            return Err(read_only_write_error(self.kind));
        }

        let path = format!("/{}s/{id}", entity_type.as_str());
        let req = HttpRequest::new(HttpMethod::Put, self.host.host.clone(), self.url(&path), format!("/{}s/{{id}}", entity_type.as_str()))
            .with_idempotency_key(idempotency_key)
            .with_json_body(payload)
            .map_err(|err| SyncError::Internal {
                message: format!("failed to serialize {entity_type} payload: {err}"),
            })?;
        let req = self.authed(req);

        let response = self.client.send(&self.host, req).await?;
        match response.status {
            201 => Ok(WriteOutcome::Created),
            200 | 204 => Ok(WriteOutcome::Updated),
            409 => Err(SyncError::Conflict {
                message: format!("{} rejected upsert of {entity_type}/{id} as a conflict", self.kind),
            }),
            422 => Err(SyncError::ValidationFailed {
                entity_type: entity_type.to_string(),
                entity_id: id.to_string(),
                message: String::from_utf8_lossy(&response.body).to_string(),
            }),
            status => Err(SyncError::Internal {
                message: format!("unexpected status {status} upserting {entity_type}/{id} at {}", self.kind),
            }),
        }
    }

    async fn delete(&self, entity_type: EntityType, id: &str) -> Result<DeleteOutcome, SyncError> {
        if !self.kind.is_writable() {
            return Err(read_only_write_error(self.kind));
        }

        let path = format!("/{}s/{id}", entity_type.as_str());
        let req = self.authed(HttpRequest::new(HttpMethod::Delete, self.host.host.clone(), self.url(&path), format!("/{}s/{{id}}", entity_type.as_str())));

        let response = self.client.send(&self.host, req).await?;
        match response.status {
            200 | 204 => Ok(DeleteOutcome::Deleted),
            404 => Ok(DeleteOutcome::NotFound),
            status => Err(SyncError::Internal {
                message: format!("unexpected status {status} deleting {entity_type}/{id} at {}", self.kind),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncbridge_core::Settings;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_and_host(server: &MockServer) -> (std::sync::Arc<SyncHttpClient>, HostConfig) {
        let settings = Settings::default();
        let client = std::sync::Arc::new(SyncHttpClient::new(reqwest::Client::new(), settings.max_response_bytes));
        let host = HostConfig::from_settings(server.address().to_string(), &settings);
        (client, host)
    }

    #[tokio::test]
    async fn lists_a_single_page_sorted_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/employees$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "b", "first_name": "Bea"},
                    {"id": "a", "first_name": "Ann"},
                ],
                "next_page": null,
            })))
            .mount(&server)
            .await;

        let (client, host) = client_and_host(&server);
        let adapter = HttpAdapter::new(AdapterKind::Fleet, client, host.clone(), server.uri(), "");

        let records = adapter.list_all(EntityType::Employee).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[1].id, "b");
    }

    #[tokio::test]
    async fn missing_record_is_none_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/employees/missing$"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (client, host) = client_and_host(&server);
        let adapter = HttpAdapter::new(AdapterKind::Fleet, client, host, server.uri(), "");

        let result = adapter.get_by_id(EntityType::Employee, "missing").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn read_only_adapter_rejects_writes_without_a_network_call() {
        let server = MockServer::start().await;
        let (client, host) = client_and_host(&server);
        let adapter = HttpAdapter::new(AdapterKind::Fleet, client, host, server.uri(), "");

        let result = adapter
            .upsert(EntityType::Employee, "1", &serde_json::json!({}), "key-1")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn upsert_conflict_maps_to_sync_error_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path_regex(r"^/employees/1$"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let (client, host) = client_and_host(&server);
        let adapter = HttpAdapter::new(AdapterKind::Target, client, host, server.uri(), "tok");

        let result = adapter
            .upsert(EntityType::Employee, "1", &serde_json::json!({"first_name": "Ann"}), "key-1")
            .await;
        assert!(matches!(result.unwrap_err(), SyncError::Conflict { .. }));
    }
}
