//! OAuth2 client-credentials token fetch for the directory dependency.
//! The directory is tenant-scoped and authenticates differently from the
//! target/fleet's static bearer tokens, so it gets its own small helper
//! rather than folding an OAuth flow into [`crate::HttpAdapter`].

use serde::Deserialize;
use std::sync::Arc;
use syncbridge_core::SyncError;
use syncbridge_http::{HostConfig, HttpMethod, HttpRequest, SyncHttpClient};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Performs one client-credentials grant against
/// `{base_url}/{tenant}/oauth2/token` and returns the bearer token to hand
/// to [`crate::HttpAdapter::new`]. Tokens are fetched once at startup; a
/// directory adapter whose token expires mid-run surfaces as `auth_failed`
/// on its next call and aborts the syncer per spec §4.7, rather than this
/// module silently refreshing behind the engine's back.
pub async fn fetch_client_credentials_token(
    client: &Arc<SyncHttpClient>,
    host: &HostConfig,
    base_url: &str,
    tenant: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String, SyncError> {
    let url = format!("{}/{tenant}/oauth2/token", base_url.trim_end_matches('/'));
    let body = serde_json::json!({
        "grant_type": "client_credentials",
        "client_id": client_id,
        "client_secret": client_secret,
    });

    let req = HttpRequest::new(HttpMethod::Post, host.host.clone(), url, "/{tenant}/oauth2/token")
        .with_json_body(&body)
        .map_err(|err| SyncError::Internal {
            message: format!("failed to serialize directory token request: {err}"),
        })?;

    let response = client.send(host, req).await?;
    if response.status != 200 {
        return Err(SyncError::AuthFailed { service: "directory".into() });
    }

    response
        .json::<TokenResponse>()
        .map(|parsed| parsed.access_token)
        .map_err(|err| SyncError::Internal {
            message: format!("malformed directory token response: {err}"),
        })
}
