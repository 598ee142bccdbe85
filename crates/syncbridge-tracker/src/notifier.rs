//! Notification delivery (spec §4.5), abstracted behind a trait so tests
//! substitute a recording fake instead of sending real mail or webhooks.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Mutex;
use syncbridge_core::{Notification, SyncError};
use syncbridge_http::{HostConfig, HttpMethod, HttpRequest, SyncHttpClient};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification, body: &str) -> Result<(), SyncError>;
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(host: &str, port: u16, user: &str, password: &str, from: &str) -> Result<Self, SyncError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|err| SyncError::Internal { message: format!("invalid smtp relay {host}: {err}") })?
            .port(port)
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();

        let from = from.parse().map_err(|err| SyncError::Internal {
            message: format!("invalid smtp from address {from}: {err}"),
        })?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification, body: &str) -> Result<(), SyncError> {
        let to: Mailbox = notification.recipient.parse().map_err(|err| SyncError::Internal {
            message: format!("invalid recipient {}: {err}", notification.recipient),
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notification.subject.clone())
            .body(body.to_string())
            .map_err(|err| SyncError::Internal { message: format!("failed to build notification email: {err}") })?;

        self.transport
            .send(message)
            .await
            .map_err(|err| SyncError::DependencyUnavailable { service: "smtp".into(), message: err.to_string() })?;
        Ok(())
    }
}

/// Delivers notifications as a JSON POST, reusing the rate-limited HTTP
/// client so webhook calls get the same resilience policy as every other
/// external call (spec §4.5's implementation note).
pub struct WebhookNotifier {
    client: std::sync::Arc<SyncHttpClient>,
    host: HostConfig,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: std::sync::Arc<SyncHttpClient>, host: HostConfig, url: impl Into<String>) -> Self {
        Self { client, host, url: url.into() }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification, body: &str) -> Result<(), SyncError> {
        let payload = serde_json::json!({
            "type": notification.kind,
            "subject": notification.subject,
            "body": body,
            "error_count": notification.error_count,
        });

        let req = HttpRequest::new(HttpMethod::Post, self.host.host.clone(), self.url.clone(), "/webhook")
            .with_json_body(&payload)
            .map_err(|err| SyncError::Internal { message: format!("failed to serialize webhook payload: {err}") })?;

        self.client.send(&self.host, req).await.map(|_| ())
    }
}

/// Records every notification it's handed instead of sending it anywhere.
/// Used by tests and by `ErrorNotifier` construction sites that haven't
/// configured a real transport.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification, _body: &str) -> Result<(), SyncError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
