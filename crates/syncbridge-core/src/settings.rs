//! Settings & Secret Resolver (spec §2.1).
//!
//! Loads configuration once at startup into an immutable [`Settings`] value
//! behind an `Arc`. There is no hot-reload: the process-wide reload story is
//! "restart the process", per spec. Layering order (lowest to highest
//! precedence): built-in defaults → TOML file → `SYNC_`-prefixed environment
//! variables. CLI-flag overrides are applied by the caller (`syncbridge`'s
//! `main.rs`) via [`SettingsBuilder`] setters after [`SettingsBuilder::from_env`].

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Secret values never appear in `Debug` output or in structured logs.
#[derive(Clone, Default)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "Secret(<empty>)")
        } else {
            write!(f, "Secret(<redacted>)")
        }
    }
}

/// Base URL + bearer token for one HTTP dependency.
#[derive(Debug, Clone, Default)]
pub struct EndpointCredential {
    pub base_url: String,
    pub token: Secret,
}

/// The immutable, process-wide settings value produced by [`SettingsBuilder::build`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub sync_interval: Duration,
    pub sync_workers: usize,
    pub entity_concurrency: usize,
    pub cache_ttl_hours: u64,
    pub cache_namespace: String,
    pub notification_cooldown: Duration,
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub queue_timeout: Duration,
    pub max_response_bytes: u64,
    pub http_rps_per_host: f64,
    pub http_burst_per_host: u32,

    pub target: EndpointCredential,
    pub fleet: EndpointCredential,
    pub directory_base_url: String,
    pub directory_tenant: String,
    pub directory_client_id: String,
    pub directory_client_secret: Secret,
    pub erp_database_dsn: Secret,
    pub erp_pool_size: u32,
    pub erp_acquire_timeout: Duration,
    pub erp_statement_timeout: Duration,

    pub remote_cache_url: String,
    pub remote_cache_password: Option<Secret>,

    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: Secret,
    pub notification_recipients: Vec<String>,

    pub structured_logging_enabled: bool,
    pub deletes_enabled: bool,
    pub pause_default: bool,

    pub validator_email_domain: String,
    pub operator_tokens: Vec<Secret>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(900),
            sync_workers: 4,
            entity_concurrency: 8,
            cache_ttl_hours: 6,
            cache_namespace: "syncbridge".into(),
            notification_cooldown: Duration::from_secs(3600),
            max_attempts: 5,
            base_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(30),
            queue_timeout: Duration::from_secs(5),
            max_response_bytes: 10 * 1024 * 1024,
            http_rps_per_host: 10.0,
            http_burst_per_host: 20,

            target: EndpointCredential::default(),
            fleet: EndpointCredential::default(),
            directory_base_url: String::new(),
            directory_tenant: String::new(),
            directory_client_id: String::new(),
            directory_client_secret: Secret::default(),
            erp_database_dsn: Secret::default(),
            erp_pool_size: 10,
            erp_acquire_timeout: Duration::from_secs(5),
            erp_statement_timeout: Duration::from_secs(10),

            remote_cache_url: "redis://127.0.0.1:6379".into(),
            remote_cache_password: None,

            smtp_host: String::new(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_password: Secret::default(),
            notification_recipients: Vec::new(),

            structured_logging_enabled: true,
            deletes_enabled: false,
            pause_default: false,

            validator_email_domain: "example.com".into(),
            operator_tokens: Vec::new(),
        }
    }
}

/// The subset of [`Settings`] expressible in a `--config` TOML file.
/// Credentials are deliberately absent here — they're expected from
/// environment variables or a secrets manager, not a file an operator
/// might commit by accident.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct TomlSettings {
    sync_interval_seconds: Option<u64>,
    sync_workers: Option<usize>,
    entity_concurrency: Option<usize>,
    cache_ttl_hours: Option<u64>,
    cache_namespace: Option<String>,
    notification_cooldown_seconds: Option<u64>,
    max_attempts: Option<u32>,
    base_backoff_ms: Option<u64>,
    max_backoff_ms: Option<u64>,
    queue_timeout_ms: Option<u64>,
    max_response_bytes: Option<u64>,
    http_rps_per_host: Option<f64>,
    http_burst_per_host: Option<u32>,
    structured_logging_enabled: Option<bool>,
    deletes_enabled: Option<bool>,
    pause_default: Option<bool>,
    validator_email_domain: Option<String>,
}

/// Builds a [`Settings`] value by layering defaults, environment variables,
/// and caller-supplied overrides, mirroring the teacher's builder-pattern
/// config objects (e.g. `RateLimiterConfigBuilder`).
pub struct SettingsBuilder {
    settings: Settings,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }

    /// Applies overrides from an optional TOML file (spec §6: "built-in
    /// defaults → an optional TOML file path"), meant to run before
    /// [`Self::from_env`] in the layering chain so environment variables
    /// still win. A missing file is not an error — `--config` is
    /// optional — but a present, malformed one is, since silently
    /// ignoring a typo'd config file is worse than failing fast at
    /// startup.
    pub fn from_toml_file(mut self, path: &Path) -> Result<Self, String> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(self),
            Err(err) => return Err(format!("reading config file {}: {err}", path.display())),
        };
        let parsed: TomlSettings = toml::from_str(&text).map_err(|err| format!("parsing config file {}: {err}", path.display()))?;

        if let Some(v) = parsed.sync_interval_seconds {
            self.settings.sync_interval = Duration::from_secs(v);
        }
        if let Some(v) = parsed.sync_workers {
            self.settings.sync_workers = v;
        }
        if let Some(v) = parsed.entity_concurrency {
            self.settings.entity_concurrency = v;
        }
        if let Some(v) = parsed.cache_ttl_hours {
            self.settings.cache_ttl_hours = v;
        }
        if let Some(v) = parsed.cache_namespace {
            self.settings.cache_namespace = v;
        }
        if let Some(v) = parsed.notification_cooldown_seconds {
            self.settings.notification_cooldown = Duration::from_secs(v);
        }
        if let Some(v) = parsed.max_attempts {
            self.settings.max_attempts = v;
        }
        if let Some(v) = parsed.base_backoff_ms {
            self.settings.base_backoff = Duration::from_millis(v);
        }
        if let Some(v) = parsed.max_backoff_ms {
            self.settings.max_backoff = Duration::from_millis(v);
        }
        if let Some(v) = parsed.queue_timeout_ms {
            self.settings.queue_timeout = Duration::from_millis(v);
        }
        if let Some(v) = parsed.max_response_bytes {
            self.settings.max_response_bytes = v;
        }
        if let Some(v) = parsed.http_rps_per_host {
            self.settings.http_rps_per_host = v;
        }
        if let Some(v) = parsed.http_burst_per_host {
            self.settings.http_burst_per_host = v;
        }
        if let Some(v) = parsed.structured_logging_enabled {
            self.settings.structured_logging_enabled = v;
        }
        if let Some(v) = parsed.deletes_enabled {
            self.settings.deletes_enabled = v;
        }
        if let Some(v) = parsed.pause_default {
            self.settings.pause_default = v;
        }
        if let Some(v) = parsed.validator_email_domain {
            self.settings.validator_email_domain = v;
        }

        Ok(self)
    }

    /// Applies `SYNC_*` environment variable overrides on top of the
    /// current values. Unknown or malformed variables are ignored rather
    /// than failing startup — an operator fixing a typo shouldn't need to
    /// decode a panic first.
    pub fn from_env(mut self) -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();

        if let Some(v) = env.get("SYNC_INTERVAL_SECONDS").and_then(|s| s.parse().ok()) {
            self.settings.sync_interval = Duration::from_secs(v);
        }
        if let Some(v) = env.get("SYNC_WORKERS").and_then(|s| s.parse().ok()) {
            self.settings.sync_workers = v;
        }
        if let Some(v) = env
            .get("SYNC_ENTITY_CONCURRENCY")
            .and_then(|s| s.parse().ok())
        {
            self.settings.entity_concurrency = v;
        }
        if let Some(v) = env.get("SYNC_CACHE_TTL_HOURS").and_then(|s| s.parse().ok()) {
            self.settings.cache_ttl_hours = v;
        }
        if let Some(v) = env.get("SYNC_CACHE_NAMESPACE") {
            self.settings.cache_namespace = v.clone();
        }
        if let Some(v) = env.get("SYNC_MAX_ATTEMPTS").and_then(|s| s.parse().ok()) {
            self.settings.max_attempts = v;
        }
        if let Some(v) = env.get("SYNC_HTTP_RPS_PER_HOST").and_then(|s| s.parse().ok()) {
            self.settings.http_rps_per_host = v;
        }
        if let Some(v) = env
            .get("SYNC_HTTP_BURST_PER_HOST")
            .and_then(|s| s.parse().ok())
        {
            self.settings.http_burst_per_host = v;
        }
        if let Some(v) = env.get("SYNC_TARGET_BASE_URL") {
            self.settings.target.base_url = v.clone();
        }
        if let Some(v) = env.get("SYNC_TARGET_TOKEN") {
            self.settings.target.token = Secret::new(v.clone());
        }
        if let Some(v) = env.get("SYNC_FLEET_BASE_URL") {
            self.settings.fleet.base_url = v.clone();
        }
        if let Some(v) = env.get("SYNC_FLEET_TOKEN") {
            self.settings.fleet.token = Secret::new(v.clone());
        }
        if let Some(v) = env.get("SYNC_DIRECTORY_BASE_URL") {
            self.settings.directory_base_url = v.clone();
        }
        if let Some(v) = env.get("SYNC_DIRECTORY_TENANT") {
            self.settings.directory_tenant = v.clone();
        }
        if let Some(v) = env.get("SYNC_DIRECTORY_CLIENT_ID") {
            self.settings.directory_client_id = v.clone();
        }
        if let Some(v) = env.get("SYNC_DIRECTORY_CLIENT_SECRET") {
            self.settings.directory_client_secret = Secret::new(v.clone());
        }
        if let Some(v) = env.get("SYNC_ERP_DATABASE_DSN") {
            self.settings.erp_database_dsn = Secret::new(v.clone());
        }
        if let Some(v) = env.get("SYNC_ERP_POOL_SIZE").and_then(|s| s.parse().ok()) {
            self.settings.erp_pool_size = v;
        }
        if let Some(v) = env
            .get("SYNC_ERP_ACQUIRE_TIMEOUT_SECONDS")
            .and_then(|s| s.parse().ok())
        {
            self.settings.erp_acquire_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env
            .get("SYNC_ERP_STATEMENT_TIMEOUT_SECONDS")
            .and_then(|s| s.parse().ok())
        {
            self.settings.erp_statement_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env.get("SYNC_REMOTE_CACHE_URL") {
            self.settings.remote_cache_url = v.clone();
        }
        if let Some(v) = env.get("SYNC_REMOTE_CACHE_PASSWORD") {
            self.settings.remote_cache_password = Some(Secret::new(v.clone()));
        }
        if let Some(v) = env.get("SYNC_SMTP_HOST") {
            self.settings.smtp_host = v.clone();
        }
        if let Some(v) = env.get("SYNC_SMTP_PORT").and_then(|s| s.parse().ok()) {
            self.settings.smtp_port = v;
        }
        if let Some(v) = env.get("SYNC_NOTIFICATION_RECIPIENTS") {
            self.settings.notification_recipients =
                v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(v) = env.get("SYNC_DELETES_ENABLED").and_then(|s| s.parse().ok()) {
            self.settings.deletes_enabled = v;
        }
        if let Some(v) = env.get("SYNC_PAUSE_DEFAULT").and_then(|s| s.parse().ok()) {
            self.settings.pause_default = v;
        }
        if let Some(v) = env.get("SYNC_VALIDATOR_EMAIL_DOMAIN") {
            self.settings.validator_email_domain = v.clone();
        }
        if let Some(v) = env.get("SYNC_OPERATOR_TOKENS") {
            self.settings.operator_tokens =
                v.split(',').map(|s| Secret::new(s.trim())).collect();
        }

        self
    }

    pub fn sync_interval(mut self, d: Duration) -> Self {
        self.settings.sync_interval = d;
        self
    }

    pub fn pause_default(mut self, paused: bool) -> Self {
        self.settings.pause_default = paused;
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_debug_never_prints_the_value() {
        let secret = Secret::new("super-sekrit");
        assert!(!format!("{secret:?}").contains("super-sekrit"));
    }

    #[test]
    fn defaults_are_sane() {
        let settings = SettingsBuilder::new().build();
        assert!(!settings.deletes_enabled);
        assert!(settings.max_attempts >= 1);
        assert!(settings.cache_ttl_hours > 0);
    }

    #[test]
    fn builder_setters_override_defaults() {
        let settings = SettingsBuilder::new()
            .sync_interval(Duration::from_secs(60))
            .pause_default(true)
            .build();
        assert_eq!(settings.sync_interval, Duration::from_secs(60));
        assert!(settings.pause_default);
    }

    #[test]
    fn missing_config_file_is_not_an_error() {
        let settings = SettingsBuilder::new().from_toml_file(Path::new("/nonexistent/syncbridge.toml")).unwrap().build();
        assert_eq!(settings.sync_interval, Settings::default().sync_interval);
    }

    #[test]
    fn toml_file_overrides_defaults_and_env_still_wins_after() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syncbridge.toml");
        std::fs::write(&path, "sync_interval_seconds = 42\ndeletes_enabled = true\n").unwrap();

        let settings = SettingsBuilder::new().from_toml_file(&path).unwrap().build();
        assert_eq!(settings.sync_interval, Duration::from_secs(42));
        assert!(settings.deletes_enabled);
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syncbridge.toml");
        std::fs::write(&path, "not valid toml {{{").unwrap();

        assert!(SettingsBuilder::new().from_toml_file(&path).is_err());
    }
}
