//! Process entry point (SPEC_FULL §12): parses CLI flags, loads layered
//! settings, constructs every component exactly once, and runs the sync
//! engine's scheduler alongside the control-plane HTTP listener under one
//! Tokio runtime.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use syncbridge_adapters::{AdapterKind, EntityAdapter, ErpAdapter, HttpAdapter};
use syncbridge_cache::{CacheManagerConfig, FreshnessManager};
use syncbridge_control::audit::AuditLog;
use syncbridge_control::rate_limit::LocalRateLimiter;
use syncbridge_control::state::AppState;
use syncbridge_core::{EntityType, SettingsBuilder};
use syncbridge_engine::{EntitySyncerFactory, Scheduler, SessionController};
use syncbridge_http::{HostConfig, SyncHttpClient};
use syncbridge_queue::FailedRecordQueue;
use syncbridge_tracker::{ErrorLog, NotificationLog, Notifier, RecordingNotifier, SmtpNotifier};
use syncbridge_validator::ValidatorConfig;

/// Entity synchronization service: reconciles ERP/fleet/directory sources
/// into the safety-management target on a schedule, and serves an
/// operator control plane alongside it.
#[derive(Parser, Debug)]
#[command(name = "syncbridge")]
struct Args {
    /// Optional TOML settings file, layered under environment overrides.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Address the control-plane HTTP server listens on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen_addr: SocketAddr,

    /// Directory for durable output (change log, error log, cache snapshots).
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Start paused regardless of `SYNC_PAUSE_DEFAULT`.
    #[arg(long)]
    pause: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    let mut builder = SettingsBuilder::new();
    if let Some(path) = &args.config {
        builder = builder.from_toml_file(path).map_err(|err| anyhow::anyhow!(err))?;
    }
    builder = builder.from_env();
    if args.pause {
        builder = builder.pause_default(true);
    }
    let settings = Arc::new(builder.build());

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|err| anyhow::anyhow!("failed to install prometheus recorder: {err}"))?;

    let http_client = Arc::new(SyncHttpClient::new(reqwest::Client::new(), settings.max_response_bytes));

    let target_host = HostConfig::from_settings(host_of(&settings.target.base_url), &settings);
    let fleet_host = HostConfig::from_settings(host_of(&settings.fleet.base_url), &settings);
    let directory_host = HostConfig::from_settings(host_of(&settings.directory_base_url), &settings);

    let target_adapter: Arc<dyn EntityAdapter> = Arc::new(HttpAdapter::new(
        AdapterKind::Target,
        Arc::clone(&http_client),
        target_host,
        settings.target.base_url.clone(),
        settings.target.token.expose().to_string(),
    ));
    let fleet_adapter: Arc<dyn EntityAdapter> = Arc::new(HttpAdapter::new(
        AdapterKind::Fleet,
        Arc::clone(&http_client),
        fleet_host,
        settings.fleet.base_url.clone(),
        settings.fleet.token.expose().to_string(),
    ));

    let directory_token = if settings.directory_client_id.is_empty() {
        String::new()
    } else {
        syncbridge_adapters::fetch_client_credentials_token(
            &http_client,
            &directory_host,
            &settings.directory_base_url,
            &settings.directory_tenant,
            &settings.directory_client_id,
            settings.directory_client_secret.expose(),
        )
        .await?
    };
    let directory_adapter: Arc<dyn EntityAdapter> = Arc::new(HttpAdapter::new(
        AdapterKind::Directory,
        Arc::clone(&http_client),
        directory_host,
        settings.directory_base_url.clone(),
        directory_token,
    ));
    let erp_adapter: Arc<dyn EntityAdapter> = Arc::new(ErpAdapter::connect(&settings).await?);

    let cache = Arc::new(FreshnessManager::new(CacheManagerConfig {
        namespace: settings.cache_namespace.clone(),
        default_ttl: Duration::from_secs(settings.cache_ttl_hours * 3600),
        disk_directory: args.output_dir.join("cache"),
        ..CacheManagerConfig::default()
    }));
    let cache_ttl = Duration::from_secs(settings.cache_ttl_hours * 3600);

    let queue = Arc::new(FailedRecordQueue::new());
    let validator_config = ValidatorConfig::from(settings.as_ref());

    let inner_notifier: Arc<dyn Notifier> = if !settings.smtp_host.is_empty() {
        Arc::new(SmtpNotifier::new(
            &settings.smtp_host,
            settings.smtp_port,
            &settings.smtp_user,
            settings.smtp_password.expose(),
            settings.notification_recipients.first().map(String::as_str).unwrap_or("ops@example.com"),
        )?)
    } else {
        Arc::new(RecordingNotifier::new())
    };
    let notifications = Arc::new(NotificationLog::new(inner_notifier));

    let factories: Vec<EntitySyncerFactory> = EntityType::SYNC_ORDER
        .into_iter()
        .map(|entity_type| EntitySyncerFactory {
            entity_type,
            source: source_adapter(entity_type, &erp_adapter, &fleet_adapter, &directory_adapter),
            target: Arc::clone(&target_adapter),
            cache: Arc::clone(&cache),
            cache_ttl,
            validator_config: validator_config.clone(),
            queue: Arc::clone(&queue),
            deletes_enabled: settings.deletes_enabled,
            entity_concurrency: settings.entity_concurrency,
        })
        .collect();

    let controller = Arc::new(SessionController::new(
        factories,
        Arc::clone(&notifications) as Arc<dyn Notifier>,
        settings.notification_cooldown,
        settings.sync_interval,
        args.output_dir.clone(),
        settings.pause_default,
    ));

    let scheduler = Arc::new(Scheduler::new(Arc::clone(&controller), settings.sync_interval));
    scheduler.start();

    let state = AppState {
        settings: Arc::clone(&settings),
        controller: Arc::clone(&controller),
        scheduler: Arc::clone(&scheduler),
        cache: Arc::clone(&cache),
        queue: Arc::clone(&queue),
        http_client: Arc::clone(&http_client),
        notifications,
        error_log: Arc::new(ErrorLog::new(args.output_dir.clone())),
        audit: Arc::new(AuditLog::new()),
        pause_rate_limiter: Arc::new(LocalRateLimiter::new(1.0, 5)),
        metrics_handle,
        output_dir: args.output_dir.clone(),
    };

    let app = syncbridge_control::app(state);
    let listener = tokio::net::TcpListener::bind(args.listen_addr).await?;
    tracing::info!(addr = %args.listen_addr, "control plane listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();
    Ok(())
}

fn source_adapter(
    entity_type: EntityType,
    erp: &Arc<dyn EntityAdapter>,
    fleet: &Arc<dyn EntityAdapter>,
    directory: &Arc<dyn EntityAdapter>,
) -> Arc<dyn EntityAdapter> {
    match syncbridge_engine::source_for(entity_type) {
        AdapterKind::Erp => Arc::clone(erp),
        AdapterKind::Fleet => Arc::clone(fleet),
        AdapterKind::Directory => Arc::clone(directory),
        AdapterKind::Target => unreachable!("no entity type sources from the writable target"),
    }
}

/// Strips a scheme from a configured base URL down to the bare host
/// `HostConfig` expects as its per-host rate-limiter/bulkhead key.
fn host_of(base_url: &str) -> String {
    base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or(base_url)
        .to_string()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
