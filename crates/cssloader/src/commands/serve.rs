//! Daemon command implementation.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::Mutex;
use tracing::{info, warn};

use cssloader::build_info;
use cssloader::catalog::CatalogClient;
use cssloader::config::Config;
use cssloader::scheduler::{SchedulerConfig, SchedulerService, SystemClock};
use cssloader::server;
use cssloader::store::ThemeStore;
use cssloader::store::file::{FileScheduleStore, FileSettingsStore, FileThemeStore};
use cssloader::theme::{PresetApplier, PresetRegistry, ThemeManager};

pub async fn run(
    config_path: &str,
    host_override: Option<IpAddr>,
    port_override: Option<u16>,
) -> Result<()> {
    let mut config = Config::load(config_path).await?;

    // CLI overrides config
    if let Some(host) = host_override {
        config.server.host = host.to_string();
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }

    let paths = config.paths(Path::new(config_path));
    info!(version = %build_info::version_string(), "Starting cssloader");

    // Load installed themes
    let themes: Arc<dyn ThemeStore> = Arc::new(
        FileThemeStore::new(&paths.themes_dir).with_config_dir(&paths.theme_config_dir),
    );
    let registry = PresetRegistry::new();
    let count = registry
        .refresh(themes.as_ref())
        .await
        .context("Failed to load themes")?;
    info!(
        themes = count,
        presets = registry.presets().len(),
        path = %paths.themes_dir.display(),
        "Loaded themes"
    );

    let manager = ThemeManager::new(themes, registry.clone());
    let applier: Arc<dyn PresetApplier> = Arc::new(manager.clone());

    let catalog = CatalogClient::new(
        &config.catalog.api_url,
        Arc::new(FileSettingsStore::new(&paths.settings)),
    );
    if let Err(e) = catalog.load_short_token().await {
        warn!(error = %e, "Failed to load catalog token");
    }

    let scheduler = if config.scheduler.enabled {
        let service = SchedulerService::new(SchedulerConfig {
            tick_interval: config.scheduler.tick_interval(),
            clock: Arc::new(SystemClock),
            registry: registry.clone(),
            applier,
            store: Arc::new(FileScheduleStore::new(&paths.schedule)),
        });
        Some(service.start().await)
    } else {
        info!("Scheduler disabled");
        None
    };

    // Create shutdown channel for HTTP-triggered shutdown
    let (shutdown_tx, shutdown_rx) = server::shutdown_channel();

    let state = server::AppState {
        themes: manager,
        catalog: Arc::new(catalog),
        scheduler: scheduler.clone(),
        admin_token: config.server.admin_token.clone(),
        shutdown_tx: Arc::new(Mutex::new(Some(shutdown_tx))),
    };

    let app = server::build_app(state, config.server.request_timeout_seconds);

    let ip: IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(ip, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await?;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }

    info!("Server stopped");
    Ok(())
}

/// Stop a running daemon by calling the shutdown endpoint.
pub async fn stop(config_path: &str, port_override: Option<u16>) -> Result<()> {
    let config = Config::load(config_path).await?;
    let port = port_override.unwrap_or(config.server.port);
    let client = cssloader::client::DaemonClient::new(&format!("http://127.0.0.1:{port}"));

    if client.health().await.is_err() {
        anyhow::bail!("No server running on port {}", port);
    }

    client
        .shutdown(config.server.admin_token.as_deref())
        .await
        .context("Failed to stop server")?;

    println!("Shutdown initiated for server on port {port}");
    Ok(())
}

async fn shutdown_signal(http_shutdown: tokio::sync::oneshot::Receiver<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
        _ = http_shutdown => info!("Received shutdown request via HTTP, shutting down..."),
    }
}
