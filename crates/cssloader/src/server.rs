use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use tokio::sync::{Mutex, oneshot};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::catalog::CatalogClient;
use crate::handlers;
use crate::scheduler::SchedulerHandle;
use crate::theme::ThemeManager;

/// Requests handled at once by the API routes.
const MAX_CONCURRENT_REQUESTS: usize = 32;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Every theme write goes through here.
    pub themes: ThemeManager,
    pub catalog: Arc<CatalogClient>,
    /// `None` when the scheduler is disabled in config.
    pub scheduler: Option<SchedulerHandle>,
    pub admin_token: Option<String>,
    pub shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

// ============================================================================
// Server Setup
// ============================================================================

/// Create a shutdown channel pair.
///
/// Returns (sender for AppState, receiver for shutdown_signal).
pub fn shutdown_channel() -> (oneshot::Sender<()>, oneshot::Receiver<()>) {
    oneshot::channel()
}

pub fn build_app(state: AppState, request_timeout_seconds: u64) -> Router {
    let api_v1 = Router::new()
        .route(
            "/schedule",
            get(handlers::v1::list_schedule).post(handlers::v1::create_schedule),
        )
        .route(
            "/schedule/{id}",
            put(handlers::v1::upsert_schedule).delete(handlers::v1::delete_schedule),
        )
        .route(
            "/presets",
            get(handlers::v1::list_presets).post(handlers::v1::create_preset),
        )
        .route("/presets/apply", post(handlers::v1::apply_preset))
        .route("/themes", get(handlers::v1::list_themes))
        .route("/themes/install", post(handlers::v1::install_theme))
        .route("/themes/reload", post(handlers::v1::reload_themes))
        .route(
            "/themes/{name}",
            put(handlers::v1::set_theme).delete(handlers::v1::delete_theme),
        )
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_seconds),
        ))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS));

    // Admin routes (no timeout, state required for shutdown)
    let admin_routes = Router::new()
        .route("/shutdown", post(handlers::shutdown))
        .with_state(state.clone());

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .route("/version", get(handlers::version))
        .with_state(state)
        .nest("/api/v1", api_v1)
        .nest("/api/admin/v1", admin_routes)
}
