//! Installed theme handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::api::{
    InstallThemeRequest, InstallThemeResponse, ListThemesResponse, ReloadThemesResponse,
    SetThemeRequest,
};
use crate::catalog::{self, CatalogError};
use crate::handlers::problem_details;
use crate::server::AppState;
use crate::theme::ThemeError;

pub async fn list_themes(State(state): State<AppState>) -> Json<ListThemesResponse> {
    Json(ListThemesResponse {
        themes: state.themes.registry().snapshot().to_vec(),
    })
}

/// POST /api/v1/themes/reload
pub async fn reload_themes(State(state): State<AppState>) -> Response {
    match state.themes.refresh().await {
        Ok(themes) => Json(ReloadThemesResponse { themes }).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to reload themes");
            problem_details::internal_error("failed to reload themes").into_response()
        }
    }
}

/// PUT /api/v1/themes/{name}
pub async fn set_theme(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<SetThemeRequest>,
) -> Response {
    match state.themes.set_enabled(&name, req.enabled).await {
        Ok(theme) => Json(theme).into_response(),
        Err(ThemeError::ThemeNotFound(_)) => {
            problem_details::not_found(format!("theme '{name}' not found")).into_response()
        }
        Err(e) => {
            error!(theme = %name, error = %e, "Failed to update theme");
            problem_details::internal_error("failed to update theme").into_response()
        }
    }
}

/// DELETE /api/v1/themes/{name}
pub async fn delete_theme(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.themes.delete(&name).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(ThemeError::ThemeNotFound(_)) => {
            problem_details::not_found(format!("theme '{name}' not found")).into_response()
        }
        Err(e @ ThemeError::Bundled(_)) => problem_details::conflict(e.to_string()).into_response(),
        Err(e) => {
            error!(theme = %name, error = %e, "Failed to delete theme");
            problem_details::internal_error("failed to delete theme").into_response()
        }
    }
}

/// POST /api/v1/themes/install
///
/// Downloads a catalog theme and whatever it depends on that is missing.
pub async fn install_theme(
    State(state): State<AppState>,
    Json(req): Json<InstallThemeRequest>,
) -> Response {
    match catalog::install_theme(&state.catalog, &state.themes, &req.id).await {
        Ok(installed) => {
            (StatusCode::CREATED, Json(InstallThemeResponse { installed })).into_response()
        }
        Err(CatalogError::BadStatus { status: 404 }) => {
            problem_details::not_found(format!("catalog theme '{}' not found", req.id))
                .into_response()
        }
        Err(e @ CatalogError::Theme(_)) => {
            error!(id = %req.id, error = %e, "Failed to install theme");
            problem_details::internal_error(e.to_string()).into_response()
        }
        Err(e) => {
            error!(id = %req.id, error = %e, "Catalog install failed");
            problem_details::bad_gateway(e.to_string()).into_response()
        }
    }
}
