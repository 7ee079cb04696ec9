//! Preset handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::api::{ApplyPresetRequest, CreatePresetRequest, ListPresetsResponse, PresetSummary};
use crate::handlers::problem_details;
use crate::server::AppState;
use crate::theme::{PresetApplier, ThemeError};

pub async fn list_presets(State(state): State<AppState>) -> Json<ListPresetsResponse> {
    Json(presets_response(&state))
}

/// POST /api/v1/presets
///
/// Saves the enabled themes as a new preset and activates it.
pub async fn create_preset(
    State(state): State<AppState>,
    Json(req): Json<CreatePresetRequest>,
) -> Response {
    match state.themes.create_preset(&req.name).await {
        Ok(preset) => (StatusCode::CREATED, Json(PresetSummary::from(&preset))).into_response(),
        Err(e @ ThemeError::InvalidName(_)) => {
            problem_details::bad_request(e.to_string()).into_response()
        }
        Err(e @ ThemeError::AlreadyExists(_)) => {
            problem_details::conflict(e.to_string()).into_response()
        }
        Err(e) => {
            error!(preset = %req.name, error = %e, "Failed to create preset");
            problem_details::internal_error(e.to_string()).into_response()
        }
    }
}

/// POST /api/v1/presets/apply
///
/// `{"name": "None"}` disables every preset.
pub async fn apply_preset(
    State(state): State<AppState>,
    Json(req): Json<ApplyPresetRequest>,
) -> Response {
    match state.themes.apply_preset(&req.name).await {
        Ok(()) => Json(presets_response(&state)).into_response(),
        Err(e @ (ThemeError::PresetNotFound(_) | ThemeError::ThemeNotFound(_))) => {
            problem_details::not_found(e.to_string()).into_response()
        }
        Err(e) => {
            error!(preset = %req.name, error = %e, "Failed to apply preset");
            problem_details::internal_error(e.to_string()).into_response()
        }
    }
}

fn presets_response(state: &AppState) -> ListPresetsResponse {
    let registry = state.themes.registry();
    ListPresetsResponse::new(&registry.presets(), registry.selected_preset())
}
