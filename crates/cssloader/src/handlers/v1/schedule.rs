//! Scheduled preset change handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::api::{ListScheduleResponse, ScheduleEntry, ScheduleRequest};
use crate::handlers::problem_details;
use crate::scheduler::{ScheduledChange, SchedulerError, SchedulerHandle};
use crate::server::AppState;

pub async fn list_schedule(State(state): State<AppState>) -> Response {
    let scheduler = match scheduler(&state) {
        Ok(s) => s,
        Err(response) => return response,
    };

    match scheduler.list().await {
        Ok(entries) => {
            let entries = entries.iter().map(|c| entry(&state, c)).collect();
            Json(ListScheduleResponse { entries }).into_response()
        }
        Err(e) => scheduler_error(e),
    }
}

/// POST /api/v1/schedule
pub async fn create_schedule(
    State(state): State<AppState>,
    req: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Response {
    let req = match request_body(req) {
        Ok(req) => req,
        Err(response) => return response,
    };
    let change = ScheduledChange::new(req.profile_id, req.hours, req.minutes);
    save(&state, change, StatusCode::CREATED).await
}

/// PUT /api/v1/schedule/{id}
pub async fn upsert_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Response {
    let req = match request_body(req) {
        Ok(req) => req,
        Err(response) => return response,
    };
    let change = ScheduledChange {
        id,
        profile_id: req.profile_id,
        hours: req.hours,
        minutes: req.minutes,
    };
    save(&state, change, StatusCode::OK).await
}

/// DELETE /api/v1/schedule/{id}
pub async fn delete_schedule(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let scheduler = match scheduler(&state) {
        Ok(s) => s,
        Err(response) => return response,
    };

    match scheduler.remove(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => scheduler_error(e),
    }
}

async fn save(state: &AppState, change: ScheduledChange, status: StatusCode) -> Response {
    let scheduler = match scheduler(state) {
        Ok(s) => s,
        Err(response) => return response,
    };

    // Only schedule presets that exist now; they may still vanish later.
    if !state.themes.registry().has_preset(&change.profile_id) {
        return problem_details::not_found(format!("preset '{}' not found", change.profile_id))
            .into_response();
    }

    let body = entry(state, &change);
    match scheduler.upsert(change).await {
        Ok(()) => (status, Json(body)).into_response(),
        Err(e) => scheduler_error(e),
    }
}

fn entry(state: &AppState, change: &ScheduledChange) -> ScheduleEntry {
    let preset_name = state
        .themes
        .registry()
        .find_preset(&change.profile_id)
        .map(|p| p.name);
    ScheduleEntry::new(change, preset_name)
}

/// Malformed bodies, including out-of-range hours or minutes, are a 400
/// problem rather than axum's plain-text rejection.
fn request_body(
    req: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<ScheduleRequest, Response> {
    match req {
        Ok(Json(req)) => Ok(req),
        Err(rejection) => {
            Err(problem_details::bad_request(rejection.body_text()).into_response())
        }
    }
}

fn scheduler(state: &AppState) -> Result<&SchedulerHandle, Response> {
    state.scheduler.as_ref().ok_or_else(|| {
        problem_details::service_unavailable("scheduler is disabled").into_response()
    })
}

fn scheduler_error(e: SchedulerError) -> Response {
    let problem = match &e {
        SchedulerError::InvalidTime { .. } => problem_details::bad_request(e.to_string()),
        SchedulerError::NotFound(_) => problem_details::not_found(e.to_string()),
        SchedulerError::Unavailable => problem_details::service_unavailable(e.to_string()),
        SchedulerError::Persistence(_)
        | SchedulerError::InconsistentState { .. }
        | SchedulerError::Load(_) => problem_details::internal_error(e.to_string()),
    };
    problem.into_response()
}
