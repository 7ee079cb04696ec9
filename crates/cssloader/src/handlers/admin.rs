//! Admin handlers for server management.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;

use super::problem_details;
use crate::server::AppState;

/// POST /api/admin/v1/shutdown
///
/// Triggers a graceful server shutdown. If `admin_token` is configured the
/// request must carry `Authorization: Bearer <token>`.
pub async fn shutdown(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if !is_authorized(state.admin_token.as_deref(), &headers) {
        return problem_details::forbidden("admin access denied").into_response();
    }

    if let Some(tx) = state.shutdown_tx.lock().await.take() {
        let _ = tx.send(());
        (StatusCode::OK, "Shutdown initiated").into_response()
    } else {
        problem_details::conflict("shutdown already in progress").into_response()
    }
}

fn is_authorized(admin_token: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = admin_token else {
        return true;
    };

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}
