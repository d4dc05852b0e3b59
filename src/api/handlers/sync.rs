//! Bulk calendar sync endpoint handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{SyncPairRequest, SyncReportResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /sync/sessions` — Converge both calendars for a pair.
///
/// # Errors
///
/// Returns [`GatewayError`] if the session list cannot be read.
/// Per-side calendar failures are reported in the response body.
#[utoipa::path(
    post,
    path = "/api/v1/sync/sessions",
    tag = "Sync",
    summary = "Sync a trainer/client pair",
    description = "Pushes every non-cancelled session between the pair to both calendars, \
                   recreating events whose stored references turned out stale.",
    request_body = SyncPairRequest,
    responses(
        (status = 200, description = "Sync report", body = SyncReportResponse),
        (status = 500, description = "Ledger unavailable", body = ErrorResponse),
    )
)]
pub async fn sync_sessions(
    State(state): State<AppState>,
    Json(req): Json<SyncPairRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let report = state
        .reconciliation
        .sync_pair(req.trainer_id, req.client_id)
        .await?;
    Ok(Json(SyncReportResponse::from(report)))
}

/// Sync routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/sync/sessions", post(sync_sessions))
}
