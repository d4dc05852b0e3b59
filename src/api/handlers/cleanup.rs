//! Operator cleanup endpoint handlers.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use super::caller_id;
use crate::api::dto::{DuplicateCleanupRequest, DuplicateCleanupResponse, OrphanCleanupResponse};
use crate::app_state::AppState;
use crate::domain::SessionId;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /cleanup/duplicates` — Sweep duplicated calendar events.
///
/// # Errors
///
/// Returns [`GatewayError`] for non-operator callers, an unknown
/// session, or a failed calendar listing.
#[utoipa::path(
    post,
    path = "/api/v1/cleanup/duplicates",
    tag = "Cleanup",
    summary = "Remove duplicate calendar events",
    description = "Scans the trainer's calendar around a session and deletes every event \
                   duplicating it, keeping only the recorded one.",
    params(
        ("X-User-Id" = uuid::Uuid, Header, description = "Calling user (trainer or admin)"),
    ),
    request_body = DuplicateCleanupRequest,
    responses(
        (status = 200, description = "Sweep finished", body = DuplicateCleanupResponse),
        (status = 403, description = "Caller is not an operator", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 502, description = "Calendar listing failed", body = ErrorResponse),
    )
)]
pub async fn cleanup_duplicates(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DuplicateCleanupRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let caller = caller_id(&headers)?;
    let removed = state
        .cleanup
        .remove_duplicate_events(caller, SessionId::from_uuid(req.session_id))
        .await?;
    Ok(Json(DuplicateCleanupResponse { removed }))
}

/// `POST /cleanup/orphans` — Clear every stored event reference.
///
/// # Errors
///
/// Returns [`GatewayError`] for non-operator callers or a ledger
/// failure.
#[utoipa::path(
    post,
    path = "/api/v1/cleanup/orphans",
    tag = "Cleanup",
    summary = "Clear orphaned event references",
    description = "Clears every stored calendar event reference so the next sync recreates \
                   events from the ledger.",
    params(
        ("X-User-Id" = uuid::Uuid, Header, description = "Calling user (trainer or admin)"),
    ),
    responses(
        (status = 200, description = "References cleared", body = OrphanCleanupResponse),
        (status = 403, description = "Caller is not an operator", body = ErrorResponse),
    )
)]
pub async fn cleanup_orphans(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    let caller = caller_id(&headers)?;
    let cleared = state.cleanup.clear_orphaned_references(caller).await?;
    Ok(Json(OrphanCleanupResponse { cleared }))
}

/// Cleanup routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cleanup/duplicates", post(cleanup_duplicates))
        .route("/cleanup/orphans", post(cleanup_orphans))
}
