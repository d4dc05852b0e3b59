//! Reschedule negotiation endpoint handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use super::caller_id;
use crate::api::dto::{
    RescheduleAction, RescheduleRequest, RescheduleRespondRequest, SessionResponse,
};
use crate::app_state::AppState;
use crate::domain::{RescheduleProposal, SessionId};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /sessions/:id/reschedule` — Propose a new session time.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller is not the booked client,
/// the session starts within the notice window, or the proposed time
/// is not in the future.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/reschedule",
    tag = "Reschedule",
    summary = "Propose a reschedule",
    description = "Records the booked client's proposal for a new session time. The original \
                   time stays in force until the trainer approves.",
    params(
        ("id" = uuid::Uuid, Path, description = "Session UUID"),
        ("X-User-Id" = uuid::Uuid, Header, description = "Calling user"),
    ),
    request_body = RescheduleRequest,
    responses(
        (status = 200, description = "Proposal recorded", body = SessionResponse),
        (status = 403, description = "Caller is not the booked client", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 422, description = "Too close to start or proposed time in past", body = ErrorResponse),
    )
)]
pub async fn propose_reschedule(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
    Json(req): Json<RescheduleRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let caller = caller_id(&headers)?;
    let proposal = RescheduleProposal {
        date: req.proposed_date,
        start_time: req.proposed_start_time,
        end_time: req.proposed_end_time,
        reason: req.reason,
    };
    let session = state
        .reschedule
        .propose(caller, SessionId::from_uuid(id), proposal)
        .await?;
    Ok(Json(SessionResponse::from(session)))
}

/// `POST /sessions/:id/reschedule/respond` — Approve or deny a proposal.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller is not the assigned
/// trainer or no proposal is pending.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/reschedule/respond",
    tag = "Reschedule",
    summary = "Respond to a reschedule proposal",
    description = "Applies the trainer's approval or denial. Approval moves the session to the \
                   proposed time and pushes the change to both calendars.",
    params(
        ("id" = uuid::Uuid, Path, description = "Session UUID"),
        ("X-User-Id" = uuid::Uuid, Header, description = "Calling user"),
    ),
    request_body = RescheduleRespondRequest,
    responses(
        (status = 200, description = "Response applied", body = SessionResponse),
        (status = 403, description = "Caller is not the assigned trainer", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "No pending proposal", body = ErrorResponse),
    )
)]
pub async fn respond_reschedule(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
    Json(req): Json<RescheduleRespondRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let caller = caller_id(&headers)?;
    let session = state
        .reschedule
        .respond(
            caller,
            SessionId::from_uuid(id),
            req.action == RescheduleAction::Approve,
            req.response_note.as_deref(),
        )
        .await?;
    Ok(Json(SessionResponse::from(session)))
}

/// Reschedule routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/{id}/reschedule", post(propose_reschedule))
        .route("/sessions/{id}/reschedule/respond", post(respond_reschedule))
}
