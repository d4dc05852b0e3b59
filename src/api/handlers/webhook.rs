//! Payment processor webhook handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use tracing::info;

use crate::api::dto::{PaymentWebhookRequest, PaymentWebhookResponse};
use crate::api::signature;
use crate::app_state::AppState;
use crate::domain::CheckoutEvent;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::CreditOutcome;

/// Header carrying the processor's HMAC-SHA256 hex signature.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// `POST /webhooks/payment` — Receive a payment processor event.
///
/// The raw body is verified against `X-Webhook-Signature` before any
/// parsing. Verified `checkout.completed` events are credited; other
/// event types are acknowledged and ignored.
///
/// # Errors
///
/// Returns [`GatewayError`] on a missing or invalid signature, a
/// malformed payload, missing checkout metadata, or a package type
/// outside the allow-list.
#[utoipa::path(
    post,
    path = "/webhooks/payment",
    tag = "Webhooks",
    summary = "Receive a payment event",
    description = "Verifies the HMAC-SHA256 signature of the raw body, then credits \
                   checkout.completed events to session packages exactly once per transaction.",
    request_body = PaymentWebhookRequest,
    responses(
        (status = 200, description = "Event acknowledged", body = PaymentWebhookResponse),
        (status = 400, description = "Invalid signature or payload", body = ErrorResponse),
    )
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayError> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(GatewayError::InvalidSignature)?;
    if !signature::verify(&state.config.webhook_secret, &body, provided) {
        return Err(GatewayError::InvalidSignature);
    }

    let request: PaymentWebhookRequest = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::InvalidRequest(format!("malformed payload: {e}")))?;

    if request.event_type != "checkout.completed" {
        info!(event_type = %request.event_type, "ignoring unhandled event type");
        return Ok(Json(PaymentWebhookResponse {
            received: true,
            outcome: "ignored".to_string(),
            package_id: None,
            sessions_total: None,
        }));
    }

    let metadata = request
        .metadata
        .ok_or_else(|| GatewayError::MissingMetadata("metadata".to_string()))?;
    let event = CheckoutEvent {
        transaction_id: request.transaction_id,
        client_id: metadata.user_id,
        package_type: metadata.package_type,
        sessions_included: metadata.sessions_included,
        original_sessions: metadata
            .original_sessions
            .unwrap_or(metadata.sessions_included),
        is_prorated: metadata.is_prorated,
        expiry_date: metadata.expiry_date,
        amount_cents: request.amount_total,
        paid_at: request.paid_at.unwrap_or_else(Utc::now),
    };

    let response = match state.crediting.credit_checkout(&event).await? {
        CreditOutcome::Credited {
            package_id,
            sessions_total,
        } => PaymentWebhookResponse {
            received: true,
            outcome: "credited".to_string(),
            package_id: Some(package_id),
            sessions_total: Some(sessions_total),
        },
        CreditOutcome::AlreadyProcessed => PaymentWebhookResponse {
            received: true,
            outcome: "already_processed".to_string(),
            package_id: None,
            sessions_total: None,
        },
        CreditOutcome::RecordedNeedsReconciliation { .. } => PaymentWebhookResponse {
            received: true,
            outcome: "recorded".to_string(),
            package_id: None,
            sessions_total: None,
        },
    };
    Ok(Json(response))
}

/// Webhook routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/payment", post(payment_webhook))
}
