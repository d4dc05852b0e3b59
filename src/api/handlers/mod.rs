//! REST endpoint handlers organized by resource.

pub mod cleanup;
pub mod reschedule;
pub mod sync;
pub mod system;
pub mod webhook;

use axum::http::HeaderMap;
use axum::Router;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::GatewayError;

/// Header carrying the authenticated principal's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extracts the calling user from the `X-User-Id` header.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] when the header is absent
/// or not a UUID.
pub fn caller_id(headers: &HeaderMap) -> Result<Uuid, GatewayError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or_else(|| {
            GatewayError::InvalidRequest("missing or invalid X-User-Id header".to_string())
        })
}

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(reschedule::routes())
        .merge(sync::routes())
        .merge(cleanup::routes())
}
