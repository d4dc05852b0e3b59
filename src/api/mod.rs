//! REST API layer: route handlers, DTOs, signature verification, and
//! router composition.
//!
//! Authenticated endpoints are mounted under `/api/v1`; the payment
//! webhook and the health check live at the root.

pub mod dto;
pub mod handlers;
pub mod signature;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::webhook::routes())
        .merge(handlers::system::routes())
}
