//! Calendar provider abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CalendarBinding, EventContent};
use crate::error::GatewayError;

/// A remote calendar event as returned by a listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEvent {
    /// Provider-assigned event identifier.
    pub id: String,
    /// Event title.
    pub summary: String,
    /// Event start, when the provider reports a timed start.
    pub start: Option<DateTime<Utc>>,
}

/// Remote calendar operations the reconciliation services depend on.
///
/// Every call authenticates with the owner's [`CalendarBinding`]; the
/// provider holds no per-user state of its own.
#[async_trait]
pub trait CalendarProvider: Send + Sync + std::fmt::Debug {
    /// Creates an event and returns the provider-assigned event id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TokenRefresh`] if the binding's refresh
    /// token is rejected, or [`GatewayError::CalendarApi`] on any other
    /// remote failure.
    async fn insert_event(
        &self,
        binding: &CalendarBinding,
        content: &EventContent,
    ) -> Result<String, GatewayError>;

    /// Overwrites an existing event with new content.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CalendarApi`] when the event no longer
    /// exists remotely or the call fails; callers are expected to
    /// self-heal by recreating.
    async fn update_event(
        &self,
        binding: &CalendarBinding,
        event_id: &str,
        content: &EventContent,
    ) -> Result<(), GatewayError>;

    /// Deletes an event. Deleting an already-gone event is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CalendarApi`] on remote failure.
    async fn delete_event(
        &self,
        binding: &CalendarBinding,
        event_id: &str,
    ) -> Result<(), GatewayError>;

    /// Lists events in a time window whose text matches `query`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CalendarApi`] on remote failure.
    async fn list_events(
        &self,
        binding: &CalendarBinding,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        query: &str,
    ) -> Result<Vec<RemoteEvent>, GatewayError>;
}
