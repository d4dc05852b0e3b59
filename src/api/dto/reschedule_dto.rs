//! Reschedule negotiation DTOs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Session;

/// Client's reschedule proposal.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RescheduleRequest {
    /// Proposed session date.
    pub proposed_date: NaiveDate,
    /// Proposed start time.
    pub proposed_start_time: NaiveTime,
    /// Proposed end time; omitted means the default duration.
    #[serde(default)]
    pub proposed_end_time: Option<NaiveTime>,
    /// Free-text reason shown to the trainer.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Trainer's decision on a pending proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RescheduleAction {
    /// Move the session to the proposed time.
    Approve,
    /// Keep the original time.
    Deny,
}

/// Trainer's response to a pending proposal.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RescheduleRespondRequest {
    /// Whether to approve or deny the proposal.
    pub action: RescheduleAction,
    /// Optional note delivered back to the client.
    #[serde(default)]
    pub response_note: Option<String>,
}

/// Session state returned after a reschedule operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Session identifier.
    pub id: Uuid,
    /// Assigned trainer.
    pub trainer_id: Uuid,
    /// Booked client.
    pub client_id: Uuid,
    /// Session date.
    pub date: NaiveDate,
    /// Start time.
    pub start_time: NaiveTime,
    /// End time, when one is recorded.
    pub end_time: Option<NaiveTime>,
    /// Session lifecycle status.
    pub status: String,
    /// Session type.
    pub session_type: String,
    /// Reschedule negotiation state.
    pub reschedule_status: String,
    /// Pending proposal date, if any.
    pub proposed_date: Option<NaiveDate>,
    /// Pending proposal start time, if any.
    pub proposed_start_time: Option<NaiveTime>,
    /// Trainer's note from the latest response.
    pub response_note: Option<String>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id.into(),
            trainer_id: session.trainer_id,
            client_id: session.client_id,
            date: session.date,
            start_time: session.start_time,
            end_time: session.end_time,
            status: session.status.as_str().to_string(),
            session_type: session.session_type,
            reschedule_status: session.reschedule.status.as_str().to_string(),
            proposed_date: session.reschedule.proposed_date,
            proposed_start_time: session.reschedule.proposed_start_time,
            response_note: session.reschedule.response_note,
        }
    }
}
