//! Training session records and the reschedule negotiation states.
//!
//! A [`Session`] is the ledger's scheduling row. Its two external event id
//! fields are hints, not guarantees: the remote events they reference may
//! have been deleted out-of-band, and reconciliation must tolerate that
//! and self-heal by recreating (see `service::reconciliation`).

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SessionId;

/// Fallback session length when no explicit end time is recorded.
pub const DEFAULT_SESSION_MINUTES: i64 = 60;

/// Lifecycle status of a session row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session is on the books.
    Scheduled,
    /// Session took place.
    Completed,
    /// Session was cancelled; excluded from bulk reconciliation.
    Cancelled,
}

impl SessionStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a storage string back into a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// State of the reschedule negotiation for a session.
///
/// `Approved` and `Denied` are terminal for a given proposal; a new
/// proposal from the client resets the machine to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescheduleStatus {
    /// No proposal on record.
    None,
    /// Client has proposed a new time; awaiting the trainer.
    Pending,
    /// Trainer approved; session date/time now reflect the proposal.
    Approved,
    /// Trainer denied; original date/time untouched.
    Denied,
}

impl RescheduleStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
        }
    }

    /// Parses a storage string back into a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "denied" => Some(Self::Denied),
            _ => None,
        }
    }
}

/// A client's proposed time change, as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleProposal {
    /// Proposed session date.
    pub date: NaiveDate,
    /// Proposed start time.
    pub start_time: NaiveTime,
    /// Proposed end time, if the client supplied one.
    pub end_time: Option<NaiveTime>,
    /// Free-text reason shown to the trainer.
    pub reason: Option<String>,
}

impl RescheduleProposal {
    /// Proposed start instant (ledger times are UTC).
    #[must_use]
    pub fn start_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date.and_time(self.start_time))
    }
}

/// Reschedule negotiation fields embedded in a session row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleState {
    /// Current negotiation state.
    pub status: RescheduleStatus,
    /// Proposed date, present while a proposal is on record.
    pub proposed_date: Option<NaiveDate>,
    /// Proposed start time.
    pub proposed_start_time: Option<NaiveTime>,
    /// Proposed end time.
    pub proposed_end_time: Option<NaiveTime>,
    /// Client's reason for the proposal.
    pub reason: Option<String>,
    /// Trainer's note attached on approval or denial.
    pub response_note: Option<String>,
}

impl RescheduleState {
    /// A session with no proposal on record.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            status: RescheduleStatus::None,
            proposed_date: None,
            proposed_start_time: None,
            proposed_end_time: None,
            reason: None,
            response_note: None,
        }
    }

    /// Returns the pending proposal, if the fields are complete.
    #[must_use]
    pub fn proposal(&self) -> Option<RescheduleProposal> {
        Some(RescheduleProposal {
            date: self.proposed_date?,
            start_time: self.proposed_start_time?,
            end_time: self.proposed_end_time,
            reason: self.reason.clone(),
        })
    }
}

impl Default for RescheduleState {
    fn default() -> Self {
        Self::none()
    }
}

/// A training session: the internal record both calendars converge toward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// Assigned trainer.
    pub trainer_id: Uuid,
    /// Booked client.
    pub client_id: Uuid,
    /// Session date.
    pub date: NaiveDate,
    /// Start time.
    pub start_time: NaiveTime,
    /// End time; `None` means the default 60-minute duration applies.
    pub end_time: Option<NaiveTime>,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Session type (e.g. `"In-Person Training"`); also the calendar
    /// event title prefix.
    pub session_type: String,
    /// Trainer-calendar event reference. Hint only; may be stale.
    pub trainer_event_id: Option<String>,
    /// Client-calendar event reference. Hint only; may be stale.
    pub client_event_id: Option<String>,
    /// Reschedule negotiation state.
    pub reschedule: RescheduleState,
}

impl Session {
    /// Start instant of the session (ledger times are UTC).
    #[must_use]
    pub fn start_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date.and_time(self.start_time))
    }

    /// End instant, falling back to [`DEFAULT_SESSION_MINUTES`] after the
    /// start when no explicit end time is recorded.
    #[must_use]
    pub fn end_at(&self) -> DateTime<Utc> {
        match self.end_time {
            Some(end) => Utc.from_utc_datetime(&self.date.and_time(end)),
            None => self.start_at() + Duration::minutes(DEFAULT_SESSION_MINUTES),
        }
    }

    /// Stored event reference for the given calendar side.
    #[must_use]
    pub fn event_id(&self, side: super::CalendarSide) -> Option<&str> {
        match side {
            super::CalendarSide::Trainer => self.trainer_event_id.as_deref(),
            super::CalendarSide::Client => self.client_event_id.as_deref(),
        }
    }

    /// Owner of the calendar on the given side.
    #[must_use]
    pub const fn side_user(&self, side: super::CalendarSide) -> Uuid {
        match side {
            super::CalendarSide::Trainer => self.trainer_id,
            super::CalendarSide::Client => self.client_id,
        }
    }

    /// Counterparty of the calendar owner on the given side.
    #[must_use]
    pub const fn counterparty(&self, side: super::CalendarSide) -> Uuid {
        match side {
            super::CalendarSide::Trainer => self.client_id,
            super::CalendarSide::Client => self.trainer_id,
        }
    }
}
