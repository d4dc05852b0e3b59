//! Deterministic calendar event content derivation.
//!
//! Event content is a pure function of the [`Session`] and the calendar
//! side: both calendars converge toward it, each phrased from its owner's
//! perspective. Keeping this derivation deterministic is what lets the
//! reconciliation engine recreate a remote event at any time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::session::Session;
use super::user::UserProfile;

/// Which external calendar an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarSide {
    /// The trainer's calendar.
    Trainer,
    /// The client's calendar.
    Client,
}

impl CalendarSide {
    /// Both sides, in reconciliation order.
    pub const BOTH: [Self; 2] = [Self::Trainer, Self::Client];

    /// Lowercase label for logs and error aggregation.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Trainer => "trainer",
            Self::Client => "client",
        }
    }
}

/// The content a remote calendar event should converge toward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventContent {
    /// Event title: session type plus counterparty name.
    pub summary: String,
    /// Side-phrased description.
    pub description: String,
    /// Event start.
    pub start: DateTime<Utc>,
    /// Event end (explicit or 60-minute fallback).
    pub end: DateTime<Utc>,
    /// Counterparty email, invited as an attendee when known.
    pub attendee: Option<String>,
}

impl EventContent {
    /// Derives the event content for one side of a session.
    ///
    /// `counterparty` is the profile of the other party; when the lookup
    /// found nobody, a generic role name is used so reconciliation can
    /// still proceed.
    #[must_use]
    pub fn for_side(
        session: &Session,
        side: CalendarSide,
        counterparty: Option<&UserProfile>,
    ) -> Self {
        let fallback = match side {
            CalendarSide::Trainer => "client",
            CalendarSide::Client => "trainer",
        };
        let name = counterparty.map_or(fallback, |p| p.name.as_str());

        let summary = format!("{} with {}", session.session_type, name);
        let description = match side {
            CalendarSide::Trainer => {
                format!("{} session with {}", session.session_type, name)
            }
            CalendarSide::Client => {
                format!("Your {} session with {}", session.session_type, name)
            }
        };

        Self {
            summary,
            description,
            start: session.start_at(),
            end: session.end_at(),
            attendee: counterparty.and_then(|p| p.email.clone()),
        }
    }
}
