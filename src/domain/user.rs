//! User profiles and calendar bindings.
//!
//! Both are collaborator surfaces: the gateway reads them but profile
//! CRUD and the OAuth connect flow live outside this service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a user, as far as this gateway cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Runs sessions; may respond to reschedules and trigger cleanup.
    Trainer,
    /// Books sessions; may propose reschedules.
    Client,
    /// May trigger any administrative operation.
    Admin,
}

impl UserRole {
    /// Returns the storage string for this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trainer => "trainer",
            Self::Client => "client",
            Self::Admin => "admin",
        }
    }

    /// Parses a storage string back into a role.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trainer" => Some(Self::Trainer),
            "client" => Some(Self::Client),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Whether this role may run operator maintenance.
    #[must_use]
    pub const fn is_operator(&self) -> bool {
        matches!(self, Self::Trainer | Self::Admin)
    }
}

/// Minimal user profile read through the collaborator lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub user_id: Uuid,
    /// Display name, used in calendar event titles.
    pub name: String,
    /// Email, used as the calendar attendee when known.
    pub email: Option<String>,
    /// Role.
    pub role: UserRole,
}

/// A user's external calendar connection.
///
/// Absence means "not connected": reconciliation for that side is
/// skipped, never failed. The refresh token is exchanged for a
/// short-lived access token per call; tokens are not position-sensitive,
/// so last-writer-wins on concurrent refresh is acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarBinding {
    /// Owning user.
    pub user_id: Uuid,
    /// Long-lived OAuth refresh token.
    pub refresh_token: String,
    /// Remote calendar identifier events are written to.
    pub calendar_id: String,
    /// When the user connected their calendar.
    pub connected_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_round_trip() {
        for role in [UserRole::Trainer, UserRole::Client, UserRole::Admin] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("owner"), None);
    }

    #[test]
    fn trainer_and_admin_are_operators() {
        assert!(UserRole::Trainer.is_operator());
        assert!(UserRole::Admin.is_operator());
        assert!(!UserRole::Client.is_operator());
    }
}
