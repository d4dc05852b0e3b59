//! Session-credit packages.
//!
//! A [`Package`] accumulates the session credits a client has purchased
//! for one package type. The ledger keeps at most one `active` package
//! per (client, type); crediting either creates it or adds to it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed allow-list of purchasable package types. Webhook events carrying
/// anything else are rejected as a client error (not retryable).
pub const PACKAGE_TYPES: &[&str] = &[
    "In-Person Training",
    "Virtual Training",
    "Partner Training",
];

/// Returns whether the given package type is on the allow-list.
#[must_use]
pub fn is_valid_package_type(package_type: &str) -> bool {
    PACKAGE_TYPES.contains(&package_type)
}

/// Status of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    /// Credits may still be consumed; the crediting target.
    Active,
    /// Past its expiry date; never credited again.
    Expired,
}

impl PackageStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }

    /// Parses a storage string back into a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// A client's session-credit package for one package type.
///
/// `transaction_id` records only the most recent contributing transaction
/// and is a display/debug convenience; the immutable `payment_events`
/// table is the source of truth for dedupe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package identifier.
    pub id: Uuid,
    /// Owning client.
    pub client_id: Uuid,
    /// Package type from the allow-list.
    pub package_type: String,
    /// Remaining plus consumed credits from all contributing purchases.
    pub sessions_included: i32,
    /// Sum of the originally purchased session counts.
    pub original_sessions: i32,
    /// Whether any contributing purchase was prorated.
    pub is_prorated: bool,
    /// Package status.
    pub status: PackageStatus,
    /// Most recent crediting transaction applied, if any.
    pub transaction_id: Option<String>,
    /// Expiry date, if the purchase carried one.
    pub expiry_date: Option<NaiveDate>,
    /// Timestamp of the first (or overwriting) purchase.
    pub purchased_at: DateTime<Utc>,
}
