//! Insert models and insert outcomes for the ledger.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{Package, PaymentEvent};

/// Fields for a new payment event row.
#[derive(Debug, Clone)]
pub struct NewPaymentEvent {
    /// Processor-assigned transaction identifier.
    pub transaction_id: String,
    /// Purchasing client.
    pub client_id: Uuid,
    /// Amount paid, in cents.
    pub amount_cents: i64,
    /// Sessions granted by the purchase.
    pub session_count: i32,
    /// Package type, when the event carried metadata.
    pub package_type: Option<String>,
    /// Processor status string.
    pub status: String,
    /// Purchase timestamp.
    pub paid_at: DateTime<Utc>,
}

/// Outcome of inserting a payment event.
///
/// A uniqueness conflict on `transaction_id` is the duplicate-delivery
/// case and is reported as data, not as an error: the caller falls back
/// to already-processed semantics.
#[derive(Debug, Clone)]
pub enum PaymentInsert {
    /// Row was created by this call.
    Inserted(PaymentEvent),
    /// A row with this transaction id already existed.
    Duplicate(PaymentEvent),
}

/// Fields for a new active package row.
#[derive(Debug, Clone)]
pub struct NewPackage {
    /// Owning client.
    pub client_id: Uuid,
    /// Package type from the allow-list.
    pub package_type: String,
    /// Initial session credit.
    pub sessions_included: i32,
    /// Originally purchased session count.
    pub original_sessions: i32,
    /// Whether the purchase was prorated.
    pub is_prorated: bool,
    /// Crediting transaction.
    pub transaction_id: String,
    /// Expiry date, if any.
    pub expiry_date: Option<NaiveDate>,
    /// Purchase timestamp.
    pub purchased_at: DateTime<Utc>,
}

/// Outcome of inserting an active package.
///
/// A conflict on the partial unique index (one active package per
/// client/type) means a concurrent crediting call won the create; the
/// caller falls through to the add-credit branch against the returned
/// package.
#[derive(Debug, Clone)]
pub enum PackageInsert {
    /// Row was created by this call.
    Inserted(Package),
    /// An active package for this (client, type) already existed.
    ActiveExists(Package),
}
