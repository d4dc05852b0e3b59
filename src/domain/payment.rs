//! Payment ledger rows and the verified checkout event.
//!
//! [`PaymentEvent`] rows are immutable after insert except for attaching
//! the resolved `package_type` and `package_id`. The unique constraint on
//! `transaction_id` is the serialization point that makes crediting
//! idempotent under concurrent duplicate delivery.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A durably recorded payment processor notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Row identifier.
    pub id: Uuid,
    /// Processor-assigned transaction identifier (unique).
    pub transaction_id: String,
    /// Purchasing client.
    pub client_id: Uuid,
    /// Amount paid, in cents.
    pub amount_cents: i64,
    /// Number of sessions the purchase grants.
    pub session_count: i32,
    /// Resolved package type; `None` for rows recorded by non-checkout
    /// event kinds that never carried metadata.
    pub package_type: Option<String>,
    /// Processor status string.
    pub status: String,
    /// Package this payment was credited to, once resolved.
    pub package_id: Option<Uuid>,
    /// Purchase timestamp.
    pub paid_at: DateTime<Utc>,
}

/// A verified "checkout completed" event, after signature verification
/// and metadata extraction. The only event class that mutates the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutEvent {
    /// Processor-assigned transaction identifier.
    pub transaction_id: String,
    /// Purchasing client.
    pub client_id: Uuid,
    /// Package type from checkout metadata.
    pub package_type: String,
    /// Sessions granted by this purchase (may be prorated).
    pub sessions_included: i32,
    /// Sessions at full package size, before proration.
    pub original_sessions: i32,
    /// Whether the purchase was prorated.
    pub is_prorated: bool,
    /// Expiry date from metadata, if any.
    pub expiry_date: Option<NaiveDate>,
    /// Amount paid, in cents.
    pub amount_cents: i64,
    /// Purchase timestamp.
    pub paid_at: DateTime<Utc>,
}
