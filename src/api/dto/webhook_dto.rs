//! Payment webhook request/response DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Payment processor webhook payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentWebhookRequest {
    /// Processor event type; only `checkout.completed` is credited.
    pub event_type: String,
    /// Processor-assigned transaction identifier.
    pub transaction_id: String,
    /// Amount paid, in cents.
    pub amount_total: i64,
    /// Purchase timestamp; defaults to receipt time when absent.
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    /// Checkout metadata describing the purchaser and package.
    #[serde(default)]
    pub metadata: Option<CheckoutMetadata>,
}

/// Purchaser and package details attached to the checkout by the storefront.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutMetadata {
    /// Purchasing client.
    pub user_id: Uuid,
    /// Purchased package type; must be on the allow-list.
    pub package_type: String,
    /// Sessions granted by this purchase.
    pub sessions_included: i32,
    /// Sessions at full package size; defaults to `sessions_included`.
    #[serde(default)]
    pub original_sessions: Option<i32>,
    /// Whether the purchase was prorated.
    #[serde(default)]
    pub is_prorated: bool,
    /// Package expiry date, if any.
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentWebhookResponse {
    /// Always `true` for an acknowledged delivery.
    pub received: bool,
    /// What happened: `credited`, `already_processed`, `recorded`, or
    /// `ignored` for event types the gateway does not handle.
    pub outcome: String,
    /// Credited package, when crediting completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_id: Option<Uuid>,
    /// Package session balance after crediting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_total: Option<i32>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn processor_payload_shape_deserializes() {
        let body = serde_json::json!({
            "event_type": "checkout.completed",
            "transaction_id": "txn_551",
            "metadata": {
                "user_id": "7f6f3a4e-9a36-4f0e-8a11-2b1f0c9d5e21",
                "package_type": "In-Person Training",
                "sessions_included": 8,
                "original_sessions": 8,
                "is_prorated": false,
                "expiry_date": "2026-10-01"
            },
            "amount_total": 64000
        });
        let Ok(request) = serde_json::from_value::<PaymentWebhookRequest>(body) else {
            panic!("documented processor payload should deserialize");
        };
        assert_eq!(request.amount_total, 64000);
        let Some(metadata) = request.metadata else {
            panic!("metadata should be present");
        };
        assert_eq!(
            metadata.user_id.to_string(),
            "7f6f3a4e-9a36-4f0e-8a11-2b1f0c9d5e21"
        );
        assert_eq!(metadata.sessions_included, 8);
    }

    #[test]
    fn minimal_payload_omits_optional_fields() {
        let body = serde_json::json!({
            "event_type": "refund.created",
            "transaction_id": "txn_552",
            "amount_total": 8000
        });
        let Ok(request) = serde_json::from_value::<PaymentWebhookRequest>(body) else {
            panic!("payload without metadata should deserialize");
        };
        assert!(request.metadata.is_none());
        assert!(request.paid_at.is_none());
    }
}
