//! Bulk calendar sync DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::service::SyncReport;

/// Trainer/client pair whose sessions should be synced.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncPairRequest {
    /// Assigned trainer.
    pub trainer_id: Uuid,
    /// Booked client.
    pub client_id: Uuid,
}

/// Aggregate result of a bulk sync.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncReportResponse {
    /// Sessions processed.
    pub synced: usize,
    /// Events created, including self-heal recreations.
    pub created: usize,
    /// Events updated in place.
    pub updated: usize,
    /// Calendar sides skipped for lack of a connection.
    pub skipped: usize,
    /// Per-side failure descriptions.
    pub errors: Vec<String>,
}

impl From<SyncReport> for SyncReportResponse {
    fn from(report: SyncReport) -> Self {
        Self {
            synced: report.synced,
            created: report.created,
            updated: report.updated,
            skipped: report.skipped,
            errors: report.errors,
        }
    }
}
