//! Operator cleanup DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Session whose trainer calendar should be swept for duplicates.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DuplicateCleanupRequest {
    /// Session identifier.
    pub session_id: Uuid,
}

/// Result of a duplicate-event sweep.
#[derive(Debug, Serialize, ToSchema)]
pub struct DuplicateCleanupResponse {
    /// Remote events removed.
    pub removed: u64,
}

/// Result of clearing orphaned event references.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrphanCleanupResponse {
    /// Sessions whose references were cleared.
    pub cleared: u64,
}
