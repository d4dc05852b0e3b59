//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::domain::NotificationBus;
use crate::persistence::LedgerStore;
use crate::service::{CleanupService, CreditingService, ReconciliationService, RescheduleService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Gateway configuration.
    pub config: Arc<GatewayConfig>,
    /// Durable payment/session ledger.
    pub store: Arc<dyn LedgerStore>,
    /// Payment crediting service.
    pub crediting: Arc<CreditingService>,
    /// Calendar reconciliation service.
    pub reconciliation: Arc<ReconciliationService>,
    /// Operator cleanup service.
    pub cleanup: Arc<CleanupService>,
    /// Reschedule negotiation service.
    pub reschedule: Arc<RescheduleService>,
    /// Bus for fire-and-forget collaborator notifications.
    pub notifier: NotificationBus,
}
