//! Business services: payment crediting, calendar reconciliation,
//! duplicate/orphan cleanup, and reschedule negotiation.

pub mod cleanup;
pub mod crediting;
pub mod reconciliation;
pub mod reschedule;

pub use cleanup::CleanupService;
pub use crediting::{CreditOutcome, CreditingService};
pub use reconciliation::{ReconciliationService, SideOutcome, SyncAction, SyncReport};
pub use reschedule::{RescheduleService, RESCHEDULE_WINDOW_HOURS};
