//! Domain layer: core scheduling and ledger types.
//!
//! This module contains the server-side domain model: session identity,
//! session and package records, payment events, calendar bindings, the
//! reschedule negotiation states, calendar event content derivation, and
//! the notification bus for fire-and-forget collaborator events.

pub mod event_content;
pub mod notification;
pub mod one_or_many;
pub mod package;
pub mod payment;
pub mod session;
pub mod session_id;
pub mod user;

pub use event_content::{CalendarSide, EventContent};
pub use notification::{Notification, NotificationBus};
pub use one_or_many::OneOrMany;
pub use package::{is_valid_package_type, Package, PackageStatus, PACKAGE_TYPES};
pub use payment::{CheckoutEvent, PaymentEvent};
pub use session::{RescheduleProposal, RescheduleState, RescheduleStatus, Session, SessionStatus};
pub use session_id::SessionId;
pub use user::{CalendarBinding, UserProfile, UserRole};
