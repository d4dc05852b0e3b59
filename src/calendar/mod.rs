//! External calendar gateway.
//!
//! [`CalendarProvider`] is the seam between the reconciliation services
//! and the remote calendar API. [`GoogleCalendar`] is the production
//! implementation; tests use the in-process [`mock::MockCalendar`].

pub mod google;
#[cfg(test)]
pub mod mock;
pub mod provider;

pub use google::GoogleCalendar;
pub use provider::{CalendarProvider, RemoteEvent};
