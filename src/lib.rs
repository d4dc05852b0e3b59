//! # coachsync-gateway
//!
//! Scheduling and payment gateway for personal training businesses.
//!
//! The gateway keeps an internal session ledger as the source of truth
//! and converges two external calendars (trainer and client) toward it.
//! Verified payment processor webhooks credit training packages exactly
//! once per transaction; a reschedule negotiation lets clients propose
//! new times for trainers to approve or deny.
//!
//! ## Architecture
//!
//! ```text
//! Payment processor ── POST /webhooks/payment
//! Clients / Trainers ── REST (api/)
//!     │
//!     ├── CreditingService      (service/)
//!     ├── ReconciliationService (service/)
//!     ├── RescheduleService     (service/)
//!     ├── CleanupService        (service/)
//!     │
//!     ├── LedgerStore ── PostgreSQL (persistence/)
//!     └── CalendarProvider ── Google Calendar (calendar/)
//! ```

pub mod api;
pub mod app_state;
pub mod calendar;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
