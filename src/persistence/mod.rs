//! Persistence layer: the durable payment/session ledger.
//!
//! [`LedgerStore`] is the seam between the services and storage. The
//! production implementation is PostgreSQL via `sqlx::PgPool`; an
//! in-memory implementation backs tests and local development. All
//! cross-request coordination happens through this ledger — workers share
//! no in-process state.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::MemoryLedger;
pub use models::{NewPackage, NewPaymentEvent, PackageInsert, PaymentInsert};
pub use postgres::PostgresLedger;
pub use store::LedgerStore;
