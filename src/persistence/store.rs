//! The `LedgerStore` trait: storage seam for all services.

use async_trait::async_trait;
use uuid::Uuid;

use super::models::{NewPackage, NewPaymentEvent, PackageInsert, PaymentInsert};
use crate::domain::{
    CalendarBinding, CalendarSide, Package, PaymentEvent, RescheduleProposal, Session, SessionId,
    UserProfile,
};
use crate::error::GatewayError;

/// Durable ledger operations used by the crediting, reconciliation,
/// cleanup, and reschedule services.
///
/// Implementations must make [`insert_payment_event`] and
/// [`insert_package`] conflict-safe: concurrent duplicate inserts may
/// never both report `Inserted`. [`approve_reschedule`] and
/// [`deny_reschedule`] are compare-and-set operations gated on a pending
/// proposal; a lost race returns `false` rather than applying twice.
///
/// [`insert_payment_event`]: LedgerStore::insert_payment_event
/// [`insert_package`]: LedgerStore::insert_package
/// [`approve_reschedule`]: LedgerStore::approve_reschedule
/// [`deny_reschedule`]: LedgerStore::deny_reschedule
#[async_trait]
pub trait LedgerStore: Send + Sync + std::fmt::Debug {
    /// Looks up a payment event by processor transaction id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn find_payment_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentEvent>, GatewayError>;

    /// Inserts a payment event, treating a transaction-id conflict as the
    /// duplicate case.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn insert_payment_event(
        &self,
        new: NewPaymentEvent,
    ) -> Result<PaymentInsert, GatewayError>;

    /// Attaches a package type to a payment row that has none.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn attach_payment_package_type(
        &self,
        payment_id: Uuid,
        package_type: &str,
    ) -> Result<(), GatewayError>;

    /// Attaches the resolved package id to a payment row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn attach_payment_package(
        &self,
        payment_id: Uuid,
        package_id: Uuid,
    ) -> Result<(), GatewayError>;

    /// Finds the client's active package of the given type, if any.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn find_active_package(
        &self,
        client_id: Uuid,
        package_type: &str,
    ) -> Result<Option<Package>, GatewayError>;

    /// Inserts a new active package, treating a one-active-per-client/type
    /// conflict as [`PackageInsert::ActiveExists`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn insert_package(&self, new: NewPackage) -> Result<PackageInsert, GatewayError>;

    /// Overwrites a legacy package's credit with a purchase, treating it
    /// as newly created.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn overwrite_package_credit(
        &self,
        package_id: Uuid,
        new: &NewPackage,
    ) -> Result<(), GatewayError>;

    /// Adds a purchase's credit to an existing package and records its
    /// transaction as the most recent contributor.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn add_package_credit(
        &self,
        package_id: Uuid,
        sessions_included: i32,
        original_sessions: i32,
        transaction_id: &str,
    ) -> Result<(), GatewayError>;

    /// Loads a session by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, GatewayError>;

    /// Lists all non-cancelled sessions between a trainer/client pair,
    /// ordered by date and start time.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn list_pair_sessions(
        &self,
        trainer_id: Uuid,
        client_id: Uuid,
    ) -> Result<Vec<Session>, GatewayError>;

    /// Stores (or clears) one side's remote event reference.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn set_session_event_id(
        &self,
        id: SessionId,
        side: CalendarSide,
        event_id: Option<&str>,
    ) -> Result<(), GatewayError>;

    /// Records a reschedule proposal and sets the status to pending,
    /// superseding any earlier proposal. Returns `false` if the session
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn propose_reschedule(
        &self,
        id: SessionId,
        proposal: &RescheduleProposal,
    ) -> Result<bool, GatewayError>;

    /// Atomically applies the pending proposal's date/times to the session
    /// and marks the proposal approved, in a single compare-and-set gated
    /// on `reschedule_status = pending`. Returns `false` if the CAS lost.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn approve_reschedule(&self, id: SessionId) -> Result<bool, GatewayError>;

    /// Marks the pending proposal denied, leaving the session date/times
    /// untouched. Same compare-and-set semantics as approval.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn deny_reschedule(&self, id: SessionId, note: Option<&str>)
    -> Result<bool, GatewayError>;

    /// Clears every stored remote event reference without verifying
    /// remote state. Operator maintenance; returns the number of sessions
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn clear_event_references(&self) -> Result<u64, GatewayError>;

    /// Looks up a user's calendar binding. `None` means not connected.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn find_binding(&self, user_id: Uuid) -> Result<Option<CalendarBinding>, GatewayError>;

    /// Looks up a user profile (collaborator surface).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, GatewayError>;
}
