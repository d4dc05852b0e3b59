//! In-memory ledger for tests and local development.
//!
//! A single mutex serializes every operation, which gives the same
//! observable guarantees as the PostgreSQL uniqueness constraints: two
//! concurrent duplicate inserts can never both report `Inserted`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::models::{NewPackage, NewPaymentEvent, PackageInsert, PaymentInsert};
use super::store::LedgerStore;
use crate::domain::{
    CalendarBinding, CalendarSide, Package, PackageStatus, PaymentEvent, RescheduleProposal,
    RescheduleStatus, Session, SessionId, SessionStatus, UserProfile,
};
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct State {
    payments: Vec<PaymentEvent>,
    packages: Vec<Package>,
    sessions: HashMap<SessionId, Session>,
    bindings: HashMap<Uuid, CalendarBinding>,
    profiles: HashMap<Uuid, UserProfile>,
}

/// Mutex-backed ledger with the same conflict semantics as PostgreSQL.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<State>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, GatewayError> {
        self.state
            .lock()
            .map_err(|_| GatewayError::Internal("ledger mutex poisoned".to_string()))
    }

    /// Seeds a session row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the ledger mutex is poisoned.
    pub fn put_session(&self, session: Session) -> Result<(), GatewayError> {
        self.lock()?.sessions.insert(session.id, session);
        Ok(())
    }

    /// Seeds a calendar binding.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the ledger mutex is poisoned.
    pub fn put_binding(&self, binding: CalendarBinding) -> Result<(), GatewayError> {
        self.lock()?.bindings.insert(binding.user_id, binding);
        Ok(())
    }

    /// Seeds a user profile.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the ledger mutex is poisoned.
    pub fn put_profile(&self, profile: UserProfile) -> Result<(), GatewayError> {
        self.lock()?.profiles.insert(profile.user_id, profile);
        Ok(())
    }

    /// Seeds a package row directly (for legacy-package scenarios).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the ledger mutex is poisoned.
    pub fn put_package(&self, package: Package) -> Result<(), GatewayError> {
        self.lock()?.packages.push(package);
        Ok(())
    }

    /// Number of payment rows recorded (test assertion helper).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the ledger mutex is poisoned.
    pub fn payment_count(&self) -> Result<usize, GatewayError> {
        Ok(self.lock()?.payments.len())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn find_payment_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentEvent>, GatewayError> {
        let state = self.lock()?;
        Ok(state
            .payments
            .iter()
            .find(|p| p.transaction_id == transaction_id)
            .cloned())
    }

    async fn insert_payment_event(
        &self,
        new: NewPaymentEvent,
    ) -> Result<PaymentInsert, GatewayError> {
        let mut state = self.lock()?;
        if let Some(existing) = state
            .payments
            .iter()
            .find(|p| p.transaction_id == new.transaction_id)
        {
            return Ok(PaymentInsert::Duplicate(existing.clone()));
        }
        let payment = PaymentEvent {
            id: Uuid::new_v4(),
            transaction_id: new.transaction_id,
            client_id: new.client_id,
            amount_cents: new.amount_cents,
            session_count: new.session_count,
            package_type: new.package_type,
            status: new.status,
            package_id: None,
            paid_at: new.paid_at,
        };
        state.payments.push(payment.clone());
        Ok(PaymentInsert::Inserted(payment))
    }

    async fn attach_payment_package_type(
        &self,
        payment_id: Uuid,
        package_type: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        if let Some(payment) = state.payments.iter_mut().find(|p| p.id == payment_id) {
            if payment.package_type.is_none() {
                payment.package_type = Some(package_type.to_string());
            }
        }
        Ok(())
    }

    async fn attach_payment_package(
        &self,
        payment_id: Uuid,
        package_id: Uuid,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        if let Some(payment) = state.payments.iter_mut().find(|p| p.id == payment_id) {
            payment.package_id = Some(package_id);
        }
        Ok(())
    }

    async fn find_active_package(
        &self,
        client_id: Uuid,
        package_type: &str,
    ) -> Result<Option<Package>, GatewayError> {
        let state = self.lock()?;
        Ok(state
            .packages
            .iter()
            .find(|p| {
                p.client_id == client_id
                    && p.package_type == package_type
                    && p.status == PackageStatus::Active
            })
            .cloned())
    }

    async fn insert_package(&self, new: NewPackage) -> Result<PackageInsert, GatewayError> {
        let mut state = self.lock()?;
        if let Some(existing) = state.packages.iter().find(|p| {
            p.client_id == new.client_id
                && p.package_type == new.package_type
                && p.status == PackageStatus::Active
        }) {
            return Ok(PackageInsert::ActiveExists(existing.clone()));
        }
        let package = Package {
            id: Uuid::new_v4(),
            client_id: new.client_id,
            package_type: new.package_type,
            sessions_included: new.sessions_included,
            original_sessions: new.original_sessions,
            is_prorated: new.is_prorated,
            status: PackageStatus::Active,
            transaction_id: Some(new.transaction_id),
            expiry_date: new.expiry_date,
            purchased_at: new.purchased_at,
        };
        state.packages.push(package.clone());
        Ok(PackageInsert::Inserted(package))
    }

    async fn overwrite_package_credit(
        &self,
        package_id: Uuid,
        new: &NewPackage,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        if let Some(package) = state.packages.iter_mut().find(|p| p.id == package_id) {
            package.sessions_included = new.sessions_included;
            package.original_sessions = new.original_sessions;
            package.is_prorated = new.is_prorated;
            package.transaction_id = Some(new.transaction_id.clone());
            package.expiry_date = new.expiry_date;
            package.purchased_at = new.purchased_at;
        }
        Ok(())
    }

    async fn add_package_credit(
        &self,
        package_id: Uuid,
        sessions_included: i32,
        original_sessions: i32,
        transaction_id: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        if let Some(package) = state.packages.iter_mut().find(|p| p.id == package_id) {
            package.sessions_included += sessions_included;
            package.original_sessions += original_sessions;
            package.transaction_id = Some(transaction_id.to_string());
        }
        Ok(())
    }

    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, GatewayError> {
        let state = self.lock()?;
        Ok(state.sessions.get(&id).cloned())
    }

    async fn list_pair_sessions(
        &self,
        trainer_id: Uuid,
        client_id: Uuid,
    ) -> Result<Vec<Session>, GatewayError> {
        let state = self.lock()?;
        let mut sessions: Vec<Session> = state
            .sessions
            .values()
            .filter(|s| {
                s.trainer_id == trainer_id
                    && s.client_id == client_id
                    && s.status != SessionStatus::Cancelled
            })
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.date, s.start_time));
        Ok(sessions)
    }

    async fn set_session_event_id(
        &self,
        id: SessionId,
        side: CalendarSide,
        event_id: Option<&str>,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        if let Some(session) = state.sessions.get_mut(&id) {
            let stored = event_id.map(str::to_string);
            match side {
                CalendarSide::Trainer => session.trainer_event_id = stored,
                CalendarSide::Client => session.client_event_id = stored,
            }
        }
        Ok(())
    }

    async fn propose_reschedule(
        &self,
        id: SessionId,
        proposal: &RescheduleProposal,
    ) -> Result<bool, GatewayError> {
        let mut state = self.lock()?;
        let Some(session) = state.sessions.get_mut(&id) else {
            return Ok(false);
        };
        session.reschedule.status = RescheduleStatus::Pending;
        session.reschedule.proposed_date = Some(proposal.date);
        session.reschedule.proposed_start_time = Some(proposal.start_time);
        session.reschedule.proposed_end_time = proposal.end_time;
        session.reschedule.reason = proposal.reason.clone();
        session.reschedule.response_note = None;
        Ok(true)
    }

    async fn approve_reschedule(&self, id: SessionId) -> Result<bool, GatewayError> {
        let mut state = self.lock()?;
        let Some(session) = state.sessions.get_mut(&id) else {
            return Ok(false);
        };
        if session.reschedule.status != RescheduleStatus::Pending {
            return Ok(false);
        }
        let (Some(date), Some(start)) = (
            session.reschedule.proposed_date,
            session.reschedule.proposed_start_time,
        ) else {
            return Ok(false);
        };
        session.date = date;
        session.start_time = start;
        session.end_time = session.reschedule.proposed_end_time;
        session.reschedule.status = RescheduleStatus::Approved;
        Ok(true)
    }

    async fn deny_reschedule(
        &self,
        id: SessionId,
        note: Option<&str>,
    ) -> Result<bool, GatewayError> {
        let mut state = self.lock()?;
        let Some(session) = state.sessions.get_mut(&id) else {
            return Ok(false);
        };
        if session.reschedule.status != RescheduleStatus::Pending {
            return Ok(false);
        }
        session.reschedule.status = RescheduleStatus::Denied;
        session.reschedule.response_note = note.map(str::to_string);
        Ok(true)
    }

    async fn clear_event_references(&self) -> Result<u64, GatewayError> {
        let mut state = self.lock()?;
        let mut cleared = 0u64;
        for session in state.sessions.values_mut() {
            if session.trainer_event_id.is_some() || session.client_event_id.is_some() {
                session.trainer_event_id = None;
                session.client_event_id = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn find_binding(&self, user_id: Uuid) -> Result<Option<CalendarBinding>, GatewayError> {
        let state = self.lock()?;
        Ok(state.bindings.get(&user_id).cloned())
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, GatewayError> {
        let state = self.lock()?;
        Ok(state.profiles.get(&user_id).cloned())
    }
}
