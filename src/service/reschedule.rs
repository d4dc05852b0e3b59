//! Reschedule negotiation between client and trainer.
//!
//! The client proposes a new time, the trainer approves or denies.
//! Approval applies the proposed time to the session and pushes the
//! change to both calendars; denial leaves the original time untouched.
//! Both responses resolve through a compare-and-set in the ledger, so
//! concurrent responses to one proposal settle exactly once.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::reconciliation::{ReconciliationService, SyncAction};
use crate::domain::{
    Notification, NotificationBus, RescheduleProposal, RescheduleStatus, Session, SessionId,
    SessionStatus,
};
use crate::error::GatewayError;
use crate::persistence::LedgerStore;

/// Minimum notice a client must give before the original start time.
pub const RESCHEDULE_WINDOW_HOURS: i64 = 24;

/// Drives reschedule proposals through the negotiation state machine.
#[derive(Debug)]
pub struct RescheduleService {
    store: Arc<dyn LedgerStore>,
    reconciliation: Arc<ReconciliationService>,
    notifier: NotificationBus,
}

impl RescheduleService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        reconciliation: Arc<ReconciliationService>,
        notifier: NotificationBus,
    ) -> Self {
        Self {
            store,
            reconciliation,
            notifier,
        }
    }

    /// Records a client's reschedule proposal for a session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] for an unknown session,
    /// [`GatewayError::NotSessionClient`] when the caller is not the
    /// booked client, [`GatewayError::InvalidRequest`] for a session no
    /// longer on the books, [`GatewayError::RescheduleWindowClosed`]
    /// inside the notice window, or
    /// [`GatewayError::ProposedTimeInPast`] for a proposed start that is
    /// not in the future.
    pub async fn propose(
        &self,
        caller: Uuid,
        session_id: SessionId,
        proposal: RescheduleProposal,
    ) -> Result<Session, GatewayError> {
        let session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or(GatewayError::SessionNotFound(session_id.into()))?;
        if caller != session.client_id {
            return Err(GatewayError::NotSessionClient);
        }
        if session.status != SessionStatus::Scheduled {
            return Err(GatewayError::InvalidRequest(format!(
                "session is {}",
                session.status.as_str()
            )));
        }

        let now = Utc::now();
        if session.start_at() - now < Duration::hours(RESCHEDULE_WINDOW_HOURS) {
            return Err(GatewayError::RescheduleWindowClosed);
        }
        if proposal.start_at() <= now {
            return Err(GatewayError::ProposedTimeInPast);
        }

        if !self.store.propose_reschedule(session_id, &proposal).await? {
            return Err(GatewayError::SessionNotFound(session_id.into()));
        }
        info!(
            %session_id,
            client_id = %caller,
            proposed_date = %proposal.date,
            "reschedule proposed"
        );
        self.store
            .find_session(session_id)
            .await?
            .ok_or(GatewayError::SessionNotFound(session_id.into()))
    }

    /// Applies the trainer's approval or denial of a pending proposal.
    ///
    /// On approval the session moves to the proposed time and both
    /// calendars are converged; calendar failures are logged, never
    /// returned, since the schedule change has already committed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] for an unknown session,
    /// [`GatewayError::NotSessionTrainer`] when the caller is not the
    /// assigned trainer, or [`GatewayError::RescheduleNotPending`] when
    /// no proposal is awaiting a response (including losing the race to
    /// a concurrent response).
    pub async fn respond(
        &self,
        caller: Uuid,
        session_id: SessionId,
        approve: bool,
        note: Option<&str>,
    ) -> Result<Session, GatewayError> {
        let session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or(GatewayError::SessionNotFound(session_id.into()))?;
        if caller != session.trainer_id {
            return Err(GatewayError::NotSessionTrainer);
        }
        if session.reschedule.status != RescheduleStatus::Pending {
            return Err(GatewayError::RescheduleNotPending);
        }

        if approve {
            self.approve(session_id).await
        } else {
            self.deny(session_id, note).await
        }
    }

    async fn approve(&self, session_id: SessionId) -> Result<Session, GatewayError> {
        if !self.store.approve_reschedule(session_id).await? {
            return Err(GatewayError::RescheduleNotPending);
        }
        let session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or(GatewayError::SessionNotFound(session_id.into()))?;

        let outcomes = self
            .reconciliation
            .sync_session(&session, SyncAction::Update)
            .await;
        for (side, outcome) in &outcomes {
            if let super::reconciliation::SideOutcome::Failed(message) = outcome {
                warn!(
                    %session_id,
                    side = side.label(),
                    %message,
                    "approved reschedule committed, calendar push failed"
                );
            }
        }

        info!(
            %session_id,
            date = %session.date,
            start_time = %session.start_time,
            "reschedule approved"
        );
        self.notifier.publish(Notification::SessionRescheduled {
            session_id,
            trainer_id: session.trainer_id,
            client_id: session.client_id,
            date: session.date,
            start_time: session.start_time,
            timestamp: Utc::now(),
        });
        Ok(session)
    }

    async fn deny(
        &self,
        session_id: SessionId,
        note: Option<&str>,
    ) -> Result<Session, GatewayError> {
        if !self.store.deny_reschedule(session_id, note).await? {
            return Err(GatewayError::RescheduleNotPending);
        }
        info!(%session_id, "reschedule denied");
        self.store
            .find_session(session_id)
            .await?
            .ok_or(GatewayError::SessionNotFound(session_id.into()))
    }
}
