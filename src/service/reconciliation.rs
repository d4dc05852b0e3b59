//! Dual-calendar reconciliation.
//!
//! The session ledger is the source of truth; the trainer and client
//! calendars are projections that may drift (events deleted out-of-band,
//! references never written, revoked tokens). Reconciliation pushes the
//! ledger state to both sides and self-heals: an update against a stale
//! event reference falls back to creating a fresh event and overwriting
//! the stored reference. One side failing never blocks the other.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::calendar::CalendarProvider;
use crate::domain::{CalendarSide, EventContent, Session};
use crate::error::GatewayError;
use crate::persistence::LedgerStore;

/// What a sync pass should do with a session's remote events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Create events on both sides, ignoring stored references.
    Create,
    /// Converge existing events, creating where references are stale
    /// or missing.
    Update,
    /// Remove events and clear stored references.
    Delete,
}

/// Per-side result of a sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideOutcome {
    /// A fresh event was created and its reference stored.
    Created(String),
    /// The existing event was updated in place.
    Updated,
    /// The event was removed and the reference cleared.
    Deleted,
    /// Nothing to do: the calendar is not connected, or no event exists.
    Skipped,
    /// The side could not be converged.
    Failed(String),
}

/// Aggregate counters for a bulk sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Sessions processed.
    pub synced: usize,
    /// Events created (including self-heal recreations).
    pub created: usize,
    /// Events updated in place.
    pub updated: usize,
    /// Sides skipped for lack of a calendar connection.
    pub skipped: usize,
    /// Human-readable per-side failures.
    pub errors: Vec<String>,
}

impl SyncReport {
    fn absorb(&mut self, session: &Session, side: CalendarSide, outcome: &SideOutcome) {
        match outcome {
            SideOutcome::Created(_) => self.created += 1,
            SideOutcome::Updated => self.updated += 1,
            SideOutcome::Deleted => {}
            SideOutcome::Skipped => self.skipped += 1,
            SideOutcome::Failed(message) => self.errors.push(format!(
                "session {} {}: {}",
                session.id,
                side.label(),
                message
            )),
        }
    }
}

/// Converges remote calendars toward the session ledger.
#[derive(Debug)]
pub struct ReconciliationService {
    store: Arc<dyn LedgerStore>,
    calendar: Arc<dyn CalendarProvider>,
}

impl ReconciliationService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, calendar: Arc<dyn CalendarProvider>) -> Self {
        Self { store, calendar }
    }

    /// Syncs one session to both calendars. Never fails as a whole;
    /// each side reports its own outcome.
    pub async fn sync_session(
        &self,
        session: &Session,
        action: SyncAction,
    ) -> Vec<(CalendarSide, SideOutcome)> {
        let mut outcomes = Vec::with_capacity(CalendarSide::BOTH.len());
        for side in CalendarSide::BOTH {
            let outcome = self.sync_side(session, side, action).await;
            if let SideOutcome::Failed(message) = &outcome {
                warn!(
                    session_id = %session.id,
                    side = side.label(),
                    %message,
                    "calendar side failed to converge"
                );
            }
            outcomes.push((side, outcome));
        }
        outcomes
    }

    /// Syncs every non-cancelled session between a trainer and client.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the session list cannot be read.
    /// Calendar failures are recorded in the report, not returned.
    pub async fn sync_pair(
        &self,
        trainer_id: Uuid,
        client_id: Uuid,
    ) -> Result<SyncReport, GatewayError> {
        let sessions = self.store.list_pair_sessions(trainer_id, client_id).await?;
        let mut report = SyncReport {
            synced: sessions.len(),
            ..SyncReport::default()
        };
        for session in &sessions {
            for (side, outcome) in self.sync_session(session, SyncAction::Update).await {
                report.absorb(session, side, &outcome);
            }
        }
        info!(
            %trainer_id,
            %client_id,
            synced = report.synced,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            failures = report.errors.len(),
            "pair sync finished"
        );
        Ok(report)
    }

    async fn sync_side(
        &self,
        session: &Session,
        side: CalendarSide,
        action: SyncAction,
    ) -> SideOutcome {
        let owner = session.side_user(side);
        let binding = match self.store.find_binding(owner).await {
            Ok(Some(binding)) => binding,
            Ok(None) => return SideOutcome::Skipped,
            Err(error) => return SideOutcome::Failed(error.to_string()),
        };

        match action {
            SyncAction::Delete => {
                let Some(event_id) = session.event_id(side) else {
                    return SideOutcome::Skipped;
                };
                if let Err(error) = self.calendar.delete_event(&binding, event_id).await {
                    return SideOutcome::Failed(error.to_string());
                }
                match self
                    .store
                    .set_session_event_id(session.id, side, None)
                    .await
                {
                    Ok(()) => SideOutcome::Deleted,
                    Err(error) => SideOutcome::Failed(error.to_string()),
                }
            }
            SyncAction::Create => {
                let content = self.side_content(session, side).await;
                self.create_and_store(session, side, &binding, &content)
                    .await
            }
            SyncAction::Update => {
                let content = self.side_content(session, side).await;
                let Some(event_id) = session.event_id(side) else {
                    // No reference on record: heal by creating.
                    return self
                        .create_and_store(session, side, &binding, &content)
                        .await;
                };
                match self.calendar.update_event(&binding, event_id, &content).await {
                    Ok(()) => SideOutcome::Updated,
                    Err(error) => {
                        // Stale reference: the remote event is gone or
                        // unreachable. Recreate and adopt the new id.
                        warn!(
                            session_id = %session.id,
                            side = side.label(),
                            stale_event_id = event_id,
                            %error,
                            "update failed, recreating event"
                        );
                        self.create_and_store(session, side, &binding, &content)
                            .await
                    }
                }
            }
        }
    }

    async fn side_content(&self, session: &Session, side: CalendarSide) -> EventContent {
        let counterparty = self
            .store
            .find_profile(session.counterparty(side))
            .await
            .ok()
            .flatten();
        EventContent::for_side(session, side, counterparty.as_ref())
    }

    async fn create_and_store(
        &self,
        session: &Session,
        side: CalendarSide,
        binding: &crate::domain::CalendarBinding,
        content: &EventContent,
    ) -> SideOutcome {
        let event_id = match self.calendar.insert_event(binding, content).await {
            Ok(event_id) => event_id,
            Err(error) => return SideOutcome::Failed(error.to_string()),
        };
        match self
            .store
            .set_session_event_id(session.id, side, Some(&event_id))
            .await
        {
            Ok(()) => SideOutcome::Created(event_id),
            Err(error) => SideOutcome::Failed(error.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, Utc};

    use super::*;
    use crate::calendar::mock::MockCalendar;
    use crate::domain::{
        CalendarBinding, RescheduleState, SessionId, SessionStatus, UserProfile, UserRole,
    };
    use crate::persistence::MemoryLedger;

    struct Fixture {
        ledger: Arc<MemoryLedger>,
        calendar: Arc<MockCalendar>,
        service: ReconciliationService,
        trainer_id: Uuid,
        client_id: Uuid,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(MemoryLedger::new());
        let calendar = Arc::new(MockCalendar::new());
        let service = ReconciliationService::new(
            Arc::clone(&ledger) as Arc<dyn LedgerStore>,
            Arc::clone(&calendar) as Arc<dyn CalendarProvider>,
        );
        Fixture {
            ledger,
            calendar,
            service,
            trainer_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
        }
    }

    fn bind(fx: &Fixture, user_id: Uuid, calendar_id: &str) {
        let Ok(()) = fx.ledger.put_binding(CalendarBinding {
            user_id,
            refresh_token: "rt".to_string(),
            calendar_id: calendar_id.to_string(),
            connected_at: Utc::now(),
        }) else {
            panic!("binding seed should succeed");
        };
    }

    fn session(fx: &Fixture) -> Session {
        let Some(date) = NaiveDate::from_ymd_opt(2026, 4, 2) else {
            panic!("valid date");
        };
        let Some(start) = NaiveTime::from_hms_opt(10, 0, 0) else {
            panic!("valid time");
        };
        let session = Session {
            id: SessionId::new(),
            trainer_id: fx.trainer_id,
            client_id: fx.client_id,
            date,
            start_time: start,
            end_time: None,
            status: SessionStatus::Scheduled,
            session_type: "In-Person Training".to_string(),
            trainer_event_id: None,
            client_event_id: None,
            reschedule: RescheduleState::none(),
        };
        let Ok(()) = fx.ledger.put_session(session.clone()) else {
            panic!("session seed should succeed");
        };
        session
    }

    async fn stored(fx: &Fixture, id: SessionId) -> Session {
        let Ok(Some(session)) = fx.ledger.find_session(id).await else {
            panic!("session should exist");
        };
        session
    }

    #[tokio::test]
    async fn create_writes_events_and_references_on_both_sides() {
        let fx = fixture();
        bind(&fx, fx.trainer_id, "cal-trainer");
        bind(&fx, fx.client_id, "cal-client");
        let session = session(&fx);

        let outcomes = fx.service.sync_session(&session, SyncAction::Create).await;
        assert!(outcomes
            .iter()
            .all(|(_, o)| matches!(o, SideOutcome::Created(_))));

        let after = stored(&fx, session.id).await;
        assert!(after.trainer_event_id.is_some());
        assert!(after.client_event_id.is_some());
        let Ok(trainer_events) = fx.calendar.events_in("cal-trainer") else {
            panic!("mock events should list");
        };
        assert_eq!(trainer_events.len(), 1);
    }

    #[tokio::test]
    async fn stale_reference_self_heals_with_fresh_event() {
        let fx = fixture();
        bind(&fx, fx.trainer_id, "cal-trainer");
        let mut session = session(&fx);
        session.trainer_event_id = Some("evt-gone".to_string());
        let Ok(()) = fx.ledger.put_session(session.clone()) else {
            panic!("session seed should succeed");
        };

        let outcomes = fx.service.sync_session(&session, SyncAction::Update).await;
        let Some((_, SideOutcome::Created(new_id))) = outcomes
            .iter()
            .find(|(side, _)| *side == CalendarSide::Trainer)
        else {
            panic!("trainer side should self-heal by creating");
        };
        assert_ne!(new_id, "evt-gone");

        let after = stored(&fx, session.id).await;
        assert_eq!(after.trainer_event_id.as_deref(), Some(new_id.as_str()));
        let Ok(Some(_)) = fx.calendar.content_of(new_id) else {
            panic!("fresh event should exist remotely");
        };
    }

    #[tokio::test]
    async fn unconnected_side_is_skipped_not_failed() {
        let fx = fixture();
        bind(&fx, fx.trainer_id, "cal-trainer");
        let session = session(&fx);

        let outcomes = fx.service.sync_session(&session, SyncAction::Update).await;
        let mut by_side = outcomes.into_iter();
        let Some((CalendarSide::Trainer, SideOutcome::Created(_))) = by_side.next() else {
            panic!("trainer side should create");
        };
        let Some((CalendarSide::Client, SideOutcome::Skipped)) = by_side.next() else {
            panic!("client side should be skipped");
        };
    }

    #[tokio::test]
    async fn one_failing_side_does_not_block_the_other() {
        let fx = fixture();
        bind(&fx, fx.trainer_id, "cal-trainer");
        bind(&fx, fx.client_id, "cal-client");
        let Ok(()) = fx.calendar.fail_calendar("cal-client") else {
            panic!("mock setup should succeed");
        };
        let session = session(&fx);

        let outcomes = fx.service.sync_session(&session, SyncAction::Update).await;
        let Some((_, SideOutcome::Created(_))) = outcomes
            .iter()
            .find(|(side, _)| *side == CalendarSide::Trainer)
        else {
            panic!("trainer side should converge");
        };
        let Some((_, SideOutcome::Failed(_))) = outcomes
            .iter()
            .find(|(side, _)| *side == CalendarSide::Client)
        else {
            panic!("client side should report failure");
        };
    }

    #[tokio::test]
    async fn pair_sync_excludes_cancelled_sessions() {
        let fx = fixture();
        bind(&fx, fx.trainer_id, "cal-trainer");
        bind(&fx, fx.client_id, "cal-client");
        let _first = session(&fx);
        let _second = session(&fx);
        let mut cancelled = session(&fx);
        cancelled.status = SessionStatus::Cancelled;
        let Ok(()) = fx.ledger.put_session(cancelled) else {
            panic!("session seed should succeed");
        };

        let Ok(report) = fx.service.sync_pair(fx.trainer_id, fx.client_id).await else {
            panic!("pair sync should succeed");
        };
        assert_eq!(report.synced, 2);
        assert_eq!(report.created, 4, "two sessions, two sides each");
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn pair_sync_with_one_failing_session_reports_the_rest_synced() {
        let fx = fixture();
        bind(&fx, fx.trainer_id, "cal-trainer");
        let _first = session(&fx);
        let _second = session(&fx);
        let mut failing = session(&fx);
        failing.session_type = "Virtual Training".to_string();
        let Ok(()) = fx.ledger.put_session(failing.clone()) else {
            panic!("session seed should succeed");
        };
        let Ok(()) = fx.calendar.fail_matching("Virtual Training") else {
            panic!("mock setup should succeed");
        };

        let Ok(report) = fx.service.sync_pair(fx.trainer_id, fx.client_id).await else {
            panic!("pair sync should succeed");
        };
        assert_eq!(report.synced, 3);
        assert_eq!(report.created, 2, "the two healthy sessions converge");
        assert_eq!(report.errors.len(), 1);
        let Some(error) = report.errors.first() else {
            panic!("one error expected");
        };
        assert!(error.contains(&failing.id.to_string()));
    }

    #[tokio::test]
    async fn update_converges_content_and_uses_counterparty_name() {
        let fx = fixture();
        bind(&fx, fx.trainer_id, "cal-trainer");
        let Ok(()) = fx.ledger.put_profile(UserProfile {
            user_id: fx.client_id,
            name: "Dana".to_string(),
            email: Some("dana@example.com".to_string()),
            role: UserRole::Client,
        }) else {
            panic!("profile seed should succeed");
        };
        let session = session(&fx);

        let outcomes = fx.service.sync_session(&session, SyncAction::Create).await;
        let Some((_, SideOutcome::Created(event_id))) = outcomes
            .iter()
            .find(|(side, _)| *side == CalendarSide::Trainer)
        else {
            panic!("trainer side should create");
        };
        let Ok(Some(content)) = fx.calendar.content_of(event_id) else {
            panic!("event should exist");
        };
        assert_eq!(content.summary, "In-Person Training with Dana");
        assert_eq!(content.attendee.as_deref(), Some("dana@example.com"));
    }

    #[tokio::test]
    async fn delete_removes_event_and_clears_reference() {
        let fx = fixture();
        bind(&fx, fx.trainer_id, "cal-trainer");
        bind(&fx, fx.client_id, "cal-client");
        let session = session(&fx);
        fx.service.sync_session(&session, SyncAction::Create).await;
        let synced = stored(&fx, session.id).await;

        let outcomes = fx.service.sync_session(&synced, SyncAction::Delete).await;
        assert!(outcomes
            .iter()
            .all(|(_, o)| matches!(o, SideOutcome::Deleted)));

        let after = stored(&fx, session.id).await;
        assert!(after.trainer_event_id.is_none());
        assert!(after.client_event_id.is_none());
        let Ok(events) = fx.calendar.events_in("cal-trainer") else {
            panic!("mock events should list");
        };
        assert!(events.is_empty());
    }
}
