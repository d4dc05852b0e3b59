//! Operator maintenance: duplicate calendar events and orphaned
//! event references.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::calendar::CalendarProvider;
use crate::domain::SessionId;
use crate::error::GatewayError;
use crate::persistence::LedgerStore;

/// Removes duplicated remote events and resets stale references.
#[derive(Debug)]
pub struct CleanupService {
    store: Arc<dyn LedgerStore>,
    calendar: Arc<dyn CalendarProvider>,
}

impl CleanupService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, calendar: Arc<dyn CalendarProvider>) -> Self {
        Self { store, calendar }
    }

    async fn require_operator(&self, caller: Uuid) -> Result<(), GatewayError> {
        let profile = self
            .store
            .find_profile(caller)
            .await?
            .ok_or(GatewayError::UserNotFound(caller))?;
        if !profile.role.is_operator() {
            return Err(GatewayError::RoleRequired);
        }
        Ok(())
    }

    /// Scans the trainer's calendar within a session's time slot and
    /// deletes every event that duplicates it, keeping only the
    /// recorded one.
    ///
    /// Deletion is best-effort per event; a failed delete is logged and
    /// skipped so one stubborn event cannot abort the sweep. Returns the
    /// number of events removed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RoleRequired`] for non-operator callers,
    /// [`GatewayError::SessionNotFound`] for an unknown session, or
    /// [`GatewayError::CalendarApi`] if the listing itself fails.
    pub async fn remove_duplicate_events(
        &self,
        caller: Uuid,
        session_id: SessionId,
    ) -> Result<u64, GatewayError> {
        self.require_operator(caller).await?;

        let session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or(GatewayError::SessionNotFound(session_id.into()))?;
        let Some(binding) = self.store.find_binding(session.trainer_id).await? else {
            return Ok(0);
        };

        // Only events inside the session's own time slot are duplicate
        // candidates; a same-type session later that day must be left alone.
        let events = self
            .calendar
            .list_events(
                &binding,
                session.start_at(),
                session.end_at(),
                &session.session_type,
            )
            .await?;

        let keep = session.trainer_event_id.as_deref();
        let mut removed = 0u64;
        for event in events {
            if Some(event.id.as_str()) == keep {
                continue;
            }
            if !event.summary.starts_with(&session.session_type) {
                continue;
            }
            match self.calendar.delete_event(&binding, &event.id).await {
                Ok(()) => removed += 1,
                Err(error) => {
                    warn!(
                        session_id = %session_id,
                        event_id = %event.id,
                        %error,
                        "failed to delete duplicate event, skipping"
                    );
                }
            }
        }
        info!(session_id = %session_id, removed, "duplicate sweep finished");
        Ok(removed)
    }

    /// Clears every stored event reference in the ledger, forcing the
    /// next sync to recreate events from scratch. Returns the number of
    /// sessions touched.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RoleRequired`] for non-operator callers
    /// or a persistence error.
    pub async fn clear_orphaned_references(&self, caller: Uuid) -> Result<u64, GatewayError> {
        self.require_operator(caller).await?;
        let cleared = self.store.clear_event_references().await?;
        info!(cleared, "orphaned event references cleared");
        Ok(cleared)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, Utc};

    use super::*;
    use crate::calendar::mock::MockCalendar;
    use crate::domain::{
        CalendarBinding, EventContent, RescheduleState, Session, SessionStatus, UserProfile,
        UserRole,
    };
    use crate::persistence::MemoryLedger;

    struct Fixture {
        ledger: Arc<MemoryLedger>,
        calendar: Arc<MockCalendar>,
        service: CleanupService,
        trainer_id: Uuid,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(MemoryLedger::new());
        let calendar = Arc::new(MockCalendar::new());
        let service = CleanupService::new(
            Arc::clone(&ledger) as Arc<dyn LedgerStore>,
            Arc::clone(&calendar) as Arc<dyn CalendarProvider>,
        );
        let trainer_id = Uuid::new_v4();
        let Ok(()) = ledger.put_profile(UserProfile {
            user_id: trainer_id,
            name: "Alex".to_string(),
            email: None,
            role: UserRole::Trainer,
        }) else {
            panic!("profile seed should succeed");
        };
        Fixture {
            ledger,
            calendar,
            service,
            trainer_id,
        }
    }

    fn seed_session(fx: &Fixture, trainer_event_id: Option<&str>) -> Session {
        let Some(date) = NaiveDate::from_ymd_opt(2026, 4, 2) else {
            panic!("valid date");
        };
        let Some(start) = NaiveTime::from_hms_opt(10, 0, 0) else {
            panic!("valid time");
        };
        let session = Session {
            id: SessionId::new(),
            trainer_id: fx.trainer_id,
            client_id: Uuid::new_v4(),
            date,
            start_time: start,
            end_time: None,
            status: SessionStatus::Scheduled,
            session_type: "In-Person Training".to_string(),
            trainer_event_id: trainer_event_id.map(str::to_string),
            client_event_id: None,
            reschedule: RescheduleState::none(),
        };
        let Ok(()) = fx.ledger.put_session(session.clone()) else {
            panic!("session seed should succeed");
        };
        let Ok(()) = fx.ledger.put_binding(CalendarBinding {
            user_id: fx.trainer_id,
            refresh_token: "rt".to_string(),
            calendar_id: "cal-trainer".to_string(),
            connected_at: Utc::now(),
        }) else {
            panic!("binding seed should succeed");
        };
        session
    }

    fn seed_remote(fx: &Fixture, event_id: &str, session: &Session, summary: &str) {
        let content = EventContent {
            summary: summary.to_string(),
            description: String::new(),
            start: session.start_at(),
            end: session.end_at(),
            attendee: None,
        };
        let Ok(()) = fx.calendar.seed_event("cal-trainer", event_id, content) else {
            panic!("remote seed should succeed");
        };
    }

    #[tokio::test]
    async fn duplicate_sweep_keeps_only_the_recorded_event() {
        let fx = fixture();
        let session = seed_session(&fx, Some("evt-keep"));
        seed_remote(&fx, "evt-keep", &session, "In-Person Training with Dana");
        seed_remote(&fx, "evt-dupe-1", &session, "In-Person Training with Dana");
        seed_remote(&fx, "evt-dupe-2", &session, "In-Person Training with Dana");
        seed_remote(&fx, "evt-other", &session, "Dentist");

        let Ok(removed) = fx
            .service
            .remove_duplicate_events(fx.trainer_id, session.id)
            .await
        else {
            panic!("sweep should succeed");
        };
        assert_eq!(removed, 2);

        let Ok(remaining) = fx.calendar.events_in("cal-trainer") else {
            panic!("mock events should list");
        };
        let ids: Vec<&str> = remaining.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["evt-keep", "evt-other"]);
    }

    #[tokio::test]
    async fn sweep_leaves_same_day_sessions_of_the_same_type_alone() {
        let fx = fixture();
        let morning = seed_session(&fx, Some("evt-morning"));
        let Some(evening_start) = NaiveTime::from_hms_opt(17, 0, 0) else {
            panic!("valid time");
        };
        let evening = Session {
            id: SessionId::new(),
            start_time: evening_start,
            client_id: Uuid::new_v4(),
            trainer_event_id: Some("evt-evening".to_string()),
            ..morning.clone()
        };
        let Ok(()) = fx.ledger.put_session(evening.clone()) else {
            panic!("session seed should succeed");
        };
        seed_remote(&fx, "evt-morning", &morning, "In-Person Training with Dana");
        seed_remote(&fx, "evt-dupe", &morning, "In-Person Training with Dana");
        seed_remote(&fx, "evt-evening", &evening, "In-Person Training with Sam");

        let Ok(removed) = fx
            .service
            .remove_duplicate_events(fx.trainer_id, morning.id)
            .await
        else {
            panic!("sweep should succeed");
        };
        assert_eq!(removed, 1, "only the duplicate in the morning slot goes");

        let Ok(remaining) = fx.calendar.events_in("cal-trainer") else {
            panic!("mock events should list");
        };
        let ids: Vec<&str> = remaining.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["evt-evening", "evt-morning"]);
    }

    #[tokio::test]
    async fn sweep_without_calendar_connection_removes_nothing() {
        let fx = fixture();
        let Some(date) = NaiveDate::from_ymd_opt(2026, 4, 2) else {
            panic!("valid date");
        };
        let Some(start) = NaiveTime::from_hms_opt(10, 0, 0) else {
            panic!("valid time");
        };
        let session = Session {
            id: SessionId::new(),
            trainer_id: fx.trainer_id,
            client_id: Uuid::new_v4(),
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

        let Ok(removed) = fx
            .service
            .remove_duplicate_events(fx.trainer_id, session.id)
            .await
        else {
            panic!("sweep should succeed");
        };
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn clear_orphans_requires_operator_role() {
        let fx = fixture();
        let client_id = Uuid::new_v4();
        let Ok(()) = fx.ledger.put_profile(UserProfile {
            user_id: client_id,
            name: "Dana".to_string(),
            email: None,
            role: UserRole::Client,
        }) else {
            panic!("profile seed should succeed");
        };

        let result = fx.service.clear_orphaned_references(client_id).await;
        assert!(matches!(result, Err(GatewayError::RoleRequired)));
    }

    #[tokio::test]
    async fn clear_orphans_counts_touched_sessions() {
        let fx = fixture();
        let _with_refs = seed_session(&fx, Some("evt-1"));
        let _without_refs = seed_session(&fx, None);

        let Ok(cleared) = fx.service.clear_orphaned_references(fx.trainer_id).await else {
            panic!("clear should succeed");
        };
        assert_eq!(cleared, 1);

        let Ok(count) = fx.ledger.clear_event_references().await else {
            panic!("second clear should succeed");
        };
        assert_eq!(count, 0, "second pass finds nothing to clear");
    }
}
