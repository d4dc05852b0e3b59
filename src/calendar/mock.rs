//! In-process calendar double for service tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::provider::{CalendarProvider, RemoteEvent};
use crate::domain::{CalendarBinding, EventContent};
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    /// event id -> (calendar id, content)
    events: HashMap<String, (String, EventContent)>,
    fail_calendars: HashSet<String>,
    fail_summaries: Vec<String>,
}

/// Calendar double: stores events in memory and can simulate remote
/// failures per calendar and out-of-band event deletion.
#[derive(Debug, Default)]
pub struct MockCalendar {
    state: Mutex<MockState>,
}

impl MockCalendar {
    /// Creates an empty mock calendar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockState>, GatewayError> {
        self.state
            .lock()
            .map_err(|_| GatewayError::Internal("mock calendar mutex poisoned".to_string()))
    }

    /// Makes every call against the given calendar fail.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the mutex is poisoned.
    pub fn fail_calendar(&self, calendar_id: &str) -> Result<(), GatewayError> {
        self.lock()?.fail_calendars.insert(calendar_id.to_string());
        Ok(())
    }

    /// Makes insert/update fail for events whose summary contains the
    /// given text, regardless of calendar.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the mutex is poisoned.
    pub fn fail_matching(&self, summary_part: &str) -> Result<(), GatewayError> {
        self.lock()?.fail_summaries.push(summary_part.to_string());
        Ok(())
    }

    /// Removes an event as if a user deleted it out-of-band.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the mutex is poisoned.
    pub fn forget_event(&self, event_id: &str) -> Result<(), GatewayError> {
        self.lock()?.events.remove(event_id);
        Ok(())
    }

    /// Seeds an event directly, bypassing the insert path.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the mutex is poisoned.
    pub fn seed_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        content: EventContent,
    ) -> Result<(), GatewayError> {
        self.lock()?
            .events
            .insert(event_id.to_string(), (calendar_id.to_string(), content));
        Ok(())
    }

    /// Events currently stored for a calendar, as (event id, content).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the mutex is poisoned.
    pub fn events_in(&self, calendar_id: &str) -> Result<Vec<(String, EventContent)>, GatewayError> {
        let state = self.lock()?;
        let mut events: Vec<(String, EventContent)> = state
            .events
            .iter()
            .filter(|(_, (cal, _))| cal == calendar_id)
            .map(|(id, (_, content))| (id.clone(), content.clone()))
            .collect();
        events.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(events)
    }

    /// Content of a stored event, if present.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the mutex is poisoned.
    pub fn content_of(&self, event_id: &str) -> Result<Option<EventContent>, GatewayError> {
        let state = self.lock()?;
        Ok(state.events.get(event_id).map(|(_, c)| c.clone()))
    }
}

#[async_trait]
impl CalendarProvider for MockCalendar {
    async fn insert_event(
        &self,
        binding: &CalendarBinding,
        content: &EventContent,
    ) -> Result<String, GatewayError> {
        let mut state = self.lock()?;
        if state.fail_calendars.contains(&binding.calendar_id) {
            return Err(GatewayError::CalendarApi(format!(
                "simulated failure for {}",
                binding.calendar_id
            )));
        }
        if state
            .fail_summaries
            .iter()
            .any(|part| content.summary.contains(part))
        {
            return Err(GatewayError::CalendarApi(format!(
                "simulated failure for {}",
                content.summary
            )));
        }
        state.next_id += 1;
        let event_id = format!("mock-evt-{}", state.next_id);
        state.events.insert(
            event_id.clone(),
            (binding.calendar_id.clone(), content.clone()),
        );
        Ok(event_id)
    }

    async fn update_event(
        &self,
        binding: &CalendarBinding,
        event_id: &str,
        content: &EventContent,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        if state.fail_calendars.contains(&binding.calendar_id) {
            return Err(GatewayError::CalendarApi(format!(
                "simulated failure for {}",
                binding.calendar_id
            )));
        }
        if state
            .fail_summaries
            .iter()
            .any(|part| content.summary.contains(part))
        {
            return Err(GatewayError::CalendarApi(format!(
                "simulated failure for {}",
                content.summary
            )));
        }
        match state.events.get_mut(event_id) {
            Some((_, stored)) => {
                *stored = content.clone();
                Ok(())
            }
            None => Err(GatewayError::CalendarApi(format!(
                "event {event_id} not found"
            ))),
        }
    }

    async fn delete_event(
        &self,
        binding: &CalendarBinding,
        event_id: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        if state.fail_calendars.contains(&binding.calendar_id) {
            return Err(GatewayError::CalendarApi(format!(
                "simulated failure for {}",
                binding.calendar_id
            )));
        }
        state.events.remove(event_id);
        Ok(())
    }

    async fn list_events(
        &self,
        binding: &CalendarBinding,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        query: &str,
    ) -> Result<Vec<RemoteEvent>, GatewayError> {
        let state = self.lock()?;
        if state.fail_calendars.contains(&binding.calendar_id) {
            return Err(GatewayError::CalendarApi(format!(
                "simulated failure for {}",
                binding.calendar_id
            )));
        }
        let mut events: Vec<RemoteEvent> = state
            .events
            .iter()
            .filter(|(_, (cal, content))| {
                cal == &binding.calendar_id
                    && content.summary.contains(query)
                    && content.start >= window_start
                    && content.start < window_end
            })
            .map(|(id, (_, content))| RemoteEvent {
                id: id.clone(),
                summary: content.summary.clone(),
                start: Some(content.start),
            })
            .collect();
        events.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(events)
    }
}
