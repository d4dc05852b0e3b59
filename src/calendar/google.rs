//! Google Calendar v3 client.
//!
//! Authentication is a per-call refresh-token exchange: each operation
//! mints a fresh access token from the owner's stored refresh token, so
//! the client carries no shared mutable token state.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::provider::{CalendarProvider, RemoteEvent};
use crate::config::GatewayConfig;
use crate::domain::{CalendarBinding, EventContent};
use crate::error::GatewayError;

/// Google Calendar v3 API client.
pub struct GoogleCalendar {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base: String,
}

impl std::fmt::Debug for GoogleCalendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleCalendar")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_url", &self.token_url)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EventItem {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    start: Option<EventTime>,
}

#[derive(Debug, Deserialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<EventItem>,
}

impl GoogleCalendar {
    /// Builds a client from the gateway configuration.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            token_url: config.google_token_url.clone(),
            api_base: config.google_api_base.clone(),
        }
    }

    async fn access_token(&self, binding: &CalendarBinding) -> Result<String, GatewayError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", binding.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::TokenRefresh(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::TokenRefresh(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::TokenRefresh(e.to_string()))?;
        Ok(token.access_token)
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}/events", self.api_base, calendar_id)
    }

    fn event_body(content: &EventContent) -> serde_json::Value {
        let mut body = json!({
            "summary": content.summary,
            "description": content.description,
            "start": { "dateTime": content.start.to_rfc3339() },
            "end": { "dateTime": content.end.to_rfc3339() },
        });
        if let Some(email) = &content.attendee {
            body["attendees"] = json!([{ "email": email }]);
        }
        body
    }
}

#[async_trait::async_trait]
impl CalendarProvider for GoogleCalendar {
    async fn insert_event(
        &self,
        binding: &CalendarBinding,
        content: &EventContent,
    ) -> Result<String, GatewayError> {
        let token = self.access_token(binding).await?;
        let response = self
            .http
            .post(self.events_url(&binding.calendar_id))
            .bearer_auth(&token)
            .json(&Self::event_body(content))
            .send()
            .await
            .map_err(|e| GatewayError::CalendarApi(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::CalendarApi(format!(
                "event insert returned {}",
                response.status()
            )));
        }

        let created: CreatedEvent = response
            .json()
            .await
            .map_err(|e| GatewayError::CalendarApi(e.to_string()))?;
        debug!(calendar_id = %binding.calendar_id, event_id = %created.id, "calendar event created");
        Ok(created.id)
    }

    async fn update_event(
        &self,
        binding: &CalendarBinding,
        event_id: &str,
        content: &EventContent,
    ) -> Result<(), GatewayError> {
        let token = self.access_token(binding).await?;
        let url = format!("{}/{}", self.events_url(&binding.calendar_id), event_id);
        let response = self
            .http
            .patch(url)
            .bearer_auth(&token)
            .json(&Self::event_body(content))
            .send()
            .await
            .map_err(|e| GatewayError::CalendarApi(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::CalendarApi(format!(
                "event update returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn delete_event(
        &self,
        binding: &CalendarBinding,
        event_id: &str,
    ) -> Result<(), GatewayError> {
        let token = self.access_token(binding).await?;
        let url = format!("{}/{}", self.events_url(&binding.calendar_id), event_id);
        let response = self
            .http
            .delete(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| GatewayError::CalendarApi(e.to_string()))?;

        // An already-deleted event is the desired end state.
        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND && status != StatusCode::GONE {
            return Err(GatewayError::CalendarApi(format!(
                "event delete returned {status}"
            )));
        }
        Ok(())
    }

    async fn list_events(
        &self,
        binding: &CalendarBinding,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        query: &str,
    ) -> Result<Vec<RemoteEvent>, GatewayError> {
        let token = self.access_token(binding).await?;
        let response = self
            .http
            .get(self.events_url(&binding.calendar_id))
            .bearer_auth(&token)
            .query(&[
                ("timeMin", window_start.to_rfc3339().as_str()),
                ("timeMax", window_end.to_rfc3339().as_str()),
                ("q", query),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::CalendarApi(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::CalendarApi(format!(
                "event list returned {}",
                response.status()
            )));
        }

        let list: EventList = response
            .json()
            .await
            .map_err(|e| GatewayError::CalendarApi(e.to_string()))?;
        Ok(list
            .items
            .into_iter()
            .map(|item| RemoteEvent {
                id: item.id,
                summary: item.summary.unwrap_or_default(),
                start: item.start.and_then(|s| s.date_time),
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;

    fn test_client(server_url: &str) -> GoogleCalendar {
        GoogleCalendar {
            http: reqwest::Client::new(),
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            token_url: format!("{server_url}/token"),
            api_base: format!("{server_url}/calendar/v3"),
        }
    }

    fn test_binding() -> CalendarBinding {
        CalendarBinding {
            user_id: Uuid::new_v4(),
            refresh_token: "rt_test".to_string(),
            calendar_id: "primary".to_string(),
            connected_at: Utc::now(),
        }
    }

    fn test_content() -> EventContent {
        let Some(start) = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).single() else {
            panic!("valid timestamp");
        };
        EventContent {
            summary: "In-Person Training with Dana".to_string(),
            description: "In-Person Training session with Dana".to_string(),
            start,
            end: start + chrono::Duration::minutes(60),
            attendee: Some("dana@example.com".to_string()),
        }
    }

    #[tokio::test]
    async fn insert_event_exchanges_token_and_returns_id() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                mockito::Matcher::UrlEncoded("refresh_token".into(), "rt_test".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"at_test","expires_in":3599}"#)
            .create_async()
            .await;
        let insert_mock = server
            .mock("POST", "/calendar/v3/calendars/primary/events")
            .match_header("authorization", "Bearer at_test")
            .with_status(200)
            .with_body(r#"{"id":"evt_123"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let Ok(event_id) = client.insert_event(&test_binding(), &test_content()).await else {
            panic!("insert should succeed");
        };
        assert_eq!(event_id, "evt_123");
        token_mock.assert_async().await;
        insert_mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_of_missing_event_is_calendar_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"at_test"}"#)
            .create_async()
            .await;
        server
            .mock("PATCH", "/calendar/v3/calendars/primary/events/evt_gone")
            .with_status(404)
            .with_body(r#"{"error":{"code":404}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client
            .update_event(&test_binding(), "evt_gone", &test_content())
            .await;
        assert!(matches!(result, Err(GatewayError::CalendarApi(_))));
    }

    #[tokio::test]
    async fn rejected_refresh_token_is_token_refresh_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client.insert_event(&test_binding(), &test_content()).await;
        assert!(matches!(result, Err(GatewayError::TokenRefresh(_))));
    }

    #[tokio::test]
    async fn delete_tolerates_already_gone_event() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"at_test"}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", "/calendar/v3/calendars/primary/events/evt_gone")
            .with_status(404)
            .create_async()
            .await;

        let client = test_client(&server.url());
        assert!(client.delete_event(&test_binding(), "evt_gone").await.is_ok());
    }

    #[tokio::test]
    async fn list_events_parses_items() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"at_test"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/calendar/v3/calendars/primary/events")
            .match_query(mockito::Matcher::UrlEncoded(
                "q".into(),
                "In-Person Training".into(),
            ))
            .with_status(200)
            .with_body(
                r#"{"items":[
                    {"id":"evt_1","summary":"In-Person Training with Dana",
                     "start":{"dateTime":"2026-03-10T09:00:00Z"}},
                    {"id":"evt_2","summary":"In-Person Training with Dana"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let Some(start) = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).single() else {
            panic!("valid timestamp");
        };
        let Ok(events) = client
            .list_events(
                &test_binding(),
                start,
                start + chrono::Duration::days(1),
                "In-Person Training",
            )
            .await
        else {
            panic!("list should succeed");
        };
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "evt_1");
        assert!(events[0].start.is_some());
        assert!(events[1].start.is_none());
    }
}
