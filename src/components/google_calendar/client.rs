use super::credentials::{CalendarCredentials, CredentialResolver};
use super::models::{
    CalendarEvent, ConferenceDataRequest, ConferenceSolutionKey, CreateConferenceRequest,
    EventAttendee, EventRequest,
};
use super::time::event_time;
use super::token::TokenManager;
use super::MeetProvider;
use crate::components::meetings::{Conference, Meeting};
use crate::components::store::DocumentStore;
use crate::config::Config;
use crate::error::{google_calendar_error, ServiceResult};
use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::{Client, Method, Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Calendar API root
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Creates Google Calendar events with Meet conferences for meetings
#[derive(Clone)]
pub struct GoogleCalendarClient {
    credentials: CredentialResolver,
    token_manager: TokenManager,
    client: Client,
    timezone: Tz,
    api_base: String,
}

impl GoogleCalendarClient {
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> ServiceResult<Self> {
        Ok(Self {
            credentials: CredentialResolver::new(Arc::clone(&store), config),
            token_manager: TokenManager::new(store),
            client: Client::new(),
            timezone: config.tz()?,
            api_base: CALENDAR_API_BASE.to_string(),
        })
    }

    /// URL of the events collection, or of one event
    fn events_url(&self, calendar_id: &str, event_id: Option<&str>) -> ServiceResult<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| google_calendar_error("Calendar API base cannot be a base URL"))?;
            segments.pop_if_empty().push("calendars").push(calendar_id).push("events");
            if let Some(event_id) = event_id {
                segments.push(event_id);
            }
        }

        Ok(url)
    }

    /// Event body for a meeting, optionally asking for a new Meet conference.
    ///
    /// Bodies without a conference are PATCHes, where an omitted description
    /// would leave the old one in place, so a cleared description is sent empty.
    fn event_body(&self, meeting: &Meeting, with_conference: bool) -> EventRequest {
        let description = if with_conference {
            meeting.description.clone()
        } else {
            Some(meeting.description.clone().unwrap_or_default())
        };

        EventRequest {
            summary: meeting.title.clone(),
            description,
            start: event_time(meeting.start_time, self.timezone),
            end: event_time(meeting.end_time(), self.timezone),
            attendees: meeting
                .attendees
                .iter()
                .map(|email| EventAttendee {
                    email: email.clone(),
                })
                .collect(),
            conference_data: with_conference.then(|| ConferenceDataRequest {
                create_request: CreateConferenceRequest {
                    request_id: uuid::Uuid::new_v4().to_string(),
                    conference_solution_key: ConferenceSolutionKey {
                        kind: "hangoutsMeet".to_string(),
                    },
                },
            }),
        }
    }

    async fn authorize(&self) -> ServiceResult<(CalendarCredentials, String)> {
        let credentials = self.credentials.resolve().await?;
        let access_token = self.token_manager.access_token(&credentials).await?;
        Ok((credentials, access_token))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        access_token: &str,
        body: Option<&EventRequest>,
    ) -> ServiceResult<Response> {
        debug!("Calendar API {} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", access_token));
        if let Some(body) = body {
            request = request.json(body);
        }

        request
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Calendar request failed: {}", e)))
    }
}

/// Turn a non-success response into an error carrying the body
async fn ensure_success(response: Response, action: &str) -> ServiceResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());
    Err(google_calendar_error(&format!(
        "Failed to {}: HTTP {} - {}",
        action, status, error_body
    )))
}

#[async_trait]
impl MeetProvider for GoogleCalendarClient {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn create_conference(&self, meeting: &Meeting) -> ServiceResult<Conference> {
        let (credentials, access_token) = self.authorize().await?;

        let mut url = self.events_url(&credentials.calendar_id, None)?;
        url.query_pairs_mut().append_pair("conferenceDataVersion", "1");

        let body = self.event_body(meeting, true);
        let response = self.send(Method::POST, url, &access_token, Some(&body)).await?;
        let response = ensure_success(response, "create event").await?;

        let event: CalendarEvent = response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse event response: {}", e)))?;

        let join_url = event
            .join_url()
            .ok_or_else(|| google_calendar_error("Created event has no Meet link"))?
            .to_string();

        info!("Created calendar event {} for meeting {}", event.id, meeting.id);

        Ok(Conference {
            join_url,
            event_id: Some(event.id),
        })
    }

    async fn update_conference(&self, meeting: &Meeting) -> ServiceResult<()> {
        let Some(event_id) = meeting.calendar_event_id.as_deref() else {
            return Ok(());
        };

        let (credentials, access_token) = self.authorize().await?;
        let url = self.events_url(&credentials.calendar_id, Some(event_id))?;

        let body = self.event_body(meeting, false);
        let response = self.send(Method::PATCH, url, &access_token, Some(&body)).await?;
        ensure_success(response, "update event").await?;

        info!("Updated calendar event {} for meeting {}", event_id, meeting.id);
        Ok(())
    }

    async fn cancel_conference(&self, meeting: &Meeting) -> ServiceResult<()> {
        let Some(event_id) = meeting.calendar_event_id.as_deref() else {
            return Ok(());
        };

        let (credentials, access_token) = self.authorize().await?;
        let url = self.events_url(&credentials.calendar_id, Some(event_id))?;

        let response = self.send(Method::DELETE, url, &access_token, None).await?;
        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            debug!("Calendar event {} already removed", event_id);
            return Ok(());
        }
        ensure_success(response, "delete event").await?;

        info!("Deleted calendar event {} for meeting {}", event_id, meeting.id);
        Ok(())
    }
}
