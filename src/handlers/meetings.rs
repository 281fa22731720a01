use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::Method;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::request::{parse_body, query_params, require_method};
use super::response::{created, ok};
use super::AppState;
use crate::components::meetings::validation::{
    require_field, validate_create, validate_update, CreateMeetingRequest, UpdateMeetingRequest,
};
use crate::components::meetings::{Meeting, MeetingFilter, MeetingStatus};
use crate::error::{invalid_argument, not_found, ServiceResult};
use crate::utils::time::parse_bound;

/// Listing size when no limit is given
pub const DEFAULT_LIST_LIMIT: usize = 50;
/// Largest listing a client may ask for
pub const MAX_LIST_LIMIT: usize = 100;

#[derive(Debug, Serialize)]
pub struct MeetingList {
    pub meetings: Vec<Meeting>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeletedMeeting {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteMeetingRequest {
    id: Option<String>,
}

fn meeting_not_found(id: &str) -> crate::error::Error {
    not_found(&format!("Meeting {} not found", id))
}

/// POST /createMeeting
pub async fn create_meeting(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> ServiceResult<impl IntoResponse> {
    require_method(&method, "POST")?;

    let request: CreateMeetingRequest = parse_body(&body)?;
    let draft = validate_create(request, &state.settings)?;

    let mut meeting = Meeting::scheduled(Uuid::new_v4().to_string(), draft, Utc::now());
    let conference = state.meet.create_conference(&meeting).await?;
    meeting.attach_conference(conference);

    state.meetings.insert(&meeting).await?;
    info!("Created meeting {} starting at {}", meeting.id, meeting.start_time);

    Ok(created(meeting))
}

/// GET /getMeeting?id=
pub async fn get_meeting(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
) -> ServiceResult<impl IntoResponse> {
    require_method(&method, "GET")?;

    let params = query_params(query.as_deref());
    let id = require_field(params.get("id").map(String::as_str), "id")?;

    let meeting = state
        .meetings
        .find(&id)
        .await?
        .ok_or_else(|| meeting_not_found(&id))?;

    Ok(ok(meeting))
}

/// GET /listMeetings?status=&from=&to=&limit=
pub async fn list_meetings(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
) -> ServiceResult<impl IntoResponse> {
    require_method(&method, "GET")?;

    let params = query_params(query.as_deref());
    let filter = list_filter(&params)?;

    let meetings = state.meetings.list(&filter).await?;
    let count = meetings.len();

    Ok(ok(MeetingList { meetings, count }))
}

fn list_filter(
    params: &std::collections::HashMap<String, String>,
) -> ServiceResult<MeetingFilter> {
    let status = params
        .get("status")
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<MeetingStatus>().map_err(|e| invalid_argument(&e)))
        .transpose()?;

    let bound = |name: &str| {
        params
            .get(name)
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                parse_bound(s).ok_or_else(|| {
                    invalid_argument(&format!("Invalid {} '{}': expected an RFC 3339 timestamp", name, s))
                })
            })
            .transpose()
    };
    let from = bound("from")?;
    let to = bound("to")?;

    let limit = match params.get("limit").filter(|s| !s.trim().is_empty()) {
        Some(limit) => match limit.trim().parse::<usize>() {
            Ok(limit) if (1..=MAX_LIST_LIMIT).contains(&limit) => limit,
            _ => {
                return Err(invalid_argument(&format!(
                    "Invalid limit '{}': expected a number between 1 and {}",
                    limit, MAX_LIST_LIMIT
                )))
            }
        },
        None => DEFAULT_LIST_LIMIT,
    };

    Ok(MeetingFilter {
        status,
        from,
        to,
        limit: Some(limit),
    })
}

/// PUT or PATCH /updateMeeting
pub async fn update_meeting(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> ServiceResult<impl IntoResponse> {
    require_method(&method, "PUT, PATCH")?;

    let mut request: UpdateMeetingRequest = parse_body(&body)?;
    if request.id.is_none() {
        request.id = query_params(query.as_deref()).remove("id");
    }
    let (id, patch) = validate_update(request, &state.settings)?;

    let mut meeting = state
        .meetings
        .find(&id)
        .await?
        .ok_or_else(|| meeting_not_found(&id))?;

    let effect = patch.apply(&mut meeting, Utc::now());
    if effect.cancelled {
        state.meet.cancel_conference(&meeting).await?;
    } else if effect.reopened {
        // The old event was removed on cancellation
        let conference = state.meet.create_conference(&meeting).await?;
        meeting.attach_conference(conference);
    } else if effect.reschedule {
        state.meet.update_conference(&meeting).await?;
    }

    state.meetings.save(&meeting).await?;
    info!("Updated meeting {} (status {})", meeting.id, meeting.status);

    Ok(ok(meeting))
}

/// DELETE /deleteMeeting?id=
pub async fn delete_meeting(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> ServiceResult<impl IntoResponse> {
    require_method(&method, "DELETE")?;

    let request: DeleteMeetingRequest = parse_body(&body)?;
    let id = query_params(query.as_deref()).remove("id").or(request.id);
    let id = require_field(id.as_deref(), "id")?;

    let meeting = state
        .meetings
        .find(&id)
        .await?
        .ok_or_else(|| meeting_not_found(&id))?;

    if meeting.status == MeetingStatus::Scheduled {
        if let Err(e) = state.meet.cancel_conference(&meeting).await {
            warn!("Failed to cancel conference for meeting {}: {}", id, e);
        }
    }

    if !state.meetings.remove(&id).await? {
        return Err(meeting_not_found(&id));
    }
    info!("Deleted meeting {}", id);

    Ok(ok(DeletedMeeting { id, deleted: true }))
}

/// GET /health
pub async fn health_handler(method: Method) -> ServiceResult<&'static str> {
    require_method(&method, "GET")?;
    Ok("OK")
}
