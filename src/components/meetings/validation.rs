use super::models::{MeetingDraft, MeetingPatch, MeetingStatus};
use crate::config::MAX_MEETING_DURATION;
use crate::error::{invalid_argument, ServiceResult};
use crate::utils::time::parse_start_time;
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::HashSet;

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;
pub const MAX_ATTENDEES: usize = 100;

/// Settings validation needs from the configuration
#[derive(Debug, Clone, Copy)]
pub struct ValidationSettings {
    pub timezone: Tz,
    pub default_duration_minutes: u32,
}

/// Body of a create request. Every field is optional here so that missing
/// fields are reported by name instead of by the deserializer.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<i64>,
    pub attendees: Option<Vec<String>>,
}

/// Body of an update request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeetingRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<i64>,
    pub attendees: Option<Vec<String>>,
    pub status: Option<String>,
}

/// Return the trimmed value of a required field
pub fn require_field(value: Option<&str>, field: &str) -> ServiceResult<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| invalid_argument(&format!("Missing required field: {}", field)))
}

pub fn validate_create(
    request: CreateMeetingRequest,
    settings: &ValidationSettings,
) -> ServiceResult<MeetingDraft> {
    let title = validate_title(&require_field(request.title.as_deref(), "title")?)?;
    let start_time = require_field(request.start_time.as_deref(), "startTime")?;
    let start_time = validate_start_time(&start_time, settings.timezone)?;

    let duration_minutes = match request.duration_minutes {
        Some(duration) => validate_duration(duration)?,
        None => settings.default_duration_minutes,
    };

    let description = request
        .description
        .map(|d| validate_description(&d))
        .transpose()?
        .filter(|d| !d.is_empty());

    let attendees = request
        .attendees
        .map(validate_attendees)
        .transpose()?
        .unwrap_or_default();

    Ok(MeetingDraft {
        title,
        description,
        start_time,
        duration_minutes,
        attendees,
    })
}

pub fn validate_update(
    request: UpdateMeetingRequest,
    settings: &ValidationSettings,
) -> ServiceResult<(String, MeetingPatch)> {
    let id = require_field(request.id.as_deref(), "id")?;

    let title = match request.title {
        Some(title) if title.trim().is_empty() => {
            return Err(invalid_argument("Field 'title' cannot be empty"))
        }
        Some(title) => Some(validate_title(title.trim())?),
        None => None,
    };

    let start_time = request
        .start_time
        .map(|s| validate_start_time(&s, settings.timezone))
        .transpose()?;

    let patch = MeetingPatch {
        title,
        description: request
            .description
            .map(|d| validate_description(&d))
            .transpose()?,
        start_time,
        duration_minutes: request.duration_minutes.map(validate_duration).transpose()?,
        attendees: request.attendees.map(validate_attendees).transpose()?,
        status: request
            .status
            .map(|s| s.parse::<MeetingStatus>().map_err(|e| invalid_argument(&e)))
            .transpose()?,
    };

    if patch.is_empty() {
        return Err(invalid_argument("No fields to update"));
    }

    Ok((id, patch))
}

fn validate_title(title: &str) -> ServiceResult<String> {
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(invalid_argument(&format!(
            "Field 'title' must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(title.to_string())
}

fn validate_description(description: &str) -> ServiceResult<String> {
    let description = description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(invalid_argument(&format!(
            "Field 'description' must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(description.to_string())
}

fn validate_start_time(input: &str, tz: Tz) -> ServiceResult<chrono::DateTime<chrono::Utc>> {
    parse_start_time(input, tz).ok_or_else(|| {
        invalid_argument(&format!(
            "Invalid startTime '{}': expected an RFC 3339 timestamp or a local date-time",
            input.trim()
        ))
    })
}

fn validate_duration(duration: i64) -> ServiceResult<u32> {
    if !(1..=i64::from(MAX_MEETING_DURATION)).contains(&duration) {
        return Err(invalid_argument(&format!(
            "Field 'durationMinutes' must be between 1 and {}",
            MAX_MEETING_DURATION
        )));
    }
    Ok(duration as u32)
}

/// Normalise attendee addresses, dropping duplicates but keeping order
fn validate_attendees(attendees: Vec<String>) -> ServiceResult<Vec<String>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut normalized: Vec<String> = Vec::new();

    for attendee in attendees {
        let email = attendee.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(invalid_argument(&format!(
                "Invalid attendee email: '{}'",
                attendee.trim()
            )));
        }
        if seen.contains(&email) {
            continue;
        }
        // Stop at the first address over the cap
        if normalized.len() >= MAX_ATTENDEES {
            return Err(invalid_argument(&format!(
                "At most {} attendees are allowed",
                MAX_ATTENDEES
            )));
        }
        seen.insert(email.clone());
        normalized.push(email);
    }

    Ok(normalized)
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
