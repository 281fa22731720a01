use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    #[default]
    Scheduled,
    Cancelled,
    Completed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "scheduled",
            MeetingStatus::Cancelled => "cancelled",
            MeetingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "scheduled" => Ok(MeetingStatus::Scheduled),
            "cancelled" => Ok(MeetingStatus::Cancelled),
            "completed" => Ok(MeetingStatus::Completed),
            other => Err(format!(
                "Invalid status '{}': expected one of scheduled, cancelled, completed",
                other
            )),
        }
    }
}

/// A meeting record, stored as one document in the `meetings` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub join_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub status: MeetingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new meeting
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingDraft {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub attendees: Vec<String>,
}

/// Join details returned by a meet provider
#[derive(Debug, Clone, PartialEq)]
pub struct Conference {
    pub join_url: String,
    pub event_id: Option<String>,
}

/// Validated changes to an existing meeting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeetingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub attendees: Option<Vec<String>>,
    pub status: Option<MeetingStatus>,
}

/// What a patch means for the calendar event behind a meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchEffect {
    /// Event details changed while the meeting is still scheduled
    pub reschedule: bool,
    /// The meeting moved to the cancelled state
    pub cancelled: bool,
    /// A cancelled meeting was scheduled again and needs a new conference
    pub reopened: bool,
}

impl Meeting {
    /// Create a scheduled meeting without join details
    pub fn scheduled(id: String, draft: MeetingDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            start_time: draft.start_time,
            duration_minutes: draft.duration_minutes,
            join_url: String::new(),
            calendar_event_id: None,
            attendees: draft.attendees,
            status: MeetingStatus::Scheduled,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach the join link and calendar event returned by the provider
    pub fn attach_conference(&mut self, conference: Conference) {
        self.join_url = conference.join_url;
        self.calendar_event_id = conference.event_id;
    }

    /// When the meeting ends
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(i64::from(self.duration_minutes))
    }
}

impl MeetingPatch {
    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_time.is_none()
            && self.duration_minutes.is_none()
            && self.attendees.is_none()
            && self.status.is_none()
    }

    /// Apply the patch and refresh `updated_at`
    pub fn apply(self, meeting: &mut Meeting, now: DateTime<Utc>) -> PatchEffect {
        let mut details_changed = false;

        if let Some(title) = self.title {
            details_changed |= meeting.title != title;
            meeting.title = title;
        }
        if let Some(description) = self.description {
            // An empty description clears it
            let description = Some(description).filter(|d| !d.is_empty());
            details_changed |= meeting.description != description;
            meeting.description = description;
        }
        if let Some(start_time) = self.start_time {
            details_changed |= meeting.start_time != start_time;
            meeting.start_time = start_time;
        }
        if let Some(duration) = self.duration_minutes {
            details_changed |= meeting.duration_minutes != duration;
            meeting.duration_minutes = duration;
        }
        if let Some(attendees) = self.attendees {
            details_changed |= meeting.attendees != attendees;
            meeting.attendees = attendees;
        }

        let previous_status = meeting.status;
        if let Some(status) = self.status {
            meeting.status = status;
        }

        meeting.updated_at = now.max(meeting.created_at);

        let reopened = previous_status == MeetingStatus::Cancelled
            && meeting.status == MeetingStatus::Scheduled;

        PatchEffect {
            reschedule: details_changed
                && meeting.status == MeetingStatus::Scheduled
                && !reopened,
            cancelled: previous_status != MeetingStatus::Cancelled
                && meeting.status == MeetingStatus::Cancelled,
            reopened,
        }
    }
}
