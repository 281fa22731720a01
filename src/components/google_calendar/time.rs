use super::models::EventTime;
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;

/// Express an instant as a calendar event time in the given timezone
pub fn event_time(instant: DateTime<Utc>, tz: Tz) -> EventTime {
    EventTime {
        date_time: instant
            .with_timezone(&tz)
            .to_rfc3339_opts(SecondsFormat::Secs, false),
        time_zone: tz.name().to_string(),
    }
}
