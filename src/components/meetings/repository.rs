use super::models::{Meeting, MeetingStatus};
use crate::components::store::{collections, DocumentStore};
use crate::error::{store_error, ServiceResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

/// Filter applied when listing meetings
#[derive(Debug, Clone, Default)]
pub struct MeetingFilter {
    pub status: Option<MeetingStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl MeetingFilter {
    fn matches(&self, meeting: &Meeting) -> bool {
        self.status.map_or(true, |status| meeting.status == status)
            && self.from.map_or(true, |from| meeting.start_time >= from)
            && self.to.map_or(true, |to| meeting.start_time <= to)
    }
}

/// Typed access to the `meetings` collection
#[derive(Clone)]
pub struct MeetingRepository {
    store: Arc<dyn DocumentStore>,
}

impl MeetingRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Store a new meeting
    pub async fn insert(&self, meeting: &Meeting) -> ServiceResult<()> {
        self.save(meeting).await
    }

    /// Create or replace a meeting document
    pub async fn save(&self, meeting: &Meeting) -> ServiceResult<()> {
        let document = serde_json::to_value(meeting)
            .map_err(|e| store_error(&format!("Failed to serialize meeting: {}", e)))?;
        self.store
            .set(collections::MEETINGS, &meeting.id, document)
            .await
    }

    /// Find a meeting by id
    pub async fn find(&self, id: &str) -> ServiceResult<Option<Meeting>> {
        let Some(document) = self.store.get(collections::MEETINGS, id).await? else {
            return Ok(None);
        };

        serde_json::from_value(document)
            .map(Some)
            .map_err(|e| store_error(&format!("Failed to deserialize meeting {}: {}", id, e)))
    }

    /// List meetings matching the filter, earliest first
    pub async fn list(&self, filter: &MeetingFilter) -> ServiceResult<Vec<Meeting>> {
        let documents = self.store.list(collections::MEETINGS).await?;

        let mut meetings: Vec<Meeting> = documents
            .into_iter()
            .filter_map(|document| match serde_json::from_value::<Meeting>(document) {
                Ok(meeting) => Some(meeting),
                Err(e) => {
                    warn!("Skipping malformed meeting document: {}", e);
                    None
                }
            })
            .filter(|meeting| filter.matches(meeting))
            .collect();

        meetings.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));

        if let Some(limit) = filter.limit {
            meetings.truncate(limit);
        }

        Ok(meetings)
    }

    /// Delete a meeting, returning whether it existed
    pub async fn remove(&self, id: &str) -> ServiceResult<bool> {
        self.store.delete(collections::MEETINGS, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::meetings::models::MeetingDraft;
    use crate::components::store::InMemoryStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn meeting(id: &str, day: u32, status: MeetingStatus) -> Meeting {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut meeting = Meeting::scheduled(
            id.to_string(),
            MeetingDraft {
                title: format!("Meeting {}", id),
                description: None,
                start_time: Utc.with_ymd_and_hms(2026, 2, day, 10, 0, 0).unwrap(),
                duration_minutes: 30,
                attendees: Vec::new(),
            },
            now,
        );
        meeting.status = status;
        meeting
    }

    #[tokio::test]
    async fn test_list_sorts_filters_and_skips_malformed() {
        let store = Arc::new(InMemoryStore::new());
        let repo = MeetingRepository::new(store.clone());

        repo.insert(&meeting("c", 3, MeetingStatus::Scheduled)).await.unwrap();
        repo.insert(&meeting("a", 1, MeetingStatus::Scheduled)).await.unwrap();
        repo.insert(&meeting("b", 2, MeetingStatus::Cancelled)).await.unwrap();
        store
            .set(collections::MEETINGS, "broken", json!({"title": 42}))
            .await
            .unwrap();

        let all = repo.list(&MeetingFilter::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let scheduled = repo
            .list(&MeetingFilter {
                status: Some(MeetingStatus::Scheduled),
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].id, "a");

        let window = repo
            .list(&MeetingFilter {
                from: Some(Utc.with_ymd_and_hms(2026, 2, 2, 10, 0, 0).unwrap()),
                to: Some(Utc.with_ymd_and_hms(2026, 2, 3, 10, 0, 0).unwrap()),
                ..Default::default()
            })
            .await
            .unwrap();
        let ids: Vec<&str> = window.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_find_and_remove() {
        let repo = MeetingRepository::new(Arc::new(InMemoryStore::new()));
        let stored = meeting("a", 1, MeetingStatus::Scheduled);

        repo.insert(&stored).await.unwrap();
        assert_eq!(repo.find("a").await.unwrap(), Some(stored));
        assert!(repo.remove("a").await.unwrap());
        assert_eq!(repo.find("a").await.unwrap(), None);
        assert!(!repo.remove("a").await.unwrap());
    }
}
