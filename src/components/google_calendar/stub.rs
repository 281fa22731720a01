use super::MeetProvider;
use crate::components::meetings::{Conference, Meeting};
use crate::error::ServiceResult;
use async_trait::async_trait;
use rand::Rng;

/// Letter groups of a Meet-style code, e.g. `abc-defg-hij`
const CODE_GROUPS: [usize; 3] = [3, 4, 3];

/// Generates join links locally without calling any calendar API
#[derive(Debug, Clone)]
pub struct StubMeetProvider {
    base_url: String,
}

impl StubMeetProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Random lowercase code grouped like a Meet code
pub fn generate_meeting_code() -> String {
    let mut rng = rand::rng();
    CODE_GROUPS
        .iter()
        .map(|&len| {
            (0..len)
                .map(|_| char::from(rng.random_range(b'a'..=b'z')))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[async_trait]
impl MeetProvider for StubMeetProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn create_conference(&self, _meeting: &Meeting) -> ServiceResult<Conference> {
        Ok(Conference {
            join_url: format!("{}/{}", self.base_url, generate_meeting_code()),
            event_id: None,
        })
    }

    async fn update_conference(&self, _meeting: &Meeting) -> ServiceResult<()> {
        Ok(())
    }

    async fn cancel_conference(&self, _meeting: &Meeting) -> ServiceResult<()> {
        Ok(())
    }
}
