mod client;
pub mod credentials;
pub mod models;
mod stub;
mod time;
pub mod token;

pub use client::GoogleCalendarClient;
pub use credentials::{CalendarCredentials, CredentialResolver};
pub use stub::{generate_meeting_code, StubMeetProvider};
pub use token::TokenManager;

use crate::components::meetings::{Conference, Meeting};
use crate::components::store::DocumentStore;
use crate::config::{Config, MeetProviderKind};
use crate::error::ServiceResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Source of join links and calendar events for meetings
#[async_trait]
pub trait MeetProvider: Send + Sync + 'static {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// Create the conference for a new meeting
    async fn create_conference(&self, meeting: &Meeting) -> ServiceResult<Conference>;

    /// Push changed meeting details to the conference
    async fn update_conference(&self, meeting: &Meeting) -> ServiceResult<()>;

    /// Cancel the conference of a meeting
    async fn cancel_conference(&self, meeting: &Meeting) -> ServiceResult<()>;
}

/// Build the provider selected in the configuration
pub fn build_provider(
    config: &Config,
    store: Arc<dyn DocumentStore>,
) -> ServiceResult<Arc<dyn MeetProvider>> {
    let provider: Arc<dyn MeetProvider> = match config.meet_provider {
        MeetProviderKind::Stub => Arc::new(StubMeetProvider::new(config.meet_base_url.clone())),
        MeetProviderKind::Google => Arc::new(GoogleCalendarClient::new(store, config)?),
    };

    info!("Using {} meet provider", provider.name());
    Ok(provider)
}
