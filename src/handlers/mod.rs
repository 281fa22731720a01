mod meetings;
mod request;
mod response;

pub use meetings::{
    create_meeting, delete_meeting, get_meeting, health_handler, list_meetings, update_meeting,
    DeletedMeeting, MeetingList, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT,
};
pub use response::ApiResponse;

use crate::components::google_calendar::MeetProvider;
use crate::components::meetings::validation::ValidationSettings;
use crate::components::meetings::MeetingRepository;
use crate::components::store::DocumentStore;
use crate::config::Config;
use crate::error::{not_found, Error, ServiceResult};
use axum::http::Uri;
use axum::routing::any;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Meetings collection
    pub meetings: MeetingRepository,
    /// Join link and calendar provider
    pub meet: Arc<dyn MeetProvider>,
    /// Validation defaults taken from the configuration
    pub settings: ValidationSettings,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        meet: Arc<dyn MeetProvider>,
        settings: ValidationSettings,
    ) -> Self {
        Self {
            meetings: MeetingRepository::new(store),
            meet,
            settings,
        }
    }

    /// Build state using the validation defaults from the configuration
    pub fn from_config(
        config: &Config,
        store: Arc<dyn DocumentStore>,
        meet: Arc<dyn MeetProvider>,
    ) -> ServiceResult<Self> {
        let settings = ValidationSettings {
            timezone: config.tz()?,
            default_duration_minutes: config.default_duration_minutes,
        };
        Ok(Self::new(store, meet, settings))
    }
}

async fn route_not_found(uri: Uri) -> Error {
    not_found(&format!("No handler for {}", uri.path()))
}

/// Build the router exposing every meeting handler.
///
/// Handlers accept any method on their path and enforce the allowed ones
/// themselves so that rejections use the JSON error envelope.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/createMeeting", any(create_meeting))
        .route("/getMeeting", any(get_meeting))
        .route("/listMeetings", any(list_meetings))
        .route("/updateMeeting", any(update_meeting))
        .route("/deleteMeeting", any(delete_meeting))
        .route("/health", any(health_handler))
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
