use crate::components::store::{collections, DocumentStore};
use crate::config::Config;
use crate::error::{config_error, ServiceResult};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Id of the remote config document holding calendar credentials
pub const CREDENTIALS_DOCUMENT: &str = "google_calendar";

/// Calendar used when none is configured
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Calendar settings as stored in remote config
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub calendar_id: Option<String>,
}

/// Complete credentials for the Google Calendar API
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub calendar_id: String,
}

/// Looks up calendar credentials in remote config, falling back to the environment
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn DocumentStore>,
    fallback: CalendarSettings,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        Self {
            store,
            fallback: CalendarSettings {
                client_id: config.google_client_id.clone(),
                client_secret: config.google_client_secret.clone(),
                calendar_id: config.google_calendar_id.clone(),
            },
        }
    }

    /// Read the remote config document, if any
    async fn remote_settings(&self) -> CalendarSettings {
        match self.store.get(collections::CONFIG, CREDENTIALS_DOCUMENT).await {
            Ok(Some(document)) => match serde_json::from_value(document) {
                Ok(settings) => {
                    debug!("Using calendar settings from remote config");
                    settings
                }
                Err(e) => {
                    warn!("Ignoring malformed remote calendar config: {}", e);
                    CalendarSettings::default()
                }
            },
            Ok(None) => CalendarSettings::default(),
            Err(e) => {
                warn!("Could not read remote calendar config: {}", e);
                CalendarSettings::default()
            }
        }
    }

    /// Resolve credentials, remote config taking precedence field by field
    pub async fn resolve(&self) -> ServiceResult<CalendarCredentials> {
        let remote = self.remote_settings().await;

        let pick = |remote: Option<String>, fallback: &Option<String>| {
            remote
                .or_else(|| fallback.clone())
                .filter(|v| !v.trim().is_empty())
        };

        let client_id = pick(remote.client_id, &self.fallback.client_id);
        let client_secret = pick(remote.client_secret, &self.fallback.client_secret);
        let calendar_id = pick(remote.calendar_id, &self.fallback.calendar_id)
            .unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string());

        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(CalendarCredentials {
                client_id,
                client_secret,
                calendar_id,
            }),
            (client_id, client_secret) => {
                let missing: Vec<&str> = [
                    client_id.is_none().then_some("clientId"),
                    client_secret.is_none().then_some("clientSecret"),
                ]
                .into_iter()
                .flatten()
                .collect();

                Err(config_error(&format!(
                    "Google Calendar credentials are not configured: missing {}",
                    missing.join(", ")
                )))
            }
        }
    }
}
