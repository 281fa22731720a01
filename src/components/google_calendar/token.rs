use super::credentials::CalendarCredentials;
use crate::components::store::{collections, DocumentStore};
use crate::error::{google_calendar_error, ServiceResult};
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Id of the token document in the `tokens` collection
pub const TOKEN_DOCUMENT: &str = "google_calendar";

/// OAuth token endpoint
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are refreshed
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn DocumentStore>,
    client: Client,
}

/// Whether a token document is still usable at `now`.
/// `None` means the document carries no expiry.
pub fn is_token_fresh(token: &Value, now: i64) -> Option<bool> {
    let expiry = token.get("expires_at").and_then(|v| v.as_i64())?;
    Some(expiry - EXPIRY_MARGIN_SECS > now)
}

impl TokenManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            client: Client::new(),
        }
    }

    /// Get OAuth token, either from the store or by refreshing the stored one
    pub async fn get_token(&self, credentials: &CalendarCredentials) -> ServiceResult<Value> {
        let token = self
            .store
            .get(collections::TOKENS, TOKEN_DOCUMENT)
            .await?
            .ok_or_else(|| {
                google_calendar_error("No token found. Run get_calendar_token to authorize the service.")
            })?;

        match is_token_fresh(&token, Utc::now().timestamp()) {
            Some(true) => Ok(token),
            // Token is expired, refresh it
            Some(false) => self.refresh_token(&token, credentials).await,
            None => Err(google_calendar_error(
                "Stored token has no expiry. Run get_calendar_token to authorize the service.",
            )),
        }
    }

    /// Access token string for API requests
    pub async fn access_token(&self, credentials: &CalendarCredentials) -> ServiceResult<String> {
        let token = self.get_token(credentials).await?;
        token
            .get("access_token")
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| google_calendar_error("No access token available"))
    }

    /// Refresh an expired token
    async fn refresh_token(
        &self,
        token: &Value,
        credentials: &CalendarCredentials,
    ) -> ServiceResult<Value> {
        let refresh_token = token
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| google_calendar_error("No refresh token in token data"))?;

        info!("Refreshing Google Calendar access token");

        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let new_token: Value = response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse token response: {}", e)))?;

        let token_data = merge_refreshed_token(&new_token, refresh_token, Utc::now().timestamp())?;
        self.set_token(token_data.clone()).await?;

        Ok(token_data)
    }

    /// Store a token document (used by the authorization tool)
    pub async fn set_token(&self, token: Value) -> ServiceResult<()> {
        self.store
            .set(collections::TOKENS, TOKEN_DOCUMENT, token)
            .await
    }
}

/// Combine a refresh response with the refresh token we already hold
fn merge_refreshed_token(new_token: &Value, refresh_token: &str, now: i64) -> ServiceResult<Value> {
    let access_token = new_token
        .get("access_token")
        .cloned()
        .ok_or_else(|| google_calendar_error("Token response missing 'access_token' field"))?;

    let expires_in = new_token
        .get("expires_in")
        .and_then(|v| v.as_i64())
        .unwrap_or(3600);

    // Google only returns a new refresh token when it rotates it
    let refresh_token = new_token
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .unwrap_or(refresh_token);

    Ok(json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "expires_at": now + expires_in,
    }))
}
