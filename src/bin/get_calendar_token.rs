use meetings_service::components::google_calendar::token::TOKEN_URL;
use meetings_service::components::google_calendar::{CredentialResolver, TokenManager};
use meetings_service::components::redis_service::RedisActor;
use meetings_service::components::store::DocumentStore;
use meetings_service::config::Config;
use meetings_service::error::{other_error, ServiceResult};
use serde_json::json;
use std::sync::Arc;

const REDIRECT_URI: &str = "http://localhost:8080";
const CALLBACK_ADDRESS: &str = "0.0.0.0:8080";
const SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

/// Pull a query parameter out of the callback request path
fn callback_param(path: &str, name: &str) -> Option<String> {
    let query = path.split_once('?').map(|(_, q)| q)?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    run().await?;
    Ok(())
}

async fn run() -> ServiceResult<()> {
    // Load configuration
    let config = Config::load()?;

    // Tokens live in Redis, same as for the service
    let (mut redis_actor, redis_handle) = RedisActor::connect(&config.redis_url).await?;
    let _redis_task = tokio::spawn(async move {
        redis_actor.run().await;
    });
    let store: Arc<dyn DocumentStore> = Arc::new(redis_handle.clone());

    let credentials = CredentialResolver::new(Arc::clone(&store), &config)
        .resolve()
        .await?;
    let token_manager = TokenManager::new(store);

    // Random state guards the callback
    let state = uuid::Uuid::new_v4().to_string();

    let auth_url = url::Url::parse_with_params(
        "https://accounts.google.com/o/oauth2/v2/auth",
        &[
            ("client_id", credentials.client_id.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("response_type", "code"),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("scope", SCOPE),
            ("state", state.as_str()),
        ],
    )
    .map_err(|e| other_error(&format!("Invalid authorization URL: {}", e)))?;

    println!("Opening browser for Google Calendar authorization...");
    if webbrowser::open(auth_url.as_str()).is_err() {
        println!("Could not open a browser, visit this URL instead:\n{}", auth_url);
    }

    // Start local server to receive the callback
    let server = tiny_http::Server::http(CALLBACK_ADDRESS)
        .map_err(|e| other_error(&format!("Failed to start callback server: {}", e)))?;
    println!("Waiting for authorization callback...");

    let request = server.recv()?;
    let path = request.url().to_string();

    if callback_param(&path, "state").as_deref() != Some(state.as_str()) {
        return Err(other_error("Authorization callback state does not match"));
    }

    let code = callback_param(&path, "code")
        .ok_or_else(|| other_error("No authorization code found in callback"))?;

    // Exchange code for tokens
    let response = reqwest::Client::new()
        .post(TOKEN_URL)
        .form(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let error_text = response.text().await?;
        return Err(other_error(&format!("Failed to get token: {}", error_text)));
    }

    let mut token_data: serde_json::Value = response.json().await?;

    let expires_in = token_data
        .get("expires_in")
        .and_then(|v| v.as_i64())
        .unwrap_or(3600);
    let expires_at = chrono::Utc::now().timestamp() + expires_in;

    match token_data.as_object_mut() {
        Some(obj) => {
            obj.insert("expires_at".to_string(), json!(expires_at));
        }
        None => return Err(other_error("Token data is not an object")),
    }

    token_manager.set_token(token_data).await?;

    let response =
        tiny_http::Response::from_string("Authorization successful! You can close this window.");
    request.respond(response)?;

    println!("Token successfully saved to Redis!");

    redis_handle.shutdown().await?;
    Ok(())
}
