#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono_tz::Tz;
use http_body_util::BodyExt;
use meetings_service::components::google_calendar::{MeetProvider, StubMeetProvider};
use meetings_service::components::meetings::validation::ValidationSettings;
use meetings_service::components::store::{DocumentStore, InMemoryStore};
use meetings_service::handlers::{router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const MEET_BASE_URL: &str = "https://meet.google.com";

pub fn settings() -> ValidationSettings {
    ValidationSettings {
        timezone: Tz::UTC,
        default_duration_minutes: 30,
    }
}

/// Router over an empty in-memory store and the stub provider
pub fn test_app() -> (Router, Arc<dyn DocumentStore>) {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    let meet: Arc<dyn MeetProvider> = Arc::new(StubMeetProvider::new(MEET_BASE_URL));
    (app_with(Arc::clone(&store), meet), store)
}

pub fn app_with(store: Arc<dyn DocumentStore>, meet: Arc<dyn MeetProvider>) -> Router {
    router(AppState::new(store, meet, settings()))
}

/// Send one request and decode the JSON body (`Value::Null` when the body is not JSON)
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(
        app,
        method,
        uri,
        body.map(|b| b.to_string()).unwrap_or_default(),
    )
    .await;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: String,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, bytes)
}

/// Create a meeting through the handler and return its id
pub async fn create(app: &Router, body: Value) -> String {
    let (status, json) = send(app, Method::POST, "/createMeeting", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected response: {json}");
    json["data"]["id"].as_str().unwrap().to_string()
}
