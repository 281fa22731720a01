mod common;

use axum::http::{header, Method, StatusCode};
use common::{create, send, send_raw, test_app, MEET_BASE_URL};
use meetings_service::components::store::DocumentStore;
use serde_json::json;

#[tokio::test]
async fn test_create_meeting() {
    let (app, _) = test_app();

    let (status, json) = send(
        &app,
        Method::POST,
        "/createMeeting",
        Some(json!({
            "title": "  Sprint planning ",
            "startTime": "2026-11-02T09:00:00Z",
            "attendees": ["Alice@Example.com", "bob@example.com", "alice@example.com"]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    let meeting = &json["data"];
    assert_eq!(meeting["title"], "Sprint planning");
    assert_eq!(meeting["status"], "scheduled");
    assert_eq!(meeting["durationMinutes"], 30);
    assert_eq!(meeting["startTime"], "2026-11-02T09:00:00Z");
    assert_eq!(meeting["attendees"], json!(["alice@example.com", "bob@example.com"]));
    assert!(meeting["joinUrl"]
        .as_str()
        .unwrap()
        .starts_with(&format!("{}/", MEET_BASE_URL)));
    assert!(!meeting["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_meeting_local_time_uses_timezone() {
    let (app, _) = test_app();

    let (status, json) = send(
        &app,
        Method::POST,
        "/createMeeting",
        Some(json!({ "title": "Retro", "startTime": "2026-11-02 15:30", "durationMinutes": 45 })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["startTime"], "2026-11-02T15:30:00Z");
    assert_eq!(json["data"]["durationMinutes"], 45);
}

#[tokio::test]
async fn test_create_meeting_missing_title() {
    let (app, _) = test_app();

    let (status, json) = send(
        &app,
        Method::POST,
        "/createMeeting",
        Some(json!({ "startTime": "2026-11-02T09:00:00Z" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "INVALID_ARGUMENT");
    assert_eq!(json["error"]["message"], "Missing required field: title");
}

#[tokio::test]
async fn test_create_meeting_invalid_json() {
    let (app, _) = test_app();

    let (status, _, bytes) =
        send_raw(&app, Method::POST, "/createMeeting", "{not json".to_string()).await;
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_ARGUMENT");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn test_create_meeting_wrong_method() {
    let (app, _) = test_app();

    let (status, headers, bytes) =
        send_raw(&app, Method::GET, "/createMeeting", String::new()).await;
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[header::ALLOW], "POST");
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_get_meeting() {
    let (app, _) = test_app();
    let id = create(
        &app,
        json!({ "title": "Standup", "startTime": "2026-11-02T08:00:00Z" }),
    )
    .await;

    let (status, json) = send(&app, Method::GET, &format!("/getMeeting?id={}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], id.as_str());
    assert_eq!(json["data"]["title"], "Standup");
}

#[tokio::test]
async fn test_get_meeting_errors() {
    let (app, _) = test_app();

    let (status, json) = send(&app, Method::GET, "/getMeeting", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Missing required field: id");

    let (status, json) = send(&app, Method::GET, "/getMeeting?id=missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert_eq!(json["error"]["message"], "Meeting missing not found");
}

#[tokio::test]
async fn test_list_meetings_filters() {
    let (app, _) = test_app();
    let late = create(&app, json!({ "title": "Late", "startTime": "2026-11-03T16:00:00Z" })).await;
    let early = create(&app, json!({ "title": "Early", "startTime": "2026-11-01T09:00:00Z" })).await;
    let cancelled = create(&app, json!({ "title": "Gone", "startTime": "2026-11-02T09:00:00Z" })).await;

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/updateMeeting",
        Some(json!({ "id": cancelled, "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, Method::GET, "/listMeetings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["count"], 3);
    assert_eq!(json["data"]["meetings"][0]["id"], early.as_str());
    assert_eq!(json["data"]["meetings"][2]["id"], late.as_str());

    let (_, json) = send(&app, Method::GET, "/listMeetings?status=scheduled", None).await;
    assert_eq!(json["data"]["count"], 2);

    let (_, json) = send(
        &app,
        Method::GET,
        "/listMeetings?from=2026-11-02T00:00:00Z&to=2026-11-04T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(json["data"]["count"], 2);

    let (_, json) = send(&app, Method::GET, "/listMeetings?limit=1", None).await;
    assert_eq!(json["data"]["count"], 1);
    assert_eq!(json["data"]["meetings"][0]["id"], early.as_str());
}

#[tokio::test]
async fn test_list_meetings_rejects_bad_parameters() {
    let (app, _) = test_app();

    for uri in [
        "/listMeetings?status=postponed",
        "/listMeetings?limit=0",
        "/listMeetings?limit=101",
        "/listMeetings?from=yesterday",
    ] {
        let (status, json) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["error"]["code"], "INVALID_ARGUMENT", "{uri}");
    }
}

#[tokio::test]
async fn test_update_meeting() {
    let (app, _) = test_app();
    let id = create(
        &app,
        json!({ "title": "Review", "description": "Q3", "startTime": "2026-11-02T10:00:00Z" }),
    )
    .await;

    let (status, json) = send(
        &app,
        Method::PUT,
        "/updateMeeting",
        Some(json!({ "id": id, "title": "Quarterly review", "description": "", "durationMinutes": 90 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["title"], "Quarterly review");
    assert_eq!(json["data"]["durationMinutes"], 90);
    assert!(json["data"].get("description").is_none());

    let (_, json) = send(&app, Method::GET, &format!("/getMeeting?id={}", id), None).await;
    assert_eq!(json["data"]["title"], "Quarterly review");
}

#[tokio::test]
async fn test_update_meeting_id_from_query() {
    let (app, _) = test_app();
    let id = create(&app, json!({ "title": "Sync", "startTime": "2026-11-02T10:00:00Z" })).await;

    let (status, json) = send(
        &app,
        Method::PATCH,
        &format!("/updateMeeting?id={}", id),
        Some(json!({ "status": "completed" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "completed");
}

#[tokio::test]
async fn test_update_meeting_errors() {
    let (app, _) = test_app();
    let id = create(&app, json!({ "title": "Sync", "startTime": "2026-11-02T10:00:00Z" })).await;

    let (status, json) = send(&app, Method::PUT, "/updateMeeting", Some(json!({ "id": id }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "No fields to update");

    let (status, json) = send(
        &app,
        Method::PUT,
        "/updateMeeting",
        Some(json!({ "id": "missing", "title": "New" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");

    let (status, headers, _) =
        send_raw(&app, Method::POST, "/updateMeeting", String::new()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[header::ALLOW], "PUT, PATCH");
}

#[tokio::test]
async fn test_delete_meeting() {
    let (app, store) = test_app();
    let id = create(&app, json!({ "title": "Sync", "startTime": "2026-11-02T10:00:00Z" })).await;

    let (status, json) =
        send(&app, Method::DELETE, &format!("/deleteMeeting?id={}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], id.as_str());
    assert_eq!(json["data"]["deleted"], true);
    assert!(store.get("meetings", &id).await.unwrap().is_none());

    let (status, _) = send(&app, Method::GET, &format!("/getMeeting?id={}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        send(&app, Method::DELETE, &format!("/deleteMeeting?id={}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_meeting_id_in_body() {
    let (app, _) = test_app();
    let id = create(&app, json!({ "title": "Sync", "startTime": "2026-11-02T10:00:00Z" })).await;

    let (status, json) =
        send(&app, Method::DELETE, "/deleteMeeting", Some(json!({ "id": id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["deleted"], true);

    let (status, json) = send(&app, Method::DELETE, "/deleteMeeting", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Missing required field: id");
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _) = test_app();

    let (status, json) = send(&app, Method::GET, "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app();

    let (status, _, body) = send_raw(&app, Method::GET, "/health", String::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    let (status, headers, bytes) = send_raw(&app, Method::POST, "/health", String::new()).await;
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[header::ALLOW], "GET");
    assert_eq!(json["error"]["code"], "METHOD_NOT_ALLOWED");
}
