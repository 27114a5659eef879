//! HTTP surface tests.
//!
//! Drives the full router over the in-memory store with `tower`'s
//! `oneshot`, asserting the §status-code contract of the API: 201/409 for
//! create, 200/409 for update, 204/409 for delete, 404/400 for resource
//! and argument errors.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use sched_core::monitor::LifecycleMonitor;
use sched_core::solver::IntervalBackend;
use sched_service::config::Config;
use sched_service::routes::{build_routes, AppState};
use sched_service::services::SchedulingService;
use sched_service::store::{InMemoryStore, MeetingStore};

fn test_app() -> Router {
    let store = Arc::new(InMemoryStore::new());
    let monitor = Arc::new(LifecycleMonitor::new());
    let backend = Arc::new(IntervalBackend::default());
    let vars = HashMap::from([(
        "DATABASE_URL".to_string(),
        "postgresql://localhost/unused".to_string(),
    )]);
    let config = Config::from_vars(&vars).unwrap();

    let store_dyn: Arc<dyn MeetingStore> = store.clone();
    let service = Arc::new(SchedulingService::new(
        store_dyn.clone(),
        backend,
        monitor.clone(),
        &config,
    ));
    let state = Arc::new(AppState {
        store: store_dyn,
        service,
        monitor,
        config,
    });

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle();
    build_routes(state, metrics_handle)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(value) => builder
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_room(app: &Router, name: &str, capacity: i32) -> Uuid {
    let (status, body) = send(
        app,
        "POST",
        "/api/rooms",
        Some(json!({ "name": name, "capacity": capacity })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["room_id"].as_str().unwrap().parse().unwrap()
}

async fn create_participant(app: &Router, name: &str, email: &str) -> Uuid {
    let (status, body) = send(
        app,
        "POST",
        "/api/participants",
        Some(json!({ "name": name, "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["participant_id"].as_str().unwrap().parse().unwrap()
}

fn meeting_body(room_id: Uuid, participant_ids: &[Uuid], start: &str, end: &str) -> Value {
    json!({
        "title": "Team sync",
        "start_time": start,
        "end_time": end,
        "room_id": room_id,
        "participant_ids": participant_ids,
    })
}

async fn schedule_meeting(app: &Router, room_id: Uuid, participant_ids: &[Uuid]) -> Uuid {
    let (status, body) = send(
        app,
        "POST",
        "/api/meetings",
        Some(meeting_body(
            room_id,
            participant_ids,
            "2030-01-01T10:00:00Z",
            "2030-01-01T11:00:00Z",
        )),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["meeting"]["meeting_id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_create_meeting_returns_201_with_report() {
    let app = test_app();
    let room_id = create_room(&app, "Alpha", 10).await;
    let p1 = create_participant(&app, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/meetings",
        Some(meeting_body(
            room_id,
            &[p1],
            "2030-01-01T10:00:00Z",
            "2030-01-01T11:00:00Z",
        )),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["solver_status"], "SATISFIABLE");
    assert_eq!(body["meeting"]["status"], "pending");
}

#[tokio::test]
async fn test_create_conflicting_meeting_returns_409() {
    let app = test_app();
    let room_id = create_room(&app, "Alpha", 10).await;
    let p1 = create_participant(&app, "Ada", "ada@example.com").await;
    let p2 = create_participant(&app, "Bey", "bey@example.com").await;

    let meeting_id = schedule_meeting(&app, room_id, &[p1]).await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/meetings/{}/confirm", meeting_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/meetings",
        Some(meeting_body(
            room_id,
            &[p2],
            "2030-01-01T10:30:00Z",
            "2030-01-01T11:30:00Z",
        )),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["solver_status"], "UNSATISFIABLE");
    let violations = body["constraint_violations"].as_array().unwrap();
    assert!(violations
        .iter()
        .any(|v| v.as_str().unwrap().starts_with("Room conflict")));
}

#[tokio::test]
async fn test_malformed_body_returns_400() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/meetings")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_unknown_meeting_returns_404() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/meetings/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_status_listing_and_transitions() {
    let app = test_app();
    let room_id = create_room(&app, "Alpha", 10).await;
    let p1 = create_participant(&app, "Ada", "ada@example.com").await;
    let meeting_id = schedule_meeting(&app, room_id, &[p1]).await;

    let (status, listed) = send(&app, "GET", "/api/meetings/status/pending", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, confirmed) = send(
        &app,
        "POST",
        &format!("/api/meetings/{}/confirm", meeting_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");

    // Confirm is not repeatable: the machine has moved on.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/meetings/{}/confirm", meeting_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/meetings/{}/cancel", meeting_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_status_segment_returns_400() {
    let app = test_app();
    let (status, _) = send(&app, "GET", "/api/meetings/status/archived", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_meeting_returns_204() {
    let app = test_app();
    let room_id = create_room(&app, "Alpha", 10).await;
    let p1 = create_participant(&app, "Ada", "ada@example.com").await;
    let meeting_id = schedule_meeting(&app, room_id, &[p1]).await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/meetings/{}", meeting_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/meetings/{}", meeting_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_room_name_returns_400() {
    let app = test_app();
    create_room(&app, "Alpha", 10).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/rooms",
        Some(json!({ "name": "Alpha", "capacity": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_room_delete_refused_while_referenced() {
    let app = test_app();
    let room_id = create_room(&app, "Alpha", 10).await;
    let p1 = create_participant(&app, "Ada", "ada@example.com").await;
    schedule_meeting(&app, room_id, &[p1]).await;

    let (status, body) = send(&app, "DELETE", &format!("/api/rooms/{}", room_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_verification_surface() {
    let app = test_app();
    let room_id = create_room(&app, "Alpha", 10).await;
    let p1 = create_participant(&app, "Ada", "ada@example.com").await;
    let p2 = create_participant(&app, "Bey", "bey@example.com").await;

    // Two pending meetings over the same slot: admitted statically,
    // flagged by the monitor.
    schedule_meeting(&app, room_id, &[p1]).await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/meetings",
        Some(meeting_body(
            room_id,
            &[p2],
            "2030-01-01T10:00:00Z",
            "2030-01-01T11:00:00Z",
        )),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["runtime_warnings"].as_array().unwrap().is_empty());

    let (status, stats) = send(&app, "GET", "/api/meetings/verification/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["critical_count"], 1);
    assert_eq!(stats["pending_meetings"], 2);

    let (status, violations) = send(
        &app,
        "GET",
        "/api/meetings/verification/violations?severity=CRITICAL",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = violations.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries.first().unwrap()["property"], "MEETING_OVERLAP");

    // The meetings start in 2030: the sweep has nothing to flag yet.
    let (status, raised) = send(
        &app,
        "POST",
        "/api/meetings/verification/check-pending",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(raised.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_available_slots_endpoint() {
    let app = test_app();
    let room_id = create_room(&app, "Alpha", 10).await;
    let p1 = create_participant(&app, "Ada", "ada@example.com").await;
    let meeting_id = schedule_meeting(&app, room_id, &[p1]).await;
    send(
        &app,
        "POST",
        &format!("/api/meetings/{}/confirm", meeting_id),
        None,
    )
    .await;

    let uri = format!(
        "/api/rooms/{}/available-slots?duration_minutes=60\
         &search_start=2030-01-01T09:00:00Z&search_end=2030-01-01T12:00:00Z",
        room_id
    );
    let (status, slots) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = slots.as_array().unwrap();
    assert!(entries
        .iter()
        .any(|slot| slot["start_time"] == "2030-01-01T09:00:00Z"));
    // The confirmed booking blocks the 10:00 hour entirely.
    assert!(entries
        .iter()
        .all(|slot| slot["start_time"] != "2030-01-01T10:00:00Z"));
}

#[tokio::test]
async fn test_range_listing_validates_window() {
    let app = test_app();
    let (status, _) = send(
        &app,
        "GET",
        "/api/meetings/range?start=2030-01-02T00:00:00Z&end=2030-01-01T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "healthy");
}

#[tokio::test]
async fn test_batch_verification_endpoint() {
    let app = test_app();
    let room_id = create_room(&app, "Alpha", 10).await;
    let p1 = create_participant(&app, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/meetings/verification/batch",
        Some(json!({
            "proposals": [
                {
                    "room_id": room_id,
                    "start_time": "2030-01-01T10:00:00Z",
                    "end_time": "2030-01-01T11:00:00Z",
                    "participant_ids": [p1],
                },
                {
                    "room_id": room_id,
                    "start_time": "2030-01-01T10:30:00Z",
                    "end_time": "2030-01-01T11:30:00Z",
                    "participant_ids": [],
                }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    let violations = body["constraint_violations"].as_array().unwrap();
    assert!(violations
        .iter()
        .any(|v| v.as_str().unwrap().contains("proposal 0 overlaps proposal 1")));
}
