use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use personal_scheduler::{app, config::Config, state::AppState, store::JsonStore};

fn test_app(dir: &tempfile::TempDir) -> Router {
    let config = Config {
        db_path: dir.path().join("db.json"),
        static_dir: dir.path().join("static"),
        jwt_secret: "integration-secret".to_string(),
        ..Config::default()
    };
    let store = JsonStore::open(&config.db_path).unwrap();
    app(AppState::new(store, config))
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_and_login(app: &Router, username: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "password": "secret123",
            "full_name": "Nguyen An",
            "email": format!("{username}@example.com"),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);
    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn accounts_are_unique_and_passwords_checked() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);
    register_and_login(&app, "an").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": "an",
            "password": "secret123",
            "full_name": "Someone Else",
            "email": "other@example.com",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "username": "x", "password": "123", "full_name": "X", "email": "x@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "an", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let (status, body) = send(&app, Method::GET, "/api/schedules", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, Method::GET, "/api/statistics/overview", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn schedule_lifecycle_feeds_statistics_and_chat() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);
    let token = register_and_login(&app, "binh").await;
    let token = Some(token.as_str());

    let start = Utc::now() - Duration::days(1);
    let end = start + Duration::minutes(120);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/schedules",
        token,
        Some(json!({
            "title": "Write report",
            "start_time": start.to_rfc3339(),
            "end_time": end.to_rfc3339(),
            "category": "work",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["completed"], false);
    assert_eq!(body["data"]["color"], "#3B82F6");

    // end before start
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/schedules/{id}"),
        token,
        Some(json!({ "end_time": (start - Duration::hours(1)).to_rfc3339() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // toggle without a body
    let (status, body) = send(&app, Method::PATCH, &format!("/api/schedules/{id}/complete"), token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["completed"], true);

    let (status, body) = send(&app, Method::GET, "/api/statistics/overview", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["completion_rate"], 100);
    assert_eq!(body["data"]["work_hours"], 2);

    let (status, body) = send(&app, Method::GET, "/api/schedules/search?keyword=REPORT", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/chat",
        token,
        Some(json!({ "message": "Hello there" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["category"], "greeting");
    let reply = body["data"]["message"].as_str().unwrap().to_string();
    assert!(reply.starts_with("Hello Nguyen An!"));

    let (status, body) = send(&app, Method::GET, "/api/ai/suggestions", token, None).await;
    assert_eq!(status, StatusCode::OK);
    let logged = body["data"].as_array().unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0]["category"], "greeting");
    assert_eq!(logged[0]["text"], reply.as_str());

    let (status, _) = send(&app, Method::DELETE, &format!("/api/schedules/{id}"), token, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &format!("/api/schedules/{id}"), token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, "/api/schedules/not-a-uuid", token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn entries_are_owner_scoped() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;

    let start = Utc::now() + Duration::hours(2);
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/schedules",
        Some(&alice),
        Some(json!({
            "title": "Private",
            "start_time": start.to_rfc3339(),
            "end_time": (start + Duration::hours(1)).to_rfc3339(),
            "category": "study",
        })),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/schedules", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, Method::PATCH, &format!("/api/schedules/{id}/complete"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // the upcoming entry gets exactly one reminder
    let (status, body) = send(&app, Method::POST, "/api/notifications/create-reminders", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["created"], 1);
    let (_, body) = send(&app, Method::POST, "/api/notifications/create-reminders", Some(&alice), None).await;
    assert_eq!(body["data"]["created"], 0);

    let (_, body) = send(&app, Method::GET, "/api/notifications", Some(&alice), None).await;
    assert_eq!(body["data"]["unread_count"], 1);
    assert_eq!(body["data"]["notifications"][0]["schedule_title"], "Private");
    let (_, body) = send(&app, Method::GET, "/api/notifications", Some(&bob), None).await;
    assert_eq!(body["data"]["unread_count"], 0);
}

#[tokio::test]
async fn assistant_reports_on_an_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);
    let token = register_and_login(&app, "chi").await;
    let token = Some(token.as_str());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/generate-schedule",
        token,
        Some(json!({ "date": "2030-01-07" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let slots = body["data"]["suggested_schedules"].as_array().unwrap();
    let hours: Vec<(u64, u64)> = slots
        .iter()
        .map(|s| (s["start_hour"].as_u64().unwrap(), s["end_hour"].as_u64().unwrap()))
        .collect();
    assert_eq!(hours, vec![(8, 10), (10, 12), (12, 14)]);

    let (status, body) = send(&app, Method::GET, "/api/ai/analyze-performance", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["summary"]["total_schedules"], 0);
    assert_eq!(body["data"]["summary"]["completion_rate"], 0.0);

    let (status, body) = send(&app, Method::GET, "/api/personal-ai/analyze-habits", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["insights"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/api/personal-ai/smart-reminders", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["reminders"].as_array().unwrap().is_empty());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/personal-ai/create-personal-plan",
        token,
        Some(json!({ "plan_type": "study", "duration": "4 weeks" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["preferred_hour"], 19);
    assert_eq!(body["data"]["schedule"].as_array().unwrap().len(), 7);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/personal-ai/personal-advice",
        token,
        Some(json!({ "goal": "study_better" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["recommendations"].as_array().unwrap().len(), 4);

    let (status, _) = send(&app, Method::GET, "/api/statistics/overview?tz=Mars/Olympus", token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/statistics/overview?start_date=2025-03-10&end_date=2025-03-01",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn free_slots_skip_entries_carried_over_from_the_night_before() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);
    let token = register_and_login(&app, "dung").await;
    let token = Some(token.as_str());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/schedules",
        token,
        Some(json!({
            "title": "Night shift",
            "start_time": "2030-01-06T22:00:00+00:00",
            "end_time": "2030-01-07T11:00:00+00:00",
            "category": "work",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/generate-schedule",
        token,
        Some(json!({ "date": "2030-01-07" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["existing_schedules"].as_array().unwrap().len(), 1);
    let hours: Vec<(u64, u64)> = body["data"]["suggested_schedules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| (s["start_hour"].as_u64().unwrap(), s["end_hour"].as_u64().unwrap()))
        .collect();
    assert_eq!(hours, vec![(11, 13), (13, 15), (15, 17)]);

    // the day before still sees the late start
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/ai/generate-schedule",
        token,
        Some(json!({ "date": "2030-01-06" })),
    )
    .await;
    assert_eq!(body["data"]["existing_schedules"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn out_of_range_slot_preferences_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);
    let token = register_and_login(&app, "em").await;
    let token = Some(token.as_str());

    for preferences in [
        json!({ "slot_hours": u32::MAX }),
        json!({ "work_start": 4_000_000_000u32, "work_end": 4_000_000_010u32 }),
        json!({ "work_start": 8, "work_end": 30 }),
        json!({ "slot_hours": 0 }),
    ] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ai/generate-schedule",
            token,
            Some(json!({ "date": "2030-01-07", "preferences": preferences })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{preferences}");
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn malformed_input_gets_the_failure_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);
    let token = register_and_login(&app, "giang").await;
    let token = Some(token.as_str());

    let start = Utc::now() + Duration::hours(1);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/schedules",
        token,
        Some(json!({
            "title": "Standup",
            "start_time": start.to_rfc3339(),
            "end_time": (start + Duration::minutes(15)).to_rfc3339(),
            "category": "meeting",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("meeting"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "giang" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, Method::GET, "/api/ai/suggestions?limit=lots", token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn performance_reports_are_logged() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);
    let token = register_and_login(&app, "hoa").await;
    let token = Some(token.as_str());

    let (status, report) = send(&app, Method::GET, "/api/ai/analyze-performance", token, None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/ai/suggestions", token, None).await;
    let logged = body["data"].as_array().unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0]["category"], "performance");
    let stored: Value = serde_json::from_str(logged[0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(stored, report["data"]);
}
