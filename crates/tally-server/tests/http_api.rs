//! End-to-end router tests against a temporary SQLite database.

use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use tally_config::ServerConfig;
use tally_db::{ConnectionManager, ResolvedHost, RetryConfig, SqliteConnector, TaskStore};
use tally_server::routes::create_router;
use tally_server::state::AppState;

async fn app_at(path: PathBuf, seeds: &[&str]) -> Router {
    let manager = ConnectionManager::new(
        SqliteConnector::new(),
        vec![path.to_string_lossy().into_owned()],
        ResolvedHost::new(),
    );
    let seeds: Vec<String> = seeds.iter().map(ToString::to_string).collect();
    let store = TaskStore::new(manager, &seeds);
    store
        .ensure_schema(RetryConfig::new(1, Duration::ZERO))
        .await;
    create_router(AppState::new(store), &ServerConfig::default()).unwrap()
}

async fn app(dir: &TempDir) -> Router {
    app_at(dir.path().join("tasks.db"), &[]).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn task_lifecycle() {
    let dir = TempDir::new().unwrap();
    let router = app(&dir).await;

    let (status, created) =
        send(&router, json_request("POST", "/api/tasks", &json!({ "title": "Buy milk" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Buy milk");
    assert_eq!(created["completed"], false);
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/api/tasks/{id}");

    let (status, updated) =
        send(&router, json_request("PUT", &uri, &json!({ "completed": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["title"], "Buy milk");

    let (status, fetched) = send(&router, empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["completed"], true);

    let (status, _) = send(&router, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&router, empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = send(&router, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_titles_are_rejected_without_writing() {
    let dir = TempDir::new().unwrap();
    let router = app(&dir).await;

    for body in [
        json!({ "title": "" }),
        json!({ "title": "   " }),
        json!({}),
        json!({ "title": "ok", "completed": "yes" }),
        json!({ "title": "x".repeat(101) }),
    ] {
        let (status, error) = send(&router, json_request("POST", "/api/tasks", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(error["error"], "validation_error");
    }

    let (status, tasks) = send(&router, empty_request("GET", "/api/tasks")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks, json!([]));
}

#[tokio::test]
async fn patch_and_toggle() {
    let dir = TempDir::new().unwrap();
    let router = app(&dir).await;
    let (_, created) =
        send(&router, json_request("POST", "/api/tasks", &json!({ "title": "Draft" }))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, renamed) = send(
        &router,
        json_request("PATCH", &format!("/api/tasks/{id}"), &json!({ "title": "Final" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["title"], "Final");
    assert_eq!(renamed["completed"], false);

    let (status, toggled) =
        send(&router, empty_request("POST", &format!("/api/tasks/{id}/complete"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["completed"], true);

    let (status, _) = send(&router, empty_request("POST", "/api/tasks/9999/complete")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, json_request("PATCH", "/api/tasks/9999", &json!({ "completed": true }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_a_bad_request() {
    let dir = TempDir::new().unwrap();
    let router = app(&dir).await;
    let (status, body) = send(&router, empty_request("GET", "/api/tasks/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn seeded_tasks_are_listed_in_order() {
    let dir = TempDir::new().unwrap();
    let router = app_at(
        dir.path().join("tasks.db"),
        &["Containerize backend", "Deploy to Minikube"],
    )
    .await;

    let (status, tasks) = send(&router, empty_request("GET", "/api/tasks")).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Containerize backend", "Deploy to Minikube"]);
}

// ---------------------------------------------------------------------------
// Health and degraded start
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_database_is_service_unavailable() {
    let dir = TempDir::new().unwrap();
    let router = app_at(dir.path().join("missing").join("tasks.db"), &[]).await;

    let (status, body) = send(&router, empty_request("GET", "/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");

    let (status, body) = send(&router, empty_request("GET", "/health/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");

    let (status, body) = send(&router, empty_request("GET", "/api/tasks")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "database_unavailable");
}

#[tokio::test]
async fn recovers_once_the_database_appears() {
    let dir = TempDir::new().unwrap();
    let later = dir.path().join("later");
    let router = app_at(later.join("tasks.db"), &["Containerize backend"]).await;

    let (status, _) = send(&router, empty_request("GET", "/health/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    std::fs::create_dir(&later).unwrap();

    let (status, _) = send(&router, empty_request("GET", "/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, tasks) = send(&router, empty_request("GET", "/api/tasks")).await;
    assert_eq!(tasks.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    let dir = TempDir::new().unwrap();
    let router = app(&dir).await;
    let request = Request::builder()
        .uri("/api/tasks")
        .header(header::ORIGIN, "http://frontend.local")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

// ---------------------------------------------------------------------------
// HTML page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn page_add_and_complete() {
    let dir = TempDir::new().unwrap();
    let router = app(&dir).await;

    let response = router
        .clone()
        .oneshot(form_request("/tasks", "title=Water+plants"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

    let (status, page) = send(&router, empty_request("GET", "/")).await;
    assert_eq!(status, StatusCode::OK);
    let page = page.as_str().unwrap().to_string();
    assert!(page.contains("Water plants"));

    let (_, tasks) = send(&router, empty_request("GET", "/api/tasks")).await;
    let id = tasks[0]["id"].as_i64().unwrap();
    let response = router
        .clone()
        .oneshot(empty_request("POST", &format!("/tasks/{id}/complete")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let (_, page) = send(&router, empty_request("GET", "/")).await;
    assert!(!page.as_str().unwrap().contains("Water plants"));
}

#[tokio::test]
async fn page_rejects_blank_title() {
    let dir = TempDir::new().unwrap();
    let router = app(&dir).await;

    let (status, _) = send(&router, form_request("/tasks", "title=+++")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, tasks) = send(&router, empty_request("GET", "/api/tasks")).await;
    assert_eq!(tasks, json!([]));
}

#[tokio::test]
async fn page_complete_with_bad_id_uses_json_error() {
    let dir = TempDir::new().unwrap();
    let router = app(&dir).await;

    let (status, body) = send(&router, empty_request("POST", "/tasks/abc/complete")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = send(&router, empty_request("POST", "/tasks/9999/complete")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
