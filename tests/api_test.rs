//! Integration tests for the HTTP API: routing, envelopes, statuses, CORS.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use forum_service::config::Config;
use forum_service::db::Database;
use forum_service::web::{create_app, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN_KEY: &str = "test-admin-key";

async fn setup_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");

    let config = Config {
        database_path: db_path,
        web_host: "127.0.0.1".to_string(),
        web_port: 0,
        admin_key: ADMIN_KEY.to_string(),
        post_list_limit: 20,
    };

    let state = AppState {
        db,
        config: Arc::new(config),
    };

    (create_app(state), temp_dir)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not valid JSON")
}

async fn create_post(app: &Router, title: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/posts",
            json!({ "title": title, "content": "C", "author": "A" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 0);
    body["data"]["id"].as_str().expect("id missing").to_string()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _temp_dir) = setup_app().await;

    let response = app.oneshot(empty_request(Method::GET, "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 0);
    assert_eq!(body["data"]["msg"], "Forum Service Ready");
}

#[tokio::test]
async fn test_create_post_returns_full_record() {
    let (app, _temp_dir) = setup_app().await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/posts",
            json!({ "title": "T", "content": "C", "author": "A" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 0);
    let data = &body["data"];
    assert!(data["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(data["title"], "T");
    assert_eq!(data["content"], "C");
    assert_eq!(data["author"], "A");
    assert_eq!(data["view_count"], 0);
    assert_eq!(data["comment_count"], 0);
    assert_eq!(data["created"], data["updated"]);
}

#[tokio::test]
async fn test_create_post_missing_field_is_validation_error() {
    let (app, _temp_dir) = setup_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/posts",
            json!({ "title": "T", "content": "C" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 1);
    assert_eq!(body["errmsg"], "Missing required fields");

    // Nothing persisted
    let response = app
        .oneshot(empty_request(Method::GET, "/posts"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let (app, _temp_dir) = setup_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/posts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 1);
}

#[tokio::test]
async fn test_list_returns_created_posts() {
    let (app, _temp_dir) = setup_app().await;

    create_post(&app, "First").await;
    create_post(&app, "Second").await;

    let response = app
        .oneshot(empty_request(Method::GET, "/posts"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 0);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_post_returns_post_and_comments() {
    let (app, _temp_dir) = setup_app().await;

    let id = create_post(&app, "Thread").await;

    let response = app
        .oneshot(empty_request(Method::GET, &format!("/posts/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 0);
    assert_eq!(body["data"]["post"]["id"], id.as_str());
    assert_eq!(body["data"]["post"]["view_count"], 1);
    assert!(body["data"]["comments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_missing_post_is_404_envelope() {
    let (app, _temp_dir) = setup_app().await;

    let response = app
        .oneshot(empty_request(Method::GET, "/posts/no-such-id"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 1);
    assert_eq!(body["errmsg"], "Post not found");
}

#[tokio::test]
async fn test_comment_flow_over_http() {
    let (app, _temp_dir) = setup_app().await;

    let id = create_post(&app, "Discussion").await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/posts/{id}/comments"),
            json!({ "comment": "Nice post", "nick": "bob" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 0);
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["_id"], body["data"]["objectId"]);
    assert_eq!(body["data"]["url"], format!("/post/{id}"));

    // Counter and comment list reflect the new row
    let response = app
        .oneshot(empty_request(Method::GET, &format!("/posts/{id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["post"]["comment_count"], 1);
    assert_eq!(body["data"]["comments"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["comments"][0]["comment"], "Nice post");
}

#[tokio::test]
async fn test_comment_on_missing_post_is_404() {
    let (app, _temp_dir) = setup_app().await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/posts/no-such-id/comments",
            json!({ "comment": "hello", "nick": "bob" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 1);
}

#[tokio::test]
async fn test_comment_missing_nick_is_400() {
    let (app, _temp_dir) = setup_app().await;

    let id = create_post(&app, "Strict").await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/posts/{id}/comments"),
            json!({ "comment": "anonymous" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_requires_matching_admin_key() {
    let (app, _temp_dir) = setup_app().await;

    let id = create_post(&app, "Guarded").await;

    // No key
    let response = app
        .clone()
        .oneshot(empty_request(Method::DELETE, &format!("/posts/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Wrong key
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/posts/{id}"))
        .header("x-admin-key", "wrong")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 1);
    assert_eq!(body["errmsg"], "Permission denied");

    // Post is still retrievable
    let response = app
        .oneshot(empty_request(Method::GET, &format!("/posts/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_with_correct_key_removes_post() {
    let (app, _temp_dir) = setup_app().await;

    let id = create_post(&app, "Removed").await;

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/posts/{id}"))
        .header("x-admin-key", ADMIN_KEY)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 0);
    assert_eq!(body["data"]["msg"], "Post deleted successfully");

    let response = app
        .oneshot(empty_request(Method::GET, &format!("/posts/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route_gets_envelope_404() {
    let (app, _temp_dir) = setup_app().await;

    let response = app
        .oneshot(empty_request(Method::GET, "/nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["errno"], 1);
    assert_eq!(body["errmsg"], "Not found");
}

#[tokio::test]
async fn test_options_preflight_short_circuits_with_cors() {
    let (app, _temp_dir) = setup_app().await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/posts")
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-admin-key")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_responses_carry_cors_headers() {
    let (app, _temp_dir) = setup_app().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/posts")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
