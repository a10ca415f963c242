use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

use super::{AppState, ADMIN_KEY_HEADER};
use crate::db::{NewComment, NewPost};
use crate::error::ApiError;
use crate::services::{comments, likes, posts};

/// Trusted-proxy header carrying the original client IP.
const CLIENT_IP_HEADER: &str = "cf-connecting-ip";

/// Fallback identity when no proxy header is present.
const FALLBACK_IP: &str = "127.0.0.1";

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", get(get_post).delete(delete_post))
        .route("/posts/:id/comments", axum::routing::post(create_comment))
        .route("/posts/:id/like", get(like_status).post(toggle_like))
        .fallback(not_found)
}

/// Wrap a payload in the uniform success envelope.
fn envelope<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({ "errno": 0, "data": data }))
}

/// Unwrap a JSON body, mapping extraction failures into the validation arm
/// of the error taxonomy so malformed bodies get the envelope too.
fn require_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(ApiError::Validation(format!("Invalid body: {rejection}"))),
    }
}

/// Resolve the caller's IP from the trusted proxy header, falling back to
/// the first `X-Forwarded-For` entry and finally loopback.
fn client_ip(headers: &HeaderMap) -> String {
    if let Some(ip) = headers.get(CLIENT_IP_HEADER).and_then(|v| v.to_str().ok()) {
        return ip.to_string();
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| FALLBACK_IP.to_string())
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// ========== Handlers ==========

async fn health() -> impl IntoResponse {
    envelope(json!({ "msg": "Forum Service Ready" }))
}

async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let posts = posts::list(state.db.pool(), state.config.post_list_limit).await?;
    Ok(envelope(posts))
}

async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<NewPost>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = require_body(payload)?;
    let post = posts::create(state.db.pool(), input).await?;

    tracing::info!(post_id = %post.id, author = %post.author, "Post created");
    Ok(envelope(post))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = posts::get_with_comments(state.db.pool(), &id).await?;
    Ok(envelope(result))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let provided_key = headers.get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok());

    posts::delete(state.db.pool(), &id, provided_key, &state.config.admin_key).await?;
    Ok(envelope(json!({ "msg": "Post deleted successfully" })))
}

async fn create_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<NewComment>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = require_body(payload)?;
    let ip = client_ip(&headers);
    let ua = user_agent(&headers);

    let comment = comments::create(state.db.pool(), &id, input, ip, ua).await?;

    tracing::info!(post_id = %id, comment_id = %comment.id, "Comment created");
    Ok(envelope(comment))
}

async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers);
    let liked = likes::toggle(state.db.pool(), &id, &ip).await?;

    tracing::debug!(post_id = %id, liked, "Like toggled");
    Ok(envelope(json!({ "liked": liked })))
}

async fn like_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers);
    let status = likes::status(state.db.pool(), &id, &ip).await?;
    Ok(envelope(status))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "errno": 1, "errmsg": "Not found" })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_prefers_proxy_header() {
        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_IP_HEADER, "203.0.113.9".parse().unwrap());
        headers.insert("x-forwarded-for", "198.51.100.1, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers), "203.0.113.9");
    }

    #[test]
    fn client_ip_falls_back_to_forwarded_for_then_loopback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "198.51.100.1, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers), "198.51.100.1");

        assert_eq!(client_ip(&HeaderMap::new()), FALLBACK_IP);
    }
}
