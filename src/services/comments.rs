//! Comment creation tied to an existing post.

use sqlx::SqlitePool;

use super::{fresh_id, now_ms};
use crate::db::{self, Comment, NewComment};
use crate::error::ApiError;

/// Create a comment on an existing post.
///
/// The target post is looked up first; comment text and display name are
/// mandatory. The insert and the parent's comment-count bump execute as one
/// unit of work. Status is always `approved` (no moderation path).
pub async fn create(
    pool: &SqlitePool,
    post_id: &str,
    input: NewComment,
    caller_ip: String,
    user_agent: String,
) -> Result<Comment, ApiError> {
    if input.comment.is_empty() || input.nick.is_empty() {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    }

    db::get_post(pool, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post".to_string()))?;

    let id = fresh_id();
    let now = now_ms();
    let comment = Comment {
        object_id: id.clone(),
        id,
        comment: input.comment,
        created: now,
        updated: now,
        nick: input.nick,
        mail: input.mail,
        link: input.link,
        url: format!("/post/{post_id}"),
        pid: input.pid,
        rid: input.rid,
        status: "approved".to_string(),
        user_agent,
        ip: caller_ip,
    };

    db::insert_comment_with_count(pool, &comment, post_id).await?;
    Ok(comment)
}
