//! Post operations: list, create, get-by-id (with comments), delete.

use serde::Serialize;
use sqlx::SqlitePool;

use super::{fresh_id, now_ms};
use crate::db::{self, Comment, NewPost, Post};
use crate::error::ApiError;

/// A post together with its approved comments, oldest first.
#[derive(Debug, Serialize)]
pub struct PostWithComments {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// List the most recently created posts, newest first. No side effects.
pub async fn list(pool: &SqlitePool, limit: i64) -> Result<Vec<Post>, ApiError> {
    Ok(db::list_recent_posts(pool, limit).await?)
}

/// Create a post. Title, content and author are all mandatory.
pub async fn create(pool: &SqlitePool, input: NewPost) -> Result<Post, ApiError> {
    if input.title.is_empty() || input.content.is_empty() || input.author.is_empty() {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    }

    let now = now_ms();
    let post = Post {
        id: fresh_id(),
        title: input.title,
        content: input.content,
        author: input.author,
        created: now,
        updated: now,
        view_count: 0,
        comment_count: 0,
        like_count: None,
    };

    db::insert_post(pool, &post).await?;
    Ok(post)
}

/// Fetch a post and its approved comments, bumping the view counter first.
///
/// The increment runs unconditionally; for an absent id it affects zero rows
/// and the subsequent fetch reports not-found.
pub async fn get_with_comments(pool: &SqlitePool, id: &str) -> Result<PostWithComments, ApiError> {
    db::increment_view_count(pool, id).await?;

    let post = db::get_post(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post".to_string()))?;

    let comments = db::get_approved_comments(pool, id).await?;

    Ok(PostWithComments { post, comments })
}

/// Delete a post. Requires the admin credential, checked before any lookup.
///
/// Deleting a nonexistent id is still a success (zero rows affected), and
/// comments/likes are left orphaned: the original system has no cascade.
pub async fn delete(
    pool: &SqlitePool,
    id: &str,
    provided_key: Option<&str>,
    admin_key: &str,
) -> Result<(), ApiError> {
    match provided_key {
        Some(key) if key == admin_key => {}
        _ => return Err(ApiError::Permission),
    }

    let rows = db::delete_post(pool, id).await?;
    tracing::info!(post_id = id, rows_affected = rows, "Post deleted");

    Ok(())
}
