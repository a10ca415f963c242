use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{Comment, Post, PostLike};

// ========== Posts ==========

/// Get the most recently created posts, newest first.
pub async fn list_recent_posts(pool: &SqlitePool, limit: i64) -> Result<Vec<Post>> {
    sqlx::query_as("SELECT * FROM posts ORDER BY created DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")
}

/// Insert a fully-populated post row.
pub async fn insert_post(pool: &SqlitePool, post: &Post) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO posts (id, title, content, author, created, updated, view_count, comment_count)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(&post.id)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.author)
    .bind(post.created)
    .bind(post.updated)
    .bind(post.view_count)
    .bind(post.comment_count)
    .execute(pool)
    .await
    .context("Failed to insert post")?;

    Ok(())
}

/// Get a post by its id.
pub async fn get_post(pool: &SqlitePool, id: &str) -> Result<Option<Post>> {
    sqlx::query_as("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post")
}

/// Bump a post's view counter. A no-op (zero rows) for absent ids.
pub async fn increment_view_count(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment view count")?;

    Ok(())
}

/// Delete a post row, returning the number of rows affected.
///
/// Comments and likes are left in place; the original system has no cascade
/// and orphaned rows are simply never queried again.
pub async fn delete_post(pool: &SqlitePool, id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;

    Ok(result.rows_affected())
}

// ========== Comments ==========

/// Get the approved comments referencing a post, oldest first.
pub async fn get_approved_comments(pool: &SqlitePool, post_id: &str) -> Result<Vec<Comment>> {
    sqlx::query_as("SELECT * FROM comments WHERE url = ? AND status = 'approved' ORDER BY created ASC")
        .bind(format!("/post/{post_id}"))
        .fetch_all(pool)
        .await
        .context("Failed to fetch comments")
}

/// Insert a comment and bump the parent post's comment counter as one unit
/// of work.
///
/// The insert and the counter update commit or roll back together, so the
/// counter cannot drift from the comment rows on partial failure.
pub async fn insert_comment_with_count(
    pool: &SqlitePool,
    comment: &Comment,
    post_id: &str,
) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin comment transaction")?;

    sqlx::query(
        r"
        INSERT INTO comments (id, comment, created, updated, nick, mail, link, url, pid, rid, status, user_agent, ip, object_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(&comment.id)
    .bind(&comment.comment)
    .bind(comment.created)
    .bind(comment.updated)
    .bind(&comment.nick)
    .bind(&comment.mail)
    .bind(&comment.link)
    .bind(&comment.url)
    .bind(&comment.pid)
    .bind(&comment.rid)
    .bind(&comment.status)
    .bind(&comment.user_agent)
    .bind(&comment.ip)
    .bind(&comment.object_id)
    .execute(&mut *tx)
    .await
    .context("Failed to insert comment")?;

    sqlx::query("UPDATE posts SET comment_count = comment_count + 1, updated = ? WHERE id = ?")
        .bind(comment.created)
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .context("Failed to bump comment count")?;

    tx.commit()
        .await
        .context("Failed to commit comment transaction")?;

    Ok(())
}

// ========== Likes ==========

/// Toggle a like for (post, IP) as one unit of work.
///
/// Removes the existing like row and decrements the cached counter (floored
/// at zero), or inserts a fresh row and increments it. Returns the resulting
/// liked state. Running check-then-act inside a transaction keeps the
/// (post_id, user_ip) pair unique under concurrent toggles.
pub async fn toggle_like(
    pool: &SqlitePool,
    post_id: &str,
    user_ip: &str,
    like_id: &str,
    now: i64,
) -> Result<bool> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin like transaction")?;

    let existing: Option<PostLike> =
        sqlx::query_as("SELECT * FROM post_likes WHERE post_id = ? AND user_ip = ?")
            .bind(post_id)
            .bind(user_ip)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to check existing like")?;

    let liked = if existing.is_some() {
        sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_ip = ?")
            .bind(post_id)
            .bind(user_ip)
            .execute(&mut *tx)
            .await
            .context("Failed to delete like")?;

        sqlx::query("UPDATE posts SET like_count = MAX(0, COALESCE(like_count, 0) - 1) WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .context("Failed to decrement like count")?;

        false
    } else {
        sqlx::query("INSERT INTO post_likes (id, post_id, user_ip, created) VALUES (?, ?, ?, ?)")
            .bind(like_id)
            .bind(post_id)
            .bind(user_ip)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to insert like")?;

        sqlx::query("UPDATE posts SET like_count = COALESCE(like_count, 0) + 1 WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .context("Failed to increment like count")?;

        true
    };

    tx.commit()
        .await
        .context("Failed to commit like transaction")?;

    Ok(liked)
}

/// Count the like rows for a post. Computed fresh, never from the cached
/// counter.
pub async fn count_likes(pool: &SqlitePool, post_id: &str) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM post_likes WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(pool)
        .await
        .context("Failed to count likes")?;

    Ok(row.0)
}

/// Check whether an IP has an existing like row for a post.
pub async fn user_has_liked(pool: &SqlitePool, post_id: &str, user_ip: &str) -> Result<bool> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT id FROM post_likes WHERE post_id = ? AND user_ip = ?")
            .bind(post_id)
            .bind(user_ip)
            .fetch_optional(pool)
            .await
            .context("Failed to check like status")?;

    Ok(row.is_some())
}
