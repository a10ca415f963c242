//! Per-IP like toggling and status.

use sqlx::SqlitePool;

use super::{fresh_id, now_ms};
use crate::db::{self, LikeStatus};
use crate::error::ApiError;

/// Toggle the caller's like on a post, returning the resulting liked state.
///
/// The check-then-act sequence runs as a single unit of work in the storage
/// layer, keeping at most one like row per (post, IP) pair.
pub async fn toggle(pool: &SqlitePool, post_id: &str, caller_ip: &str) -> Result<bool, ApiError> {
    let liked = db::toggle_like(pool, post_id, caller_ip, &fresh_id(), now_ms()).await?;
    Ok(liked)
}

/// Report the fresh like count for a post and whether the caller has liked
/// it. Succeeds for nonexistent posts too (zero/false).
pub async fn status(
    pool: &SqlitePool,
    post_id: &str,
    caller_ip: &str,
) -> Result<LikeStatus, ApiError> {
    let like_count = db::count_likes(pool, post_id).await?;
    let user_liked = db::user_has_liked(pool, post_id, caller_ip).await?;

    Ok(LikeStatus {
        like_count,
        user_liked,
    })
}
