use serde::{Deserialize, Serialize};

/// A top-level forum thread record.
///
/// `view_count`, `comment_count` and `like_count` are derived counters kept
/// in step with the comment/like rows by the service layer. `like_count` is
/// nullable in the schema; reads treat NULL as zero.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created: i64,
    pub updated: i64,
    pub view_count: i64,
    pub comment_count: i64,
    // Absent on the wire until the first like, like the original API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<i64>,
}

/// A reply attached to a post via its `url` reference (`/post/{post_id}`).
///
/// Wire names keep the original API's casing (`_id`, `objectId`,
/// `userAgent`); `object_id` duplicates `id` for compatibility. `pid` and
/// `rid` hold optional parent/root comment ids, empty for top-level replies.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub comment: String,
    pub created: i64,
    pub updated: i64,
    pub nick: String,
    pub mail: String,
    pub link: String,
    pub url: String,
    pub pid: String,
    pub rid: String,
    pub status: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    pub ip: String,
    #[serde(rename = "objectId")]
    pub object_id: String,
}

/// A per-(post, IP) like toggle row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostLike {
    pub id: String,
    pub post_id: String,
    pub user_ip: String,
    pub created: i64,
}

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
}

/// Input for creating a comment. Optional fields default to empty strings.
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub nick: String,
    #[serde(default)]
    pub mail: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub pid: String,
    #[serde(default)]
    pub rid: String,
}

/// Fresh like-count and caller-liked state for a post, computed from the
/// like rows rather than the cached counter.
#[derive(Debug, Clone, Serialize)]
pub struct LikeStatus {
    pub like_count: i64,
    pub user_liked: bool,
}
