use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Run all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    create_migration_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version < 1 {
        debug!("Running migration v1");
        run_migration_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    Ok(())
}

async fn create_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _schema_version (
            version INTEGER PRIMARY KEY
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create schema version table")?;

    Ok(())
}

async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT version FROM _schema_version LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("Failed to get schema version")?;

    Ok(row.map_or(0, |(v,)| v))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("DELETE FROM _schema_version")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO _schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

async fn run_migration_v1(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v1: creating initial schema");

    // Posts table. Timestamps are millisecond epoch values to match the wire
    // format. like_count stays nullable: rows created before the column
    // existed carry NULL, which reads treat as zero.
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            author TEXT NOT NULL,
            created INTEGER NOT NULL,
            updated INTEGER NOT NULL,
            view_count INTEGER NOT NULL DEFAULT 0,
            comment_count INTEGER NOT NULL DEFAULT 0,
            like_count INTEGER DEFAULT 0
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create posts table")?;

    // Comments table. `url` is the target reference ('/post/{id}'); pid/rid
    // store optional parent/root comment ids; object_id duplicates id for
    // wire-format compatibility.
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            comment TEXT NOT NULL,
            created INTEGER NOT NULL,
            updated INTEGER NOT NULL,
            nick TEXT NOT NULL,
            mail TEXT NOT NULL DEFAULT '',
            link TEXT NOT NULL DEFAULT '',
            url TEXT NOT NULL,
            pid TEXT NOT NULL DEFAULT '',
            rid TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'approved',
            user_agent TEXT NOT NULL DEFAULT '',
            ip TEXT NOT NULL DEFAULT '',
            object_id TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create comments table")?;

    // Per-IP likes. Uniqueness of (post_id, user_ip) is enforced by the
    // toggle's unit of work rather than a constraint, so the original
    // schema's shape is preserved.
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS post_likes (
            id TEXT PRIMARY KEY,
            post_id TEXT NOT NULL,
            user_ip TEXT NOT NULL,
            created INTEGER NOT NULL
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create post_likes table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created DESC)")
        .execute(pool)
        .await
        .context("Failed to create posts created index")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_comments_url_status ON comments(url, status, created)",
    )
    .execute(pool)
    .await
    .context("Failed to create comments url index")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_post_likes_post_ip ON post_likes(post_id, user_ip)",
    )
    .execute(pool)
    .await
    .context("Failed to create post_likes index")?;

    Ok(())
}
