use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

/// Idempotent schema bootstrap, run once at startup.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_sessions (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            subreddit TEXT NOT NULL,
            status TEXT NOT NULL,
            total_accounts_analyzed BIGINT NOT NULL DEFAULT 0,
            bots_detected BIGINT NOT NULL DEFAULT 0,
            started_at TIMESTAMPTZ NOT NULL,
            completed_at TIMESTAMPTZ,
            parameters JSONB NOT NULL DEFAULT '{}'::jsonb
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            username TEXT PRIMARY KEY,
            account_age_days BIGINT NOT NULL,
            comment_karma BIGINT NOT NULL,
            link_karma BIGINT NOT NULL,
            is_verified BOOLEAN NOT NULL,
            has_verified_email BOOLEAN NOT NULL,
            is_premium BOOLEAN NOT NULL,
            account_created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS activity (
            platform_id TEXT PRIMARY KEY,
            author_username TEXT NOT NULL,
            kind TEXT NOT NULL,
            score BIGINT NOT NULL,
            title TEXT,
            body TEXT,
            subreddit TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_activity_author ON activity (author_username)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bot_verdicts (
            username TEXT PRIMARY KEY,
            bot_probability DOUBLE PRECISION NOT NULL,
            confidence_score DOUBLE PRECISION NOT NULL,
            detection_method TEXT NOT NULL,
            features JSONB NOT NULL,
            risk_factors TEXT[] NOT NULL,
            analysis_timestamp TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Schema migration complete");
    Ok(())
}
