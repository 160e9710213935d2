use std::collections::HashMap;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use botsignal_common::{
    AccountRecord, ActivityAggregates, ActivityRecord, AnalysisSession, BotVerdict, SessionStatus,
};

use crate::schema;

/// Postgres-backed record store. All writes are keyed upserts on natural
/// keys, so re-running any stage is idempotent.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the idempotent schema bootstrap.
    pub async fn migrate(&self) -> Result<()> {
        schema::migrate(&self.pool).await
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    pub async fn insert_session(&self, session: &AnalysisSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO analysis_sessions
                (id, name, subreddit, status, total_accounts_analyzed, bots_detected,
                 started_at, completed_at, parameters)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.id)
        .bind(&session.name)
        .bind(&session.subreddit)
        .bind(session.status.as_str())
        .bind(session.total_accounts_analyzed)
        .bind(session.bots_detected)
        .bind(session.started_at)
        .bind(session.completed_at)
        .bind(&session.parameters)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_session(&self, id: Uuid) -> Result<Option<AnalysisSession>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, subreddit, status, total_accounts_analyzed, bots_detected,
                   started_at, completed_at, parameters
            FROM analysis_sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_session).transpose()
    }

    pub async fn list_sessions(&self) -> Result<Vec<AnalysisSession>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, subreddit, status, total_accounts_analyzed, bots_detected,
                   started_at, completed_at, parameters
            FROM analysis_sessions
            ORDER BY started_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_session).collect()
    }

    /// Delete a session. Returns false if no such session existed.
    pub async fn delete_session(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM analysis_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_session_status(&self, id: Uuid, status: SessionStatus) -> Result<()> {
        sqlx::query("UPDATE analysis_sessions SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Stamp a terminal status together with its completion time, counters,
    /// and parameters in one write.
    pub async fn finalize_session(
        &self,
        id: Uuid,
        status: SessionStatus,
        total_accounts_analyzed: i64,
        bots_detected: i64,
        completed_at: DateTime<Utc>,
        parameters: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE analysis_sessions
            SET status = $2,
                total_accounts_analyzed = $3,
                bots_detected = $4,
                completed_at = $5,
                parameters = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(total_accounts_analyzed)
        .bind(bots_detected)
        .bind(completed_at)
        .bind(parameters)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    /// Upsert account profiles keyed on username. Last write wins.
    pub async fn upsert_accounts(&self, accounts: &[AccountRecord]) -> Result<u64> {
        let mut written = 0;
        for account in accounts {
            sqlx::query(
                r#"
                INSERT INTO accounts
                    (username, account_age_days, comment_karma, link_karma,
                     is_verified, has_verified_email, is_premium, account_created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (username) DO UPDATE SET
                    account_age_days = EXCLUDED.account_age_days,
                    comment_karma = EXCLUDED.comment_karma,
                    link_karma = EXCLUDED.link_karma,
                    is_verified = EXCLUDED.is_verified,
                    has_verified_email = EXCLUDED.has_verified_email,
                    is_premium = EXCLUDED.is_premium,
                    account_created_at = EXCLUDED.account_created_at
                "#,
            )
            .bind(&account.username)
            .bind(account.account_age_days)
            .bind(account.comment_karma)
            .bind(account.link_karma)
            .bind(account.is_verified)
            .bind(account.has_verified_email)
            .bind(account.is_premium)
            .bind(account.account_created_at)
            .execute(&self.pool)
            .await?;
            written += 1;
        }
        Ok(written)
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT username, account_age_days, comment_karma, link_karma,
                   is_verified, has_verified_email, is_premium, account_created_at
            FROM accounts
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_account).collect())
    }

    pub async fn get_account(&self, username: &str) -> Result<Option<AccountRecord>> {
        let row = sqlx::query(
            r#"
            SELECT username, account_age_days, comment_karma, link_karma,
                   is_verified, has_verified_email, is_premium, account_created_at
            FROM accounts
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_account))
    }

    // -----------------------------------------------------------------------
    // Activity
    // -----------------------------------------------------------------------

    /// Upsert activity items keyed on platform id. Re-extraction refreshes
    /// score and content, not historical snapshots.
    pub async fn upsert_activity(&self, items: &[ActivityRecord]) -> Result<u64> {
        let mut written = 0;
        for item in items {
            sqlx::query(
                r#"
                INSERT INTO activity
                    (platform_id, author_username, kind, score, title, body, subreddit, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (platform_id) DO UPDATE SET
                    score = EXCLUDED.score,
                    title = EXCLUDED.title,
                    body = EXCLUDED.body
                "#,
            )
            .bind(&item.platform_id)
            .bind(&item.author_username)
            .bind(item.kind.as_str())
            .bind(item.score)
            .bind(&item.title)
            .bind(&item.body)
            .bind(&item.subreddit)
            .bind(item.created_at)
            .execute(&self.pool)
            .await?;
            written += 1;
        }
        Ok(written)
    }

    /// Per-author activity rollup across everything stored.
    pub async fn activity_aggregates(&self) -> Result<HashMap<String, ActivityAggregates>> {
        let rows = sqlx::query(
            r#"
            SELECT author_username,
                   COUNT(*) FILTER (WHERE kind = 'post') AS post_count,
                   COUNT(*) FILTER (WHERE kind = 'comment') AS comment_count,
                   COALESCE(SUM(score) FILTER (WHERE kind = 'post'), 0)::BIGINT AS post_score_sum
            FROM activity
            GROUP BY author_username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut aggregates = HashMap::new();
        for row in rows {
            let username: String = row.get("author_username");
            aggregates.insert(
                username,
                ActivityAggregates {
                    post_count: row.get("post_count"),
                    comment_count: row.get("comment_count"),
                    post_score_sum: row.get("post_score_sum"),
                },
            );
        }
        Ok(aggregates)
    }

    // -----------------------------------------------------------------------
    // Verdicts
    // -----------------------------------------------------------------------

    /// Batch-upsert verdicts keyed on username. Each new analysis overwrites
    /// the previous verdict for that user.
    pub async fn upsert_verdicts(&self, verdicts: &[BotVerdict]) -> Result<u64> {
        let mut written = 0;
        for verdict in verdicts {
            sqlx::query(
                r#"
                INSERT INTO bot_verdicts
                    (username, bot_probability, confidence_score, detection_method,
                     features, risk_factors, analysis_timestamp)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (username) DO UPDATE SET
                    bot_probability = EXCLUDED.bot_probability,
                    confidence_score = EXCLUDED.confidence_score,
                    detection_method = EXCLUDED.detection_method,
                    features = EXCLUDED.features,
                    risk_factors = EXCLUDED.risk_factors,
                    analysis_timestamp = EXCLUDED.analysis_timestamp
                "#,
            )
            .bind(&verdict.username)
            .bind(verdict.bot_probability)
            .bind(verdict.confidence_score)
            .bind(&verdict.detection_method)
            .bind(&verdict.features)
            .bind(&verdict.risk_factors)
            .bind(verdict.analysis_timestamp)
            .execute(&self.pool)
            .await?;
            written += 1;
        }
        Ok(written)
    }

    pub async fn list_verdicts(&self) -> Result<Vec<BotVerdict>> {
        let rows = sqlx::query(
            r#"
            SELECT username, bot_probability, confidence_score, detection_method,
                   features, risk_factors, analysis_timestamp
            FROM bot_verdicts
            ORDER BY bot_probability DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_verdict).collect())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn row_to_session(r: sqlx::postgres::PgRow) -> Result<AnalysisSession> {
    let status_str: String = r.get("status");
    let status = SessionStatus::parse(&status_str)
        .ok_or_else(|| anyhow!("Unknown session status in store: {status_str}"))?;

    Ok(AnalysisSession {
        id: r.get("id"),
        name: r.get("name"),
        subreddit: r.get("subreddit"),
        status,
        total_accounts_analyzed: r.get("total_accounts_analyzed"),
        bots_detected: r.get("bots_detected"),
        started_at: r.get("started_at"),
        completed_at: r.get("completed_at"),
        parameters: r.get("parameters"),
    })
}

fn row_to_account(r: sqlx::postgres::PgRow) -> AccountRecord {
    AccountRecord {
        username: r.get("username"),
        account_age_days: r.get("account_age_days"),
        comment_karma: r.get("comment_karma"),
        link_karma: r.get("link_karma"),
        is_verified: r.get("is_verified"),
        has_verified_email: r.get("has_verified_email"),
        is_premium: r.get("is_premium"),
        account_created_at: r.get("account_created_at"),
    }
}

fn row_to_verdict(r: sqlx::postgres::PgRow) -> BotVerdict {
    BotVerdict {
        username: r.get("username"),
        bot_probability: r.get("bot_probability"),
        confidence_score: r.get("confidence_score"),
        detection_method: r.get("detection_method"),
        features: r.get("features"),
        risk_factors: r.get("risk_factors"),
        analysis_timestamp: r.get("analysis_timestamp"),
    }
}
