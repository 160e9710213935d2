// Trait abstractions for the pipeline's two external boundaries.
//
// ActivitySource — the upstream platform: auth, one page of community
//   activity, per-author profiles.
// RecordStore — keyed upsert persistence for sessions, accounts, activity,
//   and verdicts.
//
// These enable deterministic testing with MockSource and MemoryStore:
// no network, no database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use botsignal_common::{
    AccountRecord, ActivityAggregates, ActivityKind, ActivityRecord, AnalysisSession,
    BotSignalError, BotVerdict, SessionStatus,
};
use reddit_client::{epoch_to_datetime, RedditClient, RedditError};

// ---------------------------------------------------------------------------
// ActivitySource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Obtain an access credential. Fatal to the extraction stage on failure.
    async fn authenticate(&self) -> Result<(), BotSignalError>;

    /// Fetch one bounded page of a community's current activity feed.
    async fn list_activity(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, BotSignalError>;

    /// Fetch one author's profile. `None` means the account no longer exists
    /// upstream; an `Err` is a per-author fetch failure the caller may skip.
    async fn get_profile(&self, username: &str)
        -> Result<Option<AccountRecord>, BotSignalError>;
}

#[async_trait]
impl ActivitySource for RedditClient {
    async fn authenticate(&self) -> Result<(), BotSignalError> {
        match RedditClient::authenticate(self).await {
            Ok(_) => Ok(()),
            Err(RedditError::MissingCredentials) => Err(BotSignalError::Config(
                "Reddit client credentials are not configured".to_string(),
            )),
            Err(e) => Err(BotSignalError::UpstreamFetch(e.to_string())),
        }
    }

    async fn list_activity(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, BotSignalError> {
        let posts = self
            .subreddit_new(subreddit, limit)
            .await
            .map_err(|e| BotSignalError::UpstreamFetch(e.to_string()))?;
        let comments = self
            .subreddit_comments(subreddit, limit)
            .await
            .map_err(|e| BotSignalError::UpstreamFetch(e.to_string()))?;

        let mut items: Vec<ActivityRecord> = Vec::with_capacity(posts.len() + comments.len());

        for post in posts {
            items.push(ActivityRecord {
                platform_id: post.name,
                author_username: post.author,
                kind: ActivityKind::Post,
                score: post.score,
                title: Some(post.title),
                body: (!post.selftext.is_empty()).then_some(post.selftext),
                subreddit: post.subreddit,
                created_at: epoch_to_datetime(post.created_utc),
            });
        }
        for comment in comments {
            items.push(ActivityRecord {
                platform_id: comment.name,
                author_username: comment.author,
                kind: ActivityKind::Comment,
                score: comment.score,
                title: None,
                body: (!comment.body.is_empty()).then_some(comment.body),
                subreddit: comment.subreddit,
                created_at: epoch_to_datetime(comment.created_utc),
            });
        }

        Ok(items)
    }

    async fn get_profile(
        &self,
        username: &str,
    ) -> Result<Option<AccountRecord>, BotSignalError> {
        let user = self
            .user_about(username)
            .await
            .map_err(|e| BotSignalError::UpstreamFetch(e.to_string()))?;

        Ok(user.map(|u| {
            let created_at = epoch_to_datetime(u.created_utc);
            AccountRecord {
                username: u.name,
                account_age_days: account_age_days(created_at, Utc::now()),
                comment_karma: u.comment_karma,
                link_karma: u.link_karma,
                is_verified: u.verified,
                has_verified_email: u.has_verified_email.unwrap_or(false),
                is_premium: u.is_gold,
                account_created_at: created_at,
            }
        }))
    }
}

/// Whole days between account creation and `now`, floored, never negative.
pub fn account_age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((now - created_at).num_seconds() / 86_400).max(0)
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RecordStore: Send + Sync {
    // --- Sessions ---

    async fn insert_session(&self, session: &AnalysisSession) -> Result<(), BotSignalError>;
    async fn get_session(&self, id: Uuid) -> Result<Option<AnalysisSession>, BotSignalError>;
    async fn list_sessions(&self) -> Result<Vec<AnalysisSession>, BotSignalError>;
    async fn delete_session(&self, id: Uuid) -> Result<bool, BotSignalError>;
    async fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
    ) -> Result<(), BotSignalError>;
    async fn finalize_session(
        &self,
        id: Uuid,
        status: SessionStatus,
        total_accounts_analyzed: i64,
        bots_detected: i64,
        completed_at: DateTime<Utc>,
        parameters: &serde_json::Value,
    ) -> Result<(), BotSignalError>;

    // --- Accounts and activity ---

    async fn upsert_accounts(&self, accounts: &[AccountRecord]) -> Result<u64, BotSignalError>;
    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, BotSignalError>;
    async fn upsert_activity(&self, items: &[ActivityRecord]) -> Result<u64, BotSignalError>;
    async fn activity_aggregates(
        &self,
    ) -> Result<HashMap<String, ActivityAggregates>, BotSignalError>;

    // --- Verdicts ---

    async fn upsert_verdicts(&self, verdicts: &[BotVerdict]) -> Result<u64, BotSignalError>;
    async fn list_verdicts(&self) -> Result<Vec<BotVerdict>, BotSignalError>;
}

fn persistence(err: anyhow::Error) -> BotSignalError {
    BotSignalError::Persistence(err.to_string())
}

#[async_trait]
impl RecordStore for botsignal_store::Store {
    async fn insert_session(&self, session: &AnalysisSession) -> Result<(), BotSignalError> {
        botsignal_store::Store::insert_session(self, session)
            .await
            .map_err(persistence)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<AnalysisSession>, BotSignalError> {
        botsignal_store::Store::get_session(self, id)
            .await
            .map_err(persistence)
    }

    async fn list_sessions(&self) -> Result<Vec<AnalysisSession>, BotSignalError> {
        botsignal_store::Store::list_sessions(self)
            .await
            .map_err(persistence)
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, BotSignalError> {
        botsignal_store::Store::delete_session(self, id)
            .await
            .map_err(persistence)
    }

    async fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
    ) -> Result<(), BotSignalError> {
        botsignal_store::Store::update_session_status(self, id, status)
            .await
            .map_err(persistence)
    }

    async fn finalize_session(
        &self,
        id: Uuid,
        status: SessionStatus,
        total_accounts_analyzed: i64,
        bots_detected: i64,
        completed_at: DateTime<Utc>,
        parameters: &serde_json::Value,
    ) -> Result<(), BotSignalError> {
        botsignal_store::Store::finalize_session(
            self,
            id,
            status,
            total_accounts_analyzed,
            bots_detected,
            completed_at,
            parameters,
        )
        .await
        .map_err(persistence)
    }

    async fn upsert_accounts(&self, accounts: &[AccountRecord]) -> Result<u64, BotSignalError> {
        botsignal_store::Store::upsert_accounts(self, accounts)
            .await
            .map_err(persistence)
    }

    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, BotSignalError> {
        botsignal_store::Store::list_accounts(self)
            .await
            .map_err(persistence)
    }

    async fn upsert_activity(&self, items: &[ActivityRecord]) -> Result<u64, BotSignalError> {
        botsignal_store::Store::upsert_activity(self, items)
            .await
            .map_err(persistence)
    }

    async fn activity_aggregates(
        &self,
    ) -> Result<HashMap<String, ActivityAggregates>, BotSignalError> {
        botsignal_store::Store::activity_aggregates(self)
            .await
            .map_err(persistence)
    }

    async fn upsert_verdicts(&self, verdicts: &[BotVerdict]) -> Result<u64, BotSignalError> {
        botsignal_store::Store::upsert_verdicts(self, verdicts)
            .await
            .map_err(persistence)
    }

    async fn list_verdicts(&self) -> Result<Vec<BotVerdict>, BotSignalError> {
        botsignal_store::Store::list_verdicts(self)
            .await
            .map_err(persistence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_age_floors_partial_days() {
        let created = DateTime::from_timestamp(0, 0).unwrap();
        let now = DateTime::from_timestamp(86_400 * 3 + 80_000, 0).unwrap();
        assert_eq!(account_age_days(created, now), 3);
    }

    #[test]
    fn account_age_clamps_future_creation_to_zero() {
        let created = DateTime::from_timestamp(1_000_000, 0).unwrap();
        let now = DateTime::from_timestamp(0, 0).unwrap();
        assert_eq!(account_age_days(created, now), 0);
    }
}
