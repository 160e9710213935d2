// Test mocks for the pipeline's two trait boundaries:
// - MockSource (ActivitySource) — HashMap-based subreddit/username lookups
// - MemoryStore (RecordStore) — stateful in-memory keyed upsert store
//
// Both are deterministic: no network, no database.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use botsignal_common::{
    AccountRecord, ActivityAggregates, ActivityKind, ActivityRecord, AnalysisSession,
    BotSignalError, BotVerdict, SessionStatus,
};

use crate::traits::{ActivitySource, RecordStore};

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

pub fn account(username: &str, age_days: i64, comment_karma: i64, link_karma: i64) -> AccountRecord {
    AccountRecord {
        username: username.to_string(),
        account_age_days: age_days,
        comment_karma,
        link_karma,
        is_verified: false,
        has_verified_email: true,
        is_premium: false,
        account_created_at: Utc::now() - chrono::Duration::days(age_days),
    }
}

pub fn post(platform_id: &str, author: &str, subreddit: &str, score: i64) -> ActivityRecord {
    ActivityRecord {
        platform_id: platform_id.to_string(),
        author_username: author.to_string(),
        kind: ActivityKind::Post,
        score,
        title: Some(format!("post {platform_id}")),
        body: None,
        subreddit: subreddit.to_string(),
        created_at: Utc::now(),
    }
}

pub fn comment(platform_id: &str, author: &str, subreddit: &str, score: i64) -> ActivityRecord {
    ActivityRecord {
        platform_id: platform_id.to_string(),
        author_username: author.to_string(),
        kind: ActivityKind::Comment,
        score,
        title: None,
        body: Some("a comment".to_string()),
        subreddit: subreddit.to_string(),
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Scripted upstream source. Builder pattern: `.on_activity()`,
/// `.on_profile()`, `.failing_profile()`, `.with_auth_failure()`,
/// `.with_listing_failure()`.
#[derive(Default)]
pub struct MockSource {
    activity: HashMap<String, Vec<ActivityRecord>>,
    profiles: HashMap<String, AccountRecord>,
    failing_profiles: HashSet<String>,
    fail_auth: bool,
    fail_listing: bool,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_activity(mut self, subreddit: &str, items: Vec<ActivityRecord>) -> Self {
        self.activity.insert(subreddit.to_string(), items);
        self
    }

    pub fn on_profile(mut self, profile: AccountRecord) -> Self {
        self.profiles.insert(profile.username.clone(), profile);
        self
    }

    /// Make one author's profile fetch error (recoverable, skip-and-continue).
    pub fn failing_profile(mut self, username: &str) -> Self {
        self.failing_profiles.insert(username.to_string());
        self
    }

    pub fn with_auth_failure(mut self) -> Self {
        self.fail_auth = true;
        self
    }

    pub fn with_listing_failure(mut self) -> Self {
        self.fail_listing = true;
        self
    }
}

#[async_trait]
impl ActivitySource for MockSource {
    async fn authenticate(&self) -> Result<(), BotSignalError> {
        if self.fail_auth {
            return Err(BotSignalError::UpstreamFetch(
                "MockSource: auth rejected".to_string(),
            ));
        }
        Ok(())
    }

    async fn list_activity(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, BotSignalError> {
        if self.fail_listing {
            return Err(BotSignalError::UpstreamFetch(
                "MockSource: listing unavailable".to_string(),
            ));
        }
        let items = self.activity.get(subreddit).cloned().unwrap_or_default();
        Ok(items.into_iter().take(limit as usize).collect())
    }

    async fn get_profile(
        &self,
        username: &str,
    ) -> Result<Option<AccountRecord>, BotSignalError> {
        if self.failing_profiles.contains(username) {
            return Err(BotSignalError::UpstreamFetch(format!(
                "MockSource: profile fetch failed for {username}"
            )));
        }
        Ok(self.profiles.get(username).cloned())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryInner {
    sessions: HashMap<Uuid, AnalysisSession>,
    accounts: HashMap<String, AccountRecord>,
    activity: HashMap<String, ActivityRecord>,
    verdicts: HashMap<String, BotVerdict>,
}

/// In-memory keyed upsert store with the same semantics as the Postgres
/// store: natural-key upserts, last write wins.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Inspection helpers for assertions ---

    pub fn account_count(&self) -> usize {
        self.inner.lock().unwrap().accounts.len()
    }

    pub fn activity_count(&self) -> usize {
        self.inner.lock().unwrap().activity.len()
    }

    pub fn verdict_count(&self) -> usize {
        self.inner.lock().unwrap().verdicts.len()
    }

    pub fn verdict(&self, username: &str) -> Option<BotVerdict> {
        self.inner.lock().unwrap().verdicts.get(username).cloned()
    }

    pub fn session(&self, id: Uuid) -> Option<AnalysisSession> {
        self.inner.lock().unwrap().sessions.get(&id).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_session(&self, session: &AnalysisSession) -> Result<(), BotSignalError> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<AnalysisSession>, BotSignalError> {
        Ok(self.inner.lock().unwrap().sessions.get(&id).cloned())
    }

    async fn list_sessions(&self) -> Result<Vec<AnalysisSession>, BotSignalError> {
        let mut sessions: Vec<AnalysisSession> =
            self.inner.lock().unwrap().sessions.values().cloned().collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, BotSignalError> {
        Ok(self.inner.lock().unwrap().sessions.remove(&id).is_some())
    }

    async fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
    ) -> Result<(), BotSignalError> {
        if let Some(session) = self.inner.lock().unwrap().sessions.get_mut(&id) {
            session.status = status;
        }
        Ok(())
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
        if let Some(session) = self.inner.lock().unwrap().sessions.get_mut(&id) {
            session.status = status;
            session.total_accounts_analyzed = total_accounts_analyzed;
            session.bots_detected = bots_detected;
            session.completed_at = Some(completed_at);
            session.parameters = parameters.clone();
        }
        Ok(())
    }

    async fn upsert_accounts(&self, accounts: &[AccountRecord]) -> Result<u64, BotSignalError> {
        let mut inner = self.inner.lock().unwrap();
        for account in accounts {
            inner
                .accounts
                .insert(account.username.clone(), account.clone());
        }
        Ok(accounts.len() as u64)
    }

    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, BotSignalError> {
        let mut accounts: Vec<AccountRecord> =
            self.inner.lock().unwrap().accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(accounts)
    }

    async fn upsert_activity(&self, items: &[ActivityRecord]) -> Result<u64, BotSignalError> {
        let mut inner = self.inner.lock().unwrap();
        for item in items {
            inner
                .activity
                .insert(item.platform_id.clone(), item.clone());
        }
        Ok(items.len() as u64)
    }

    async fn activity_aggregates(
        &self,
    ) -> Result<HashMap<String, ActivityAggregates>, BotSignalError> {
        let inner = self.inner.lock().unwrap();
        let mut aggregates: HashMap<String, ActivityAggregates> = HashMap::new();
        for item in inner.activity.values() {
            let entry = aggregates
                .entry(item.author_username.clone())
                .or_default();
            match item.kind {
                ActivityKind::Post => {
                    entry.post_count += 1;
                    entry.post_score_sum += item.score;
                }
                ActivityKind::Comment => entry.comment_count += 1,
            }
        }
        Ok(aggregates)
    }

    async fn upsert_verdicts(&self, verdicts: &[BotVerdict]) -> Result<u64, BotSignalError> {
        let mut inner = self.inner.lock().unwrap();
        for verdict in verdicts {
            inner
                .verdicts
                .insert(verdict.username.clone(), verdict.clone());
        }
        Ok(verdicts.len() as u64)
    }

    async fn list_verdicts(&self) -> Result<Vec<BotVerdict>, BotSignalError> {
        let mut verdicts: Vec<BotVerdict> =
            self.inner.lock().unwrap().verdicts.values().cloned().collect();
        verdicts.sort_by(|a, b| {
            b.bot_probability
                .partial_cmp(&a.bot_probability)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(verdicts)
    }
}
