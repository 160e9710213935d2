use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use botsignal_common::{AccountRecord, BotSignalError};

use crate::rate_limit::FixedIntervalGate;
use crate::traits::{ActivitySource, RecordStore};

/// Counts from one extraction run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractionStats {
    pub activity_count: u64,
    pub author_count: u64,
}

impl std::fmt::Display for ExtractionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} activity items, {} author profiles",
            self.activity_count, self.author_count
        )
    }
}

/// Populates account/activity storage for one community from the upstream
/// source.
///
/// Auth and the page fetch are fatal; a single author's profile fetch
/// failure is logged and skipped. All writes are keyed upserts, so re-running
/// against identical upstream data changes nothing.
pub struct ExtractionStage {
    source: Arc<dyn ActivitySource>,
    store: Arc<dyn RecordStore>,
    gate: FixedIntervalGate,
    limit: u32,
}

impl ExtractionStage {
    pub fn new(
        source: Arc<dyn ActivitySource>,
        store: Arc<dyn RecordStore>,
        fetch_delay_ms: u64,
        limit: u32,
    ) -> Self {
        Self {
            source,
            store,
            gate: FixedIntervalGate::from_millis(fetch_delay_ms),
            limit,
        }
    }

    pub async fn run(&self, subreddit: &str) -> Result<ExtractionStats, BotSignalError> {
        self.source.authenticate().await?;

        let items = self.source.list_activity(subreddit, self.limit).await?;
        info!(subreddit, items = items.len(), "Activity page fetched");

        // Set semantics: an author appearing on several activity items is
        // fetched once. BTreeSet keeps the fetch order deterministic.
        let authors: BTreeSet<&str> = items
            .iter()
            .map(|item| item.author_username.as_str())
            .collect();

        self.store.upsert_activity(&items).await?;

        let mut profiles: Vec<AccountRecord> = Vec::with_capacity(authors.len());
        for username in authors {
            self.gate.acquire().await;
            match self.source.get_profile(username).await {
                Ok(Some(profile)) => profiles.push(profile),
                Ok(None) => {
                    warn!(username, "Author profile not found upstream, skipping");
                }
                Err(e) => {
                    warn!(username, error = %e, "Author profile fetch failed, skipping");
                }
            }
        }

        self.store.upsert_accounts(&profiles).await?;

        let stats = ExtractionStats {
            activity_count: items.len() as u64,
            author_count: profiles.len() as u64,
        };
        info!(subreddit, %stats, "Extraction complete");
        Ok(stats)
    }
}
