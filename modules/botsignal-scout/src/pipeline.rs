use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use botsignal_common::{BotSignalError, BotVerdict, SessionStatus};

use crate::engine::BotProbabilityEngine;
use crate::extraction::{ExtractionStage, ExtractionStats};
use crate::session::SessionManager;
use crate::traits::{ActivitySource, RecordStore};

/// Scoring-half counts plus the verdict batch itself.
#[derive(Debug, Default)]
pub struct DetectionSummary {
    pub users_analyzed: u64,
    pub bots_detected: u64,
    pub verdicts: Vec<BotVerdict>,
}

/// Result of one full pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub extraction: ExtractionStats,
    pub detection: DetectionSummary,
}

impl std::fmt::Display for PipelineOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Pipeline Complete ===")?;
        writeln!(f, "Activity items:  {}", self.extraction.activity_count)?;
        writeln!(f, "Author profiles: {}", self.extraction.author_count)?;
        writeln!(f, "Users analyzed:  {}", self.detection.users_analyzed)?;
        writeln!(f, "Bots detected:   {}", self.detection.bots_detected)?;
        Ok(())
    }
}

/// Sequences extraction → scoring → persistence for one session, updating
/// the session status at each boundary. Any stage failure marks the session
/// terminally failed and re-raises a single descriptive error; there is no
/// automatic stage retry.
pub struct PipelineOrchestrator {
    source: Arc<dyn ActivitySource>,
    store: Arc<dyn RecordStore>,
    sessions: SessionManager,
    engine: BotProbabilityEngine,
    fetch_delay_ms: u64,
    extraction_limit: u32,
}

impl PipelineOrchestrator {
    pub fn new(
        source: Arc<dyn ActivitySource>,
        store: Arc<dyn RecordStore>,
        fetch_delay_ms: u64,
        extraction_limit: u32,
    ) -> Self {
        Self {
            source,
            sessions: SessionManager::new(store.clone()),
            store,
            engine: BotProbabilityEngine::new(),
            fetch_delay_ms,
            extraction_limit,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Run the full pipeline over all known accounts.
    pub async fn run(&self, session_id: Uuid) -> Result<PipelineOutcome, BotSignalError> {
        self.run_with_filter(session_id, None).await
    }

    /// Run the full pipeline, optionally restricting scoring to a subset of
    /// usernames. Extraction always covers the session's whole community.
    pub async fn run_with_filter(
        &self,
        session_id: Uuid,
        usernames: Option<&[String]>,
    ) -> Result<PipelineOutcome, BotSignalError> {
        // An unknown session is a request error, not a pipeline failure —
        // there is nothing to mark failed.
        let session = self.sessions.get(session_id).await?;

        match self.run_stages(&session.subreddit, session_id, usernames).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Pipeline failed");
                if let Err(mark_err) = self.sessions.fail(session_id, &e.to_string()).await {
                    error!(
                        session_id = %session_id,
                        error = %mark_err,
                        "Failed to mark session as failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        subreddit: &str,
        session_id: Uuid,
        usernames: Option<&[String]>,
    ) -> Result<PipelineOutcome, BotSignalError> {
        info!(session_id = %session_id, subreddit, "Pipeline starting");

        self.sessions
            .transition(session_id, SessionStatus::ExtractingData)
            .await?;

        let stage = ExtractionStage::new(
            self.source.clone(),
            self.store.clone(),
            self.fetch_delay_ms,
            self.extraction_limit,
        );
        let extraction = stage.run(subreddit).await?;

        self.sessions
            .transition(session_id, SessionStatus::DataExtracted)
            .await?;
        self.sessions
            .transition(session_id, SessionStatus::Analyzing)
            .await?;

        let mut accounts = self.store.list_accounts().await?;
        if let Some(filter) = usernames {
            accounts.retain(|account| filter.contains(&account.username));
        }
        let aggregates = self.store.activity_aggregates().await?;

        let verdicts = self.engine.score_batch(&accounts, &aggregates);
        self.store.upsert_verdicts(&verdicts).await?;

        let bots_detected = verdicts.iter().filter(|v| v.is_bot()).count() as u64;
        let users_analyzed = verdicts.len() as u64;

        self.sessions
            .complete(session_id, users_analyzed as i64, bots_detected as i64)
            .await?;

        info!(
            session_id = %session_id,
            users_analyzed,
            bots_detected,
            "Pipeline complete"
        );

        Ok(PipelineOutcome {
            extraction,
            detection: DetectionSummary {
                users_analyzed,
                bots_detected,
                verdicts,
            },
        })
    }
}
