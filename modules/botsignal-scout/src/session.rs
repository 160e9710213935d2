use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use botsignal_common::{AnalysisSession, BotSignalError, SessionStatus};

use crate::traits::RecordStore;

/// Single owner of the analysis-session lifecycle. All status writes flow
/// through here; the orchestrator is the only caller of the transition
/// methods.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn RecordStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        name: Option<String>,
        subreddit: String,
    ) -> Result<AnalysisSession, BotSignalError> {
        if subreddit.trim().is_empty() {
            return Err(BotSignalError::Validation(
                "subreddit must not be empty".to_string(),
            ));
        }

        let name = name.unwrap_or_else(|| format!("r/{subreddit} analysis"));
        let session = AnalysisSession::new(name, subreddit);
        self.store.insert_session(&session).await?;
        info!(session_id = %session.id, subreddit = session.subreddit.as_str(), "Session created");
        Ok(session)
    }

    pub async fn get(&self, id: Uuid) -> Result<AnalysisSession, BotSignalError> {
        self.store
            .get_session(id)
            .await?
            .ok_or_else(|| BotSignalError::NotFound(format!("session {id}")))
    }

    /// All sessions, newest first.
    pub async fn list(&self) -> Result<Vec<AnalysisSession>, BotSignalError> {
        self.store.list_sessions().await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), BotSignalError> {
        if !self.store.delete_session(id).await? {
            return Err(BotSignalError::NotFound(format!("session {id}")));
        }
        info!(session_id = %id, "Session deleted");
        Ok(())
    }

    /// Move a session to a non-terminal stage. Last writer wins; callers are
    /// expected not to run concurrent pipelines against one session.
    pub async fn transition(
        &self,
        id: Uuid,
        status: SessionStatus,
    ) -> Result<(), BotSignalError> {
        info!(session_id = %id, status = %status, "Session transition");
        self.store.update_session_status(id, status).await
    }

    /// Terminal success: stamp counters and `completed_at` in one write.
    pub async fn complete(
        &self,
        id: Uuid,
        total_accounts_analyzed: i64,
        bots_detected: i64,
    ) -> Result<(), BotSignalError> {
        let session = self.get(id).await?;
        self.store
            .finalize_session(
                id,
                SessionStatus::Completed,
                total_accounts_analyzed,
                bots_detected,
                Utc::now(),
                &session.parameters,
            )
            .await?;
        info!(
            session_id = %id,
            total_accounts_analyzed,
            bots_detected,
            "Session completed"
        );
        Ok(())
    }

    /// Terminal failure: the session never strands on a non-terminal status.
    /// The failure message is recorded in the parameters map.
    pub async fn fail(&self, id: Uuid, reason: &str) -> Result<(), BotSignalError> {
        let session = self.get(id).await?;
        let mut parameters = session.parameters.clone();
        if let Some(map) = parameters.as_object_mut() {
            map.insert(
                "error".to_string(),
                serde_json::Value::String(reason.to_string()),
            );
        }
        self.store
            .finalize_session(
                id,
                SessionStatus::Failed,
                session.total_accounts_analyzed,
                session.bots_detected,
                Utc::now(),
                &parameters,
            )
            .await?;
        info!(session_id = %id, reason, "Session failed");
        Ok(())
    }
}
