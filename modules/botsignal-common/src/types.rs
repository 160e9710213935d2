use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Session ---

/// Lifecycle of an analysis session. One pipeline run walks a session from
/// `Pending` through the extraction and scoring stages to `Completed`;
/// an unrecoverable error at any stage lands it on `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    ExtractingData,
    DataExtracted,
    Analyzing,
    Completed,
    Failed,
}

impl SessionStatus {
    /// Terminal states carry a `completed_at` timestamp; non-terminal never do.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::ExtractingData => "extracting_data",
            SessionStatus::DataExtracted => "data_extracted",
            SessionStatus::Analyzing => "analyzing",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SessionStatus::Pending),
            "extracting_data" => Some(SessionStatus::ExtractingData),
            "data_extracted" => Some(SessionStatus::DataExtracted),
            "analyzing" => Some(SessionStatus::Analyzing),
            "completed" => Some(SessionStatus::Completed),
            "failed" => Some(SessionStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One analysis job: which subreddit, where the run currently is, and the
/// aggregate counters stamped at completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSession {
    pub id: Uuid,
    pub name: String,
    pub subreddit: String,
    pub status: SessionStatus,
    pub total_accounts_analyzed: i64,
    pub bots_detected: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Free-form run parameters; also records the failure message on `Failed`.
    pub parameters: serde_json::Value,
}

impl AnalysisSession {
    pub fn new(name: String, subreddit: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            subreddit,
            status: SessionStatus::Pending,
            total_accounts_analyzed: 0,
            bots_detected: 0,
            started_at: Utc::now(),
            completed_at: None,
            parameters: serde_json::json!({}),
        }
    }
}

// --- Extracted records ---

/// A Reddit account profile snapshot, keyed on username.
/// Re-extraction overwrites the previous snapshot (last-write-wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub username: String,
    /// Whole days since the account was created, computed at fetch time.
    pub account_age_days: i64,
    pub comment_karma: i64,
    pub link_karma: i64,
    pub is_verified: bool,
    pub has_verified_email: bool,
    pub is_premium: bool,
    pub account_created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Post,
    Comment,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Post => "post",
            ActivityKind::Comment => "comment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "post" => Some(ActivityKind::Post),
            "comment" => Some(ActivityKind::Comment),
            _ => None,
        }
    }
}

/// A single post or comment, keyed on the platform id. The author is a weak
/// reference — the profile may never have been fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub platform_id: String,
    pub author_username: String,
    pub kind: ActivityKind,
    pub score: i64,
    pub title: Option<String>,
    pub body: Option<String>,
    pub subreddit: String,
    pub created_at: DateTime<Utc>,
}

/// Per-author activity rollup, derived from stored activity on each scoring
/// run. Never persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityAggregates {
    pub post_count: i64,
    pub comment_count: i64,
    pub post_score_sum: i64,
}

// --- Verdict ---

/// The scored output for one account. Upserted keyed on username — each new
/// analysis overwrites the previous verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotVerdict {
    pub username: String,
    pub bot_probability: f64,
    pub confidence_score: f64,
    pub detection_method: String,
    /// The full named feature map the score was computed from.
    pub features: serde_json::Value,
    pub risk_factors: Vec<String>,
    pub analysis_timestamp: DateTime<Utc>,
}

impl BotVerdict {
    /// Verdicts above this probability count toward a session's `bots_detected`.
    pub const BOT_THRESHOLD: f64 = 0.5;

    pub fn is_bot(&self) -> bool {
        self.bot_probability > Self::BOT_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrips_through_strings() {
        for status in [
            SessionStatus::Pending,
            SessionStatus::ExtractingData,
            SessionStatus::DataExtracted,
            SessionStatus::Analyzing,
            SessionStatus::Completed,
            SessionStatus::Failed,
        ] {
            assert_eq!(SessionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::parse("cancelled"), None);
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(!SessionStatus::Pending.is_terminal());
        assert!(!SessionStatus::Analyzing.is_terminal());
    }

    #[test]
    fn new_session_starts_pending_with_no_completion() {
        let session = AnalysisSession::new("test".to_string(), "rust".to_string());
        assert_eq!(session.status, SessionStatus::Pending);
        assert!(session.completed_at.is_none());
        assert_eq!(session.total_accounts_analyzed, 0);
        assert_eq!(session.bots_detected, 0);
    }
}
