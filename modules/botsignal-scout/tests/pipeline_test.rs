// End-to-end pipeline tests over the mock trait boundaries.
// Deterministic: no network, no database.

use std::sync::Arc;

use botsignal_common::{BotSignalError, SessionStatus};
use botsignal_scout::testing::{account, comment, post, MemoryStore, MockSource};
use botsignal_scout::PipelineOrchestrator;

fn scripted_source() -> MockSource {
    MockSource::new()
        .on_activity(
            "rust",
            vec![
                post("t3_a1", "alice", "rust", 10),
                post("t3_b1", "botty", "rust", 0),
                comment("t1_a2", "alice", "rust", 3),
                comment("t1_b2", "botty", "rust", 0),
            ],
        )
        .on_profile(account("alice", 3000, 5000, 1200))
        .on_profile(account("botty", 2, 0, 0))
}

fn orchestrator(source: MockSource, store: Arc<MemoryStore>) -> PipelineOrchestrator {
    PipelineOrchestrator::new(Arc::new(source), store, 0, 100)
}

#[tokio::test]
async fn full_pipeline_completes_session_and_counts_bots() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = orchestrator(scripted_source(), store.clone());

    let session = pipeline
        .sessions()
        .create(None, "rust".to_string())
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Pending);

    let outcome = pipeline.run(session.id).await.unwrap();

    assert_eq!(outcome.extraction.activity_count, 4);
    assert_eq!(outcome.extraction.author_count, 2);
    assert_eq!(outcome.detection.users_analyzed, 2);

    let stored = store.session(session.id).unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert!(stored.completed_at.is_some());
    assert_eq!(stored.total_accounts_analyzed, 2);

    // bots_detected matches the count of persisted verdicts above threshold
    let over_threshold = ["alice", "botty"]
        .iter()
        .filter(|u| store.verdict(u).unwrap().bot_probability > 0.5)
        .count() as i64;
    assert_eq!(stored.bots_detected, over_threshold);

    // the fresh zero-karma account reads as a bot, the established one does not
    assert!(store.verdict("botty").unwrap().bot_probability > 0.5);
    assert!(store.verdict("alice").unwrap().bot_probability < 0.5);
}

#[tokio::test]
async fn unknown_session_id_is_a_not_found_error() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = orchestrator(scripted_source(), store);

    let result = pipeline.run(uuid::Uuid::new_v4()).await;
    assert!(matches!(result, Err(BotSignalError::NotFound(_))));
}

#[tokio::test]
async fn auth_failure_marks_session_terminally_failed() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = orchestrator(scripted_source().with_auth_failure(), store.clone());

    let session = pipeline
        .sessions()
        .create(Some("doomed".to_string()), "rust".to_string())
        .await
        .unwrap();

    let result = pipeline.run(session.id).await;
    assert!(matches!(result, Err(BotSignalError::UpstreamFetch(_))));

    let stored = store.session(session.id).unwrap();
    assert_eq!(stored.status, SessionStatus::Failed);
    assert!(stored.completed_at.is_some());
    assert!(stored.parameters["error"].as_str().is_some());
}

#[tokio::test]
async fn listing_failure_marks_session_terminally_failed() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = orchestrator(scripted_source().with_listing_failure(), store.clone());

    let session = pipeline
        .sessions()
        .create(None, "rust".to_string())
        .await
        .unwrap();

    assert!(pipeline.run(session.id).await.is_err());
    let stored = store.session(session.id).unwrap();
    assert_eq!(stored.status, SessionStatus::Failed);
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn single_author_fetch_failure_does_not_abort_the_run() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = orchestrator(scripted_source().failing_profile("botty"), store.clone());

    let session = pipeline
        .sessions()
        .create(None, "rust".to_string())
        .await
        .unwrap();
    let outcome = pipeline.run(session.id).await.unwrap();

    // activity still lands in full; only the failing author's profile is skipped
    assert_eq!(outcome.extraction.activity_count, 4);
    assert_eq!(outcome.extraction.author_count, 1);
    assert_eq!(store.account_count(), 1);
    assert!(store.verdict("alice").is_some());
    assert!(store.verdict("botty").is_none());

    let stored = store.session(session.id).unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
}

#[tokio::test]
async fn re_running_extraction_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = orchestrator(scripted_source(), store.clone());

    let session = pipeline
        .sessions()
        .create(None, "rust".to_string())
        .await
        .unwrap();

    pipeline.run(session.id).await.unwrap();
    let after_one = (store.activity_count(), store.account_count(), store.verdict_count());

    // caller-level re-submission of the whole pipeline against the same session
    pipeline.run(session.id).await.unwrap();
    let after_two = (store.activity_count(), store.account_count(), store.verdict_count());

    assert_eq!(after_one, after_two);
}

#[tokio::test]
async fn scoring_can_be_restricted_to_a_subset_of_accounts() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = orchestrator(scripted_source(), store.clone());

    let session = pipeline
        .sessions()
        .create(None, "rust".to_string())
        .await
        .unwrap();

    let filter = vec!["botty".to_string()];
    let outcome = pipeline
        .run_with_filter(session.id, Some(&filter))
        .await
        .unwrap();

    assert_eq!(outcome.detection.users_analyzed, 1);
    assert!(store.verdict("botty").is_some());
    assert!(store.verdict("alice").is_none());
}

#[tokio::test]
async fn session_listing_is_newest_first_and_delete_is_validated() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = orchestrator(MockSource::new(), store);
    let sessions = pipeline.sessions();

    let first = sessions.create(None, "rust".to_string()).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = sessions.create(None, "golang".to_string()).await.unwrap();

    let listed = sessions.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);

    sessions.delete(first.id).await.unwrap();
    let missing = sessions.delete(first.id).await;
    assert!(matches!(missing, Err(BotSignalError::NotFound(_))));

    let empty_name = sessions.create(None, "  ".to_string()).await;
    assert!(matches!(empty_name, Err(BotSignalError::Validation(_))));
}
