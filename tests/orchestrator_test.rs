//! End-to-end orchestrator flows over in-memory ports.

mod common;

use std::sync::Arc;
use std::time::Duration;

use colloquy::domain::ports::SubmitResponse;
use colloquy::services::{OrchestratorEvent, StopReason};
use colloquy::{
    BalanceLevel, Config, Conversation, ConversationId, Message, Orchestrator, OrchestratorError,
    SubmitOutcome, TaskId, TaskStatus, TransportError,
};

use common::{child, parent, snapshot, FakeBackend, ScriptedFeed, StaticLedger};

struct Rig {
    orchestrator: Orchestrator,
    backend: Arc<FakeBackend>,
    feed: Arc<ScriptedFeed>,
}

fn rig(balance: Result<Option<f64>, TransportError>, feed: ScriptedFeed) -> Rig {
    let backend = Arc::new(FakeBackend::new());
    let feed = Arc::new(feed);
    let orchestrator = Orchestrator::new(
        backend.clone(),
        feed.clone(),
        Arc::new(StaticLedger(balance)),
        &Config::default(),
    );
    Rig {
        orchestrator,
        backend,
        feed,
    }
}

async fn seed_current(rig: &Rig, id: &str) -> ConversationId {
    let id = ConversationId::from(id);
    let mut conversation = Conversation::new(id.clone(), "seeded");
    conversation.messages.push(Message::user("hello"));
    rig.orchestrator.store().replace(conversation).await;
    rig.orchestrator.store().set_current(Some(id.clone())).await;
    id
}

#[tokio::test]
async fn test_empty_balance_blocks_before_any_submission() {
    let rig = rig(Ok(Some(0.0)), ScriptedFeed::new(vec![]));
    let id = seed_current(&rig, "C1").await;

    let err = rig.orchestrator.send_message("hi").await.unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::GateBlocked {
            level: BalanceLevel::Empty
        }
    ));
    assert_eq!(rig.backend.submit_count(), 0);
    // Nothing was appended optimistically.
    let stored = rig.orchestrator.store().get(&id).await.unwrap();
    assert_eq!(stored.message_count(), 1);
}

#[tokio::test]
async fn test_unreadable_balance_blocks_fail_closed() {
    let rig = rig(
        Err(TransportError::Network("balance service down".into())),
        ScriptedFeed::new(vec![]),
    );
    seed_current(&rig, "C1").await;

    let err = rig.orchestrator.send_message("hi").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::GateBlocked { .. }));
    assert_eq!(rig.backend.submit_count(), 0);
}

#[tokio::test]
async fn test_low_balance_allows_and_warns() {
    let rig = rig(Ok(Some(5.0)), ScriptedFeed::new(vec![]));
    let id = seed_current(&rig, "C1").await;
    let mut rx = rig.orchestrator.subscribe();

    let outcome = rig.orchestrator.send_message("hi").await.unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Replied {
            reply: "ok".to_string()
        }
    );
    let envelope = rx.recv().await.unwrap();
    assert!(matches!(
        envelope.event,
        OrchestratorEvent::LowBalance { balance } if (balance - 5.0).abs() < f64::EPSILON
    ));
    // User message plus inline reply.
    let stored = rig.orchestrator.store().get(&id).await.unwrap();
    assert_eq!(stored.message_count(), 3);
}

#[tokio::test]
async fn test_no_active_conversation_is_rejected_before_submit() {
    let rig = rig(Ok(Some(100.0)), ScriptedFeed::new(vec![]));

    let err = rig.orchestrator.send_message("hi").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::NoActiveConversation));
    assert_eq!(rig.backend.submit_count(), 0);
}

#[tokio::test]
async fn test_failed_submission_rolls_back_exactly_one_message() {
    let rig = rig(Ok(Some(100.0)), ScriptedFeed::new(vec![]));
    let id = seed_current(&rig, "C1").await;
    rig.backend
        .respond_with(Err(TransportError::Status {
            status: 502,
            message: "bad gateway".into(),
        }));

    let err = rig.orchestrator.send_message("doomed").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::Transport(_)));
    assert_eq!(rig.backend.submit_count(), 1);
    let stored = rig.orchestrator.store().get(&id).await.unwrap();
    assert_eq!(stored.message_count(), 1);
    assert_eq!(stored.messages[0].text, "hello");
}

#[tokio::test]
async fn test_sync_reply_applies_artifact_update() {
    let rig = rig(Ok(Some(100.0)), ScriptedFeed::new(vec![]));
    let id = seed_current(&rig, "C1").await;
    rig.backend.respond_with(Ok(SubmitResponse::Sync {
        reply: "generated".into(),
        test_update: Some(serde_json::json!({"cases": 3})),
    }));
    let mut rx = rig.orchestrator.subscribe();

    rig.orchestrator.send_message("make tests").await.unwrap();

    let stored = rig.orchestrator.store().get(&id).await.unwrap();
    assert_eq!(stored.test_data, Some(serde_json::json!({"cases": 3})));
    let envelope = rx.recv().await.unwrap();
    assert!(matches!(
        envelope.event,
        OrchestratorEvent::MergeApplied {
            has_new_artifact: true,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_async_submission_polls_until_complete_and_merges() {
    let feed = ScriptedFeed::new(vec![
        Ok(snapshot(vec![parent(
            "P1",
            vec![child("t1", TaskStatus::Processing)],
        )])),
        Ok(snapshot(vec![parent("P1", vec![child("t1", TaskStatus::Done)])])),
    ]);
    let rig = rig(Ok(Some(100.0)), feed);
    let id = seed_current(&rig, "C1").await;

    // Server-side copy after generation: the full transcript plus the
    // produced artifact.
    let mut remote = Conversation::new(id.clone(), "seeded");
    remote.messages.push(Message::user("hello"));
    remote.messages.push(Message::user("generate"));
    remote.messages.push(Message::ai("here you go"));
    remote.test_data = Some(serde_json::json!({"cases": 2}));
    rig.backend.set_remote(remote);

    rig.backend.respond_with(Ok(SubmitResponse::Async {
        task_id: TaskId::from("t1"),
    }));
    let mut rx = rig.orchestrator.subscribe();

    let outcome = rig.orchestrator.send_message("generate").await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Processing {
            task_id: TaskId::from("t1")
        }
    );
    assert!(rig.orchestrator.is_polling(&id));

    let mut completed = 0;
    loop {
        let envelope = rx.recv().await.unwrap();
        match envelope.event {
            OrchestratorEvent::TaskCompleted { task_id, .. } => {
                assert_eq!(task_id, TaskId::from("t1"));
                completed += 1;
            }
            OrchestratorEvent::PollerStopped { reason, .. } => {
                assert_eq!(reason, StopReason::Complete);
                break;
            }
            _ => {}
        }
    }
    assert_eq!(completed, 1);
    assert_eq!(rig.feed.fetch_count(), 2);

    // The merged server copy won: longer transcript and the new artifact.
    let stored = rig.orchestrator.store().current().await.unwrap();
    assert_eq!(stored.message_count(), 3);
    assert!(stored.has_artifact());
}

#[tokio::test]
async fn test_upload_is_gated_and_skips_optimistic_append() {
    let rig = rig(Ok(Some(0.0)), ScriptedFeed::new(vec![]));
    let id = seed_current(&rig, "C1").await;

    let err = rig
        .orchestrator
        .upload_artifact("spec.pdf", b"data".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::GateBlocked { .. }));

    let rig = crate::rig(Ok(Some(100.0)), ScriptedFeed::new(vec![]));
    let id2 = seed_current(&rig, id.as_str()).await;
    rig.orchestrator
        .upload_artifact("spec.pdf", b"data".to_vec())
        .await
        .unwrap();

    // Only the backend's reply landed; uploads do not append a user
    // message.
    let stored = rig.orchestrator.store().get(&id2).await.unwrap();
    assert_eq!(stored.message_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_refresh_follows_selection_and_shutdown() {
    let rig = rig(Ok(Some(100.0)), ScriptedFeed::new(vec![]));
    rig.orchestrator.start_background();

    // Default cadence is 30s. Two intervals pass with nothing selected:
    // the loop ticks but refreshes nothing.
    tokio::time::sleep(Duration::from_secs(65)).await;
    assert_eq!(rig.backend.refresh_count(), 0);

    seed_current(&rig, "C1").await;
    let mut rx = rig.orchestrator.subscribe();
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(rig.backend.refresh_count(), 1);
    let envelope = rx.recv().await.unwrap();
    assert!(matches!(
        envelope.event,
        OrchestratorEvent::MergeApplied { .. }
    ));

    // After shutdown the cadence stops entirely.
    rig.orchestrator.shutdown();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(rig.backend.refresh_count(), 1);
}

#[tokio::test]
async fn test_select_refreshes_from_server_before_switching() {
    let rig = rig(Ok(Some(100.0)), ScriptedFeed::new(vec![]));
    let id = ConversationId::from("C9");
    let mut remote = Conversation::new(id.clone(), "from server");
    remote.messages.push(Message::ai("hi"));
    rig.backend.set_remote(remote);

    let selected = rig.orchestrator.select(&id).await.unwrap();

    assert_eq!(selected.title, "from server");
    assert_eq!(rig.orchestrator.store().current_id().await, Some(id));
    assert_eq!(rig.backend.refresh_count(), 1);
}

#[tokio::test]
async fn test_load_conversations_primes_local_cache() {
    let rig = rig(Ok(Some(100.0)), ScriptedFeed::new(vec![]));
    let remote = Conversation::new(ConversationId::from("C3"), "remote only");
    rig.backend.set_remote(remote);

    let listed = rig
        .orchestrator
        .load_conversations(colloquy::ListFilter::Active)
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert!(rig
        .orchestrator
        .store()
        .contains(&ConversationId::from("C3"))
        .await);
}
