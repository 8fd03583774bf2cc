mod common;

use colloquy_llm::{AssistantError, AssistantId, Role, RunStatus};
use colloquy_session::{ConversationCache, MessageExchange, ThreadSession};
use common::{fast_policy, FakeAssistantsApi};
use std::time::Duration;

async fn setup(api: &FakeAssistantsApi) -> (MessageExchange, colloquy_llm::ThreadId, AssistantId) {
    let assistant_id = api.seed_assistant("asst_math");
    let thread_id = ThreadSession::new(api.clone().shared()).create().await.unwrap();
    let exchange = MessageExchange::new(api.clone().shared(), fast_policy(500));
    (exchange, thread_id, assistant_id)
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let api = FakeAssistantsApi::new();
    let (exchange, thread_id, _) = setup(&api).await;

    for text in ["one", "two", "three"] {
        exchange.post_message(&thread_id, Role::User, text).await.unwrap();
    }

    let history = exchange.fetch_history(&thread_id).await.unwrap();
    let texts: Vec<String> = history.iter().map(|m| m.text()).collect();
    assert_eq!(texts, vec!["three", "two", "one"]);
    assert!(history
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
}

#[tokio::test]
async fn test_most_recent_of_empty_history() {
    let err = MessageExchange::most_recent(&[]).unwrap_err();
    assert!(matches!(err, AssistantError::EmptyHistory));
}

#[tokio::test]
async fn test_full_turn_updates_cache() {
    let api = FakeAssistantsApi::new().with_reply("4");
    let (exchange, thread_id, assistant_id) = setup(&api).await;
    let mut cache = ConversationCache::new(10);

    let reply = exchange
        .exchange(&mut cache, &thread_id, &assistant_id, "What is 2+2?")
        .await
        .unwrap();

    assert_eq!(reply, "4");
    assert_eq!(cache.len(), 2);
    let last = cache.last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, "4");

    let history = exchange.fetch_history(&thread_id).await.unwrap();
    assert_eq!(history[0].role, Role::Assistant);
    assert_eq!(history[1].text(), "What is 2+2?");
}

#[tokio::test]
async fn test_trigger_run_requires_assistant_id() {
    let api = FakeAssistantsApi::new();
    let (exchange, thread_id, _) = setup(&api).await;

    let err = exchange
        .trigger_run(&thread_id, &AssistantId::new(""))
        .await
        .unwrap_err();

    assert!(matches!(err, AssistantError::Precondition(_)));
    assert_eq!(api.count("create_run"), 0);
}

#[tokio::test]
async fn test_await_completion_walks_through_pending_statuses() {
    let api = FakeAssistantsApi::new().with_run_script(vec![
        RunStatus::Queued,
        RunStatus::InProgress,
        RunStatus::InProgress,
        RunStatus::Completed,
    ]);
    let (exchange, thread_id, assistant_id) = setup(&api).await;

    let run = exchange.trigger_run(&thread_id, &assistant_id).await.unwrap();
    let status = exchange
        .await_completion(&run, Duration::from_millis(500))
        .await
        .unwrap();

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(api.count("get_run"), 4);
}

#[tokio::test]
async fn test_failed_run_carries_status_and_detail() {
    let api =
        FakeAssistantsApi::new().with_run_script(vec![RunStatus::InProgress, RunStatus::Failed]);
    let (exchange, thread_id, assistant_id) = setup(&api).await;
    let mut cache = ConversationCache::new(10);

    let err = exchange
        .exchange(&mut cache, &thread_id, &assistant_id, "Hello")
        .await
        .unwrap_err();

    match err {
        AssistantError::RunFailed { status, detail, .. } => {
            assert_eq!(status, RunStatus::Failed);
            assert!(detail.unwrap().contains("server_error"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // the user turn reached the thread, the reply never did
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.last().unwrap().role, Role::User);
}

#[tokio::test]
async fn test_requires_action_is_a_failure() {
    let api = FakeAssistantsApi::new().with_run_script(vec![RunStatus::RequiresAction]);
    let (exchange, thread_id, assistant_id) = setup(&api).await;

    let run = exchange.trigger_run(&thread_id, &assistant_id).await.unwrap();
    let err = exchange
        .await_completion(&run, Duration::from_millis(500))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "run_failed");
}

#[tokio::test]
async fn test_timeout_cancels_run() {
    let api = FakeAssistantsApi::new().with_run_script(vec![RunStatus::InProgress]);
    let (exchange, thread_id, assistant_id) = setup(&api).await;

    let run = exchange.trigger_run(&thread_id, &assistant_id).await.unwrap();
    let err = exchange
        .await_completion(&run, Duration::from_millis(30))
        .await
        .unwrap_err();

    assert!(matches!(err, AssistantError::Timeout { .. }));
    assert_eq!(api.count("cancel_run"), 1);
    assert!(api.count("get_run") >= 1);
}

#[tokio::test]
async fn test_run_creation_error_is_surfaced() {
    let api = FakeAssistantsApi::new().failing_runs();
    let (exchange, thread_id, assistant_id) = setup(&api).await;

    let err = exchange
        .reply_to_latest(&thread_id, &assistant_id)
        .await
        .unwrap_err();

    match err {
        AssistantError::Remote { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "The server had an error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
