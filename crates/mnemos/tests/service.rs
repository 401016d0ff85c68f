//! End-to-end behaviour of the service facade over a file store.

use mnemos::Mnemos;
use mnemos::config::MnemosConfig;
use mnemos::llm::{EstimatingTokenizer, Tokenizer};
use mnemos::memory::{FileMemoryStore, MemoryStore, Message};
use mnemos_test_utils::{CollectingSink, ScriptedCompletion, WordTokenizer};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const SESSION: &str = "chat-42";

fn service(
    config: MnemosConfig,
    store: Arc<dyn MemoryStore>,
    completion: ScriptedCompletion,
    sink: CollectingSink,
) -> Mnemos {
    Mnemos::with_collaborators(
        config,
        store,
        Arc::new(completion),
        Arc::new(WordTokenizer),
        Arc::new(sink),
    )
    .expect("service")
}

#[tokio::test]
async fn appending_past_the_window_compacts_the_transcript() {
    let temp = tempdir().expect("tempdir");
    let store: Arc<dyn MemoryStore> = Arc::new(FileMemoryStore::new(temp.path()).expect("store"));
    let completion = ScriptedCompletion::new();
    let sink = CollectingSink::new();
    let mnemos = service(
        MnemosConfig::builder().message_window(6).build(),
        store.clone(),
        completion.clone(),
        sink.clone(),
    );

    for idx in 0..10 {
        let role = if idx % 2 == 0 { "user" } else { "assistant" };
        mnemos
            .append(SESSION, vec![Message::new(role, format!("turn {idx}"))])
            .await
            .expect("append");
    }
    mnemos.shutdown().await;

    assert_eq!(sink.len(), 10);
    assert!(sink.take().iter().all(|report| report.is_success()));
    assert!(completion.call_count() >= 1);

    let memory = mnemos.memory(SESSION, 0).await.expect("memory");
    let uncovered = memory.messages.expect("messages");
    assert!(uncovered.len() < 6, "uncovered={}", uncovered.len());
    let summary = memory.summary.expect("summary");
    let all = mnemos.memory(SESSION, 10).await.expect("all").messages.expect("messages");
    let point = all
        .iter()
        .position(|message| message.uuid == summary.summary_point_uuid)
        .expect("summary point in transcript");
    assert_eq!(all[point + 1..].to_vec(), uncovered);
}

#[tokio::test]
async fn append_succeeds_when_the_worker_queue_is_full() {
    let temp = tempdir().expect("tempdir");
    let store: Arc<dyn MemoryStore> = Arc::new(FileMemoryStore::new(temp.path()).expect("store"));
    let mut config = MnemosConfig::builder().message_window(2).build();
    config.extractors.workers.max_concurrent = 1;
    config.extractors.workers.queue_capacity = 1;
    let completion = ScriptedCompletion::new().with_delay(Duration::from_millis(300));
    let sink = CollectingSink::new();
    let mnemos = service(config, store, completion, sink.clone());

    for idx in 0..6 {
        mnemos
            .append(SESSION, vec![Message::new("user", format!("turn {idx}"))])
            .await
            .expect("append is not failed by background extraction");
    }
    mnemos.shutdown().await;

    assert!(sink.len() < 6, "some notifications should have been refused");
    let stored = mnemos
        .memory(SESSION, 100)
        .await
        .expect("memory")
        .messages
        .expect("messages");
    let contents: Vec<String> = stored.into_iter().map(|message| message.content).collect();
    let expected: Vec<String> = (0..6).map(|idx| format!("turn {idx}")).collect();
    assert_eq!(contents, expected);
}

#[tokio::test]
async fn appended_messages_get_token_counts() {
    let temp = tempdir().expect("tempdir");
    let store: Arc<dyn MemoryStore> = Arc::new(FileMemoryStore::new(temp.path()).expect("store"));
    let mnemos = service(
        MnemosConfig::builder().message_window(50).build(),
        store,
        ScriptedCompletion::new(),
        CollectingSink::new(),
    );

    mnemos
        .append(
            SESSION,
            vec![
                Message::new("user", "three small words"),
                Message::new("assistant", "preset").with_token_count(9),
            ],
        )
        .await
        .expect("append");
    mnemos.shutdown().await;

    let messages = mnemos
        .memory(SESSION, 0)
        .await
        .expect("memory")
        .messages
        .expect("messages");
    let counts: Vec<usize> = messages.iter().map(|message| message.token_count).collect();
    assert_eq!(counts, vec![3, 9]);
}

#[tokio::test]
async fn summarize_runs_synchronously() {
    let temp = tempdir().expect("tempdir");
    let store: Arc<dyn MemoryStore> = Arc::new(FileMemoryStore::new(temp.path()).expect("store"));
    let mut config = MnemosConfig::builder().message_window(4).build();
    config.extractors.summarizer.enabled = false;
    let completion = ScriptedCompletion::with_responses(["the user counted to five"]);
    let mnemos = service(config, store, completion.clone(), CollectingSink::new());
    assert!(mnemos.registry().is_empty());

    let messages: Vec<Message> = (0..5)
        .map(|idx| Message::new("user", format!("number {idx}")))
        .collect();
    mnemos.append(SESSION, messages.clone()).await.expect("append");
    assert_eq!(completion.call_count(), 0);

    mnemos.summarize(SESSION).await.expect("summarize");

    let memory = mnemos.memory(SESSION, 0).await.expect("memory");
    let summary = memory.summary.expect("summary");
    assert_eq!(summary.content, "the user counted to five");
    assert_eq!(summary.summary_point_uuid, messages[2].uuid);
    assert_eq!(memory.messages.expect("messages"), messages[3..].to_vec());
    mnemos.shutdown().await;
}

#[tokio::test]
async fn search_and_delete_go_through_the_store() {
    let temp = tempdir().expect("tempdir");
    let store: Arc<dyn MemoryStore> = Arc::new(FileMemoryStore::new(temp.path()).expect("store"));
    let mnemos = service(
        MnemosConfig::builder().message_window(50).build(),
        store,
        ScriptedCompletion::new(),
        CollectingSink::new(),
    );
    mnemos
        .append(
            SESSION,
            vec![
                Message::new("user", "book a flight to Lisbon"),
                Message::new("assistant", "which dates for Lisbon?"),
            ],
        )
        .await
        .expect("append");

    let results = mnemos.search(SESSION, "flight lisbon", 5).await.expect("search");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].message.content, "book a flight to Lisbon");

    mnemos.delete(SESSION).await.expect("delete");
    assert!(mnemos.memory(SESSION, 0).await.is_err());
    mnemos.shutdown().await;
}

#[tokio::test]
async fn from_config_uses_the_configured_store_path() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("memory");
    let json5 = format!(
        r#"{{ memory: {{ store: {{ path: "{}" }} }}, extractors: {{ summarizer: {{ enabled: false }} }} }}"#,
        path.display()
    );
    let config = MnemosConfig::load_from_str(&json5).expect("config");

    let mnemos = Mnemos::from_config(config).expect("service");
    mnemos
        .append(SESSION, vec![Message::new("user", "hello there")])
        .await
        .expect("append");
    mnemos.shutdown().await;

    assert!(path.join(SESSION).join("messages.jsonl").exists());
    let memory = mnemos.memory(SESSION, 0).await.expect("memory");
    assert_eq!(
        memory.messages.expect("messages")[0].token_count,
        EstimatingTokenizer.count("hello there").expect("count")
    );
}

#[tokio::test]
async fn from_config_accepts_a_custom_tokenizer() {
    let temp = tempdir().expect("tempdir");
    let mut config = MnemosConfig::builder().build();
    config.memory.store.path = Some(temp.path().display().to_string());
    config.extractors.summarizer.enabled = false;

    let mnemos = Mnemos::from_config_with_tokenizer(
        config,
        Arc::new(WordTokenizer),
        Arc::new(CollectingSink::new()),
    )
    .expect("service");
    mnemos
        .append(SESSION, vec![Message::new("user", "記憶 の 要約 です")])
        .await
        .expect("append");
    mnemos.shutdown().await;

    let memory = mnemos.memory(SESSION, 0).await.expect("memory");
    assert_eq!(memory.messages.expect("messages")[0].token_count, 4);
}
