//! Summary extractor behaviour against in-memory collaborators.

use mnemos_config::MnemosConfig;
use mnemos_extractors::{
    AppState, ExtractContext, Extractor, PromptBuilder, SUMMARY_MAX_OUTPUT_TOKENS,
    SummaryExtractor,
};
use mnemos_llm::{LlmError, Tokenizer};
use mnemos_memory::{Message, MessageEvent, Summary};
use mnemos_test_utils::{
    CollectingSink, ScriptedCompletion, StubStore, WordTokenizer, test_config, test_state,
    transcript,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const SESSION: &str = "session-1";
/// Capacity of the default model.
const DEFAULT_MODEL_TOKENS: usize = 4096;

/// `prompt_tokens` value that leaves exactly `budget` input tokens.
fn prompt_tokens_for_budget(budget: usize) -> usize {
    DEFAULT_MODEL_TOKENS - SUMMARY_MAX_OUTPUT_TOKENS - budget
}

struct Harness {
    store: StubStore,
    completion: ScriptedCompletion,
    state: Arc<AppState>,
    extractor: SummaryExtractor,
}

fn harness(config: MnemosConfig, store: StubStore, completion: ScriptedCompletion) -> Harness {
    let extractor =
        SummaryExtractor::from_config(&config.extractors.summarizer).expect("extractor");
    let state = test_state(
        config,
        Arc::new(store.clone()),
        Arc::new(completion.clone()),
        Arc::new(CollectingSink::new()),
    );
    Harness {
        store,
        completion,
        state,
        extractor,
    }
}

fn seeded(messages: &[Message]) -> StubStore {
    let store = StubStore::new();
    store.seed(SESSION, messages.to_vec());
    store
}

fn event() -> MessageEvent {
    MessageEvent::new(SESSION, Vec::new())
}

impl Harness {
    async fn extract(&self) -> Result<(), mnemos_extractors::ExtractorError> {
        self.extract_with(&ExtractContext::new()).await
    }

    async fn extract_with(
        &self,
        ctx: &ExtractContext,
    ) -> Result<(), mnemos_extractors::ExtractorError> {
        self.extractor.extract(ctx, &self.state, &event()).await
    }

    fn only_written(&self) -> Summary {
        let written = self.store.written();
        assert_eq!(written.len(), 1, "expected exactly one summary write");
        written[0].1.clone()
    }
}

#[tokio::test]
async fn below_window_is_a_no_op() {
    let messages = transcript(9);
    let h = harness(test_config(10), seeded(&messages), ScriptedCompletion::new());

    h.extract().await.expect("extract");

    assert_eq!(h.store.get_calls(), 1);
    assert!(h.store.written().is_empty());
    assert_eq!(h.completion.call_count(), 0);
}

#[tokio::test]
async fn zero_window_fails_without_touching_the_store() {
    let messages = transcript(20);
    let h = harness(test_config(0), seeded(&messages), ScriptedCompletion::new());

    let err = h.extract().await.unwrap_err();

    assert!(err.to_string().contains("message_window"));
    assert_eq!(h.store.get_calls(), 0);
    assert_eq!(h.completion.call_count(), 0);
}

#[tokio::test]
async fn single_flush_covers_all_but_newest_half_window() {
    let messages = transcript(12);
    let h = harness(test_config(10), seeded(&messages), ScriptedCompletion::new());

    h.extract().await.expect("extract");

    let calls = h.completion.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].max_output_tokens, SUMMARY_MAX_OUTPUT_TOKENS);
    assert!(calls[0].prompt.contains("user: message 0\nassistant: message 1"));
    assert!(calls[0].prompt.contains("user: message 6"));
    assert!(!calls[0].prompt.contains("message 7"));

    let summary = h.only_written();
    assert_eq!(summary.summary_point_uuid, messages[6].uuid);
    assert_eq!(summary.content, "summary 1");
    assert_eq!(summary.token_count, 10);
}

#[tokio::test]
async fn summary_point_follows_halving_rule() {
    for (window, len) in [(6usize, 9usize), (7, 7), (4, 11), (1, 3)] {
        let messages = transcript(len);
        let h = harness(test_config(window), seeded(&messages), ScriptedCompletion::new());

        h.extract().await.expect("extract");

        let expected = len - window / 2 - 1;
        assert_eq!(
            h.only_written().summary_point_uuid,
            messages[expected].uuid,
            "window={window} len={len}"
        );
    }
}

#[tokio::test]
async fn budget_splits_into_two_flushes_seeded_by_the_first() {
    // Each line is three words, so a budget of 12 fits four lines.
    let messages = transcript(12);
    let config = MnemosConfig::builder()
        .message_window(10)
        .prompt_tokens(prompt_tokens_for_budget(12))
        .prompt_template("{{ prev_summary }}\n---\n{{ messages_joined }}")
        .build();
    let h = harness(config, seeded(&messages), ScriptedCompletion::new());

    h.extract().await.expect("extract");

    let calls = h.completion.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0].prompt,
        "\n---\nuser: message 0\nassistant: message 1\nuser: message 2\nassistant: message 3"
    );
    assert_eq!(
        calls[1].prompt,
        "summary 1\n---\nuser: message 4\nassistant: message 5\nuser: message 6"
    );

    let summary = h.only_written();
    assert_eq!(summary.content, "summary 2");
    assert_eq!(summary.token_count, 20);
    assert_eq!(summary.summary_point_uuid, messages[6].uuid);
}

#[tokio::test]
async fn batches_respect_the_budget_unless_a_single_message_overflows() {
    let budget = 10;
    let word_counts = [1usize, 5, 2, 8, 1, 12, 3, 3, 3, 4];
    let messages: Vec<Message> = word_counts
        .iter()
        .map(|words| Message::new("user", vec!["w"; *words].join(" ")))
        .collect();
    let config = MnemosConfig::builder()
        .message_window(2)
        .prompt_tokens(prompt_tokens_for_budget(budget))
        .prompt_template("{{ messages_joined }}")
        .build();
    let h = harness(config, seeded(&messages), ScriptedCompletion::new());

    h.extract().await.expect("extract");

    let mut seen = Vec::new();
    for call in h.completion.calls() {
        let lines: Vec<&str> = call.prompt.split('\n').collect();
        let tokens: usize = lines
            .iter()
            .map(|line| WordTokenizer.count(line).expect("count"))
            .sum();
        assert!(
            tokens <= budget || lines.len() == 1,
            "batch of {} lines has {tokens} tokens",
            lines.len()
        );
        seen.extend(lines.into_iter().map(str::to_string));
    }
    let expected: Vec<String> = messages[..messages.len() - 1]
        .iter()
        .map(|message| format!("user: {}", message.content))
        .collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn oversized_message_is_sent_alone() {
    let messages = vec![
        Message::new("user", vec!["big"; 20].join(" ")),
        Message::new("assistant", "ok"),
        Message::new("user", "latest"),
    ];
    let config = MnemosConfig::builder()
        .message_window(2)
        .prompt_tokens(prompt_tokens_for_budget(4))
        .prompt_template("{{ messages_joined }}")
        .build();
    let h = harness(config, seeded(&messages), ScriptedCompletion::new());

    h.extract().await.expect("extract");

    let calls = h.completion.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].prompt, format!("user: {}", messages[0].content));
    assert_eq!(calls[1].prompt, "assistant: ok");
    assert_eq!(h.only_written().summary_point_uuid, messages[1].uuid);
}

#[tokio::test]
async fn existing_summary_seeds_the_first_flush() {
    let messages = transcript(14);
    let store = seeded(&messages);
    store.seed_summary(SESSION, Summary::new("earlier summary", 5, messages[1].uuid));
    let config = MnemosConfig::builder()
        .message_window(10)
        .prompt_template("{{ prev_summary }}\n---\n{{ messages_joined }}")
        .build();
    let h = harness(config, store, ScriptedCompletion::new());

    h.extract().await.expect("extract");

    let calls = h.completion.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].prompt.starts_with("earlier summary\n---\nuser: message 2\n"));
    assert!(!calls[0].prompt.contains("message 1\n"));
    // 12 uncovered messages, newest 5 stay uncovered.
    assert_eq!(h.only_written().summary_point_uuid, messages[8].uuid);
}

#[tokio::test]
async fn covered_messages_are_not_summarized_again() {
    let messages = transcript(12);
    let h = harness(test_config(10), seeded(&messages), ScriptedCompletion::new());

    h.extract().await.expect("first");
    h.extract().await.expect("second");

    assert_eq!(h.completion.call_count(), 1);
    assert_eq!(h.store.written().len(), 1);
}

#[tokio::test]
async fn identical_input_yields_identical_coverage() {
    let messages = transcript(15);
    let first = harness(test_config(8), seeded(&messages), ScriptedCompletion::new());
    let second = harness(
        test_config(8),
        seeded(&messages),
        ScriptedCompletion::with_responses(["different wording"]),
    );

    first.extract().await.expect("first");
    second.extract().await.expect("second");

    assert_eq!(
        first.only_written().summary_point_uuid,
        second.only_written().summary_point_uuid
    );
}

#[tokio::test]
async fn unknown_model_fails_before_any_completion() {
    let messages = transcript(12);
    let config = MnemosConfig::builder()
        .message_window(10)
        .model("no-such-model")
        .build();
    let h = harness(config, seeded(&messages), ScriptedCompletion::new());

    let err = h.extract().await.unwrap_err();

    assert!(err.to_string().contains("capacity table"));
    assert_eq!(h.completion.call_count(), 0);
    assert!(h.store.written().is_empty());
}

#[tokio::test]
async fn prompt_tokens_larger_than_capacity_is_an_error() {
    let messages = transcript(12);
    let config = MnemosConfig::builder()
        .message_window(10)
        .prompt_tokens(4000)
        .build();
    let h = harness(config, seeded(&messages), ScriptedCompletion::new());

    let err = h.extract().await.unwrap_err();

    assert!(err.to_string().contains("no input budget"));
    assert_eq!(h.completion.call_count(), 0);
}

#[tokio::test]
async fn missing_messages_collection_is_an_error() {
    let store = StubStore::with_missing_messages();
    store.seed(SESSION, transcript(12));
    let h = harness(test_config(10), store, ScriptedCompletion::new());

    let err = h.extract().await.unwrap_err();

    assert!(err.to_string().contains("no messages"));
    assert_eq!(h.completion.call_count(), 0);
}

#[tokio::test]
async fn store_errors_are_wrapped() {
    let h = harness(test_config(10), StubStore::new(), ScriptedCompletion::new());

    let err = h.extract().await.unwrap_err();

    assert!(err.message().contains("failed to read memory"));
    assert!(err.to_string().contains("session not found"));
}

#[tokio::test]
async fn empty_completion_is_rejected() {
    let messages = transcript(12);
    let h = harness(
        test_config(10),
        seeded(&messages),
        ScriptedCompletion::with_responses(["   "]),
    );

    let err = h.extract().await.unwrap_err();

    assert!(err.to_string().contains("empty summary"));
    assert!(h.store.written().is_empty());
}

#[tokio::test]
async fn completion_errors_abort_without_writing() {
    let messages = transcript(12);
    let completion = ScriptedCompletion::new();
    completion.push(Err(LlmError::RateLimited("slow down".to_string())));
    let h = harness(test_config(10), seeded(&messages), completion);

    let err = h.extract().await.unwrap_err();

    assert!(err.to_string().contains("rate limited"));
    assert!(h.store.written().is_empty());
}

#[tokio::test]
async fn summarize_rejects_an_empty_batch() {
    let h = harness(test_config(4), StubStore::new(), ScriptedCompletion::new());

    let err = h
        .extractor
        .summarize(&ExtractContext::new(), &h.state, &[], "")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "no messages to summarize");
    assert_eq!(h.completion.call_count(), 0);
}

#[tokio::test]
async fn cancelled_context_does_nothing() {
    let messages = transcript(12);
    let h = harness(test_config(10), seeded(&messages), ScriptedCompletion::new());
    let ctx = ExtractContext::new();
    ctx.cancel();

    let err = h.extract_with(&ctx).await.unwrap_err();

    assert!(err.to_string().contains("cancelled"));
    assert_eq!(h.store.get_calls(), 0);
    assert_eq!(h.completion.call_count(), 0);
}

#[tokio::test]
async fn cancellation_during_completion_writes_nothing() {
    let messages = transcript(12);
    let completion = ScriptedCompletion::new().with_delay(Duration::from_millis(500));
    let h = harness(test_config(10), seeded(&messages), completion);
    let ctx = ExtractContext::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = h.extract_with(&ctx).await.unwrap_err();

    assert!(err.to_string().contains("cancelled while calling completion service"));
    assert!(h.store.written().is_empty());
}

#[tokio::test]
async fn deadline_during_completion_writes_nothing() {
    let messages = transcript(12);
    let completion = ScriptedCompletion::new().with_delay(Duration::from_millis(500));
    let h = harness(test_config(10), seeded(&messages), completion);
    let ctx = ExtractContext::new().with_timeout(Duration::from_millis(20));

    let err = h.extract_with(&ctx).await.unwrap_err();

    assert!(err.to_string().contains("deadline exceeded"));
    assert!(h.store.written().is_empty());
}

#[test]
fn invalid_prompt_template_fails_construction() {
    let config = MnemosConfig::builder()
        .prompt_template("{{ prev_summary }} only")
        .build();
    assert!(SummaryExtractor::from_config(&config.extractors.summarizer).is_err());
    assert!(PromptBuilder::new().is_ok());
}
