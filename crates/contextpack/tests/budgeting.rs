use pa_contextpack::{ContextBudgeter, SUMMARY_INSTRUCTION};
use pa_domain::error::{Error, Result};
use pa_domain::message::{Message, Role};
use pa_providers::Generator;
use parking_lot::Mutex;

struct ScriptedSummarizer {
    reply: Result<String>,
    calls: Mutex<Vec<(String, usize, String)>>,
}

impl ScriptedSummarizer {
    fn ok(text: &str) -> Self {
        Self {
            reply: Ok(text.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            reply: Err(Error::Http("connection refused".into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait::async_trait]
impl Generator for ScriptedSummarizer {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[Message],
        user_message: &str,
    ) -> Result<String> {
        self.calls
            .lock()
            .push((system_prompt.into(), history.len(), user_message.into()));
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(Error::Other(e.to_string())),
        }
    }
}

/// Alternating user/assistant messages of 40 chars (10 tokens) each.
fn conversation(n: usize) -> Vec<Message> {
    (0..n)
        .map(|i| {
            let text = format!("{:<40}", format!("message {i}"));
            if i % 2 == 0 {
                Message::user(text)
            } else {
                Message::assistant(text)
            }
        })
        .collect()
}

#[tokio::test]
async fn under_budget_passes_through_without_summarizing() {
    let mut budgeter = ContextBudgeter::with_budget(1_000);
    let summarizer = ScriptedSummarizer::ok("unused");
    let history = conversation(6);

    let out = budgeter
        .build_history(&history, Some(&summarizer), "Coffee Shop")
        .await;

    assert_eq!(out, history);
    assert_eq!(summarizer.call_count(), 0);
    assert!(budgeter.summary().is_none());
}

#[tokio::test]
async fn over_budget_summarizes_once_and_keeps_last_four() {
    let mut budgeter = ContextBudgeter::with_budget(50);
    let summarizer = ScriptedSummarizer::ok("The customer ordered a large coffee.");
    let history = conversation(10);
    assert_eq!(budgeter.total_tokens(&history), 100);

    let out = budgeter
        .build_history(&history, Some(&summarizer), "Coffee Shop")
        .await;

    assert_eq!(summarizer.call_count(), 1);
    assert_eq!(out.len(), 5);
    assert_eq!(out[0].role, Role::Assistant);
    assert_eq!(out[0].content, "The customer ordered a large coffee.");
    assert_eq!(&out[1..], &history[6..]);
    assert_eq!(budgeter.summary(), Some("The customer ordered a large coffee."));

    let calls = summarizer.calls.lock();
    let (system, prior, text) = &calls[0];
    assert_eq!(system, SUMMARY_INSTRUCTION);
    assert_eq!(*prior, 0);
    assert!(text.starts_with("User: message 0"));
    assert_eq!(text.lines().count(), 6);
}

#[tokio::test]
async fn budget_boundary_is_inclusive() {
    let mut budgeter = ContextBudgeter::with_budget(60);
    let summarizer = ScriptedSummarizer::ok("summary");
    let history = conversation(6);

    let out = budgeter
        .build_history(&history, Some(&summarizer), "Coffee Shop")
        .await;

    assert_eq!(summarizer.call_count(), 1);
    assert_eq!(out.len(), 5);
}

#[tokio::test]
async fn failing_summarizer_yields_synthetic_summary() {
    let mut budgeter = ContextBudgeter::with_budget(50);
    let summarizer = ScriptedSummarizer::failing();
    let history = conversation(11);

    let out = budgeter
        .build_history(&history, Some(&summarizer), "Coffee Shop")
        .await;

    assert_eq!(summarizer.call_count(), 1);
    assert_eq!(
        out[0].content,
        "Previous conversation included 3 exchanges about Coffee Shop."
    );
    assert_eq!(&out[1..], &history[7..]);
}

#[tokio::test]
async fn missing_summarizer_yields_synthetic_summary() {
    let mut budgeter = ContextBudgeter::with_budget(10);
    let history = conversation(8);

    let out = budgeter.build_history(&history, None, "Job Interview").await;

    assert_eq!(
        out[0].content,
        "Previous conversation included 2 exchanges about Job Interview."
    );
    assert_eq!(out.len(), 5);
}

#[tokio::test]
async fn short_history_over_budget_is_returned_as_is() {
    let mut budgeter = ContextBudgeter::with_budget(5);
    let summarizer = ScriptedSummarizer::ok("unused");
    let history = conversation(3);

    let out = budgeter
        .build_history(&history, Some(&summarizer), "Coffee Shop")
        .await;

    assert_eq!(out, history);
    assert_eq!(summarizer.call_count(), 0);
}

#[tokio::test]
async fn new_summary_replaces_previous() {
    let mut budgeter = ContextBudgeter::with_budget(50);
    let first = ScriptedSummarizer::ok("first summary");
    let second = ScriptedSummarizer::ok("second summary");

    budgeter
        .build_history(&conversation(10), Some(&first), "Coffee Shop")
        .await;
    let out = budgeter
        .build_history(&conversation(12), Some(&second), "Coffee Shop")
        .await;

    assert_eq!(budgeter.summary(), Some("second summary"));
    let summaries = out.iter().filter(|m| m.content.contains("summary")).count();
    assert_eq!(summaries, 1);

    budgeter.reset();
    assert!(budgeter.summary().is_none());
}
