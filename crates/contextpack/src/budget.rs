//! History budgeting.
//!
//! Keeps the history sent to the model under a fixed token budget. Once the
//! full history reaches the budget, everything but the last few messages is
//! collapsed into one live summary that replaces any earlier one.

use crate::estimator::{CharHeuristic, TokenEstimator};
use crate::report::BudgetStats;
use pa_domain::config::ContextConfig;
use pa_domain::message::Message;
use pa_domain::trace::TraceEvent;
use pa_providers::Generator;

/// Messages always kept verbatim at the tail of the history.
pub const RECENT_WINDOW: usize = 4;

pub const SUMMARY_INSTRUCTION: &str =
    "Summarize this conversation in 2-3 sentences, focusing on key points and current topic";

pub struct ContextBudgeter {
    budget_tokens: usize,
    estimator: Box<dyn TokenEstimator>,
    summary: Option<String>,
}

impl ContextBudgeter {
    pub fn new(config: &ContextConfig) -> Self {
        Self::with_budget(config.history_budget())
    }

    pub fn with_budget(budget_tokens: usize) -> Self {
        Self {
            budget_tokens,
            estimator: Box::new(CharHeuristic),
            summary: None,
        }
    }

    pub fn with_estimator(mut self, estimator: Box<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn budget_tokens(&self) -> usize {
        self.budget_tokens
    }

    /// The live summary of older turns, if one has been produced.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn reset(&mut self) {
        self.summary = None;
    }

    pub fn total_tokens(&self, messages: &[Message]) -> usize {
        messages
            .iter()
            .map(|m| self.estimator.estimate_message(m))
            .sum()
    }

    pub fn stats(&self, messages: &[Message]) -> BudgetStats {
        let total_tokens = self.total_tokens(messages);
        BudgetStats {
            message_count: messages.len(),
            total_tokens,
            budget_tokens: self.budget_tokens,
            over_budget: total_tokens >= self.budget_tokens,
            has_summary: self.summary.is_some(),
        }
    }

    /// Produce the history to send for the next generation call.
    ///
    /// Under budget the input comes back unchanged and the summarizer is not
    /// called. Otherwise the result is `[summary] + last RECENT_WINDOW`.
    /// Never fails: a missing or failing summarizer yields a synthetic summary.
    pub async fn build_history(
        &mut self,
        messages: &[Message],
        summarizer: Option<&dyn Generator>,
        scenario_name: &str,
    ) -> Vec<Message> {
        let total_tokens = self.total_tokens(messages);
        if total_tokens < self.budget_tokens {
            return messages.to_vec();
        }

        let split = messages.len().saturating_sub(RECENT_WINDOW);
        let (older, recent) = messages.split_at(split);
        if older.is_empty() {
            return recent.to_vec();
        }

        let (summary, fallback) = match summarize(summarizer, older).await {
            Some(text) => (text, false),
            None => (synthetic_summary(older.len(), scenario_name), true),
        };

        TraceEvent::ContextBudgeted {
            total_tokens,
            budget_tokens: self.budget_tokens,
            older_messages: older.len(),
            kept_messages: recent.len(),
            summary_fallback: fallback,
        }
        .emit();

        let mut history = Vec::with_capacity(recent.len() + 1);
        history.push(Message::assistant(summary.clone()));
        history.extend_from_slice(recent);
        self.summary = Some(summary);
        history
    }
}

async fn summarize(summarizer: Option<&dyn Generator>, older: &[Message]) -> Option<String> {
    let summarizer = summarizer?;
    match summarizer
        .generate(SUMMARY_INSTRUCTION, &[], &conversation_text(older))
        .await
    {
        Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Ok(_) => {
            tracing::warn!("summarizer returned empty text, using synthetic summary");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "history summarization failed, using synthetic summary");
            None
        }
    }
}

/// One exchange is a user line plus a reply, hence `older / 2`.
pub fn synthetic_summary(older_len: usize, scenario_name: &str) -> String {
    format!(
        "Previous conversation included {} exchanges about {}.",
        older_len / 2,
        scenario_name
    )
}

fn conversation_text(messages: &[Message]) -> String {
    let mut buf = String::new();
    for m in messages {
        let label = match m.role.as_str() {
            "user" => "User",
            "assistant" => "Assistant",
            _ => "System",
        };
        buf.push_str(label);
        buf.push_str(": ");
        buf.push_str(&m.content);
        buf.push('\n');
    }
    buf
}
