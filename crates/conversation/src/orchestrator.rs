//! Dialogue orchestrator.
//!
//! Single source of truth for one conversation: owns the transcript and
//! composes the metrics tracker, the history budgeter and the ending policy
//! around one generation call per user turn. Generation problems never
//! escape; the reply then comes from the scenario's canned list.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use pa_contextpack::ContextBudgeter;
use pa_domain::clock::Clock;
use pa_domain::config::{ContextConfig, LlmConfig};
use pa_domain::message::{count_user_messages, Message, Role};
use pa_domain::metrics::ConversationMetrics;
use pa_domain::scenario::Scenario;
use pa_domain::session::SessionMetrics;
use pa_domain::trace::TraceEvent;
use pa_providers::Generator;

use crate::ending::{EndingPolicy, EndingState, RandomSource};
use crate::fallback::canned_reply;
use crate::metrics::TurnMetricsTracker;

/// Read-only snapshot of a conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub estimated_tokens: usize,
    pub budget_tokens: usize,
    pub has_summary: bool,
    pub ending_state: EndingState,
    pub fallback_replies: u32,
    pub metrics: ConversationMetrics,
}

pub struct DialogueOrchestrator {
    clock: Arc<dyn Clock>,
    generator: Option<Arc<dyn Generator>>,
    summarizer: Option<Arc<dyn Generator>>,
    timeout: Duration,
    budgeter: ContextBudgeter,
    ending: EndingPolicy,
    metrics: TurnMetricsTracker,
    scenario: Option<Scenario>,
    transcript: Vec<Message>,
    /// Whether `transcript[0]` is the scenario's opening line.
    seeded: bool,
    fallback_replies: u32,
}

impl DialogueOrchestrator {
    pub fn new(
        context: &ContextConfig,
        llm: &LlmConfig,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            metrics: TurnMetricsTracker::new(clock.clone()),
            clock,
            generator: None,
            summarizer: None,
            timeout: Duration::from_millis(llm.timeout_ms),
            budgeter: ContextBudgeter::new(context),
            ending: EndingPolicy::new(rng),
            scenario: None,
            transcript: Vec::new(),
            seeded: false,
            fallback_replies: 0,
        }
    }

    /// Reply generator. `None` keeps the orchestrator on canned replies.
    pub fn with_generator(mut self, generator: Option<Arc<dyn Generator>>) -> Self {
        self.generator = generator;
        self
    }

    /// History summarizer. Without one, summaries are synthetic.
    pub fn with_summarizer(mut self, summarizer: Option<Arc<dyn Generator>>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn with_budgeter(mut self, budgeter: ContextBudgeter) -> Self {
        self.budgeter = budgeter;
        self
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Start a conversation on `scenario`, discarding any previous one.
    pub fn initialize(&mut self, scenario: &Scenario) {
        self.reset_components();
        self.ending.reset(scenario.estimated_minutes);

        if let Some(opening) = scenario.initial_message.as_deref() {
            self.transcript
                .push(Message::assistant(opening).at(self.clock.now()));
            self.seeded = true;
        }

        if self.generator.is_none() {
            tracing::warn!(
                scenario = %scenario.id,
                "no generation service configured; replies will use canned fallbacks"
            );
        }

        let targets = self.ending.targets();
        tracing::info!(
            scenario = %scenario.id,
            estimated_turns = targets.estimated_turns,
            min_turns = targets.min_turns,
            max_turns = targets.max_turns,
            "conversation initialized"
        );
        self.scenario = Some(scenario.clone());
    }

    pub fn clear(&mut self) {
        self.reset_components();
        self.ending.reset(None);
        self.scenario = None;
    }

    fn reset_components(&mut self) {
        self.transcript.clear();
        self.seeded = false;
        self.fallback_replies = 0;
        self.budgeter.reset();
        self.metrics.reset();
    }

    // ── Turns ───────────────────────────────────────────────────────

    /// Append the user's utterance. Generation is a separate call.
    pub fn add_user_message(&mut self, content: &str) {
        self.transcript
            .push(Message::user(content).at(self.clock.now()));
    }

    /// Produce and append the assistant reply to `user_input`. Never fails.
    pub async fn get_ai_response(&mut self, user_input: &str) -> String {
        let (scenario_name, base_prompt) = match &self.scenario {
            Some(s) => (s.name.clone(), s.system_prompt.clone()),
            None => (String::new(), String::new()),
        };

        let user_turns = count_user_messages(&self.transcript);
        self.ending.advance(user_turns);
        let system_prompt = self.ending.decorate_system_prompt(&base_prompt);

        let prior = prior_history(&self.transcript, self.seeded, user_input);
        let history = self
            .budgeter
            .build_history(prior, self.summarizer.as_deref(), &scenario_name)
            .await;

        let generated = match &self.generator {
            None => Err("not_configured".to_string()),
            Some(generator) => {
                match tokio::time::timeout(
                    self.timeout,
                    generator.generate(&system_prompt, &history, user_input),
                )
                .await
                {
                    Ok(Ok(text)) if !text.trim().is_empty() => Ok(text),
                    Ok(Ok(_)) => Err("empty_reply".to_string()),
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "generation failed, using canned reply");
                        Err(format!("error: {e}"))
                    }
                    Err(_) => {
                        tracing::warn!(
                            timeout_ms = self.timeout.as_millis() as u64,
                            "generation timed out, using canned reply"
                        );
                        Err("timeout".to_string())
                    }
                }
            }
        };

        let reply = match generated {
            Ok(text) => text,
            Err(reason) => {
                TraceEvent::GenerationFallback {
                    scenario: scenario_name.clone(),
                    user_turns,
                    reason,
                }
                .emit();
                self.fallback_replies += 1;
                canned_reply(&scenario_name, user_turns).to_string()
            }
        };

        self.transcript
            .push(Message::assistant(reply.clone()).at(self.clock.now()));
        reply
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn scenario(&self) -> Option<&Scenario> {
        self.scenario.as_ref()
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn metrics(&self) -> &TurnMetricsTracker {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut TurnMetricsTracker {
        &mut self.metrics
    }

    pub fn is_conversation_complete(&self) -> bool {
        self.ending.is_conversation_complete()
    }

    pub fn ending_state(&self) -> EndingState {
        self.ending.state()
    }

    pub fn stats(&self) -> ConversationStats {
        let user_messages = count_user_messages(&self.transcript);
        let assistant_messages = self
            .transcript
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .count();
        let budget = self.budgeter.stats(&self.transcript);
        ConversationStats {
            total_messages: self.transcript.len(),
            user_messages,
            assistant_messages,
            estimated_tokens: budget.total_tokens,
            budget_tokens: budget.budget_tokens,
            has_summary: budget.has_summary,
            ending_state: self.ending.state(),
            fallback_replies: self.fallback_replies,
            metrics: self.metrics.conversation_metrics(),
        }
    }

    /// Metadata to persist alongside the transcript.
    pub fn session_metrics(&self) -> SessionMetrics {
        SessionMetrics {
            turns: self.metrics.turns().to_vec(),
            fallback_replies: self.fallback_replies,
            summarized: self.budgeter.summary().is_some(),
        }
    }
}

/// History before the pending user turn, without the opening line.
fn prior_history<'a>(transcript: &'a [Message], seeded: bool, user_input: &str) -> &'a [Message] {
    let mut history = transcript;
    if seeded && !history.is_empty() {
        history = &history[1..];
    }
    if let Some((last, rest)) = history.split_last() {
        if last.role == Role::User && last.content == user_input {
            history = rest;
        }
    }
    history
}
