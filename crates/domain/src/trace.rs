use serde::Serialize;

/// Structured trace events emitted across all Parley crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ContextBudgeted {
        total_tokens: usize,
        budget_tokens: usize,
        older_messages: usize,
        kept_messages: usize,
        summary_fallback: bool,
    },
    LlmRequest {
        provider: String,
        model: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    GenerationFallback {
        scenario: String,
        user_turns: usize,
        reason: String,
    },
    EndingTransition {
        from: String,
        to: String,
        user_turns: usize,
        min_turns: usize,
        max_turns: usize,
    },
    TurnRecorded {
        turn_number: u32,
        response_time_ms: Option<u64>,
        speaking_duration_ms: u64,
        pause_count: u32,
    },
    SessionTransition {
        session_id: Option<String>,
        from: String,
        to: String,
    },
    SessionSyncFailed {
        session_id: Option<String>,
        operation: String,
        error: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "pa_event");
    }
}
