//! The wire-level seam: one chat completion, no streaming, no tools.
//!
//! Practice replies are short and spoken aloud only once complete, so the
//! adapters expose a single blocking-style `chat` call.

use pa_domain::error::Result;
use pa_domain::message::Message;
use serde::{Deserialize, Serialize};

/// One completion request. System messages lead `messages`.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// `None` leaves sampling to the provider.
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Overrides the provider's `default_model`.
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: Option<Usage>,
    /// Model that answered, as reported by the service.
    pub model: String,
    /// `"stop"`, `"end_turn"`, `"length"`... Logged, never interpreted.
    pub finish_reason: Option<String>,
}

/// Token accounting as reported by the service. Recorded on the
/// `llm_request` trace event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// An HTTP chat-completion adapter (OpenAI-compatible or Anthropic).
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    /// Config id of this provider, used in logs and errors.
    fn provider_id(&self) -> &str;
}
