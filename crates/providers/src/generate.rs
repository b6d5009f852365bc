//! The narrow text-generation seam used by the conversation engine.
//!
//! The engine never talks to an [`LlmProvider`] directly: it hands over a
//! system prompt, the prior history and the new user text, and receives
//! reply text. Tests swap in scripted generators.

use crate::traits::{ChatRequest, LlmProvider};
use pa_domain::error::Result;
use pa_domain::message::Message;
use pa_domain::trace::TraceEvent;
use std::sync::Arc;
use std::time::Instant;

/// Produces reply text for one conversational step.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[Message],
        user_message: &str,
    ) -> Result<String>;
}

/// [`Generator`] backed by a chat-completion provider.
pub struct ProviderGenerator {
    provider: Arc<dyn LlmProvider>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = Some(temperature);
        self.max_tokens = Some(max_tokens);
        self
    }

    /// System prompt first, then history in order, then the new user turn.
    fn build_request(
        &self,
        system_prompt: &str,
        history: &[Message],
        user_message: &str,
    ) -> ChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend(history.iter().cloned());
        messages.push(Message::user(user_message));

        ChatRequest {
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            model: self.model.clone(),
        }
    }
}

#[async_trait::async_trait]
impl Generator for ProviderGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[Message],
        user_message: &str,
    ) -> Result<String> {
        let req = self.build_request(system_prompt, history, user_message);
        let started = Instant::now();
        let resp = self.provider.chat(&req).await?;

        TraceEvent::LlmRequest {
            provider: self.provider.provider_id().to_string(),
            model: resp.model.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
            prompt_tokens: resp.usage.map(|u| u.prompt_tokens),
            completion_tokens: resp.usage.map(|u| u.completion_tokens),
        }
        .emit();

        Ok(resp.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ChatResponse;
    use pa_domain::message::Role;
    use parking_lot::Mutex;

    struct CapturingProvider {
        seen: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait::async_trait]
    impl LlmProvider for CapturingProvider {
        async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
            self.seen.lock().push(req.clone());
            Ok(ChatResponse {
                content: "  Here's your large coffee  \n".into(),
                usage: None,
                model: "mock".into(),
                finish_reason: Some("stop".into()),
            })
        }

        fn provider_id(&self) -> &str {
            "mock"
        }
    }

    #[tokio::test]
    async fn assembles_system_history_user() {
        let provider = Arc::new(CapturingProvider {
            seen: Mutex::new(Vec::new()),
        });
        let generator = ProviderGenerator::new(provider.clone())
            .with_model(Some("small".into()))
            .with_sampling(0.8, 300);

        let history = vec![
            Message::user("Hi there"),
            Message::assistant("What can I get you?"),
        ];
        let reply = generator
            .generate("You are a barista.", &history, "A large coffee")
            .await
            .unwrap();
        assert_eq!(reply, "Here's your large coffee");

        let seen = provider.seen.lock();
        let req = &seen[0];
        let roles: Vec<Role> = req.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(req.messages[3].content, "A large coffee");
        assert_eq!(req.model.as_deref(), Some("small"));
        assert_eq!(req.max_tokens, Some(300));
    }
}
