//! Provider registry.
//!
//! Reads the [`LlmConfig`] at startup, resolves authentication and wires the
//! configured adapter into the generators and transcriber the engine uses.
//! A provider that fails to initialize is logged and skipped: the engine then
//! runs on canned replies instead of refusing to start.

use crate::anthropic::AnthropicProvider;
use crate::generate::{Generator, ProviderGenerator};
use crate::openai_compat::OpenAiCompatProvider;
use crate::traits::LlmProvider;
use crate::transcription::{Transcriber, WhisperTranscriber};
use pa_domain::config::{LlmConfig, ProviderConfig, ProviderKind};
use pa_domain::error::Result;
use std::sync::Arc;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ProviderRegistry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The external services available to a practice session.
///
/// Every slot is optional. `reply` being `None` is the "not configured"
/// state that routes all replies through the canned fallback.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    pub reply: Option<Arc<dyn Generator>>,
    pub summarizer: Option<Arc<dyn Generator>>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
}

impl ProviderRegistry {
    pub fn from_config(config: &LlmConfig) -> Self {
        let provider = config.provider.as_ref().and_then(|pc| match build_provider(pc) {
            Ok(provider) => {
                tracing::info!(provider_id = %pc.id, kind = ?pc.kind, "registered LLM provider");
                Some(provider)
            }
            Err(e) => {
                tracing::warn!(
                    provider_id = %pc.id,
                    kind = ?pc.kind,
                    error = %e,
                    "failed to initialize LLM provider, replies will use canned fallbacks"
                );
                None
            }
        });

        let reply = provider.clone().map(|p| {
            Arc::new(
                ProviderGenerator::new(p).with_sampling(config.temperature, config.max_tokens),
            ) as Arc<dyn Generator>
        });

        // Summaries are short; cap them well below a normal reply.
        let summarizer = provider.map(|p| {
            Arc::new(
                ProviderGenerator::new(p)
                    .with_model(config.summarizer_model.clone())
                    .with_sampling(0.3, 150),
            ) as Arc<dyn Generator>
        });

        let transcriber = config.transcription.as_ref().and_then(|tc| {
            match WhisperTranscriber::from_config(tc) {
                Ok(t) => Some(Arc::new(t) as Arc<dyn Transcriber>),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to initialize transcription, skipping");
                    None
                }
            }
        });

        Self {
            reply,
            summarizer,
            transcriber,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.reply.is_some()
    }
}

/// Instantiate the adapter matching `pc.kind`.
pub fn build_provider(pc: &ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    match pc.kind {
        ProviderKind::OpenaiCompat => {
            OpenAiCompatProvider::from_config(pc).map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
        }
        ProviderKind::Anthropic => {
            AnthropicProvider::from_config(pc).map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
        }
    }
}
