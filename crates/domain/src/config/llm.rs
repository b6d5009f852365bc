use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generation service settings.
///
/// Leaving `provider` unset is a supported mode: every reply then comes from
/// the scenario's canned fallback list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
    /// Optional cheaper model for history summaries. Falls back to the
    /// provider's default model.
    #[serde(default)]
    pub summarizer_model: Option<String>,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    #[serde(default = "d_300")]
    pub max_tokens: u32,
    /// Upper bound on a single generation call before the fallback path
    /// takes over.
    #[serde(default = "d_20000u")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub transcription: Option<TranscriptionConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: None,
            summarizer_model: None,
            temperature: d_temperature(),
            max_tokens: 300,
            timeout_ms: 20_000,
            transcription: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub kind: ProviderKind,
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenaiCompat,
    Anthropic,
}

/// Speech-to-text endpoint (OpenAI-compatible `/audio/transcriptions`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub base_url: String,
    #[serde(default = "d_whisper")]
    pub model: String,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Header name (e.g. "Authorization", "x-api-key").
    #[serde(default)]
    pub header: Option<String>,
    /// Header value prefix (e.g. "Bearer ").
    #[serde(default)]
    pub prefix: Option<String>,
    /// Env var containing the key.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env or keychain).
    #[serde(default)]
    pub key: Option<String>,
    /// Keychain service name (e.g., "parley").
    #[serde(default)]
    pub service: Option<String>,
    /// Keychain account name (e.g., "openai-api-key").
    #[serde(default)]
    pub account: Option<String>,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_temperature() -> f32 {
    0.8
}
fn d_300() -> u32 {
    300
}
fn d_20000u() -> u64 {
    20_000
}
fn d_whisper() -> String {
    "whisper-1".into()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
