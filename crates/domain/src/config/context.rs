use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Context budget
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Share of the context window held back for the system prompt and the
/// model's reply.
pub const CONTEXT_RESERVE_RATIO: f64 = 0.10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Estimated-token size of the model's context window.
    #[serde(default = "d_4000")]
    pub max_context_tokens: usize,
}

impl ContextConfig {
    /// Tokens available for conversation history once the reserve is taken.
    pub fn history_budget(&self) -> usize {
        let reserve = (self.max_context_tokens as f64 * CONTEXT_RESERVE_RATIO).ceil() as usize;
        self.max_context_tokens.saturating_sub(reserve)
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: 4_000,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_4000() -> usize {
    4_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_reserves_ten_percent() {
        assert_eq!(ContextConfig::default().history_budget(), 3_600);
        let small = ContextConfig {
            max_context_tokens: 105,
        };
        assert_eq!(small.history_budget(), 94);
    }
}
