use serde::{Deserialize, Serialize};

/// Snapshot of the budget position of a message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetStats {
    pub message_count: usize,
    pub total_tokens: usize,
    pub budget_tokens: usize,
    pub over_budget: bool,
    /// Whether a summary of older turns is currently held.
    pub has_summary: bool,
}
