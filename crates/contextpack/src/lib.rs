pub mod budget;
pub mod estimator;
pub mod report;

pub use budget::{ContextBudgeter, SUMMARY_INSTRUCTION};
pub use estimator::{CharHeuristic, TokenEstimator};
pub use report::BudgetStats;
