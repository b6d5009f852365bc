//! The conversation engine: per-turn metrics, history budgeting, ending
//! policy and the orchestrator that ties them to a generation service.

pub mod ending;
pub mod fallback;
pub mod metrics;
pub mod orchestrator;
pub mod practice;

pub use ending::{EndingPolicy, EndingState, RandomSource, ScriptedRandom, StdRandom, ThreadRandom};
pub use metrics::{TurnMetricsTracker, PAUSE_THRESHOLD_MS};
pub use orchestrator::{ConversationStats, DialogueOrchestrator};
pub use practice::PracticeSession;
