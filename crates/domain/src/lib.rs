//! Shared types for Parley.
//!
//! Every other crate in the workspace speaks in terms of these: conversation
//! messages, scenarios, turn metrics, the persisted session record, the
//! config tree, the shared error type, and structured trace events.

pub mod clock;
pub mod config;
pub mod error;
pub mod message;
pub mod metrics;
pub mod scenario;
pub mod session;
pub mod trace;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use metrics::{ConversationMetrics, ImprovementTrend, TurnMetrics};
pub use scenario::Scenario;
pub use session::{Session, SessionMetrics, SessionStatus};
