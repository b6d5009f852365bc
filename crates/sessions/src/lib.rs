pub mod lifecycle;
pub mod recorder;
pub mod store;

pub use lifecycle::{ExpireReason, LifecycleManager};
pub use recorder::SessionRecorder;
pub use store::{JsonFileStore, SessionStore};
