use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session lifecycle
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Session lifecycle rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Idle timeout in minutes.  An active or paused session untouched for
    /// longer than this is moved to `timeout`.  `None` disables expiry.
    #[serde(default = "d_idle")]
    pub idle_minutes: Option<u32>,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_minutes: d_idle(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Durable store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one `<id>.json` record per session.
    #[serde(default = "d_store_path")]
    pub path: PathBuf,
    /// Upper bound on a single store write.
    #[serde(default = "d_5000")]
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: d_store_path(),
            timeout_ms: 5_000,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_idle() -> Option<u32> {
    Some(30)
}
fn d_store_path() -> PathBuf {
    PathBuf::from("./data/sessions")
}
fn d_5000() -> u64 {
    5_000
}
