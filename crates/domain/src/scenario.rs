use serde::{Deserialize, Serialize};

/// A role-play scenario the user practices against.
///
/// Scenarios are owned by whatever catalogue the caller uses; the
/// conversation engine only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub system_prompt: String,
    /// Opening line spoken by the assistant before the user says anything.
    #[serde(default)]
    pub initial_message: Option<String>,
    /// Rough length of a full run-through, used to derive turn targets.
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
}

impl Scenario {
    /// Lookup key for scenario-specific fallback replies: lowercase, runs of
    /// non-alphanumerics collapsed to a single `-`.
    ///
    /// `"Coffee Shop"` → `"coffee-shop"`, `"Hotel Check-In!"` → `"hotel-check-in"`.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}
