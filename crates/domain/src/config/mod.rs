mod context;
mod llm;
mod observability;
mod sessions;
mod speech;

pub use context::*;
pub use llm::*;
pub use observability::*;
pub use sessions::*;
pub use speech::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::scenario::Scenario;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Scenario catalogue.  Empty means "use the built-in set".
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        // Without a provider every reply is canned; legal, but worth a warning.
        match &self.llm.provider {
            None => errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "llm.provider".into(),
                message: "no LLM provider configured; replies will use canned fallbacks".into(),
            }),
            Some(provider) => {
                if provider.id.is_empty() {
                    errors.push(ConfigError {
                        severity: ConfigSeverity::Error,
                        field: "llm.provider.id".into(),
                        message: "provider id must not be empty".into(),
                    });
                }
                if provider.base_url.is_empty() {
                    errors.push(ConfigError {
                        severity: ConfigSeverity::Error,
                        field: "llm.provider.base_url".into(),
                        message: "provider base_url must not be empty".into(),
                    });
                }
            }
        }

        if self.llm.timeout_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "llm.timeout_ms".into(),
                message: "timeout must be greater than 0".into(),
            });
        }

        if self.context.history_budget() == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "context.max_context_tokens".into(),
                message: "context window leaves no room for history".into(),
            });
        }

        if let Some(cmd) = &self.speech.command {
            if cmd.is_empty() || cmd[0].trim().is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: "speech.command".into(),
                    message: "speech command must name a program".into(),
                });
            }
        }

        if self.store.timeout_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "store.timeout_ms".into(),
                message: "timeout must be greater than 0".into(),
            });
        }

        let mut seen = HashSet::new();
        for (i, scenario) in self.scenarios.iter().enumerate() {
            if scenario.id.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("scenarios[{i}].id"),
                    message: "scenario id must not be empty".into(),
                });
            } else if !seen.insert(scenario.id.as_str()) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("scenarios[{i}].id"),
                    message: format!("duplicate scenario id \"{}\"", scenario.id),
                });
            }
            if scenario.estimated_minutes.unwrap_or(0) == 0 {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: format!("scenarios[{i}].estimated_minutes"),
                    message: "unset; the conversation may wind down after a few turns".into(),
                });
            }
        }

        errors
    }
}
