use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Logging
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Log output configuration.  `RUST_LOG` still overrides `default_filter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Emit newline-delimited JSON instead of compact human-readable lines.
    #[serde(default)]
    pub json_logs: bool,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "d_filter")]
    pub default_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            default_filter: d_filter(),
        }
    }
}

fn d_filter() -> String {
    "warn".into()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: ObservabilityConfig = toml::from_str("").unwrap();
        assert!(!cfg.json_logs);
        assert_eq!(cfg.default_filter, "warn");
    }

    #[test]
    fn deserialize_json_logs() {
        let cfg: ObservabilityConfig = toml::from_str(
            r#"
            json_logs = true
            default_filter = "info,pa_conversation=debug"
        "#,
        )
        .unwrap();
        assert!(cfg.json_logs);
        assert_eq!(cfg.default_filter, "info,pa_conversation=debug");
    }
}
