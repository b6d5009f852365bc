use pa_domain::config::{Config, ConfigSeverity, ProviderKind};

#[test]
fn default_config_runs_in_canned_mode() {
    let config = Config::default();
    assert!(config.llm.provider.is_none());
    let issues = config.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, ConfigSeverity::Warning);
    assert_eq!(issues[0].field, "llm.provider");
}

#[test]
fn default_budget_is_ninety_percent_of_window() {
    let config = Config::default();
    assert_eq!(config.context.max_context_tokens, 4_000);
    assert_eq!(config.context.history_budget(), 3_600);
}

#[test]
fn provider_section_parses() {
    let toml_str = r#"
[llm]
timeout_ms = 8000

[llm.provider]
id = "anthropic"
kind = "anthropic"
base_url = "https://api.anthropic.com"
default_model = "claude-3-5-haiku-latest"

[llm.provider.auth]
env = "ANTHROPIC_API_KEY"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let provider = config.llm.provider.as_ref().unwrap();
    assert_eq!(provider.kind, ProviderKind::Anthropic);
    assert_eq!(config.llm.timeout_ms, 8000);
    assert!(config.validate().is_empty());
}

#[test]
fn scenarios_parse_and_duplicates_are_rejected() {
    let toml_str = r#"
[[scenarios]]
id = "coffee"
name = "Coffee Shop"
system_prompt = "You are a barista."
initial_message = "Good morning! What can I get you?"
estimated_minutes = 5

[[scenarios]]
id = "coffee"
name = "Coffee Shop Again"
system_prompt = "You are a barista."
estimated_minutes = 5
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.scenarios.len(), 2);
    assert_eq!(
        config.scenarios[0].initial_message.as_deref(),
        Some("Good morning! What can I get you?")
    );
    let errors: Vec<_> = config
        .validate()
        .into_iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "scenarios[1].id");
}

#[test]
fn sessions_and_store_defaults() {
    let config = Config::default();
    assert_eq!(config.sessions.idle_minutes, Some(30));
    assert_eq!(config.store.timeout_ms, 5_000);
    assert!(config.store.path.ends_with("sessions"));
}
