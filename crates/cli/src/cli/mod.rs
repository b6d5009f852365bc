pub mod config;
pub mod practice;

use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};

use pa_domain::config::Config;

/// Parley: spoken-conversation practice against role-play scenarios.
#[derive(Debug, Parser)]
#[command(name = "parley", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Practice a scenario interactively (default when no subcommand is given).
    Practice {
        /// Scenario id (see `parley scenarios`). Defaults to the first one.
        #[arg(long, short)]
        scenario: Option<String>,
    },
    /// List the available scenarios.
    Scenarios,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from `PARLEY_CONFIG` (or `parley.toml`). A
/// missing file yields the defaults. Returns the config and the path used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("PARLEY_CONFIG").unwrap_or_else(|_| "parley.toml".into());
    let config = load_config_from(Path::new(&config_path))?;
    Ok((config, config_path))
}

pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
