use clap::Parser;
use tracing_subscriber::EnvFilter;

use pa_cli::cli::{Cli, Command, ConfigCommand};
use pa_domain::config::ObservabilityConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to practice when no subcommand is given.
        None => {
            let (config, _) = pa_cli::cli::load_config()?;
            init_tracing(&config.observability);
            pa_cli::cli::practice::practice(config, None).await
        }
        Some(Command::Practice { scenario }) => {
            let (config, _) = pa_cli::cli::load_config()?;
            init_tracing(&config.observability);
            pa_cli::cli::practice::practice(config, scenario).await
        }
        Some(Command::Scenarios) => {
            let (config, _) = pa_cli::cli::load_config()?;
            for s in pa_cli::scenarios::catalogue(&config) {
                let minutes = s
                    .estimated_minutes
                    .map(|m| format!("~{m} min"))
                    .unwrap_or_else(|| "open".into());
                println!("{:<16} {:<20} {:>8}  {}", s.id, s.name, minutes, s.description);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = pa_cli::cli::load_config()?;
            if !pa_cli::cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _) = pa_cli::cli::load_config()?;
            pa_cli::cli::config::show(&config)
        }
        Some(Command::Version) => {
            println!("parley {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Logs go to stderr so the REPL's stdout stays clean. `RUST_LOG` overrides
/// the configured filter.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&obs.default_filter));

    if obs.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}
