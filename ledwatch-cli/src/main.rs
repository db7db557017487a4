//! ledwatch CLI - render host health checks on an LED strip

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ledwatch_core::config::{AgentConfig, SinkConfig};
use ledwatch_core::sink::clear_slots;
use ledwatch_supervisor::{open_sink, Supervisor};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ledwatch")]
#[command(about = "Show host health checks on an LED strip", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./ledwatch.toml when present)
    #[arg(short, long, global = true, env = "LEDWATCH_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all configured monitors until Ctrl-C or SIGTERM
    Run {
        /// Override the configured sink
        #[arg(long, value_enum)]
        sink: Option<SinkKind>,

        /// Print status lines without ANSI colors
        #[arg(long)]
        no_color: bool,
    },
    /// Validate the configuration and print it as JSON
    CheckConfig,
    /// Turn off every configured slot
    Clear,
    /// Version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum SinkKind {
    Memory,
    Log,
    Remote,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run {
        sink: None,
        no_color: false,
    });

    match command {
        Commands::Run { sink, no_color } => {
            let mut config = load(cli.config.as_deref())?;
            if let Some(kind) = sink {
                config.strip.sink = match kind {
                    SinkKind::Memory => SinkConfig::Memory,
                    SinkKind::Log => SinkConfig::Log,
                    SinkKind::Remote => match config.strip.sink {
                        remote @ SinkConfig::Remote { .. } => remote,
                        _ => SinkConfig::remote(),
                    },
                };
            }
            if no_color {
                config.console.ansi = false;
            }
            run(config).await?;
        }
        Commands::CheckConfig => {
            let config = load(cli.config.as_deref())?;
            config.validate().context("Invalid configuration")?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Clear => {
            let config = load(cli.config.as_deref())?;
            let sink = open_sink(&config.strip)
                .await
                .context("Failed to open indicator sink")?;
            let slots = config.slots();
            clear_slots(sink.as_ref(), slots.iter().copied()).await;
            info!("Cleared slots {:?}", slots);
        }
        Commands::Version => {
            println!("ledwatch {}", env!("CARGO_PKG_VERSION"));
            println!("ledwatch-core {}", ledwatch_core::VERSION);
        }
    }

    Ok(())
}

fn load(path: Option<&std::path::Path>) -> Result<AgentConfig> {
    AgentConfig::load_from(path).context("Failed to load configuration")
}

async fn run(config: AgentConfig) -> Result<()> {
    info!(
        "Starting ledwatch with {} monitors on a {}-slot strip",
        config.monitors.len(),
        config.strip.slots
    );

    let supervisor = Supervisor::new(config)
        .await
        .context("Failed to start supervisor")?;
    let report = supervisor.run_until_signal().await?;

    for monitor in &report.monitors {
        info!(
            "{} (slot {}): {}",
            monitor.name, monitor.slot, monitor.status
        );
    }
    for monitor in report.crashed() {
        warn!("Monitor {} crashed during the run", monitor.name);
    }

    info!(
        "Shut down after {}s",
        (report.stopped_at - report.started_at).num_seconds()
    );
    Ok(())
}
