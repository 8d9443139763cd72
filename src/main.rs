//! `experiment-monitor`: serve the dashboard or prune experiments from the shell.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use experiment_monitor::config::load_config;
use experiment_monitor::experiment::DirectoryExperimentStore;
use experiment_monitor::monitor::{ClearOutcome, EnvironmentFilter, ExperimentSummary, Monitor};
use experiment_monitor::web::{self, WebState};

#[derive(Parser, Debug)]
#[command(name = "experiment-monitor", version, about = "Dashboard for ML training experiments")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding one sub-directory per experiment
    #[arg(long, global = true)]
    experiments_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard (default)
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print experiments, bookmarked first
    List {
        /// Only show experiments on this environment
        #[arg(long)]
        env: Option<String>,
    },
    /// Delete every experiment without a completed iteration
    ClearEmpty,
    /// Delete every experiment below the short threshold
    ClearShort,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = load_config(cli.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = cli.experiments_dir {
        config.experiments_dir = dir;
    }

    let store = DirectoryExperimentStore::new(&config.experiments_dir);
    let monitor = Monitor::from_config(store, &config);
    monitor
        .open()
        .await
        .with_context(|| format!("opening {}", config.experiments_dir.display()))?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            let state = WebState::new(monitor)?;
            web::serve(state.clone(), &config.bind_address()).await?;
            state.monitor().close().await?;
        }
        Command::List { env } => {
            let overview = monitor
                .list_experiments()
                .await?
                .filtered(&EnvironmentFilter::from_option(env));
            println!("Bookmarked");
            print_rows(&overview.bookmarked);
            println!("\nOther");
            print_rows(&overview.others);
            monitor.close().await?;
        }
        Command::ClearEmpty => {
            report("empty", monitor.clear_all_empty().await?);
            monitor.close().await?;
        }
        Command::ClearShort => {
            report("short", monitor.clear_all_short().await?);
            monitor.close().await?;
        }
    }
    Ok(())
}

fn print_rows(rows: &[ExperimentSummary]) {
    for row in rows {
        println!(
            "  {:<12} {:<28} {:<16} {:>8} {:>10}  {}",
            row.id,
            row.env,
            row.config_name,
            row.iterations_display,
            row.max_reward_display,
            row.date
        );
    }
}

fn report(label: &str, outcome: ClearOutcome) {
    println!("Deleted {} {label} experiments", outcome.deleted);
    if outcome.failed > 0 {
        println!("Could not delete {} {label} experiments, see log", outcome.failed);
    }
}
