//! Strands strategy runner - Entry Point
//!
//! Runs the hedged-call strategy against the simulated chain.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

/// Strands hedged-call strategy runner
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via STRANDS_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// List live boards and strikes with their GWAV greeks
    ExploreOptions,
    /// Show perps market parameters, fill price and fees
    ExploreFutures,
    /// Open a hedged call, advance time and rehedge (default)
    Scenario,
}

fn emit<T: Serialize + std::fmt::Debug>(report: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{report:#?}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    strands_telemetry::init_logging()?;

    info!("Starting Strands v{}", env!("CARGO_PKG_VERSION"));

    let config_path = strands_bot::AppConfig::resolve_path(args.config);
    info!(config_path = %config_path, "Loading configuration");
    let config = strands_bot::AppConfig::load(&config_path)?;
    info!(
        account = %config.strategy.account,
        supersession = ?config.strategy.supersession,
        strike_id = %config.scenario.strike_id,
        "Configuration loaded"
    );

    let app = strands_bot::Application::new(config)?;

    match args.command.unwrap_or(Command::Scenario) {
        Command::ExploreOptions => emit(&app.explore_options().await?, args.json)?,
        Command::ExploreFutures => emit(&app.explore_futures().await?, args.json)?,
        Command::Scenario => emit(&app.run_scenario().await?, args.json)?,
    }

    app.shutdown().await?;

    Ok(())
}
