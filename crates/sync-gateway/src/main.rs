//! ledger-sync: scheduled and on-demand accounting replication.

use anyhow::Context;
use clap::Parser;
use ledger_sync_engine::{Orchestrator, RunStatus};
use std::net::SocketAddr;
use sync_config_and_utils::{init_logging, Config};
use sync_gateway::cli::{Cli, Commands};
use sync_gateway::{catalog, AppState, InvocationGate, InvocationParams};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    init_logging(&config);

    match cli.command_or_serve()? {
        Commands::Serve(args) => serve(config, &args.host, args.port).await,
        Commands::Run { entity, mode } => run_once(config, entity, mode).await,
        Commands::Entities => {
            println!("{}", serde_json::to_string_pretty(&catalog())?);
            Ok(())
        }
    }
}

async fn serve(config: Config, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))?;
    sync_gateway::serve(addr, AppState::new(config)).await
}

/// The CLI is already trusted, so only scope resolution applies.
async fn run_once(
    config: Config,
    entity: Option<String>,
    mode: Option<String>,
) -> anyhow::Result<()> {
    let gate = InvocationGate::from_config(&config);
    let scope = gate.resolve(&InvocationParams {
        entity,
        mode,
        key: None,
    })?;
    let orchestrator = Orchestrator::from_config(&config)?;

    let result = orchestrator.run(&scope).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.status == RunStatus::Error {
        std::process::exit(1);
    }
    Ok(())
}
