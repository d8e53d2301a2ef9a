use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ledger-sync command-line interface.
#[derive(Debug, Parser)]
#[command(name = "ledger-sync", version)]
#[command(about = "Replicates accounting records into a REST-fronted store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// JSON configuration file; environment variables override it
    #[arg(long, global = true, env = "LEDGER_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default if no subcommand given)
    Serve(ServeArgs),

    /// Run one sync now and print the result as JSON
    Run {
        /// Sync a single entity
        #[arg(long)]
        entity: Option<String>,
        /// Sync a named group of entities
        #[arg(long)]
        mode: Option<String>,
    },

    /// List registered entities and modes
    Entities,
}

/// Bind address of the HTTP server.
#[derive(Debug, Clone, Parser)]
pub struct ServeArgs {
    #[arg(long, env = "LEDGER_SYNC_HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,
}

impl Cli {
    /// The requested subcommand; `serve` with its env-aware defaults when
    /// none was given.
    pub fn command_or_serve(self) -> Result<Commands, clap::Error> {
        match self.command {
            Some(command) => Ok(command),
            None => Ok(Commands::Serve(ServeArgs::try_parse_from(["ledger-sync"])?)),
        }
    }
}
