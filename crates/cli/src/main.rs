//! Baton CLI — the main entry point.
//!
//! Commands:
//! - `chat`    — Interactive consultation or single-message mode
//! - `gateway` — Start the HTTP JSON API
//! - `agents`  — List the configured agent roster

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "baton",
    about = "Baton — multi-agent conversation runtime",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the agent roster from the terminal
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the agent roster with capabilities and handoff targets
    Agents,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { message } => commands::chat::run(message).await,
        Commands::Gateway { port } => commands::gateway::run(port).await,
        Commands::Agents => commands::agents::run(),
    }
}
