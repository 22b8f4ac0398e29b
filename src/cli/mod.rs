//! CLI module for KasiRise Scholar
//!
//! Commands:
//! - `chat`: full-screen TUI session (default)
//! - `agents`: print the agent catalog
//! - `doctor`: configuration diagnostics

use clap::{Parser, Subcommand};
use kasirise_core::AgentId;

pub mod doctor;
pub mod tui;

/// KasiRise Scholar CLI
#[derive(Parser, Debug)]
#[command(name = "kasirise")]
#[command(about = "Terminal client for the KasiRise Scholar learning agents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a chat session (default)
    Chat {
        /// Agent to open directly, skipping the selection screen
        #[arg(long)]
        agent: Option<String>,
        /// Model override (defaults to GEMINI_MODEL or the built-in default)
        #[arg(long)]
        model: Option<String>,
    },
    /// List the agent catalog
    Agents,
    /// Run configuration diagnostics
    Doctor,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Chat { agent, model }) => {
            let agent = agent
                .as_deref()
                .map(str::parse::<AgentId>)
                .transpose()
                .map_err(|e| {
                    anyhow::anyhow!(
                        "{e} (expected one of: resource, mentor, assessment, advocacy)"
                    )
                })?;
            tui::run(agent, model).await
        }
        Some(Commands::Agents) => {
            for descriptor in kasirise_core::list_agents() {
                println!(
                    "{:<12} {:<22} {}",
                    descriptor.id, descriptor.name, descriptor.description
                );
            }
            Ok(())
        }
        Some(Commands::Doctor) => doctor::run(),
        None => tui::run(None, None).await,
    }
}
