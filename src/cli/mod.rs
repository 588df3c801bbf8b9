// Command-line surface for the chain view
//
// Every command is a plain args struct parsed by clap. Dispatch goes through
// `Runnable`, which separates commands that run immediately from those that
// suspend on storage I/O.

pub mod commands;

use clap::{Parser, Subcommand};

pub use commands::*;

#[derive(Parser, Debug, PartialEq, Eq)]
#[command(author, version, about = "Light-client chain view", long_about = None)]
#[command(name = "chain-view")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Show the trusted peak
    Status(StatusCommand),
    /// Verify a weight proof and adopt it if heavier than the peak
    ImportProof(ImportProofCommand),
    /// Extend the peak with headers that attach to it
    ImportHeaders(ImportHeadersCommand),
    /// Check a header range against the peak without changing state
    ValidateHeaders(ValidateHeadersCommand),
    /// Verify a weight proof offline and print what it claims
    InspectProof(InspectProofCommand),
    /// Delete the stored peak and checkpoints
    Reset(ResetCommand),
}

/// A command that completes without suspending
pub trait SyncCommand {
    fn run(&self) -> anyhow::Result<()>;
}

/// A command that awaits storage I/O
#[async_trait::async_trait]
pub trait AsyncCommand: Send + Sync {
    async fn run(&self) -> anyhow::Result<()>;
}

pub enum Runnable {
    Immediate(Box<dyn SyncCommand>),
    Suspending(Box<dyn AsyncCommand>),
}

impl Runnable {
    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Runnable::Immediate(command) => command.run(),
            Runnable::Suspending(command) => command.run().await,
        }
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self, Runnable::Immediate(_))
    }
}

impl Commands {
    pub fn into_runnable(self) -> Runnable {
        match self {
            Commands::Status(command) => Runnable::Suspending(Box::new(command)),
            Commands::ImportProof(command) => Runnable::Suspending(Box::new(command)),
            Commands::ImportHeaders(command) => Runnable::Suspending(Box::new(command)),
            Commands::ValidateHeaders(command) => Runnable::Suspending(Box::new(command)),
            Commands::InspectProof(command) => Runnable::Immediate(Box::new(command)),
            Commands::Reset(command) => Runnable::Suspending(Box::new(command)),
        }
    }
}
