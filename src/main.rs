// Light-client chain view CLI
// Entry point for inspecting and updating a locally trusted peak

use clap::Parser;
use light_chain_view::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    cli.command.into_runnable().execute().await
}
