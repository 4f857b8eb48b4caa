//! ERC-4337 v0.6 UserOperation inspector binary.

mod cli;
mod commands;
mod logging;

use clap::Parser;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = cli::Cli::parse();
    cli.logging.init_tracing_subscriber()?;
    cli.inspector.validate()?;

    match cli.command {
        cli::Commands::Parse { input } => commands::parse(input).await,
        cli::Commands::Encode { input, handle_ops } => commands::encode(input, handle_ops).await,
        cli::Commands::Link { input } => commands::link(&cli.inspector, input).await,
        cli::Commands::Trace { input, handle_ops, raw, json } => {
            commands::trace(&cli.inspector, input, handle_ops, raw, json).await
        }
    }
}
