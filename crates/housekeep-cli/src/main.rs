//! docker-housekeep - Delete Docker images that have not been used recently.

use clap::Parser;
use housekeep_cli::commands;
use housekeep_cli::{init_logging, Cli, Command};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> housekeep_cli::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.command.common().verbose, cli.log_timestamps)?;

    let engine = commands::engine_client(cli.socket.as_deref());

    match cli.command {
        Command::Watch(args) => commands::execute_watch(args, engine).await?,
        Command::Sweep(args) => commands::execute_sweep(args, &engine).await?,
    }

    Ok(())
}
