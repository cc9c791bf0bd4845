mod archive;
mod cli;
mod coverage;
mod download;
mod normalize;
mod parquet;
mod report;
mod segment;
mod stats;
mod store;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Download(args) => match command::download(args).await {
            Ok(saved) => println!("Saved {} months to `{}`", saved, args.store.raw_dir.display()),
            Err(e) => eprintln!("Error: {:#}", e),
        },
        Commands::Validate(args) => {
            if let Err(e) = command::validate(args).await {
                eprintln!("Error: {:#}", e);
            }
        }
        Commands::Stats(args) => {
            if let Err(e) = command::stats(args).await {
                eprintln!("Error: {:#}", e);
            }
        }
    }

    Ok(())
}
