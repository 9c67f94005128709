//! Tagvault CLI binary.
//!
//! - `serve` runs the HTTP API
//! - `config` prints the merged configuration

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use cli::{Cli, Commands, handle_config, handle_serve};

    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tagvault::init_logging(cli.log_format.into(), default_level)?;

    match cli.command {
        Commands::Serve => handle_serve(cli.config.as_deref()).await?,
        Commands::Config => handle_config(cli.config.as_deref())?,
    }

    Ok(())
}
