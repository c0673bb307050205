//! birdfeed CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; the flag wins over the config file
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| {
            AppConfig::load(cli.config.as_deref())
                .ok()
                .map(|c| c.general.log_level)
        })
        .unwrap_or_else(|| "info".to_string());
    init_logging(&log_level)?;

    // Execute command
    match cli.command {
        Commands::Signup(args) => commands::account::signup(args, cli.config).await,
        Commands::Signin(args) => commands::account::signin(args, cli.config).await,
        Commands::Whoami(args) => commands::account::whoami(args, cli.config).await,
        Commands::SetPassword(args) => commands::account::set_password(args, cli.config).await,
        Commands::DeleteUser(args) => commands::account::delete_user(args, cli.config).await,
        Commands::Tweet(args) => commands::social::tweet(args, cli.config).await,
        Commands::Tweets(args) => commands::social::tweets(args, cli.config).await,
        Commands::Follow(args) => commands::social::follow(args, cli.config).await,
        Commands::Feed(args) => commands::social::feed(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args, cli.config).await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
