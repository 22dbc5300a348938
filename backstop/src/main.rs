#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod commands;

use args::{Args, Command};
use backstop_config::Config;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize telemetry
    let telemetry_guard = backstop_telemetry::init(config.telemetry.as_ref(), &args.log_filter)?;

    tracing::debug!(
        config_path = %args.config.display(),
        command = ?args.command,
        "running backstop"
    );

    let output = match &args.command {
        Command::Check => commands::check(&config)?,
        Command::Catalog => commands::catalog(&config)?,
        Command::Render { names } => commands::render(&config, names)?,
    };
    println!("{output}");

    telemetry_guard.force_flush()?;
    Ok(())
}
