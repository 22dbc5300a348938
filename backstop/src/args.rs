use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Backstop error catalog tool
#[derive(Debug, Parser)]
#[command(name = "backstop", about = "Validate, list and render a Backstop error catalog")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "backstop.toml", env = "BACKSTOP_CONFIG")]
    pub config: PathBuf,

    /// Log filter directive
    #[arg(long, default_value = "warn", env = "BACKSTOP_LOG")]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the catalog and report what it contains
    Check,
    /// Print every catalog error as JSON
    Catalog,
    /// Print the response a request failing with these errors would get
    Render {
        /// Catalog error names
        #[arg(required = true)]
        names: Vec<String>,
    },
}
