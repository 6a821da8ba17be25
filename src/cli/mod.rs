//! CLI interface for risk-alloc
//!
//! Provides subcommands for:
//! - `size`: Position size for a trade setup
//! - `allocate`: Run one allocation cycle over strategy statistics
//! - `status`: Risk status of a portfolio snapshot
//! - `config`: Show effective configuration

mod allocate;
mod size;
mod status;

pub use allocate::AllocateArgs;
pub use size::SizeArgs;
pub use status::StatusArgs;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "risk-alloc")]
#[command(about = "Risk-adjusted position sizing and capital allocation across trading strategies")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Position size for a trade setup
    Size(SizeArgs),
    /// Run one allocation cycle over strategy statistics
    Allocate(AllocateArgs),
    /// Risk status of a portfolio snapshot
    Status(StatusArgs),
    /// Show effective configuration
    Config,
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
