//! CLI interface for bitso-capture
//!
//! Provides subcommands for:
//! - `capture`: run the bounded capture loops
//! - `status`: inspect what the data lake contains per book
//! - `config`: show the effective configuration

mod capture;
mod status;

pub use capture::CaptureArgs;
pub use status::StatusArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bitso-capture")]
#[command(about = "Order-book spread capture agent feeding the Bitso markets data lake")]
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
    /// Run the capture loops
    Capture(CaptureArgs),
    /// Inspect the data lake contents
    Status(StatusArgs),
    /// Show the effective configuration
    Config,
}
