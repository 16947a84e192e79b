//! Command-line interface

pub mod serve;

use clap::{Parser, Subcommand};

/// Teamspace API server
#[derive(Debug, Parser)]
#[command(name = "teamspace", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,
}
