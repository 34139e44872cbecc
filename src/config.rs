//! Configuration and CLI argument handling

use std::{net::SocketAddr, path::PathBuf};

use clap::{Parser, ValueEnum};

use crate::{clock::Millis, state::ExpiryPolicy};

/// Whether this process is the source of truth for query replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Answers queries from companions
    Authority,
    /// Asks for state at startup and never answers queries
    Mirror,
}

impl Role {
    pub fn answers_queries(&self) -> bool {
        matches!(self, Role::Authority)
    }
}

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "tickwatch")]
#[command(about = "A persistent stopwatch/timer service that stays in sync with a companion process")]
#[command(version)]
pub struct Config {
    /// Port to bind the control API to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the persisted clock snapshots
    #[arg(long, default_value = ".tickwatch")]
    pub data_dir: PathBuf,

    /// Name of this process on the sync bus
    #[arg(long, default_value = "handheld")]
    pub node: String,

    /// Sync role of this process
    #[arg(long, value_enum, default_value = "authority")]
    pub role: Role,

    /// Local UDP address for sync signals (sync is off when unset)
    #[arg(long)]
    pub sync_bind: Option<SocketAddr>,

    /// Peer UDP address to send sync signals to (repeatable)
    #[arg(long = "peer")]
    pub peers: Vec<SocketAddr>,

    /// Initial countdown duration in minutes
    #[arg(short, long, default_value = "5")]
    pub timer: u64,

    /// What a running countdown does when it reaches zero
    #[arg(long, value_enum, default_value = "hold")]
    pub expiry: ExpiryPolicy,

    /// Render centiseconds
    #[arg(long)]
    pub subseconds: bool,

    /// Draw both clocks on the terminal while they run
    #[arg(long)]
    pub display: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn timer_duration_ms(&self) -> Millis {
        (self.timer as Millis).saturating_mul(60_000)
    }
}
