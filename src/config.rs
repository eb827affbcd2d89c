//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "shared-timers")]
#[command(about = "A live-synchronized shared timer page server")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Directory holding page documents; pages are kept in memory only when absent
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Days a page may stay unmodified before it is deleted
    #[arg(long, default_value = "7")]
    pub retention_days: u32,

    /// Seconds between two expiry sweeps
    #[arg(long, default_value = "3600")]
    pub sweep_interval_secs: u64,

    /// Seconds between two heartbeat snapshots on a subscription
    #[arg(long, default_value = "10")]
    pub heartbeat_secs: u64,

    /// Directory of `<locale>.json` files with translated default names
    #[arg(long)]
    pub locales_dir: Option<PathBuf>,

    /// Page creations allowed per client address per minute (0 disables the limit)
    #[arg(long, default_value = "10")]
    pub create_per_minute: u32,

    /// Page fetches allowed per client address per minute (0 disables the limit)
    #[arg(long, default_value = "120")]
    pub fetch_per_minute: u32,

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

    /// Runtime settings shared with the application state
    pub fn settings(&self) -> Settings {
        Settings {
            retention: chrono::Duration::days(i64::from(self.retention_days)),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
            heartbeat: Duration::from_secs(self.heartbeat_secs.max(1)),
        }
    }
}

/// Timing knobs of the synchronization engine
#[derive(Debug, Clone)]
pub struct Settings {
    /// Maximum idle time before a page expires
    pub retention: chrono::Duration,
    pub sweep_interval: Duration,
    pub heartbeat: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retention: chrono::Duration::days(7),
            sweep_interval: Duration::from_secs(3600),
            heartbeat: Duration::from_secs(10),
        }
    }
}
