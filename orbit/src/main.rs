//! Orbit
//!
//! Screen recorder with a floating circular camera overlay. This binary is
//! the orchestrator host: it runs the session controller and waits for the
//! shell that renders Orbit's windows to connect.
//!
//! # Usage
//!
//! ```bash
//! # Run the orchestrator
//! orbit -v
//!
//! # Use another config file and socket
//! orbit --config ./orbit.toml --socket /tmp/orbit-dev.sock
//!
//! # Print a sample configuration
//! orbit --print-config > ~/.config/orbit/config.toml
//! ```

mod app;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Orbit - screen recorder with a circular camera overlay
#[derive(Parser)]
#[command(name = "orbit")]
#[command(version)]
#[command(about = "Screen recorder with a floating circular camera overlay", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to ~/.config/orbit/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Shell socket path (defaults to $XDG_RUNTIME_DIR/orbit.sock)
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Print a sample configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", orbit_core::config::sample_config());
        return Ok(());
    }

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("orbit={}", level).parse()?)
                .add_directive(format!("orbit_core={}", level).parse()?),
        )
        .with_target(false)
        .init();

    app::run(app::Options {
        config: cli.config,
        socket: cli.socket,
    })
    .await
}
