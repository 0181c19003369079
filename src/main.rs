// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use depth_capture::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "depth-capture")]
#[command(about = "Capture depth, color, point clouds and sensor data from a depth camera")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Config file (default: <config dir>/depth-capture/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the device and print its sizes and capabilities as JSON
    Info,

    /// Capture every supported modality once and write it to disk
    Snapshot {
        /// Output directory (default: config output_dir or current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Device frames to let pass first so smoothing can settle
        #[arg(short, long, default_value = "30")]
        warmup: u64,
    },

    /// Poll all modalities and report freshness and smoothing residuals
    Stream {
        /// Duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Poll interval in milliseconds
        #[arg(short, long, default_value = "100")]
        interval: u64,
    },

    /// Print the effective configuration as JSON
    Config {
        /// Also write it to the config file location
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=depth_capture=trace, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref());

    match cli.command {
        Commands::Info => cli::show_info(&config)?,
        Commands::Snapshot { output, warmup } => cli::take_snapshot(&config, output, warmup)?,
        Commands::Stream { duration, interval } => cli::stream(&config, duration, interval)?,
        Commands::Config { save } => cli::show_config(&config, cli.config, save)?,
    }

    Ok(())
}
