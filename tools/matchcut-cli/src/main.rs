//! Matchcut CLI — export tagged match clips from the command line.
//!
//! Usage:
//!   matchcut export <REQUEST>   Run an export request JSON
//!   matchcut inspect <REQUEST>  Print planned transcoder invocations
//!   matchcut check              Check transcoder and font availability

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "matchcut",
    about = "Sports match clip export with burned-in analysis overlays",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an export request
    Export {
        /// Path to the request JSON
        request: PathBuf,

        /// Destination directory, overriding the request and config
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Explicit ffmpeg binary
        #[arg(long)]
        ffmpeg: Option<PathBuf>,

        /// Explicit ffprobe binary
        #[arg(long)]
        ffprobe: Option<PathBuf>,
    },

    /// Print the planned transcoder invocations without running them
    Inspect {
        /// Path to the request JSON
        request: PathBuf,
    },

    /// Check transcoder and caption font availability
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    matchcut_common::logging::init_logging(&matchcut_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        show_targets: false,
    });

    match cli.command {
        Commands::Export {
            request,
            output_dir,
            ffmpeg,
            ffprobe,
        } => commands::export::run(request, output_dir, ffmpeg, ffprobe).await,
        Commands::Inspect { request } => commands::inspect::run(request).await,
        Commands::Check => commands::check::run(),
    }
}
