//! # CTC Scraper
//!
//! Collects SudokuPad puzzles featured in Cracking the Cryptic videos into a
//! JSON list that the companion app downloads.
//!
//! ## Usage
//!
//! ```sh
//! ctc_scraper
//! ```
//!
//! The binary is meant to run from a periodic job (e.g. a CI cron trigger)
//! that publishes the resulting `puzzles.json`.
//!
//! ## Architecture
//!
//! The run is a single sequential pipeline:
//! 1. **Feed**: Download and parse the channel's Atom feed
//! 2. **Extraction**: Keep videos whose description links a SudokuPad puzzle,
//!    rewriting the links to deep links and optionally probing video length
//! 3. **Merge**: Load the published snapshot (or the local file), refresh
//!    known videos, add new ones and sort newest first
//! 4. **Output**: Atomically overwrite the snapshot file

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod http;
mod merge;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod snapshot;
mod utils;

use cli::Cli;
use http::HttpClient;
use utils::ensure_writable_parent;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ctc_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Fail before any network work if the snapshot cannot be written.
    if let Err(e) = ensure_writable_parent(&args.output_file).await {
        error!(
            path = %args.output_file.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let client = HttpClient::new(args.timeout())?;
    let config = args.pipeline_config();

    let summary = match pipeline::run(&client, &config).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(path = %config.output_path.display(), error = %e, "Failed to write puzzle snapshot");
            return Err(e);
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        entries = summary.entries_found,
        puzzles = summary.puzzles_found,
        skipped = summary.skipped,
        added = summary.added,
        total = summary.total,
        written = summary.written,
        ?elapsed,
        "Execution complete"
    );

    Ok(())
}
