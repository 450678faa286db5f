//! The fetch, extract and merge pipeline run once per invocation.

use crate::http::Fetch;
use crate::merge::{MergeOutcome, merge_puzzles};
use crate::models::PuzzleRecord;
use crate::outputs::json;
use crate::scrapers::youtube::fetch_newest_puzzles;
use crate::snapshot::load_baseline;
use std::error::Error;
use std::path::PathBuf;
use tracing::{info, instrument};
use url::Url;

/// Where the pipeline reads from and writes to.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Channel Atom feed.
    pub feed_url: Url,
    /// Published snapshot to merge into; `None` goes straight to the local file.
    pub snapshot_url: Option<Url>,
    /// Snapshot file written by this run and read as the local fallback.
    pub output_path: PathBuf,
    /// Look up each video's length and drop videos without one.
    pub probe_video_length: bool,
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries in the feed.
    pub entries_found: usize,
    /// Entries that produced a puzzle record.
    pub puzzles_found: usize,
    /// Entries that were dropped.
    pub skipped: usize,
    /// Records new to the snapshot.
    pub added: usize,
    /// Records in the written snapshot.
    pub total: usize,
    /// Whether the snapshot file was written.
    pub written: bool,
}

/// Load the baseline, merge `fresh` into it and write the snapshot.
///
/// # Errors
///
/// Only a failure to write the output file is returned.
#[instrument(level = "info", skip_all, fields(fresh = fresh.len()))]
pub async fn merge_and_save<F: Fetch>(
    fetcher: &F,
    config: &PipelineConfig,
    fresh: Vec<PuzzleRecord>,
) -> Result<MergeOutcome, Box<dyn Error>> {
    let snapshot_url = config.snapshot_url.as_ref().map(Url::as_str);
    let existing = load_baseline(fetcher, snapshot_url, &config.output_path).await;

    let outcome = merge_puzzles(existing, fresh);
    json::write_snapshot(&outcome.records, &config.output_path).await?;

    info!(
        count = outcome.records.len(),
        path = %config.output_path.display(),
        "Saved puzzles"
    );
    info!(
        added = outcome.added,
        total = outcome.records.len(),
        "Successfully merged"
    );
    Ok(outcome)
}

/// Run the whole pipeline once.
///
/// When the feed yields no puzzles the snapshot is left untouched.
///
/// # Arguments
///
/// * `fetcher` - HTTP client for the feed, snapshot and video pages
/// * `config` - Feed, snapshot and output locations
///
/// # Returns
///
/// A [`RunSummary`] with the counts of this run.
///
/// # Errors
///
/// Only a failure to write the output file is returned; every network or
/// parse problem is logged and degraded.
#[instrument(level = "info", skip_all, fields(feed_url = %config.feed_url))]
pub async fn run<F: Fetch>(fetcher: &F, config: &PipelineConfig) -> Result<RunSummary, Box<dyn Error>> {
    let harvest =
        fetch_newest_puzzles(fetcher, config.feed_url.as_str(), config.probe_video_length).await;

    let mut summary = RunSummary {
        entries_found: harvest.entries_found,
        puzzles_found: harvest.puzzles.len(),
        skipped: harvest.skipped.len(),
        ..Default::default()
    };

    if harvest.puzzles.is_empty() {
        info!("No new puzzles found; leaving snapshot untouched");
        return Ok(summary);
    }

    let outcome = merge_and_save(fetcher, config, harvest.puzzles).await?;
    summary.added = outcome.added;
    summary.total = outcome.records.len();
    summary.written = true;
    Ok(summary)
}
