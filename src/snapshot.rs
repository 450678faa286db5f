//! Loading the baseline snapshot that new puzzles are merged into.
//!
//! The published `puzzles.json` is the source of truth, so the remote copy is
//! tried first. When it is unavailable (or empty) the local file from a
//! previous run is used, and when that is missing or unreadable the merge
//! starts from nothing. None of these failures are fatal.

use crate::http::Fetch;
use crate::models::PuzzleRecord;
use crate::utils::{looks_truncated, truncate_for_log};
use serde_json::Value;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Parse a snapshot document into records.
///
/// The document must be a JSON array. Elements without a string `videoUrl`
/// are skipped; other fields holding null or an unexpected type fall back to
/// their defaults so the record is kept.
pub fn parse_snapshot(json: &str) -> Result<Vec<PuzzleRecord>, serde_json::Error> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    let total = values.len();

    let records: Vec<PuzzleRecord> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(index, error = %e, "Skipping snapshot element");
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!(kept = records.len(), total, "Some snapshot elements were not puzzle records");
    }
    Ok(records)
}

/// Download the published snapshot.
///
/// Only an HTTP 200 response counts; anything else is an error.
#[instrument(level = "info", skip(fetcher))]
pub async fn download_snapshot<F: Fetch>(
    fetcher: &F,
    snapshot_url: &str,
) -> Result<Vec<PuzzleRecord>, Box<dyn Error>> {
    let response = fetcher.get(snapshot_url).await?;
    if response.status != 200 {
        return Err(format!("snapshot request returned HTTP {}", response.status).into());
    }
    match parse_snapshot(&response.body) {
        Ok(records) => Ok(records),
        Err(e) => {
            debug!(body_preview = %truncate_for_log(&response.body, 300), "Unparseable snapshot body");
            Err(e.into())
        }
    }
}

/// Read the snapshot written by a previous run.
///
/// Returns an empty list when the file does not exist or does not parse.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_local_snapshot(path: &Path) -> Vec<PuzzleRecord> {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No local snapshot");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "Could not read local snapshot");
            return Vec::new();
        }
    };

    match parse_snapshot(&contents) {
        Ok(records) => records,
        Err(e) => {
            if looks_truncated(&e) {
                warn!(error = %e, "Local snapshot looks truncated; ignoring it");
            } else {
                warn!(error = %e, "Local snapshot is not valid JSON; ignoring it");
            }
            Vec::new()
        }
    }
}

/// Obtain the records to merge into.
///
/// Tries `snapshot_url` (when given), then the file at `local_path`, then
/// falls back to an empty list.
///
/// # Arguments
///
/// * `fetcher` - HTTP client used for the remote snapshot
/// * `snapshot_url` - Published snapshot, or `None` to skip straight to the local file
/// * `local_path` - Snapshot file written by a previous run
///
/// # Returns
///
/// The baseline records. Failures are logged and never returned.
#[instrument(level = "info", skip(fetcher))]
pub async fn load_baseline<F: Fetch>(
    fetcher: &F,
    snapshot_url: Option<&str>,
    local_path: &Path,
) -> Vec<PuzzleRecord> {
    let mut existing = Vec::new();

    if let Some(url) = snapshot_url {
        match download_snapshot(fetcher, url).await {
            Ok(records) => existing = records,
            Err(e) => warn!(error = %e, %url, "Could not download existing puzzles"),
        }
    }

    if existing.is_empty() {
        info!("No existing puzzles downloaded; trying local snapshot");
        existing = read_local_snapshot(local_path).await;
    }

    if existing.is_empty() {
        info!("No existing puzzles found. Starting with an empty list");
    } else {
        info!(count = existing.len(), "Loaded existing puzzles");
    }
    existing
}
