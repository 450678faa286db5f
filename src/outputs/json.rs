//! JSON snapshot output.
//!
//! The snapshot is a single pretty-printed array with a four-space indent.
//! Non-ASCII text (titles, descriptions) is written as UTF-8 rather than
//! `\u` escapes, which keeps diffs of the published file readable.
//!
//! The file is first written next to its destination and then renamed over
//! it, so a crash mid-write never leaves a truncated snapshot behind.

use crate::models::PuzzleRecord;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::error::Error;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

const INDENT: &[u8] = b"    ";

/// Serialize records the way the snapshot file stores them.
pub fn to_snapshot_json(records: &[PuzzleRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    records.serialize(&mut serializer)?;
    Ok(buf)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `records` to `path`, replacing any previous content.
///
/// # Arguments
///
/// * `records` - The merged collection, already sorted
/// * `path` - Destination snapshot file
///
/// # Returns
///
/// `Ok(())` once the new file is in place.
///
/// # Errors
///
/// Returns an error if serialization, the temporary write or the rename fails.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_snapshot(records: &[PuzzleRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    let json = to_snapshot_json(records)?;
    let tmp = temp_path(path);

    if let Err(e) = fs::write(&tmp, &json).await {
        error!(tmp = %tmp.display(), error = %e, "Failed to write temporary snapshot");
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        error!(tmp = %tmp.display(), error = %e, "Failed to move snapshot into place");
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    info!(bytes = json.len(), "Wrote puzzle snapshot");
    Ok(())
}
