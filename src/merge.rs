//! Merging freshly scraped puzzles into the existing collection.
//!
//! Records are identified by `videoUrl`. A video seen for the first time is
//! added as-is; a known video only has its `views`, `rating`,
//! `sudokuPadLinks` and `title` refreshed, everything else stays as it was
//! first recorded. The result is ordered newest first by `published`.

use crate::models::PuzzleRecord;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, instrument};

/// Outcome of [`merge_puzzles`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The merged collection, sorted by `published` descending.
    pub records: Vec<PuzzleRecord>,
    /// How many videos were not in the existing collection.
    pub added: usize,
}

/// Copy the fields that may change between runs from `fresh` onto `stored`.
fn refresh(stored: &mut PuzzleRecord, fresh: PuzzleRecord) {
    stored.views = fresh.views;
    stored.rating = fresh.rating;
    stored.sudoku_pad_links = fresh.sudoku_pad_links;
    stored.title = fresh.title;
}

/// Merge `fresh` records into `existing`.
///
/// Duplicate keys within `existing` collapse to the last occurrence, at the
/// position of the first. Ties on `published` keep insertion order.
///
/// # Arguments
///
/// * `existing` - Baseline records from the previous snapshot
/// * `fresh` - Records extracted from the feed in this run
///
/// # Returns
///
/// A [`MergeOutcome`] with the sorted collection and the number of new videos.
#[instrument(level = "info", skip_all, fields(existing = existing.len(), fresh = fresh.len()))]
pub fn merge_puzzles(existing: Vec<PuzzleRecord>, fresh: Vec<PuzzleRecord>) -> MergeOutcome {
    let mut records: Vec<PuzzleRecord> = Vec::with_capacity(existing.len() + fresh.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in existing {
        match index.entry(record.video_url.clone()) {
            Entry::Occupied(slot) => records[*slot.get()] = record,
            Entry::Vacant(slot) => {
                slot.insert(records.len());
                records.push(record);
            }
        }
    }

    let mut added = 0;
    for record in fresh {
        match index.entry(record.video_url.clone()) {
            Entry::Occupied(slot) => {
                debug!(video_url = %record.video_url, "Refreshing known puzzle");
                refresh(&mut records[*slot.get()], record);
            }
            Entry::Vacant(slot) => {
                debug!(video_url = %record.video_url, "Adding new puzzle");
                slot.insert(records.len());
                records.push(record);
                added += 1;
            }
        }
    }

    // Feed timestamps are fixed-width ISO 8601, so string order is time order.
    records.sort_by(|a, b| b.published.cmp(&a.published));

    MergeOutcome { records, added }
}
