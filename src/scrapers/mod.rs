//! Scrapers for discovering puzzle videos.
//!
//! | Module | Source | Notes |
//! |--------|--------|-------|
//! | [`youtube`] | Channel Atom feed | Entries, statistics, optional video length |
//! | [`sudokupad`] | Video descriptions | Link scanning and deep-link rewriting |
//!
//! The feed scraper follows the usual two-phase pattern: fetch the index
//! document, then turn each entry into a record. Entries that cannot be
//! turned into a record are logged and skipped without failing the batch.

pub mod sudokupad;
pub mod youtube;
