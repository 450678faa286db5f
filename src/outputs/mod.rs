//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Writes the merged puzzle collection as the `puzzles.json` snapshot
//!
//! # Output Structure
//!
//! ```text
//! puzzles.json   # array of puzzle records, newest first
//! ```

pub mod json;
