//! Data models for feed entries and persisted puzzle records.
//!
//! - [`FeedEntry`]: raw values read from one `<entry>` of the channel feed
//! - [`PuzzleRecord`]: the persisted representation of a video with puzzles
//! - [`SkipReason`]: why an entry did not produce a record
//!
//! Puzzle records use camelCase field names in JSON because the published
//! `puzzles.json` is consumed by the Android app with that schema.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Raw data read from one Atom `<entry>`.
///
/// Every field is optional so the extractor can tell a missing element
/// apart from an empty one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    /// Text of `atom:title`.
    pub title: Option<String>,
    /// `href` of the first `atom:link`.
    pub video_url: Option<String>,
    /// Text of `atom:published`, verbatim.
    pub published: Option<String>,
    /// `url` of `media:group/media:thumbnail`.
    pub thumbnail_url: Option<String>,
    /// Text of `media:group/media:description`.
    pub description: Option<String>,
    /// `views` of `media:community/media:statistics`.
    pub views: Option<String>,
    /// `average` of `media:community/media:starRating`.
    pub rating: Option<String>,
}

/// A video that links at least one SudokuPad puzzle.
///
/// `video_url` is the merge identity. Fields this crate does not know about
/// are kept in `extra` so that records written by newer tools survive a
/// round-trip through the merge.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_links")]
    pub sudoku_pad_links: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub thumbnail_url: String,
    /// Duration in seconds, only present when the video page was probed.
    #[serde(
        default,
        deserialize_with = "lenient_length",
        skip_serializing_if = "Option::is_none"
    )]
    pub video_length: Option<u32>,
    /// Feed timestamp, compared as a plain string when sorting.
    #[serde(default, deserialize_with = "lenient_text")]
    pub published: String,
    pub video_url: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default = "default_count", deserialize_with = "lenient_count")]
    pub views: String,
    #[serde(default = "default_count", deserialize_with = "lenient_count")]
    pub rating: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Default for counters the feed did not report.
pub fn default_count() -> String {
    "0".to_string()
}

// Only `videoUrl` is strict. A known field holding null or an unexpected
// type falls back to its default so the record itself is kept.

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

// Numeric counts are accepted and stored as strings.
fn lenient_count<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_else(default_count))
}

fn lenient_links<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
        Value::String(link) => vec![link],
        _ => Vec::new(),
    })
}

fn lenient_length<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(seconds.and_then(|s| u32::try_from(s).ok()))
}

/// Why a feed entry produced no [`PuzzleRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The entry had no `atom:link`, so there is nothing to key it by.
    NoVideoUrl,
    /// The description contains no SudokuPad link.
    NoPuzzleLink,
    /// Video length probing was requested but the length could not be found.
    NoVideoLength,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NoVideoUrl => "no video link",
            SkipReason::NoPuzzleLink => "no SudokuPad link",
            SkipReason::NoVideoLength => "no video length",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PuzzleRecord {
        PuzzleRecord {
            title: "The Miracle Sudoku".to_string(),
            sudoku_pad_links: vec!["https://sudokupad.svencodes.com/puzzle/abc".to_string()],
            thumbnail_url: "https://i.ytimg.com/vi/x/hqdefault.jpg".to_string(),
            video_length: None,
            published: "2024-01-01T00:00:00+00:00".to_string(),
            video_url: "https://www.youtube.com/watch?v=x".to_string(),
            description: "Größe ✓ https://sudokupad.app/abc".to_string(),
            views: "1200".to_string(),
            rating: "4.9".to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_serializes_camel_case_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("sudokuPadLinks").is_some());
        assert!(json.get("thumbnailUrl").is_some());
        assert!(json.get("videoUrl").is_some());
        assert!(json.get("video_url").is_none());
    }

    #[test]
    fn test_video_length_omitted_when_absent() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("videoLength"));

        let mut with_length = sample();
        with_length.video_length = Some(3605);
        let json = serde_json::to_value(&with_length).unwrap();
        assert_eq!(json["videoLength"], 3605);
    }

    #[test]
    fn test_missing_optional_fields_take_defaults() {
        let record: PuzzleRecord =
            serde_json::from_str(r#"{"videoUrl": "https://www.youtube.com/watch?v=y"}"#).unwrap();
        assert_eq!(record.views, "0");
        assert_eq!(record.rating, "0");
        assert!(record.sudoku_pad_links.is_empty());
        assert_eq!(record.video_length, None);
    }

    #[test]
    fn test_missing_video_url_is_rejected() {
        let result: Result<PuzzleRecord, _> = serde_json::from_str(r#"{"title": "No key"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_numeric_counts_are_accepted() {
        let record: PuzzleRecord = serde_json::from_str(
            r#"{"videoUrl": "https://www.youtube.com/watch?v=z", "views": 42, "rating": 4.5}"#,
        )
        .unwrap();
        assert_eq!(record.views, "42");
        assert_eq!(record.rating, "4.5");
    }

    #[test]
    fn test_wrongly_typed_fields_fall_back_to_defaults() {
        let record: PuzzleRecord = serde_json::from_str(
            r#"{
                "title": null,
                "sudokuPadLinks": null,
                "thumbnailUrl": ["not", "a", "string"],
                "videoLength": 3600.0,
                "published": null,
                "videoUrl": "https://www.youtube.com/watch?v=odd",
                "description": {"text": "nested"},
                "views": true,
                "rating": null
            }"#,
        )
        .unwrap();
        assert_eq!(record.title, "");
        assert!(record.sudoku_pad_links.is_empty());
        assert_eq!(record.thumbnail_url, "");
        assert_eq!(record.video_length, Some(3600));
        assert_eq!(record.published, "");
        assert_eq!(record.description, "");
        assert_eq!(record.views, "true");
        assert_eq!(record.rating, "0");
    }

    #[test]
    fn test_video_length_accepts_strings_and_rejects_fractions() {
        let parse = |length: &str| -> Option<u32> {
            let json = format!(r#"{{"videoUrl": "v", "videoLength": {length}}}"#);
            serde_json::from_str::<PuzzleRecord>(&json).unwrap().video_length
        };
        assert_eq!(parse(r#""125""#), Some(125));
        assert_eq!(parse("12.5"), None);
        assert_eq!(parse("-3"), None);
        assert_eq!(parse("null"), None);
    }

    #[test]
    fn test_links_keep_string_elements() {
        let record: PuzzleRecord = serde_json::from_str(
            r#"{"videoUrl": "v", "sudokuPadLinks": ["https://sudokupad.svencodes.com/puzzle/a", null]}"#,
        )
        .unwrap();
        assert_eq!(
            record.sudoku_pad_links,
            vec!["https://sudokupad.svencodes.com/puzzle/a".to_string()]
        );
    }

    #[test]
    fn test_non_string_video_url_is_rejected() {
        let result: Result<PuzzleRecord, _> = serde_json::from_str(r#"{"videoUrl": 7}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let input = r#"{"videoUrl": "https://www.youtube.com/watch?v=w", "isDeleted": true}"#;
        let record: PuzzleRecord = serde_json::from_str(input).unwrap();
        assert_eq!(record.extra.get("isDeleted"), Some(&Value::Bool(true)));

        let output = serde_json::to_value(&record).unwrap();
        assert_eq!(output["isDeleted"], Value::Bool(true));
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::NoVideoUrl.to_string(), "no video link");
        assert_eq!(SkipReason::NoPuzzleLink.to_string(), "no SudokuPad link");
        assert_eq!(SkipReason::NoVideoLength.to_string(), "no video length");
    }
}
