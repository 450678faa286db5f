//! YouTube channel feed scraper.
//!
//! Channels publish their latest uploads as an Atom document with Media RSS
//! extensions at `https://www.youtube.com/feeds/videos.xml?channel_id=...`.
//! Each `<entry>` looks roughly like:
//!
//! ```text
//! <entry>
//!   <title>The Miracle Sudoku</title>
//!   <link rel="alternate" href="https://www.youtube.com/watch?v=..."/>
//!   <published>2024-01-01T17:00:00+00:00</published>
//!   <media:group>
//!     <media:thumbnail url="https://i.ytimg.com/..." width="480" height="360"/>
//!     <media:description>... https://sudokupad.app/abc ...</media:description>
//!     <media:community>
//!       <media:starRating count="1234" average="5.00" min="1" max="5"/>
//!       <media:statistics views="56789"/>
//!     </media:community>
//!   </media:group>
//! </entry>
//! ```
//!
//! Only `atom:entry` children of the document root are read; elements are
//! matched by namespace URI, not by prefix.

use crate::http::Fetch;
use crate::models::{FeedEntry, PuzzleRecord, SkipReason, default_count};
use crate::scrapers::sudokupad::{extract_sudokupad_links, sudokupad_deeplink};
use crate::utils::truncate_for_log;
use chrono::DateTime;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use regex::Regex;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";
const MEDIA_NS: &[u8] = b"http://search.yahoo.com/mrss/";

const UNKNOWN_TITLE: &str = "Unknown Title";

static LENGTH_SECONDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""lengthSeconds":"(\d+)""#).expect("valid lengthSeconds regex")
});

/// Elements the parser cares about. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Entry,
    Title,
    Link,
    Published,
    Group,
    Thumbnail,
    Description,
    Community,
    Statistics,
    StarRating,
    Other,
}

fn classify(resolved: &ResolveResult<'_>, local: &[u8]) -> Tag {
    let ns = match resolved {
        ResolveResult::Bound(Namespace(ns)) => *ns,
        _ => return Tag::Other,
    };
    match (ns, local) {
        (ATOM_NS, b"entry") => Tag::Entry,
        (ATOM_NS, b"title") => Tag::Title,
        (ATOM_NS, b"link") => Tag::Link,
        (ATOM_NS, b"published") => Tag::Published,
        (MEDIA_NS, b"group") => Tag::Group,
        (MEDIA_NS, b"thumbnail") => Tag::Thumbnail,
        (MEDIA_NS, b"description") => Tag::Description,
        (MEDIA_NS, b"community") => Tag::Community,
        (MEDIA_NS, b"statistics") => Tag::Statistics,
        (MEDIA_NS, b"starRating") => Tag::StarRating,
        _ => Tag::Other,
    }
}

#[derive(Debug, Clone, Copy)]
enum TextField {
    Title,
    Published,
    Description,
}

impl TextField {
    fn slot(self, entry: &mut FeedEntry) -> &mut Option<String> {
        match self {
            TextField::Title => &mut entry.title,
            TextField::Published => &mut entry.published,
            TextField::Description => &mut entry.description,
        }
    }
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, Box<dyn Error>> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn fill_if_empty(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Record what an element inside an entry contributes.
///
/// `path` is relative to the entry and ends with the element itself. The
/// first occurrence of each element wins. Returns the text field to capture
/// when the element carries its value as character data.
fn visit_element(
    entry: &mut FeedEntry,
    path: &[Tag],
    e: &BytesStart<'_>,
) -> Result<Option<TextField>, Box<dyn Error>> {
    let field = match path {
        [Tag::Title] => Some(TextField::Title),
        [Tag::Published] => Some(TextField::Published),
        [Tag::Group, Tag::Description] => Some(TextField::Description),
        [Tag::Link] => {
            fill_if_empty(&mut entry.video_url, attribute(e, "href")?);
            None
        }
        [Tag::Group, Tag::Thumbnail] => {
            fill_if_empty(&mut entry.thumbnail_url, attribute(e, "url")?);
            None
        }
        [Tag::Group, Tag::Community, Tag::Statistics] => {
            fill_if_empty(&mut entry.views, attribute(e, "views")?);
            None
        }
        [Tag::Group, Tag::Community, Tag::StarRating] => {
            fill_if_empty(&mut entry.rating, attribute(e, "average")?);
            None
        }
        _ => None,
    };

    // A repeated text element must not append to the first one's value.
    match field {
        Some(field) if field.slot(entry).is_none() => {
            *field.slot(entry) = Some(String::new());
            Ok(Some(field))
        }
        _ => Ok(None),
    }
}

/// Parse a channel feed document into its entries, in document order.
///
/// # Errors
///
/// Returns an error when the document is not well-formed XML or has no root
/// element.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, Box<dyn Error>> {
    let mut reader = NsReader::from_str(xml);

    let mut entries = Vec::new();
    let mut stack: Vec<Tag> = Vec::new();
    let mut current: Option<FeedEntry> = None;
    // Field being captured and the stack depth of its element.
    let mut capture: Option<(TextField, usize)> = None;
    let mut saw_root = false;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        match event {
            Event::Start(e) => {
                let tag = classify(&resolved, e.local_name().as_ref());
                stack.push(tag);
                saw_root = true;

                if stack.len() == 2 && tag == Tag::Entry {
                    current = Some(FeedEntry::default());
                } else if let Some(entry) = current.as_mut() {
                    if let Some(field) = visit_element(entry, &stack[2..], &e)? {
                        capture = Some((field, stack.len()));
                    }
                }
            }
            Event::Empty(e) => {
                let tag = classify(&resolved, e.local_name().as_ref());
                saw_root = true;

                if stack.len() == 1 && tag == Tag::Entry {
                    entries.push(FeedEntry::default());
                } else if let Some(entry) = current.as_mut() {
                    stack.push(tag);
                    let visited = visit_element(entry, &stack[2..], &e);
                    stack.pop();
                    visited?;
                }
            }
            Event::End(_) => {
                if let Some((_, depth)) = capture {
                    if depth == stack.len() {
                        capture = None;
                    }
                }
                let tag = stack.pop();
                if stack.len() == 1 && tag == Some(Tag::Entry) {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                }
            }
            Event::Text(t) => {
                if let Some(slot) = capture_slot(&mut current, capture, stack.len()) {
                    slot.push_str(&t.decode()?);
                }
            }
            Event::CData(c) => {
                if let Some(slot) = capture_slot(&mut current, capture, stack.len()) {
                    slot.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(slot) = capture_slot(&mut current, capture, stack.len()) {
                    match r.resolve_char_ref()? {
                        Some(ch) => slot.push(ch),
                        None => {
                            let name = r.decode()?;
                            match resolve_predefined_entity(&name) {
                                Some(value) => slot.push_str(value),
                                None => {
                                    slot.push('&');
                                    slot.push_str(&name);
                                    slot.push(';');
                                }
                            }
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err("feed document has no root element".into());
    }
    if !stack.is_empty() {
        return Err(format!("feed document ended with {} unclosed element(s)", stack.len()).into());
    }
    Ok(entries)
}

fn capture_slot(
    current: &mut Option<FeedEntry>,
    capture: Option<(TextField, usize)>,
    depth: usize,
) -> Option<&mut String> {
    let (field, capture_depth) = capture?;
    if capture_depth != depth {
        return None;
    }
    field.slot(current.as_mut()?).as_mut()
}

/// Download and parse the channel feed.
///
/// # Arguments
///
/// * `fetcher` - HTTP client used for the request
/// * `feed_url` - URL of the channel's Atom feed
///
/// # Returns
///
/// The feed's entries in document order.
///
/// # Errors
///
/// Fails on transport errors, non-2xx statuses and malformed XML.
#[instrument(level = "info", skip(fetcher))]
pub async fn fetch_feed<F: Fetch>(fetcher: &F, feed_url: &str) -> Result<Vec<FeedEntry>, Box<dyn Error>> {
    let response = fetcher.get(feed_url).await?;
    if !response.is_success() {
        return Err(format!("feed request returned HTTP {}", response.status).into());
    }

    let entries = match parse_feed(&response.body) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(body_preview = %truncate_for_log(&response.body, 300), "Unparseable feed body");
            return Err(e);
        }
    };

    info!(count = entries.len(), "Found entries in the feed");
    Ok(entries)
}

/// Turn a feed entry into a puzzle record.
///
/// Missing elements fall back to defaults (`"Unknown Title"`, empty strings,
/// `"0"` for counters). Entries without a video link or without any SudokuPad
/// link in their description are skipped.
///
/// # Arguments
///
/// * `entry` - Raw values read from one feed entry
///
/// # Returns
///
/// The record with deep-linked puzzles, or the [`SkipReason`] it was dropped for.
pub fn extract_puzzle(entry: FeedEntry) -> Result<PuzzleRecord, SkipReason> {
    let title = entry.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    let video_url = match entry.video_url {
        Some(url) if !url.is_empty() => url,
        _ => {
            let reason = SkipReason::NoVideoUrl;
            warn!(%title, %reason, "Skipping feed entry");
            return Err(reason);
        }
    };

    let description = entry.description.unwrap_or_default();
    let links = extract_sudokupad_links(&description);
    if links.is_empty() {
        let reason = SkipReason::NoPuzzleLink;
        info!(%title, %reason, "Skipping feed entry");
        return Err(reason);
    }

    let published = entry.published.unwrap_or_default();
    if DateTime::parse_from_rfc3339(&published).is_err() {
        warn!(%title, %published, "Published timestamp is not RFC 3339; sort order may be off");
    }

    Ok(PuzzleRecord {
        title,
        sudoku_pad_links: links.iter().map(|link| sudokupad_deeplink(link)).collect(),
        thumbnail_url: entry.thumbnail_url.unwrap_or_default(),
        video_length: None,
        published,
        video_url,
        description,
        views: entry.views.unwrap_or_else(default_count),
        rating: entry.rating.unwrap_or_else(default_count),
        extra: Default::default(),
    })
}

/// Find the `"lengthSeconds":"N"` value embedded in a video page.
pub fn parse_video_length(html: &str) -> Option<u32> {
    LENGTH_SECONDS
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Fetch a video page and read its duration in seconds.
///
/// Any failure is logged and reported as `None`.
#[instrument(level = "debug", skip(fetcher))]
pub async fn fetch_video_length<F: Fetch>(fetcher: &F, video_url: &str) -> Option<u32> {
    let response = match fetcher.get(video_url).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, %video_url, "Error fetching video page");
            return None;
        }
    };
    if !response.is_success() {
        warn!(status = response.status, %video_url, "Video page request failed");
        return None;
    }

    match parse_video_length(&response.body) {
        Some(length) => {
            debug!(length, %video_url, "Found video length");
            Some(length)
        }
        None => {
            warn!(%video_url, "Could not extract video length");
            None
        }
    }
}

/// Result of scraping the feed once.
#[derive(Debug, Default)]
pub struct FeedHarvest {
    /// Number of entries in the feed.
    pub entries_found: usize,
    /// Records for entries that passed every filter, in feed order.
    pub puzzles: Vec<PuzzleRecord>,
    /// Entries that were dropped, with the reason.
    pub skipped: Vec<SkipReason>,
}

async fn harvest_entry<F: Fetch>(
    fetcher: &F,
    entry: FeedEntry,
    probe_video_length: bool,
) -> Result<PuzzleRecord, SkipReason> {
    let mut record = extract_puzzle(entry)?;
    if probe_video_length {
        match fetch_video_length(fetcher, &record.video_url).await {
            Some(length) => record.video_length = Some(length),
            None => {
                let reason = SkipReason::NoVideoLength;
                warn!(title = %record.title, %reason, "Skipping feed entry");
                return Err(reason);
            }
        }
    }
    Ok(record)
}

/// Fetch the feed and extract puzzle records from every entry.
///
/// A feed failure is logged and yields an empty harvest. With
/// `probe_video_length`, each candidate's video page is requested in turn
/// and entries without a resolvable length are dropped.
#[instrument(level = "info", skip(fetcher))]
pub async fn fetch_newest_puzzles<F: Fetch>(
    fetcher: &F,
    feed_url: &str,
    probe_video_length: bool,
) -> FeedHarvest {
    let entries = match fetch_feed(fetcher, feed_url).await {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = %e, %feed_url, "Error fetching RSS feed");
            return FeedHarvest::default();
        }
    };
    let entries_found = entries.len();

    let results: Vec<Result<PuzzleRecord, SkipReason>> = stream::iter(entries)
        .then(|entry| harvest_entry(fetcher, entry, probe_video_length))
        .collect()
        .await;

    let mut harvest = FeedHarvest {
        entries_found,
        ..Default::default()
    };
    for result in results {
        match result {
            Ok(record) => harvest.puzzles.push(record),
            Err(reason) => harvest.skipped.push(reason),
        }
    }

    info!(
        entries = entries_found,
        puzzles = harvest.puzzles.len(),
        skipped = harvest.skipped.len(),
        "Extracted puzzles from feed"
    );
    harvest
}
