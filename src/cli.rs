//! Command-line interface definitions for the CTC scraper.
//!
//! Every option has a default matching the published job, so the scheduler
//! runs the binary without arguments. Options can also be set through
//! environment variables.

use crate::pipeline::PipelineConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Cracking the Cryptic uploads feed.
pub const DEFAULT_FEED_URL: &str =
    "https://www.youtube.com/feeds/videos.xml?channel_id=UCC-UOdK8-mIjxBQm_ot1T-Q";

/// Snapshot published through GitHub Pages.
pub const DEFAULT_SNAPSHOT_URL: &str = "https://jonasklamroth.github.io/CTCScraper/puzzles.json";

/// Snapshot file in the working directory.
pub const DEFAULT_OUTPUT_FILE: &str = "puzzles.json";

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Scheduled run with the defaults
/// ctc_scraper
///
/// # Merge into a local file only, also recording video lengths
/// ctc_scraper --no-remote-snapshot --probe-video-length -o ./site/puzzles.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// YouTube channel feed to scan for puzzle videos
    #[arg(long, env = "CTC_FEED_URL", default_value = DEFAULT_FEED_URL, value_parser = parse_http_url)]
    pub feed_url: Url,

    /// Previously published snapshot to merge into
    #[arg(long, env = "CTC_SNAPSHOT_URL", default_value = DEFAULT_SNAPSHOT_URL, value_parser = parse_http_url)]
    pub snapshot_url: Url,

    /// Skip the published snapshot and merge into the local file only
    #[arg(long)]
    pub no_remote_snapshot: bool,

    /// Snapshot file to read as fallback and overwrite with the result
    #[arg(short, long, env = "CTC_OUTPUT_FILE", default_value = DEFAULT_OUTPUT_FILE)]
    pub output_file: PathBuf,

    /// Fetch every video page to record its length; videos without one are dropped
    #[arg(long, env = "CTC_PROBE_VIDEO_LENGTH")]
    pub probe_video_length: bool,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "CTC_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Cli {
    /// Pipeline settings derived from the arguments.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            feed_url: self.feed_url.clone(),
            snapshot_url: (!self.no_remote_snapshot).then(|| self.snapshot_url.clone()),
            output_path: self.output_file.clone(),
            probe_video_length: self.probe_video_length,
        }
    }

    /// Per-request HTTP timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_http_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| format!("invalid URL '{value}': {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported URL scheme '{other}', expected http or https")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["ctc_scraper"]).unwrap();
        assert_eq!(cli.feed_url.as_str(), DEFAULT_FEED_URL);
        assert_eq!(cli.snapshot_url.as_str(), DEFAULT_SNAPSHOT_URL);
        assert_eq!(cli.output_file, PathBuf::from("puzzles.json"));
        assert!(!cli.probe_video_length);
        assert_eq!(cli.timeout(), Duration::from_secs(30));

        let config = cli.pipeline_config();
        assert_eq!(config.snapshot_url.as_ref().map(Url::as_str), Some(DEFAULT_SNAPSHOT_URL));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "ctc_scraper",
            "--feed-url",
            "https://www.youtube.com/feeds/videos.xml?channel_id=other",
            "--no-remote-snapshot",
            "-o",
            "/tmp/out.json",
            "--probe-video-length",
            "--timeout-secs",
            "5",
        ]);

        let config = cli.pipeline_config();
        assert_eq!(
            config.feed_url.as_str(),
            "https://www.youtube.com/feeds/videos.xml?channel_id=other"
        );
        assert!(config.snapshot_url.is_none());
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.json"));
        assert!(config.probe_video_length);
        assert_eq!(cli.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_cli_rejects_non_http_urls() {
        assert!(Cli::try_parse_from(["ctc_scraper", "--feed-url", "ftp://example.com/feed"]).is_err());
        assert!(Cli::try_parse_from(["ctc_scraper", "--snapshot-url", "not a url"]).is_err());
    }
}
