//! Command-line interface definitions.
//!
//! Paths to the bias table and model bundle can also come from the
//! environment (`BIAS_TABLE`, `BIAS_MODELS`).

use crate::models::BiasLabel;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Classify a news article's slant and find coverage of the same story from
/// outlets with a different bias.
///
/// # Examples
///
/// ```sh
/// # Classify the article and search for alternatives
/// alt_bias_news --url https://www.foxnews.com/politics/... \
///     --bias-table data/bias_reference.yaml --models models.json -j ./json
///
/// # No model bundle: the source bias has to be given
/// alt_bias_news --url https://... --bias-table data/bias_reference.yaml --bias right -j ./json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Article to analyze
    #[arg(long)]
    pub url: String,

    /// YAML table of outlets with their homepage and bias
    #[arg(long, env = "BIAS_TABLE")]
    pub bias_table: PathBuf,

    /// JSON model bundle; without it classification is disabled
    #[arg(long, env = "BIAS_MODELS")]
    pub models: Option<PathBuf>,

    /// Bias of the source article, overriding the classifier (center, left or right)
    #[arg(long)]
    pub bias: Option<BiasLabel>,

    /// Output directory for the JSON report
    #[arg(short, long)]
    pub json_output_dir: String,

    /// Optional path to the LLM config.yaml
    #[arg(short, long)]
    pub config: Option<String>,

    /// Chat template for the search query digest
    #[arg(long, default_value = "news_query_digest")]
    pub query_template: String,

    /// Chat template for the digest of the discovered articles
    #[arg(long, default_value = "news_alternate_digest")]
    pub digest_template: String,

    /// Outlets sampled per alternate bias
    #[arg(long, default_value_t = 5)]
    pub sample_size: usize,

    /// Outlet searches in flight at once
    #[arg(long, default_value_t = 1)]
    pub probe_concurrency: usize,

    /// Minimum gap between search requests, in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub search_pause_ms: u64,

    /// Discovered articles shorter than this many words are dropped
    #[arg(long, default_value_t = 100)]
    pub min_words: usize,

    /// Stop searching after this many seconds and use what was found
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Classify the article and write the report without searching
    #[arg(long)]
    pub classify_only: bool,

    /// Do not ask the LLM for a digest of the discovered articles
    #[arg(long)]
    pub skip_digest: bool,
}

impl Cli {
    pub fn search_pause(&self) -> Duration {
        Duration::from_millis(self.search_pause_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_defaults() {
        let cli = Cli::parse_from([
            "alt_bias_news",
            "--url",
            "https://www.foxnews.com/politics/budget",
            "--bias-table",
            "data/bias_reference.yaml",
            "--json-output-dir",
            "./json",
        ]);

        assert_eq!(cli.url, "https://www.foxnews.com/politics/budget");
        assert_eq!(cli.bias_table, PathBuf::from("data/bias_reference.yaml"));
        assert_eq!(cli.json_output_dir, "./json");
        assert_eq!(cli.sample_size, 5);
        assert_eq!(cli.probe_concurrency, 1);
        assert_eq!(cli.search_pause(), Duration::from_secs(3));
        assert_eq!(cli.min_words, 100);
        assert_eq!(cli.timeout(), None);
        assert!(!cli.classify_only);
        assert!(!cli.skip_digest);
    }

    #[test]
    fn test_cli_bias_and_short_flags() {
        let cli = Cli::parse_from([
            "alt_bias_news",
            "--url",
            "https://example.com/a",
            "--bias-table",
            "t.yaml",
            "--bias",
            "Right",
            "-j",
            "/tmp/json",
            "-c",
            "/tmp/config.yaml",
            "--timeout-secs",
            "90",
            "--probe-concurrency",
            "3",
        ]);

        assert_eq!(cli.bias, Some(BiasLabel::Right));
        assert_eq!(cli.json_output_dir, "/tmp/json");
        assert_eq!(cli.config.as_deref(), Some("/tmp/config.yaml"));
        assert_eq!(cli.timeout(), Some(Duration::from_secs(90)));
        assert_eq!(cli.probe_concurrency, 3);
    }

    #[test]
    fn test_cli_rejects_unknown_bias() {
        let parsed = Cli::try_parse_from([
            "alt_bias_news",
            "--url",
            "https://example.com/a",
            "--bias-table",
            "t.yaml",
            "--bias",
            "lean-left",
            "-j",
            "/tmp/json",
        ]);
        assert!(parsed.is_err());
    }
}
