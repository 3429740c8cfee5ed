//! Command-line interface definitions.
//!
//! All options can be given as flags or environment variables.

use clap::Parser;

/// Command-line arguments for the regional news scraper.
///
/// # Examples
///
/// ```sh
/// # Scrape every region in the embedded registry
/// regional_news_scraper
///
/// # One region, custom registry, gentler concurrency
/// regional_news_scraper -c sources.yaml -r assam --max-concurrency 2
///
/// # Report-only run, nothing persisted
/// regional_news_scraper --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the source registry YAML (defaults to the embedded registry)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Restrict the run to these regions (repeatable)
    #[arg(short, long)]
    pub region: Vec<String>,

    /// Maximum concurrent source scrapes per batch
    #[arg(long, env = "SCRAPER_MAX_CONCURRENCY", default_value_t = 4)]
    pub max_concurrency: usize,

    /// Pause between sequential batches, in milliseconds
    #[arg(long, env = "SCRAPER_BATCH_PAUSE_MS", default_value_t = 1500)]
    pub batch_pause_ms: u64,

    /// Directory where scraped articles are persisted
    #[arg(short, long, env = "SCRAPER_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Directory where batch reports are written
    #[arg(long, env = "SCRAPER_REPORT_DIR", default_value = "./reports")]
    pub report_dir: String,

    /// Scrape and report without persisting articles
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["regional_news_scraper"]);
        assert_eq!(cli.config, None);
        assert!(cli.region.is_empty());
        assert_eq!(cli.max_concurrency, 4);
        assert_eq!(cli.batch_pause_ms, 1500);
        assert_eq!(cli.data_dir, "./data");
        assert_eq!(cli.report_dir, "./reports");
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_repeatable_regions() {
        let cli = Cli::parse_from([
            "regional_news_scraper",
            "-r",
            "assam",
            "-r",
            "meghalaya",
        ]);
        assert_eq!(cli.region, vec!["assam", "meghalaya"]);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "regional_news_scraper",
            "-c",
            "custom.yaml",
            "--max-concurrency",
            "2",
            "--dry-run",
        ]);
        assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
        assert_eq!(cli.max_concurrency, 2);
        assert!(cli.dry_run);
    }
}
