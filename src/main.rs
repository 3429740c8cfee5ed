//! Binary entry point: wire the registry, orchestrator, store, and reporter
//! together and run one scrape batch.
//!
//! ## Usage
//!
//! ```sh
//! regional_news_scraper --region assam --max-concurrency 4
//! ```
//!
//! One invocation is one run: every configured source is scraped once,
//! articles land in the data directory, and a dated report JSON lands in the
//! report directory. Re-runs against unchanged listings insert nothing.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use regional_news_scraper::cli::Cli;
use regional_news_scraper::extract::HttpFetcher;
use regional_news_scraper::orchestrator::Orchestrator;
use regional_news_scraper::registry::Registry;
use regional_news_scraper::report::{health_report, write_report, ReportArtifact};
use regional_news_scraper::store::{ArticleStore, JsonStore, MemoryStore};
use regional_news_scraper::utils::{ensure_writable_dir, truncate_for_log};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("regional_news_scraper starting up");

    let args = Cli::parse();

    // Early check: fail fast on unwritable output directories.
    if let Err(e) = ensure_writable_dir(&args.report_dir).await {
        error!(path = %args.report_dir, error = %e, "Report directory is not writable");
        return Err(e);
    }
    if !args.dry_run {
        if let Err(e) = ensure_writable_dir(&args.data_dir).await {
            error!(path = %args.data_dir, error = %e, "Data directory is not writable");
            return Err(e);
        }
    }

    // --- Load and filter the source registry ---
    let mut registry = match &args.config {
        Some(path) => Registry::load(path)?,
        None => Registry::embedded()?,
    };
    registry.retain_regions(&args.region);
    let descriptors = registry.all_sources();
    if descriptors.is_empty() {
        warn!(regions = ?args.region, "No sources matched the requested regions; nothing to do");
        return Ok(());
    }
    info!(
        sources = descriptors.len(),
        regions = registry.regions().count(),
        dry_run = args.dry_run,
        "Registry ready"
    );

    // --- Build the pipeline ---
    let fetcher = Arc::new(HttpFetcher::new());
    let store: Arc<dyn ArticleStore> = if args.dry_run {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonStore::new(&args.data_dir))
    };
    let orchestrator = Orchestrator::new(
        fetcher,
        store,
        args.max_concurrency,
        Duration::from_millis(args.batch_pause_ms),
    );

    // --- Run ---
    let batch = orchestrator.run(&descriptors).await;
    let health = health_report(&batch);

    for recommendation in &health.recommendations {
        warn!(
            kind = ?recommendation.kind,
            subject = %recommendation.subject,
            detail = %truncate_for_log(&recommendation.detail, 300),
            "Health recommendation"
        );
    }

    info!(
        sources = batch.totals.sources,
        passed = batch.totals.passed,
        warned = batch.totals.warned,
        failed = batch.totals.failed,
        candidates = batch.totals.candidates,
        inserted = batch.totals.inserted,
        duplicates = batch.totals.within_run_duplicates + batch.totals.cross_run_duplicates,
        geo_filtered = batch.totals.geo_filtered,
        health_pct = format!("{:.1}", health.overall_health_pct).as_str(),
        "Batch complete"
    );

    // --- Write the report artifact ---
    let artifact = ReportArtifact { batch, health };
    if let Err(e) = write_report(&artifact, &args.report_dir).await {
        error!(error = %e, "Failed to write batch report");
        return Err(Box::new(e));
    }

    let elapsed = start_time.elapsed();
    info!(
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
