//! Batch orchestration: bounded-concurrency scheduling of source scrapes.
//!
//! Descriptors are partitioned into sequential batches of at most
//! `max_concurrency`. Within a batch every source runs its full
//! extract → normalize → geo-filter → dedup → insert pipeline concurrently,
//! each raced against its own timeout; batch N+1 never starts before batch N
//! has fully resolved, which bounds outstanding outbound connections. A fixed
//! pause separates batches so we never burst requests at external hosts.
//!
//! The orchestrator is infallible by construction: every per-source failure
//! is already data (a fail [`RunResult`]) by the time it reaches this layer,
//! and a batch where every source fails still folds into a valid all-fail
//! report. There is no cross-source cancellation; a timed-out pipeline is
//! dropped and its late response, if one ever arrives, is discarded.

use crate::dedup::dedupe;
use crate::extract::{extract, PageFetcher};
use crate::geo;
use crate::normalize::normalize;
use crate::registry::SourceDescriptor;
use crate::report::{classify, BatchReport, RunResult, RunStatus};
use crate::store::ArticleStore;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{info, instrument, warn};

/// Extra time a pipeline gets beyond its fetch timeout before the
/// orchestrator abandons it; covers parsing and store round-trips.
pub const TIMEOUT_GRACE: Duration = Duration::from_millis(500);

/// Default pause between sequential batches.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(1500);

/// Drives many source scrapes per run under bounded concurrency.
pub struct Orchestrator {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn ArticleStore>,
    max_concurrency: usize,
    batch_pause: Duration,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn ArticleStore>,
        max_concurrency: usize,
        batch_pause: Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            max_concurrency: max_concurrency.max(1),
            batch_pause,
        }
    }

    /// Scrape every descriptor and fold the outcomes into a batch report.
    #[instrument(level = "info", skip_all, fields(sources = descriptors.len(), max_concurrency = self.max_concurrency))]
    pub async fn run(&self, descriptors: &[SourceDescriptor]) -> BatchReport {
        let started_at = Utc::now();
        let run_t0 = Instant::now();
        let mut results: Vec<RunResult> = Vec::with_capacity(descriptors.len());

        for (index, batch) in descriptors.chunks(self.max_concurrency).enumerate() {
            if index > 0 {
                sleep(self.batch_pause).await;
            }
            info!(batch = index, size = batch.len(), "Starting scrape batch");
            let batch_results: Vec<RunResult> = stream::iter(batch)
                .map(|descriptor| self.run_source(descriptor))
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;
            results.extend(batch_results);
        }

        let report = BatchReport::from_results(results, started_at, Utc::now());
        info!(
            sources = report.totals.sources,
            passed = report.totals.passed,
            warned = report.totals.warned,
            failed = report.totals.failed,
            inserted = report.totals.inserted,
            elapsed_ms = run_t0.elapsed().as_millis() as u64,
            "Orchestration run complete"
        );
        report
    }

    /// Run one source's pipeline, raced against its timeout. Always resolves
    /// to a result; a timed-out pipeline is abandoned and reported as a fail.
    async fn run_source(&self, descriptor: &SourceDescriptor) -> RunResult {
        let t0 = Instant::now();
        let budget = descriptor.timeout + TIMEOUT_GRACE;
        let mut result = match timeout(budget, self.scrape_source(descriptor)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    source = %descriptor.name,
                    region = %descriptor.region,
                    budget_ms = budget.as_millis() as u64,
                    "Source pipeline timed out; abandoning"
                );
                RunResult::failed(
                    &descriptor.name,
                    &descriptor.region,
                    format!("timed out after {budget:?}"),
                )
            }
        };
        result.elapsed_ms = t0.elapsed().as_millis() as u64;
        result
    }

    async fn scrape_source(&self, descriptor: &SourceDescriptor) -> RunResult {
        let extraction = extract(self.fetcher.as_ref(), descriptor).await;
        let candidates = extraction.candidates.len();
        let mut error = extraction.error;

        let mut articles: Vec<_> = extraction
            .candidates
            .into_iter()
            .filter_map(normalize)
            .collect();
        let valid = articles.len();

        let mut geo_filtered = 0usize;
        if descriptor.aggregator {
            articles.retain(|article| {
                let keep = geo::is_relevant(
                    &article.title,
                    article.summary.as_deref(),
                    &descriptor.region,
                    &descriptor.region_aliases,
                );
                if !keep {
                    geo_filtered += 1;
                }
                keep
            });
        }

        let existing = match self.store.existing_fingerprints(&descriptor.region).await {
            Ok(set) => set,
            Err(e) => {
                warn!(
                    source = %descriptor.name,
                    region = %descriptor.region,
                    error = %e,
                    "Failed to read existing fingerprints; treating store as empty"
                );
                error.get_or_insert_with(|| format!("fingerprint lookup failed: {e}"));
                HashSet::new()
            }
        };
        let outcome = dedupe(articles, &existing);

        let inserted = match self.store.insert_many(&outcome.unique).await {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    source = %descriptor.name,
                    region = %descriptor.region,
                    error = %e,
                    "Store insert failed"
                );
                error.get_or_insert_with(|| format!("store insert failed: {e}"));
                0
            }
        };

        let status = classify(candidates, valid, descriptor.min_articles);
        if status != RunStatus::Pass {
            warn!(
                source = %descriptor.name,
                region = %descriptor.region,
                ?status,
                candidates,
                valid,
                "Source did not pass"
            );
        }

        RunResult {
            source: descriptor.name.clone(),
            region: descriptor.region.clone(),
            status,
            candidates,
            valid,
            inserted,
            within_run_duplicates: outcome.within_run,
            cross_run_duplicates: outcome.cross_run,
            geo_filtered,
            error,
            elapsed_ms: 0,
        }
    }
}
