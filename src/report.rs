//! Run results, the batch report, and the health reporter.
//!
//! Every source pipeline produces exactly one [`RunResult`]; the orchestrator
//! folds them into a [`BatchReport`] with totals and a per-region breakdown.
//! Both are transient and fully serializable, so the report artifact can be
//! consumed by CI or a dashboard as-is.
//!
//! The health reporter is a pure function over the batch report. It never
//! touches the network or the store; the caller decides what to do with the
//! recommendations.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// A region whose source success rate drops below this gets flagged for
/// selector review.
pub const REGION_SUCCESS_THRESHOLD: f64 = 0.8;

/// Per-source outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pass,
    Warning,
    Fail,
}

/// Outcome of one source's scrape pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub source: String,
    pub region: String,
    pub status: RunStatus,
    /// Raw candidates extracted from the listing page.
    pub candidates: usize,
    /// Candidates that survived normalization.
    pub valid: usize,
    /// Articles actually inserted by the store.
    pub inserted: usize,
    pub within_run_duplicates: usize,
    pub cross_run_duplicates: usize,
    pub geo_filtered: usize,
    /// Fetch or store error, when one occurred.
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl RunResult {
    /// An all-zero fail result for a source that never produced candidates.
    pub fn failed(source: &str, region: &str, error: impl Into<String>) -> Self {
        RunResult {
            source: source.to_string(),
            region: region.to_string(),
            status: RunStatus::Fail,
            candidates: 0,
            valid: 0,
            inserted: 0,
            within_run_duplicates: 0,
            cross_run_duplicates: 0,
            geo_filtered: 0,
            error: Some(error.into()),
            elapsed_ms: 0,
        }
    }
}

/// Classify one source's outcome.
///
/// Zero valid candidates is a fail. Valid candidates below the source's
/// configured minimum, or more than 20% of candidates failing normalization,
/// is a warning. Anything else passes.
pub fn classify(candidates: usize, valid: usize, min_articles: usize) -> RunStatus {
    if valid == 0 {
        RunStatus::Fail
    } else if valid < min_articles {
        RunStatus::Warning
    } else if candidates.saturating_sub(valid) * 5 > candidates {
        RunStatus::Warning
    } else {
        RunStatus::Pass
    }
}

/// Aggregate counters across every source in a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchTotals {
    pub sources: usize,
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
    pub candidates: usize,
    pub valid: usize,
    pub inserted: usize,
    pub within_run_duplicates: usize,
    pub cross_run_duplicates: usize,
    pub geo_filtered: usize,
}

/// Per-region pass/warn/fail breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: String,
    pub sources: usize,
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
    /// Share of sources that did not fail, in `[0, 1]`.
    pub success_rate: f64,
}

/// The full outcome of one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub totals: BatchTotals,
    pub regions: Vec<RegionSummary>,
    pub results: Vec<RunResult>,
}

impl BatchReport {
    /// Fold per-source results into totals and region summaries.
    pub fn from_results(
        results: Vec<RunResult>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let mut totals = BatchTotals {
            sources: results.len(),
            ..BatchTotals::default()
        };
        for r in &results {
            match r.status {
                RunStatus::Pass => totals.passed += 1,
                RunStatus::Warning => totals.warned += 1,
                RunStatus::Fail => totals.failed += 1,
            }
            totals.candidates += r.candidates;
            totals.valid += r.valid;
            totals.inserted += r.inserted;
            totals.within_run_duplicates += r.within_run_duplicates;
            totals.cross_run_duplicates += r.cross_run_duplicates;
            totals.geo_filtered += r.geo_filtered;
        }

        let regions = results
            .iter()
            .into_group_map_by(|r| r.region.clone())
            .into_iter()
            .map(|(region, rs)| {
                let passed = rs.iter().filter(|r| r.status == RunStatus::Pass).count();
                let warned = rs.iter().filter(|r| r.status == RunStatus::Warning).count();
                let failed = rs.iter().filter(|r| r.status == RunStatus::Fail).count();
                RegionSummary {
                    region,
                    sources: rs.len(),
                    passed,
                    warned,
                    failed,
                    success_rate: (passed + warned) as f64 / rs.len() as f64,
                }
            })
            .sorted_by(|a, b| a.region.cmp(&b.region))
            .collect();

        BatchReport {
            started_at,
            finished_at,
            totals,
            regions,
            results,
        }
    }
}

/// What kind of action a recommendation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Region success rate under threshold; its selectors need review.
    SelectorReview,
    /// Source failed with zero candidates; likely a site redesign.
    PriorityFix,
}

/// One actionable finding derived from a batch report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    /// Region or source the recommendation is about.
    pub subject: String,
    pub detail: String,
}

/// Derived health view over one batch report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Share of sources that did not fail, as a percentage.
    pub overall_health_pct: f64,
    pub recommendations: Vec<Recommendation>,
}

/// Derive success-rate statistics and actionable recommendations.
pub fn health_report(report: &BatchReport) -> HealthReport {
    let totals = &report.totals;
    let overall_health_pct = if totals.sources == 0 {
        100.0
    } else {
        (totals.sources - totals.failed) as f64 * 100.0 / totals.sources as f64
    };

    let mut recommendations = Vec::new();
    for region in &report.regions {
        if region.success_rate < REGION_SUCCESS_THRESHOLD {
            recommendations.push(Recommendation {
                kind: RecommendationKind::SelectorReview,
                subject: region.region.clone(),
                detail: format!(
                    "{} of {} sources failed ({:.0}% success); review the region's selector chains",
                    region.failed,
                    region.sources,
                    region.success_rate * 100.0
                ),
            });
        }
    }
    for result in &report.results {
        if result.status == RunStatus::Fail && result.candidates == 0 {
            let detail = match &result.error {
                Some(e) => format!("listing fetch failed: {e}"),
                None => "selectors matched no containers; the site has likely been redesigned"
                    .to_string(),
            };
            recommendations.push(Recommendation {
                kind: RecommendationKind::PriorityFix,
                subject: format!("{}/{}", result.region, result.source),
                detail,
            });
        }
    }

    HealthReport {
        overall_health_pct,
        recommendations,
    }
}

/// Everything written to the report artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub batch: BatchReport,
    pub health: HealthReport,
}

/// Write the report artifact as `{report_dir}/{date}/{HHMM}_report.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(report_dir = %report_dir.as_ref().display()))]
pub async fn write_report(
    artifact: &ReportArtifact,
    report_dir: impl AsRef<Path>,
) -> Result<PathBuf, std::io::Error> {
    let finished = artifact.batch.finished_at;
    let dir = report_dir
        .as_ref()
        .join(finished.format("%Y-%m-%d").to_string());
    tokio::fs::create_dir_all(&dir).await?;

    let path = dir.join(format!("{}_report.json", finished.format("%H%M")));
    let json = serde_json::to_vec_pretty(artifact).map_err(std::io::Error::other)?;
    tokio::fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote batch report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(region: &str, source: &str, status: RunStatus, candidates: usize) -> RunResult {
        RunResult {
            source: source.to_string(),
            region: region.to_string(),
            status,
            candidates,
            valid: if status == RunStatus::Fail { 0 } else { candidates },
            inserted: 0,
            within_run_duplicates: 0,
            cross_run_duplicates: 0,
            geo_filtered: 0,
            error: None,
            elapsed_ms: 12,
        }
    }

    #[test]
    fn classify_boundaries() {
        assert_eq!(classify(8, 0, 2), RunStatus::Fail);
        assert_eq!(classify(8, 1, 2), RunStatus::Warning);
        assert_eq!(classify(8, 2, 2), RunStatus::Pass);
        assert_eq!(classify(0, 0, 2), RunStatus::Fail);
    }

    #[test]
    fn classify_flags_high_normalization_failure_ratio() {
        // 3 of 10 rejected: 30% > 20% even though valid >= min.
        assert_eq!(classify(10, 7, 2), RunStatus::Warning);
        // Exactly 20% is still a pass.
        assert_eq!(classify(10, 8, 2), RunStatus::Pass);
        assert_eq!(classify(10, 9, 2), RunStatus::Pass);
    }

    #[test]
    fn report_aggregates_totals_and_regions() {
        let now = Utc::now();
        let report = BatchReport::from_results(
            vec![
                result("assam", "a1", RunStatus::Pass, 5),
                result("assam", "a2", RunStatus::Fail, 0),
                result("meghalaya", "m1", RunStatus::Warning, 3),
            ],
            now,
            now,
        );
        assert_eq!(report.totals.sources, 3);
        assert_eq!(report.totals.passed, 1);
        assert_eq!(report.totals.warned, 1);
        assert_eq!(report.totals.failed, 1);

        assert_eq!(report.regions.len(), 2);
        let assam = &report.regions[0];
        assert_eq!(assam.region, "assam");
        assert_eq!(assam.sources, 2);
        assert!((assam.success_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn all_fail_batch_still_yields_a_valid_report() {
        let now = Utc::now();
        let report = BatchReport::from_results(
            vec![
                result("assam", "a1", RunStatus::Fail, 0),
                result("assam", "a2", RunStatus::Fail, 0),
            ],
            now,
            now,
        );
        assert_eq!(report.totals.failed, 2);
        let health = health_report(&report);
        assert_eq!(health.overall_health_pct, 0.0);
    }

    #[test]
    fn health_flags_low_success_region_for_selector_review() {
        let now = Utc::now();
        let report = BatchReport::from_results(
            vec![
                result("assam", "a1", RunStatus::Pass, 5),
                result("assam", "a2", RunStatus::Fail, 0),
                result("meghalaya", "m1", RunStatus::Pass, 4),
            ],
            now,
            now,
        );
        let health = health_report(&report);
        assert!(health.recommendations.iter().any(|r| {
            r.kind == RecommendationKind::SelectorReview && r.subject == "assam"
        }));
        assert!(!health
            .recommendations
            .iter()
            .any(|r| r.kind == RecommendationKind::SelectorReview && r.subject == "meghalaya"));
    }

    #[test]
    fn health_flags_zero_candidate_fail_as_priority_fix() {
        let now = Utc::now();
        let mut failed = result("assam", "dead-source", RunStatus::Fail, 0);
        failed.error = None;
        let report = BatchReport::from_results(vec![failed], now, now);
        let health = health_report(&report);
        let fix = health
            .recommendations
            .iter()
            .find(|r| r.kind == RecommendationKind::PriorityFix)
            .unwrap();
        assert_eq!(fix.subject, "assam/dead-source");
        assert!(fix.detail.contains("redesigned"));
    }

    #[test]
    fn empty_batch_is_perfectly_healthy() {
        let now = Utc::now();
        let report = BatchReport::from_results(Vec::new(), now, now);
        let health = health_report(&report);
        assert_eq!(health.overall_health_pct, 100.0);
        assert!(health.recommendations.is_empty());
    }
}
