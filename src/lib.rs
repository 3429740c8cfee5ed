//! # Regional News Scraper
//!
//! A scraping pipeline that ingests news listings from dozens of
//! independently operated, structurally inconsistent regional news sites,
//! extracts candidate articles through per-source selector rules, removes
//! duplicates within and across runs, filters multi-region aggregators for
//! geographic relevance, and emits canonical article records plus a
//! machine-readable scrape-health report.
//!
//! ## Architecture
//!
//! Data flows leaf-first through the pipeline:
//!
//! 1. **[`registry`]**: declarative region → source-descriptor mapping,
//!    validated once at load
//! 2. **[`extract`]**: one GET per source, selector-chain extraction into
//!    raw candidates; never raises past its boundary
//! 3. **[`normalize`]**: canonicalization plus a stable content fingerprint
//! 4. **[`geo`]** / **[`dedup`]**: relevance filtering for aggregators,
//!    within-run and cross-run deduplication
//! 5. **[`orchestrator`]**: sequential batches of concurrent source
//!    pipelines, each raced against its own timeout
//! 6. **[`report`]**: run results, batch totals, and health recommendations
//!
//! The persistent store ([`store`]) is an opaque collaborator: fingerprints
//! out, articles in, duplicate insert attempts tolerated. Re-running the
//! pipeline against unchanged listings inserts nothing.

pub mod cli;
pub mod dedup;
pub mod extract;
pub mod geo;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod store;
pub mod utils;

pub use models::{CanonicalArticle, RawCandidate};
pub use registry::{ConfigError, Registry, SourceDescriptor};
pub use report::{BatchReport, HealthReport, RunResult, RunStatus};
