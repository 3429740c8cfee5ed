//! Data models for scraped articles.
//!
//! This module defines the two article shapes that flow through the pipeline:
//! - [`RawCandidate`]: an unvalidated record extracted from one listing page
//! - [`CanonicalArticle`]: the validated, deduplicated record that gets persisted
//!
//! A `RawCandidate` lives only inside a single extraction run; the normalizer
//! either promotes it to a `CanonicalArticle` or rejects it. Canonical articles
//! are never mutated or deleted by this pipeline once persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An unvalidated article candidate extracted from a source's listing page.
///
/// Titles may carry stray whitespace and markup artifacts; the extraction
/// engine resolves relative links against the source's base URL before
/// emitting a candidate, but no other guarantee holds until normalization.
#[derive(Debug, Clone)]
pub struct RawCandidate {
    /// Article headline as found in the listing markup.
    pub title: String,
    /// Absolute article URL, resolved against the source's base URL.
    pub link: String,
    /// Lead image URL, when the listing exposes one.
    pub image: Option<String>,
    /// Teaser/summary text, when the listing exposes one.
    pub summary: Option<String>,
    /// Name of the source this candidate came from.
    pub source: String,
    /// Region the source is registered under.
    pub region: String,
    /// When the listing page was fetched.
    pub fetched_at: DateTime<Utc>,
}

/// A validated, deduplicated article record.
///
/// Created by the normalizer from a [`RawCandidate`] and persisted by the
/// store after dedup. Within any single region no two persisted articles
/// share a `fingerprint`; the dedup engine enforces this before insert and
/// the store tolerates (skips) duplicate insert attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalArticle {
    /// Trimmed, whitespace-collapsed, length-bounded headline. Never empty.
    pub title: String,
    /// Teaser text, whitespace-collapsed. Dropped if empty.
    pub summary: Option<String>,
    /// Lead image URL.
    pub image: Option<String>,
    /// Absolute http(s) article URL.
    pub link: String,
    /// Region the article belongs to.
    pub region: String,
    /// Source the article was scraped from.
    pub source: String,
    /// Stable content hash over normalized title + link. Dedup key.
    pub fingerprint: String,
    /// When the listing page that produced this article was fetched.
    pub captured_at: DateTime<Utc>,
    /// When this record was created by the normalizer.
    pub created_at: DateTime<Utc>,
}
