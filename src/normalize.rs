//! Candidate normalization and content fingerprinting.
//!
//! Normalization turns a [`RawCandidate`] into a [`CanonicalArticle`] or
//! rejects it. Rejections are silent by design; the caller counts them and
//! the classification logic turns a high rejection ratio into a warning.
//!
//! The content fingerprint is a SHA-256 over a lower-cased,
//! whitespace-collapsed copy of title + link, so the same story re-scraped
//! with different spacing or capitalization hashes identically.

use crate::models::{CanonicalArticle, RawCandidate};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::trace;
use url::Url;

/// Titles longer than this are truncated at extraction time.
pub const MAX_TITLE_LEN: usize = 300;

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Trim and collapse internal whitespace runs to single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    RE_WS.replace_all(s.trim(), " ").to_string()
}

/// Stable content hash over normalized title + link.
///
/// Invariant under case and whitespace differences:
/// `fingerprint("Assam Floods", u)` == `fingerprint("assam   FLOODS", u)`.
pub fn fingerprint(title: &str, link: &str) -> String {
    let key = format!(
        "{}|{}",
        collapse_whitespace(title).to_lowercase(),
        collapse_whitespace(link).to_lowercase()
    );
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Canonicalize one raw candidate, or reject it.
///
/// Rejects when the title is empty after trimming, or the link does not
/// parse as an absolute http(s) URL.
pub fn normalize(raw: RawCandidate) -> Option<CanonicalArticle> {
    let title = collapse_whitespace(&raw.title);
    if title.is_empty() {
        trace!(source = %raw.source, "Rejected candidate: empty title");
        return None;
    }

    let link = match Url::parse(raw.link.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
        _ => {
            trace!(source = %raw.source, link = %raw.link, "Rejected candidate: bad link");
            return None;
        }
    };

    let summary = raw
        .summary
        .as_deref()
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty());
    let image = raw
        .image
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let fingerprint = fingerprint(&title, &link);
    Some(CanonicalArticle {
        title,
        summary,
        image,
        link,
        region: raw.region,
        source: raw.source,
        fingerprint,
        captured_at: raw.fetched_at,
        created_at: Utc::now(),
    })
}
