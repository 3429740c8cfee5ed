//! Geo-relevance filtering for multi-region aggregator sources.
//!
//! Dedicated regional sources skip this filter entirely; everything they
//! publish is considered relevant to their region. Aggregator listings mix
//! regions, so their candidates must mention the target region's canonical
//! name or a configured alias in the title or summary.
//!
//! The matching is deliberately conservative: lower-cased,
//! whitespace-collapsed substring match, no stemming, no NLP. An article
//! with no matchable text at all (no title text, no summary) is included
//! rather than dropped; false positives are preferred over silent data loss,
//! and every exclusion is counted by the caller.

use crate::normalize::collapse_whitespace;

/// Does this title/summary pair mention the target region?
///
/// `region` is the canonical region name; `aliases` are alternative names
/// from the registry (city names, historical spellings).
pub fn is_relevant(title: &str, summary: Option<&str>, region: &str, aliases: &[String]) -> bool {
    let haystack = match summary {
        Some(s) => collapse_whitespace(&format!("{title} {s}")).to_lowercase(),
        None => collapse_whitespace(title).to_lowercase(),
    };
    if haystack.is_empty() {
        // Nothing to match against; default to include.
        return true;
    }

    let region = collapse_whitespace(region).to_lowercase();
    if !region.is_empty() && haystack.contains(&region) {
        return true;
    }
    aliases.iter().any(|alias| {
        let alias = collapse_whitespace(alias).to_lowercase();
        !alias.is_empty() && haystack.contains(&alias)
    })
}
