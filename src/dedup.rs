//! Within-run and cross-run deduplication.
//!
//! Two layers, both keyed on the content fingerprint:
//!
//! - **within-run**: a set of fingerprints seen so far in the current batch;
//!   later candidates with a seen fingerprint are dropped.
//! - **cross-run**: fingerprints already persisted for the region, fetched
//!   from the store before insert; re-scraping unchanged listings on a later
//!   run therefore inserts nothing.
//!
//! The two drop counts are reported separately because they mean different
//! things: within-run duplicates are usually a listing page repeating a story
//! (pinned + chronological), cross-run duplicates are the normal steady state.

use crate::models::CanonicalArticle;
use std::collections::HashSet;
use tracing::debug;

/// What survived dedup, plus how much was dropped and why.
#[derive(Debug, Default)]
pub struct DedupOutcome {
    /// Articles with fingerprints unseen in this run and in the store.
    pub unique: Vec<CanonicalArticle>,
    /// Dropped because an earlier candidate in this run had the fingerprint.
    pub within_run: usize,
    /// Dropped because the store already holds the fingerprint.
    pub cross_run: usize,
}

/// Drop duplicate articles, preserving first-seen order.
pub fn dedupe(articles: Vec<CanonicalArticle>, existing: &HashSet<String>) -> DedupOutcome {
    let mut seen: HashSet<String> = HashSet::with_capacity(articles.len());
    let mut outcome = DedupOutcome::default();

    for article in articles {
        if !seen.insert(article.fingerprint.clone()) {
            outcome.within_run += 1;
            continue;
        }
        if existing.contains(&article.fingerprint) {
            outcome.cross_run += 1;
            continue;
        }
        outcome.unique.push(article);
    }

    debug!(
        unique = outcome.unique.len(),
        within_run = outcome.within_run,
        cross_run = outcome.cross_run,
        "Dedup complete"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawCandidate;
    use crate::normalize::normalize;
    use chrono::Utc;

    fn article(title: &str, link: &str) -> CanonicalArticle {
        normalize(RawCandidate {
            title: title.to_string(),
            link: link.to_string(),
            image: None,
            summary: None,
            source: "sentinel".to_string(),
            region: "assam".to_string(),
            fetched_at: Utc::now(),
        })
        .unwrap()
    }

    #[test]
    fn keeps_first_occurrence_within_run() {
        let articles = vec![
            article("Floods", "https://x/a"),
            article("floods", "https://x/a"),
            article("Elections", "https://x/b"),
        ];
        let outcome = dedupe(articles, &HashSet::new());
        assert_eq!(outcome.unique.len(), 2);
        assert_eq!(outcome.within_run, 1);
        assert_eq!(outcome.cross_run, 0);
        assert_eq!(outcome.unique[0].title, "Floods");
    }

    #[test]
    fn drops_fingerprints_already_in_store() {
        let persisted = article("Floods", "https://x/a");
        let existing: HashSet<String> = [persisted.fingerprint.clone()].into();
        let articles = vec![
            article("Floods", "https://x/a"),
            article("Elections", "https://x/b"),
        ];
        let outcome = dedupe(articles, &existing);
        assert_eq!(outcome.unique.len(), 1);
        assert_eq!(outcome.cross_run, 1);
        assert_eq!(outcome.unique[0].title, "Elections");
    }

    #[test]
    fn within_run_wins_over_cross_run_counting() {
        // A candidate that is both a within-run repeat and already persisted
        // counts once, as a within-run duplicate.
        let persisted = article("Floods", "https://x/a");
        let existing: HashSet<String> = [persisted.fingerprint.clone()].into();
        let articles = vec![
            article("Floods", "https://x/a"),
            article("Floods", "https://x/a"),
        ];
        let outcome = dedupe(articles, &existing);
        assert!(outcome.unique.is_empty());
        assert_eq!(outcome.within_run, 1);
        assert_eq!(outcome.cross_run, 1);
    }

    #[test]
    fn empty_input_is_fine() {
        let outcome = dedupe(Vec::new(), &HashSet::new());
        assert!(outcome.unique.is_empty());
        assert_eq!(outcome.within_run + outcome.cross_run, 0);
    }
}
