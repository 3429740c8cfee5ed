//! Listing-page extraction engine.
//!
//! One invocation fetches a source's listing page, parses it, and walks the
//! configured container nodes, evaluating each field's ordered fallback
//! selector chain. The engine is a hard error boundary: network failures,
//! non-2xx responses, timeouts, and arbitrarily malformed HTML all come back
//! as an [`Extraction`] carrying an empty candidate list and an error string,
//! never as an `Err` or a panic. One broken source must never take down a
//! sibling scrape.
//!
//! Zero matching containers is data, not a failure: it is indistinguishable
//! from a genuinely empty listing, and the health reporter is the place that
//! turns a zero-result streak into a recommendation.

use crate::models::RawCandidate;
use crate::normalize::{collapse_whitespace, MAX_TITLE_LEN};
use crate::registry::{SelectorSpec, SourceDescriptor};
use async_trait::async_trait;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Static browser user agent sent with every listing fetch. Several of the
/// configured sources serve bot traffic an empty shell page.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// A failed listing fetch. Recorded as a string on the run result; never
/// propagates past the extraction boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// The HTTP seam of the extraction engine.
///
/// Production uses [`HttpFetcher`]; tests inject stubs with canned bodies,
/// artificial delays, or permanent hangs.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<String, FetchError>;
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))
    }
}

fn classify_reqwest_error(e: reqwest::Error, timeout: Duration) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Http(e)
    }
}

/// Outcome of one extraction: candidates plus the fetch error, if any.
/// A fetch error always implies an empty candidate list.
#[derive(Debug, Default)]
pub struct Extraction {
    pub candidates: Vec<RawCandidate>,
    pub error: Option<String>,
}

/// Fetch and parse one source's listing page.
#[instrument(level = "info", skip_all, fields(source = %descriptor.name, region = %descriptor.region))]
pub async fn extract(fetcher: &dyn PageFetcher, descriptor: &SourceDescriptor) -> Extraction {
    match fetcher.fetch(&descriptor.listing_url, descriptor.timeout).await {
        Ok(html) => {
            let candidates = parse_listing(&html, descriptor);
            info!(
                count = candidates.len(),
                url = %descriptor.listing_url,
                "Extracted listing candidates"
            );
            Extraction {
                candidates,
                error: None,
            }
        }
        Err(e) => {
            warn!(error = %e, url = %descriptor.listing_url, "Listing fetch failed");
            Extraction {
                candidates: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}

/// Parse a listing document into raw candidates. Pure over its inputs apart
/// from the `fetched_at` stamp; a fixed fixture parses to an identical
/// ordered candidate list every time.
pub fn parse_listing(html: &str, descriptor: &SourceDescriptor) -> Vec<RawCandidate> {
    let document = Html::parse_document(html);
    let fetched_at = Utc::now();
    let rules = &descriptor.rules;
    let mut candidates = Vec::new();

    let containers = select_containers(&document, &rules.container);
    if containers.is_empty() {
        debug!(source = %descriptor.name, "No containers matched any selector");
        return candidates;
    }

    let mut skipped = 0usize;
    for container in containers {
        let title = first_match(container, &rules.title);
        let link = first_match(container, &rules.link)
            .and_then(|href| descriptor.listing_url.join(href.trim()).ok());
        let (Some(title), Some(link)) = (title, link) else {
            // Containers without both a title and a resolvable link are
            // usually ads or section headers wearing the card class.
            skipped += 1;
            continue;
        };

        candidates.push(RawCandidate {
            title: truncate_title(&title),
            link: link.to_string(),
            image: first_match(container, &rules.image),
            summary: first_match(container, &rules.summary),
            source: descriptor.name.clone(),
            region: descriptor.region.clone(),
            fetched_at,
        });
    }

    if skipped > 0 {
        debug!(source = %descriptor.name, skipped, "Skipped incomplete containers");
    }
    candidates
}

/// Select container nodes using the first selector in the chain that matches
/// at least one node. Document order is preserved.
fn select_containers<'a>(document: &'a Html, chain: &[SelectorSpec]) -> Vec<ElementRef<'a>> {
    for spec in chain {
        let Ok(selector) = Selector::parse(&spec.css) else {
            continue;
        };
        let matched: Vec<ElementRef<'a>> = document.select(&selector).collect();
        if !matched.is_empty() {
            return matched;
        }
    }
    Vec::new()
}

/// Evaluate an ordered fallback chain under one container and return the
/// first non-empty value.
///
/// For a spec with an attribute, the value is that attribute of the first
/// matching element that carries it non-empty; otherwise it is the element's
/// collected text. Selectors are pre-validated at registry load, so a parse
/// failure here just moves on to the next entry.
pub fn first_match(container: ElementRef<'_>, chain: &[SelectorSpec]) -> Option<String> {
    for spec in chain {
        let Ok(selector) = Selector::parse(&spec.css) else {
            continue;
        };
        for element in container.select(&selector) {
            let value = match &spec.attr {
                Some(attr) => element.value().attr(attr).map(str::to_string),
                None => Some(element.text().collect::<Vec<_>>().join(" ")),
            };
            if let Some(value) = value {
                let value = collapse_whitespace(&value);
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
    }
    None
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_LEN {
        title.to_string()
    } else {
        title.chars().take(MAX_TITLE_LEN).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    fn descriptor() -> SourceDescriptor {
        let yaml = r#"
regions:
  - name: assam
    sources:
      - name: sentinel
        url: https://news.example.com
        path: /assam
        selectors:
          container: [".story-card", "article.story"]
          title: ["h3 a", "h2 a"]
          link: ["h3 a", "h2 a"]
          image: ["img@data-src", "img"]
          summary: [".excerpt", "p"]
"#;
        Registry::from_yaml_str(yaml).unwrap().sources_for_region("assam")[0].clone()
    }

    const LISTING: &str = r#"
<html><body>
  <div class="story-card">
    <h3><a href="/assam/floods-2026">  Assam   floods: relief camps open </a></h3>
    <img data-src="https://cdn.example.com/floods.jpg" src="placeholder.gif">
    <p class="excerpt">Camps opened across three districts.</p>
  </div>
  <div class="story-card">
    <h3><a href="https://other.example.org/road-project">Road project cleared</a></h3>
    <p>Work begins in October.</p>
  </div>
  <div class="story-card">
    <h3><a href="/assam/no-title"> </a></h3>
  </div>
  <div class="story-card">
    <h3>Headline without a link</h3>
  </div>
</body></html>
"#;

    #[test]
    fn extracts_candidates_with_fallback_chains() {
        let candidates = parse_listing(LISTING, &descriptor());
        assert_eq!(candidates.len(), 2);

        assert_eq!(candidates[0].title, "Assam floods: relief camps open");
        assert_eq!(
            candidates[0].link,
            "https://news.example.com/assam/floods-2026"
        );
        assert_eq!(
            candidates[0].image.as_deref(),
            Some("https://cdn.example.com/floods.jpg")
        );
        assert_eq!(
            candidates[0].summary.as_deref(),
            Some("Camps opened across three districts.")
        );

        // Absolute link left untouched; summary falls back to the bare <p>.
        assert_eq!(candidates[1].link, "https://other.example.org/road-project");
        assert_eq!(candidates[1].summary.as_deref(), Some("Work begins in October."));
        assert_eq!(candidates[1].image, None);
    }

    #[test]
    fn parse_is_deterministic() {
        let d = descriptor();
        let first = parse_listing(LISTING, &d);
        let second = parse_listing(LISTING, &d);
        let pairs =
            |v: &[RawCandidate]| v.iter().map(|c| (c.title.clone(), c.link.clone())).collect::<Vec<_>>();
        assert_eq!(pairs(&first), pairs(&second));
    }

    #[test]
    fn zero_matching_containers_yields_empty_list() {
        let candidates = parse_listing("<html><body><p>nothing here</p></body></html>", &descriptor());
        assert!(candidates.is_empty());
    }

    #[test]
    fn malformed_html_does_not_panic() {
        let candidates = parse_listing("<div class=\"story-card\"><h3><a href=", &descriptor());
        assert!(candidates.is_empty());
    }

    #[test]
    fn container_chain_falls_back_in_order() {
        let html = r#"
<article class="story">
  <h2><a href="/second-shape">New markup after redesign</a></h2>
</article>
"#;
        let candidates = parse_listing(html, &descriptor());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "New markup after redesign");
        assert_eq!(candidates[0].link, "https://news.example.com/second-shape");
    }

    #[test]
    fn long_titles_are_truncated() {
        let long = "x".repeat(MAX_TITLE_LEN + 50);
        let html = format!(
            r#"<div class="story-card"><h3><a href="/long">{long}</a></h3></div>"#
        );
        let candidates = parse_listing(&html, &descriptor());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title.chars().count(), MAX_TITLE_LEN);
    }

    #[test]
    fn skips_containers_missing_title_or_link() {
        // Of the four cards in LISTING, two lack a title or a link.
        let candidates = parse_listing(LISTING, &descriptor());
        assert!(candidates.iter().all(|c| !c.title.is_empty()));
        assert!(candidates.iter().all(|c| c.link.starts_with("http")));
    }
}
