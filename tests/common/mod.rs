//! Shared stubs and builders for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use regional_news_scraper::extract::{FetchError, PageFetcher};
use regional_news_scraper::registry::{Registry, SourceDescriptor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Registry with one plain source and selector chains matching the fixtures.
pub fn fixture_registry() -> Registry {
    Registry::from_yaml_str(
        r#"
regions:
  - name: assam
    aliases: ["guwahati", "brahmaputra"]
    sources:
      - name: sentinel
        url: https://news.example.com
        path: /assam
        selectors:
          container: [".story-card"]
          title: ["h3 a"]
          link: ["h3 a"]
          image: ["img@data-src", "img"]
          summary: [".excerpt"]
        timeout_secs: 5
        min_articles: 2
"#,
    )
    .expect("fixture registry must be valid")
}

pub fn fixture_descriptor() -> SourceDescriptor {
    fixture_registry().sources_for_region("assam")[0].clone()
}

/// A registry with `n` identically shaped sources, for orchestrator tests.
pub fn many_sources(n: usize) -> Vec<SourceDescriptor> {
    let template = fixture_descriptor();
    (0..n)
        .map(|i| {
            let mut d = template.clone();
            d.name = format!("source-{i}");
            d.listing_url = Url::parse(&format!("https://news{i}.example.com/assam")).unwrap();
            d
        })
        .collect()
}

/// Serves a fixed body for every URL.
pub struct FixtureFetcher {
    pub body: String,
}

impl FixtureFetcher {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
        }
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, _url: &Url, _timeout: Duration) -> Result<String, FetchError> {
        Ok(self.body.clone())
    }
}

/// Serves a fixed body after a delay, tracking how many fetches are in
/// flight at once.
pub struct GaugedFetcher {
    pub body: String,
    pub delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl GaugedFetcher {
    pub fn new(body: &str, delay: Duration) -> Self {
        Self {
            body: body.to_string(),
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn total_fetches(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for GaugedFetcher {
    async fn fetch(&self, _url: &Url, _timeout: Duration) -> Result<String, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

/// Never resolves within any realistic test budget.
pub struct HangingFetcher;

#[async_trait]
impl PageFetcher for HangingFetcher {
    async fn fetch(&self, _url: &Url, _timeout: Duration) -> Result<String, FetchError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(String::new())
    }
}
