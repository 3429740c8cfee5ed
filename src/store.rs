//! The persistence collaborator seam.
//!
//! The pipeline treats storage as an opaque store with exactly two
//! operations: read the fingerprints already persisted for a region, and
//! insert a batch of articles. Dedup happens upstream, so the store makes no
//! uniqueness promises; it simply skips any article whose fingerprint it
//! already holds. Duplicate insert attempts are tolerated, never errors.
//!
//! Two implementations:
//! - [`MemoryStore`] for tests and `--dry-run`
//! - [`JsonStore`] persisting one JSON file per region under a data directory

use crate::models::CanonicalArticle;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store data is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Opaque article store consulted for cross-run dedup and written once per
/// source pipeline.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Fingerprints of every article persisted for `region`.
    async fn existing_fingerprints(&self, region: &str) -> Result<HashSet<String>, StoreError>;

    /// Insert articles, skipping any whose fingerprint the store already
    /// holds for its region. Returns the number actually inserted.
    async fn insert_many(&self, articles: &[CanonicalArticle]) -> Result<usize, StoreError>;
}

/// In-memory store. Articles grouped by region behind one mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    regions: Mutex<HashMap<String, Vec<CanonicalArticle>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything persisted for a region, in insertion order.
    pub fn articles_for_region(&self, region: &str) -> Vec<CanonicalArticle> {
        self.regions
            .lock()
            .expect("memory store poisoned")
            .get(region)
            .cloned()
            .unwrap_or_default()
    }

    pub fn total_articles(&self) -> usize {
        self.regions
            .lock()
            .expect("memory store poisoned")
            .values()
            .map(Vec::len)
            .sum()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn existing_fingerprints(&self, region: &str) -> Result<HashSet<String>, StoreError> {
        let regions = self.regions.lock().expect("memory store poisoned");
        Ok(regions
            .get(region)
            .map(|articles| articles.iter().map(|a| a.fingerprint.clone()).collect())
            .unwrap_or_default())
    }

    async fn insert_many(&self, articles: &[CanonicalArticle]) -> Result<usize, StoreError> {
        let mut regions = self.regions.lock().expect("memory store poisoned");
        let mut inserted = 0usize;
        for article in articles {
            let bucket = regions.entry(article.region.clone()).or_default();
            if bucket.iter().any(|a| a.fingerprint == article.fingerprint) {
                continue;
            }
            bucket.push(article.clone());
            inserted += 1;
        }
        Ok(inserted)
    }
}

/// File-backed store: `{root}/{region}.json`, each file a JSON array of
/// canonical articles.
///
/// Reads and writes go through one async mutex, so concurrent source
/// pipelines inserting into the same region cannot lose each other's
/// updates. Single-process by design; the real deployment runs one scrape
/// batch at a time.
pub struct JsonStore {
    root: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn region_path(&self, region: &str) -> PathBuf {
        // Region names come from the validated registry, but sanitize anyway
        // so a hostile name cannot escape the data directory.
        let safe: String = region
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.root.join(format!("{safe}.json"))
    }

    async fn read_region(&self, path: &Path) -> Result<Vec<CanonicalArticle>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ArticleStore for JsonStore {
    async fn existing_fingerprints(&self, region: &str) -> Result<HashSet<String>, StoreError> {
        let articles = self.read_region(&self.region_path(region)).await?;
        Ok(articles.into_iter().map(|a| a.fingerprint).collect())
    }

    async fn insert_many(&self, articles: &[CanonicalArticle]) -> Result<usize, StoreError> {
        if articles.is_empty() {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.root).await?;

        let mut by_region: HashMap<&str, Vec<&CanonicalArticle>> = HashMap::new();
        for article in articles {
            by_region.entry(article.region.as_str()).or_default().push(article);
        }

        let mut inserted = 0usize;
        for (region, batch) in by_region {
            let path = self.region_path(region);
            let mut persisted = self.read_region(&path).await?;
            let mut fingerprints: HashSet<String> =
                persisted.iter().map(|a| a.fingerprint.clone()).collect();

            let before = persisted.len();
            for article in batch {
                if fingerprints.insert(article.fingerprint.clone()) {
                    persisted.push((*article).clone());
                }
            }
            let added = persisted.len() - before;
            if added > 0 {
                let json = serde_json::to_vec_pretty(&persisted)?;
                tokio::fs::write(&path, json).await?;
                debug!(region, added, path = %path.display(), "Persisted region articles");
            }
            inserted += added;
        }

        info!(inserted, "Store insert complete");
        Ok(inserted)
    }
}
