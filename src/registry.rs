//! The source registry: a declarative mapping from region to scraping targets.
//!
//! Sources are configured in YAML, not code. Adding a source means adding a
//! descriptor to the registry file; the pipeline never special-cases a site.
//!
//! ```yaml
//! regions:
//!   - name: assam
//!     aliases: ["guwahati"]
//!     sources:
//!       - name: sentinel
//!         url: https://www.sentinelassam.com
//!         path: /north-east-india-news/assam-news
//!         selectors:
//!           container: [".story-card", "article"]
//!           title: ["h3 a", "h2 a"]
//!           link: ["h3 a", "h2 a"]
//!           image: ["img@data-src", "img"]
//!           summary: [".excerpt"]
//!         timeout_secs: 10
//!         min_articles: 3
//! ```
//!
//! Every descriptor is validated once, at load time. A missing name, an
//! unparseable URL, an empty title/link selector chain, or a selector that
//! does not compile fails registry construction with a [`ConfigError`] naming
//! the offending source. Authoring mistakes surface immediately, never as a
//! mysterious all-fail scrape later.

use scraper::Selector;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use url::Url;

/// Registry YAML shipped with the binary, used when `--config` is not given.
pub const DEFAULT_REGISTRY_YAML: &str = include_str!("../config/sources.yaml");

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MIN_ARTICLES: usize = 3;

/// A registry authoring or loading error. Always fatal at load time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read registry file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse registry YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("region {region:?} has a source with an empty name")]
    MissingName { region: String },
    #[error("source {source:?} in region {region:?} has no listing URL")]
    MissingUrl { region: String, r#source: String },
    #[error("source {source:?} has an invalid listing URL {url:?}: {reason}")]
    InvalidUrl {
        r#source: String,
        url: String,
        reason: String,
    },
    #[error("source {source:?} is missing a {field} selector chain")]
    MissingSelectors {
        r#source: String,
        field: &'static str,
    },
    #[error("source {source:?} has an unparseable {field} selector {selector:?}")]
    BadSelector {
        r#source: String,
        field: &'static str,
        selector: String,
    },
    #[error("duplicate source name {source:?} in region {region:?}")]
    DuplicateSource { region: String, r#source: String },
}

/// One CSS selector plus the value to take from the matched element:
/// an attribute when `attr` is set, the collected text otherwise.
///
/// Authored as a plain string, with an optional `@attr` suffix
/// (`"img@data-src"` reads the `data-src` attribute of the first `img`).
/// Link chains default to `@href` and image chains to `@src` when no
/// attribute is spelled out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSpec {
    pub css: String,
    pub attr: Option<String>,
}

impl SelectorSpec {
    fn parse(raw: &str, default_attr: Option<&str>) -> Option<Self> {
        let (css, attr) = match raw.rsplit_once('@') {
            Some((css, attr)) if !attr.is_empty() => (css, Some(attr.to_string())),
            _ => (raw, default_attr.map(str::to_string)),
        };
        let css = css.trim();
        if css.is_empty() {
            return None;
        }
        Some(SelectorSpec {
            css: css.to_string(),
            attr,
        })
    }
}

/// Ordered fallback selector chains for the five extracted fields.
///
/// Chains are evaluated in declared order and the first selector yielding a
/// non-empty value wins, so a descriptor can survive minor site redesigns by
/// listing the old selector after the new one.
#[derive(Debug, Clone)]
pub struct SelectorRules {
    pub container: Vec<SelectorSpec>,
    pub title: Vec<SelectorSpec>,
    pub link: Vec<SelectorSpec>,
    pub image: Vec<SelectorSpec>,
    pub summary: Vec<SelectorSpec>,
}

/// Validated configuration for one scraping target. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    /// Source name, unique within its region.
    pub name: String,
    /// Region this source is registered under.
    pub region: String,
    /// Alias names for the region, used by the geo-relevance filter.
    pub region_aliases: Vec<String>,
    /// Fully resolved listing page URL.
    pub listing_url: Url,
    /// Selector chains for container and field extraction.
    pub rules: SelectorRules,
    /// Per-request fetch timeout.
    pub timeout: Duration,
    /// Below this many valid articles the run is classified a warning.
    pub min_articles: usize,
    /// True for multi-region aggregators whose listings mix regions; only
    /// these go through the geo-relevance filter.
    pub aggregator: bool,
}

/// One region and its ordered list of sources.
#[derive(Debug, Clone)]
pub struct RegionEntry {
    pub name: String,
    pub aliases: Vec<String>,
    pub sources: Vec<SourceDescriptor>,
}

/// Immutable region → sources mapping, validated at construction.
#[derive(Debug, Clone)]
pub struct Registry {
    regions: Vec<RegionEntry>,
}

// Raw deserialization shapes; turned into validated descriptors below.

#[derive(Debug, Deserialize)]
struct RegistryFile {
    regions: Vec<RegionFile>,
}

#[derive(Debug, Deserialize)]
struct RegionFile {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    sources: Vec<SourceFile>,
}

#[derive(Debug, Deserialize)]
struct SourceFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    selectors: SelectorFile,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    min_articles: Option<usize>,
    #[serde(default)]
    aggregator: bool,
}

#[derive(Debug, Default, Deserialize)]
struct SelectorFile {
    #[serde(default)]
    container: Vec<String>,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    link: Vec<String>,
    #[serde(default)]
    image: Vec<String>,
    #[serde(default)]
    summary: Vec<String>,
}

impl Registry {
    /// Parse and validate a registry from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile = serde_yaml::from_str(yaml)?;
        let mut regions = Vec::with_capacity(file.regions.len());
        for region in file.regions {
            let mut sources = Vec::with_capacity(region.sources.len());
            for source in region.sources {
                let descriptor =
                    validate_source(&region.name, &region.aliases, source)?;
                if sources
                    .iter()
                    .any(|s: &SourceDescriptor| s.name == descriptor.name)
                {
                    return Err(ConfigError::DuplicateSource {
                        region: region.name.clone(),
                        source: descriptor.name,
                    });
                }
                sources.push(descriptor);
            }
            regions.push(RegionEntry {
                name: region.name,
                aliases: region.aliases,
                sources,
            });
        }
        let total: usize = regions.iter().map(|r| r.sources.len()).sum();
        info!(
            regions = regions.len(),
            sources = total,
            "Loaded source registry"
        );
        Ok(Registry { regions })
    }

    /// Load and validate a registry from a YAML file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// The registry compiled into the binary.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_yaml_str(DEFAULT_REGISTRY_YAML)
    }

    /// Sources for one region, in declared order. Unknown regions yield an
    /// empty slice rather than an error.
    pub fn sources_for_region(&self, region: &str) -> &[SourceDescriptor] {
        self.regions
            .iter()
            .find(|r| r.name == region)
            .map(|r| r.sources.as_slice())
            .unwrap_or(&[])
    }

    pub fn region(&self, name: &str) -> Option<&RegionEntry> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn regions(&self) -> impl Iterator<Item = &RegionEntry> {
        self.regions.iter()
    }

    /// All descriptors across all regions, in registry order.
    pub fn all_sources(&self) -> Vec<SourceDescriptor> {
        self.regions
            .iter()
            .flat_map(|r| r.sources.iter().cloned())
            .collect()
    }

    /// Drop every region not named in `keep`. No-op when `keep` is empty.
    pub fn retain_regions(&mut self, keep: &[String]) {
        if keep.is_empty() {
            return;
        }
        self.regions.retain(|r| keep.iter().any(|k| k == &r.name));
    }
}

fn validate_source(
    region: &str,
    aliases: &[String],
    source: SourceFile,
) -> Result<SourceDescriptor, ConfigError> {
    let name = source.name.trim().to_string();
    if name.is_empty() {
        return Err(ConfigError::MissingName {
            region: region.to_string(),
        });
    }
    if source.url.trim().is_empty() {
        return Err(ConfigError::MissingUrl {
            region: region.to_string(),
            source: name,
        });
    }

    let base = Url::parse(source.url.trim()).map_err(|e| ConfigError::InvalidUrl {
        source: name.clone(),
        url: source.url.clone(),
        reason: e.to_string(),
    })?;
    let listing_url = match &source.path {
        Some(path) => base.join(path).map_err(|e| ConfigError::InvalidUrl {
            source: name.clone(),
            url: format!("{}{}", source.url, path),
            reason: e.to_string(),
        })?,
        None => base,
    };
    if !matches!(listing_url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            source: name,
            url: listing_url.to_string(),
            reason: "scheme must be http or https".to_string(),
        });
    }

    let rules = SelectorRules {
        container: build_chain(&name, "container", &source.selectors.container, None, true)?,
        title: build_chain(&name, "title", &source.selectors.title, None, true)?,
        link: build_chain(&name, "link", &source.selectors.link, Some("href"), true)?,
        image: build_chain(&name, "image", &source.selectors.image, Some("src"), false)?,
        summary: build_chain(&name, "summary", &source.selectors.summary, None, false)?,
    };

    Ok(SourceDescriptor {
        name,
        region: region.to_string(),
        region_aliases: aliases.to_vec(),
        listing_url,
        rules,
        timeout: Duration::from_secs(source.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        min_articles: source.min_articles.unwrap_or(DEFAULT_MIN_ARTICLES),
        aggregator: source.aggregator,
    })
}

fn build_chain(
    source: &str,
    field: &'static str,
    raw: &[String],
    default_attr: Option<&str>,
    required: bool,
) -> Result<Vec<SelectorSpec>, ConfigError> {
    if required && raw.is_empty() {
        return Err(ConfigError::MissingSelectors {
            source: source.to_string(),
            field,
        });
    }
    let mut chain = Vec::with_capacity(raw.len());
    for entry in raw {
        let spec = SelectorSpec::parse(entry, default_attr).ok_or_else(|| {
            ConfigError::BadSelector {
                source: source.to_string(),
                field,
                selector: entry.clone(),
            }
        })?;
        if Selector::parse(&spec.css).is_err() {
            return Err(ConfigError::BadSelector {
                source: source.to_string(),
                field,
                selector: entry.clone(),
            });
        }
        chain.push(spec);
    }
    Ok(chain)
}
