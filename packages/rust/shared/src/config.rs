//! Application configuration for bandmeta.
//!
//! User config lives at `~/.bandmeta/bandmeta.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BandMetaError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "bandmeta.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".bandmeta";

// ---------------------------------------------------------------------------
// Config structs (matching bandmeta.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Query defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Number of similar-artist listing pages to read.
    #[serde(default = "default_pages")]
    pub pages: u32,

    /// Number of leading listing pages to skip.
    #[serde(default)]
    pub page_offset: u32,

    /// Collector workers; 1 means sequential collection.
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Template applied to hyperlinked biography text.
    #[serde(default = "default_ref_format")]
    pub wiki_ref_format: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            pages: default_pages(),
            page_offset: 0,
            workers: default_workers(),
            wiki_ref_format: default_ref_format(),
        }
    }
}

fn default_pages() -> u32 {
    5
}
fn default_workers() -> u32 {
    1
}
fn default_ref_format() -> String {
    "%q".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Site root every page path is resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Overall deadline shared by all concurrent collector workers.
    #[serde(default = "default_collect_deadline_secs")]
    pub collect_deadline_secs: u64,

    /// Maximum redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            collect_deadline_secs: default_collect_deadline_secs(),
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.last.fm".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_collect_deadline_secs() -> u64 {
    30
}
fn default_max_redirects() -> usize {
    10
}

// ---------------------------------------------------------------------------
// Query config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Upper bound on similar-artists pages read by one query.
pub const MAX_PAGES: u32 = 1_000;

/// Upper bound on similar-artists collector workers.
pub const MAX_WORKERS: u32 = 64;

/// Which optional extraction stages run after the overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stages {
    pub wiki: bool,
    pub tags: bool,
    pub similar_artists: bool,
    pub events: bool,
}

/// Runtime query configuration, merged from config file + CLI flags.
///
/// Passed by reference into every stage; nothing reads process-wide state.
#[derive(Debug, Clone, Serialize)]
pub struct QueryConfig {
    /// Band identifier as it appears in the site's URLs.
    pub band: String,
    /// Optional stages to run.
    pub stages: Stages,
    /// Number of similar-artist pages (`P`).
    pub pages: u32,
    /// Page offset (`O`).
    pub page_offset: u32,
    /// Worker count (`W`).
    pub workers: u32,
    /// Quoting template for hyperlinked biography text.
    pub wiki_ref_format: String,
    /// HTTP transport settings.
    pub http: HttpConfig,
}

impl QueryConfig {
    /// Build a query for `band` using the file defaults; all stages off.
    pub fn new(band: impl Into<String>, config: &AppConfig) -> Self {
        Self {
            band: band.into(),
            stages: Stages::default(),
            pages: config.defaults.pages,
            page_offset: config.defaults.page_offset,
            workers: config.defaults.workers,
            wiki_ref_format: config.defaults.wiki_ref_format.clone(),
            http: config.http.clone(),
        }
    }

    /// Check the query before any request is made.
    pub fn validate(&self) -> Result<()> {
        if self.band.trim().is_empty() {
            return Err(BandMetaError::validation("band name is required"));
        }
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(BandMetaError::validation(format!(
                "workers must be between 1 and {MAX_WORKERS}, got {}",
                self.workers
            )));
        }
        if !(1..=MAX_PAGES).contains(&self.pages) {
            return Err(BandMetaError::validation(format!(
                "similar artists pages must be between 1 and {MAX_PAGES}, got {}",
                self.pages
            )));
        }
        if self.page_offset.checked_add(self.pages).is_none() {
            return Err(BandMetaError::validation(format!(
                "page offset {} plus {} pages is out of range",
                self.page_offset, self.pages
            )));
        }
        Url::parse(&self.http.base_url).map_err(|e| {
            BandMetaError::validation(format!("invalid base URL {}: {e}", self.http.base_url))
        })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.bandmeta/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BandMetaError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.bandmeta/bandmeta.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BandMetaError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| BandMetaError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BandMetaError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| BandMetaError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BandMetaError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(toml_str.contains("wiki_ref_format"));
        assert!(toml_str.contains("https://www.last.fm"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[defaults]
workers = 4

[http]
base_url = "http://localhost:8080"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.workers, 4);
        assert_eq!(config.defaults.pages, 5);
        assert_eq!(config.defaults.page_offset, 0);
        assert_eq!(config.defaults.wiki_ref_format, "%q");
        assert_eq!(config.http.base_url, "http://localhost:8080");
        assert_eq!(config.http.collect_deadline_secs, 30);
    }

    #[test]
    fn query_config_from_app_config() {
        let query = QueryConfig::new("Cocteau Twins", &AppConfig::default());
        assert_eq!(query.pages, 5);
        assert_eq!(query.workers, 1);
        assert_eq!(query.stages, Stages::default());
        assert!(query.validate().is_ok());
    }

    #[test]
    fn empty_band_is_rejected() {
        let query = QueryConfig::new("  ", &AppConfig::default());
        let err = query.validate().unwrap_err();
        assert!(matches!(err, BandMetaError::Validation { .. }));
        assert!(err.to_string().contains("band name is required"));
    }

    #[test]
    fn zero_workers_and_bad_url_are_rejected() {
        let mut query = QueryConfig::new("Lush", &AppConfig::default());
        query.workers = 0;
        assert!(query.validate().is_err());

        query.workers = MAX_WORKERS + 1;
        assert!(query.validate().is_err());

        query.workers = 2;
        query.http.base_url = "not a url".into();
        assert!(query.validate().is_err());
    }

    #[test]
    fn page_range_is_bounded() {
        let mut query = QueryConfig::new("Lush", &AppConfig::default());

        query.pages = 0;
        let err = query.validate().unwrap_err();
        assert!(matches!(err, BandMetaError::Validation { .. }));

        query.pages = MAX_PAGES + 1;
        assert!(matches!(query.validate(), Err(BandMetaError::Validation { .. })));

        query.pages = MAX_PAGES;
        assert!(query.validate().is_ok());

        query.pages = 2;
        query.page_offset = u32::MAX - 1;
        let err = query.validate().unwrap_err();
        assert!(err.to_string().contains("out of range"));

        query.page_offset = u32::MAX - 2;
        assert!(query.validate().is_ok());
    }
}
