use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::default::Default;
use url::Url;

use crate::parser::DEFAULT_SECTIONS;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// README location: an http(s) URL or a local file path
    #[serde(default = "default_source")]
    pub source: String,

    /// Section keys recognized in the README, in priority order
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,

    /// Search service settings
    #[serde(default)]
    pub search: SearchConfig,

    /// PDF download settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Search service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchConfig {
    /// Semantic Scholar Graph API base URL
    #[serde(default = "default_semantic_scholar_endpoint")]
    pub semantic_scholar_endpoint: String,

    /// Semantic Scholar API key (optional; unauthenticated requests are heavily throttled)
    #[serde(default)]
    pub semantic_scholar_api_key: String,

    /// arXiv query API URL
    #[serde(default = "default_arxiv_endpoint")]
    pub arxiv_endpoint: String,

    /// Delay in milliseconds after each Semantic Scholar request
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            semantic_scholar_endpoint: default_semantic_scholar_endpoint(),
            semantic_scholar_api_key: String::new(),
            arxiv_endpoint: default_arxiv_endpoint(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

/// PDF download configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DownloadConfig {
    /// Directory receiving the PDFs
    #[serde(default = "default_download_dir")]
    pub output_dir: String,

    /// Existing files larger than this are not downloaded again
    #[serde(default = "default_min_existing_bytes")]
    pub min_existing_bytes: u64,

    /// Maximum title characters kept in a file name
    #[serde(default = "default_max_filename_chars")]
    pub max_filename_chars: usize,

    /// Download timeout in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of papers resolved and downloaded at the same time
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_download_dir(),
            min_existing_bytes: default_min_existing_bytes(),
            max_filename_chars: default_max_filename_chars(),
            timeout_secs: default_download_timeout_secs(),
            concurrent_downloads: default_concurrent_downloads(),
        }
    }
}

/// Report output configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReportConfig {
    /// Directory receiving the JSON summary and result sheets
    #[serde(default = "default_report_dir")]
    pub output_dir: String,

    /// Whether to write the downloaded/failed sheets (xlsx, CSV on failure)
    #[serde(default = "default_true", alias = "write_csv")]
    pub write_tables: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_report_dir(),
            write_tables: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Equivalent `log` crate filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source() -> String {
    "https://raw.githubusercontent.com/SarahRastegar/Best-Papers-Top-Venues/main/README.md".to_string()
}

fn default_sections() -> Vec<String> {
    DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect()
}

fn default_semantic_scholar_endpoint() -> String {
    "https://api.semanticscholar.org/graph/v1".to_string()
}

fn default_arxiv_endpoint() -> String {
    "http://export.arxiv.org/api/query".to_string()
}

fn default_request_delay_ms() -> u64 {
    1000 // Semantic Scholar allows one request per second
}

fn default_search_timeout_secs() -> u64 {
    30
}

fn default_download_dir() -> String {
    "downloaded_papers".to_string()
}

fn default_min_existing_bytes() -> u64 {
    1000
}

fn default_max_filename_chars() -> usize {
    80
}

fn default_download_timeout_secs() -> u64 {
    30
}

fn default_concurrent_downloads() -> usize {
    1
}

fn default_report_dir() -> String {
    ".".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(anyhow!("A README source URL or path is required"));
        }

        if self.sections.is_empty() {
            return Err(anyhow!("At least one section must be configured"));
        }

        let mut seen = HashSet::new();
        for section in &self.sections {
            if section.trim().is_empty() {
                return Err(anyhow!("Section names must not be empty"));
            }
            if !seen.insert(section.to_lowercase()) {
                return Err(anyhow!("Duplicate section name: {}", section));
            }
        }

        if self.download.concurrent_downloads == 0 {
            return Err(anyhow!("concurrent_downloads must be at least 1"));
        }

        if self.download.max_filename_chars == 0 {
            return Err(anyhow!("max_filename_chars must be at least 1"));
        }

        for endpoint in [&self.search.semantic_scholar_endpoint, &self.search.arxiv_endpoint] {
            Url::parse(endpoint).map_err(|e| anyhow!("Invalid search endpoint '{}': {}", endpoint, e))?;
        }

        Ok(())
    }

    /// API key for Semantic Scholar, if one is configured
    pub fn semantic_scholar_api_key(&self) -> Option<String> {
        let key = self.search.semantic_scholar_api_key.trim();
        (!key.is_empty()).then(|| key.to_string())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source: default_source(),
            sections: default_sections(),
            search: SearchConfig::default(),
            download: DownloadConfig::default(),
            report: ReportConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
