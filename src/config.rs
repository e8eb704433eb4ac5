use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::constants::DEFAULT_PUBLISHER_KEYWORDS;
use crate::error::{HarvestError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "harvester.toml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub term: String,
    pub start_year: i32,
    /// Upper bound for OpenAlex's `publication_year` filter
    pub end_year: i32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            term: "Blanchot".to_string(),
            start_year: 1998,
            end_year: 2025,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_delay_ms: u64,
    pub timeout_seconds: u64,
    /// Sent to Crossref and OpenAlex for their polite pools
    pub mailto: Option<String>,
    pub openalex_per_page: u32,
    pub crossref_rows: u32,
    pub hal_rows: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 100,
            timeout_seconds: 30,
            mailto: None,
            openalex_per_page: 200,
            crossref_rows: 1000,
            hal_rows: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    Both,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "outputs/data".to_string(),
            format: OutputFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub publisher_keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            publisher_keywords: DEFAULT_PUBLISHER_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load `harvester.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        let mut config = if config_path.exists() {
            let config_content = fs::read_to_string(config_path).map_err(|e| {
                HarvestError::Config(format!("Failed to read config file '{}': {}", config_path.display(), e))
            })?;
            Self::from_toml(&config_content)?
        } else {
            debug!("No config file at {}; using defaults", config_path.display());
            Config::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Override values from `HARVEST_*` variables; `lookup` abstracts the environment
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(term) = lookup("HARVEST_SEARCH_TERM") {
            self.search.term = term;
        }
        if let Some(year) = lookup("HARVEST_START_YEAR") {
            self.search.start_year = parse_env("HARVEST_START_YEAR", &year)?;
        }
        if let Some(year) = lookup("HARVEST_END_YEAR") {
            self.search.end_year = parse_env("HARVEST_END_YEAR", &year)?;
        }
        if let Some(mailto) = lookup("HARVEST_MAILTO") {
            self.http.mailto = Some(mailto);
        }
        if let Some(delay) = lookup("HARVEST_REQUEST_DELAY_MS") {
            self.http.request_delay_ms = parse_env("HARVEST_REQUEST_DELAY_MS", &delay)?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| HarvestError::Config(format!("{} has invalid value '{}'", key, value)))
}
