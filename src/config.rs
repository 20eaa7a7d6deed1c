//! Pipeline configuration
//!
//! The pipeline is driven by a TOML file with three sections mirroring the
//! run environment:
//!
//! ```toml
//! [catalog]
//! platform = "Sentinel-2"
//! product_type = "S2MSI1C"
//! username = "user"
//! password = "secret"
//! portal_url = "https://apihub.copernicus.eu/apihub"
//! tiles = ["52JFS", "52JGS"]
//! start_date = "2018-11-01"
//! end_date = "2018-11-30"
//!
//! [extraction]
//! bands = ["B02", "B03", "B04", "B08", "TCI", "PVI"]
//! downloads_dir = "/data/sentinel/downloads"
//! tiles_dir = "/data/sentinel/tiles"
//! previews_dir = "/data/sentinel/previews"
//!
//! [pipeline]
//! queue_capacity = 4
//! ```
//!
//! [`PipelineConfig::load`] deserializes the file; [`PipelineConfig::validate`]
//! enforces the fatal preconditions (in particular a missing staging
//! directory aborts the run before any download starts) and creates the
//! tiles/previews roots when absent.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::naming;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {reason}")]
    Read {
        /// Path that was attempted
        path: PathBuf,
        /// Underlying I/O failure
        reason: String,
    },

    /// Config file could not be parsed
    #[error("failed to parse config file: {0}")]
    Parse(String),

    /// A configured value is invalid
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The download staging directory does not exist (misconfiguration, fatal)
    #[error("download staging directory does not exist: {0}")]
    MissingStagingDirectory(PathBuf),

    /// An output root directory could not be created
    #[error("failed to create output directory {path}: {reason}")]
    CreateDirectory {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O failure
        reason: String,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete, typed pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Catalog connection and query parameters
    pub catalog: CatalogSection,
    /// Extraction layout and band selection
    pub extraction: ExtractionSection,
    /// Pipeline tuning knobs
    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// `[catalog]` section: portal credentials and query filters.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSection {
    /// Platform name used as a query filter
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Product type used as a query filter
    #[serde(default = "default_product_type")]
    pub product_type: String,
    /// Portal account username
    pub username: String,
    /// Portal account password
    pub password: String,
    /// Portal base URL
    pub portal_url: String,
    /// Tile grid references to query, one catalog query each
    pub tiles: Vec<String>,
    /// Inclusive query start date, `YYYY-MM-DD`
    pub start_date: String,
    /// Inclusive query end date, `YYYY-MM-DD`
    pub end_date: String,
}

/// `[extraction]` section: band selection and output roots.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSection {
    /// Band allow-list; entries outside this list are never written
    pub bands: Vec<String>,
    /// Band converted to a browse preview instead of being retained as raster
    #[serde(default = "default_preview_band")]
    pub preview_band: String,
    /// Staging directory archives are downloaded into (must pre-exist)
    pub downloads_dir: PathBuf,
    /// Root of the extracted tile layout
    pub tiles_dir: PathBuf,
    /// Root of the derived preview images
    pub previews_dir: PathBuf,
    /// Workflow name resolved through the workflow registry
    #[serde(default = "default_workflow")]
    pub workflow: String,
}

/// `[pipeline]` section: work queue tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Bounded work queue capacity; the producer blocks when the consumer
    /// lags this far behind
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_platform() -> String {
    "Sentinel-2".to_string()
}

fn default_product_type() -> String {
    "S2MSI1C".to_string()
}

fn default_preview_band() -> String {
    naming::PREVIEW_BAND.to_string()
}

fn default_workflow() -> String {
    "sentinel2".to_string()
}

fn default_queue_capacity() -> usize {
    4
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration and prepare output roots.
    ///
    /// A missing staging directory is fatal: it is treated as a
    /// misconfiguration, not a runtime fault, and aborts the run before the
    /// producer starts. The tiles and previews roots are created when absent.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.catalog.tiles.is_empty() {
            return Err(ConfigError::Invalid("tile list is empty".to_string()));
        }
        if self.extraction.bands.is_empty() {
            return Err(ConfigError::Invalid("band allow-list is empty".to_string()));
        }
        if self.pipeline.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be at least 1".to_string(),
            ));
        }

        let start = parse_date(&self.catalog.start_date, "start_date")?;
        let end = parse_date(&self.catalog.end_date, "end_date")?;
        if start > end {
            return Err(ConfigError::Invalid(format!(
                "start_date {start} is after end_date {end}"
            )));
        }

        if !self.extraction.downloads_dir.is_dir() {
            return Err(ConfigError::MissingStagingDirectory(
                self.extraction.downloads_dir.clone(),
            ));
        }

        for root in [&self.extraction.tiles_dir, &self.extraction.previews_dir] {
            std::fs::create_dir_all(root).map_err(|e| ConfigError::CreateDirectory {
                path: root.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

fn parse_date(value: &str, field: &str) -> ConfigResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ConfigError::Invalid(format!("{field} '{value}' is not a YYYY-MM-DD date")))
}
