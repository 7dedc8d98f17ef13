//! Pipeline configuration.
//!
//! The configuration system layers these sources, later ones overriding
//! earlier ones:
//! - Bundled defaults (include_str! from img10.toml)
//! - User config (~/.config/img10/img10.toml, then ./img10.toml)
//! - An explicit file (`--config` on the command line)
//! - Environment variables prefixed `IMG10__` (`IMG10__STORAGE__QUOTA_BYTES`)

use chrono::TimeDelta;
use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use img10_core::{FitMode, OutputFormat, ThumbnailSpec};
use img10_error::{ConfigError, Img10Error, Img10Result};
use img10_sniff::AllowList;
use img10_thumbnail::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../img10.toml");

/// When thumbnails are derived relative to ingestion.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum DerivationMode {
    /// Render every requested spec before `ingest` returns
    #[default]
    #[display("synchronous")]
    Synchronous,
    /// Report specs as pending and render on first retrieval
    #[display("deferred")]
    Deferred,
    /// Report specs as pending and render on a spawned task
    #[display("background")]
    Background,
}

/// Storage roots and quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root for original uploads
    pub uploads_dir: PathBuf,
    /// Root for rendered thumbnails
    pub thumbnails_dir: PathBuf,
    /// Directory holding `index.json`
    pub config_dir: PathBuf,
    /// Byte budget applied to each storage root separately
    pub quota_bytes: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            thumbnails_dir: PathBuf::from("thumbnails"),
            config_dir: PathBuf::from("config"),
            quota_bytes: None,
        }
    }
}

impl StorageConfig {
    /// All three roots beneath `base`.
    pub fn under(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            uploads_dir: base.join("uploads"),
            thumbnails_dir: base.join("thumbnails"),
            config_dir: base.join("config"),
            quota_bytes: None,
        }
    }

    /// Location of the persisted metadata index.
    pub fn index_path(&self) -> PathBuf {
        self.config_dir.join("index.json")
    }
}

/// Backoff applied to transient storage failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Base delay of the exponential backoff
    pub initial_backoff_ms: u64,
    /// Ceiling for a single delay
    pub max_delay_ms: u64,
    /// Retries after the first attempt; zero disables retrying
    pub max_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 50,
            max_delay_ms: 2_000,
            max_retries: 3,
        }
    }
}

/// Configuration for an [`IngestionPipeline`](crate::IngestionPipeline).
///
/// # Example
///
/// ```
/// use img10_pipeline::{DerivationMode, PipelineConfigBuilder};
///
/// let config = PipelineConfigBuilder::default()
///     .max_upload_bytes(1024u64)
///     .derivation(DerivationMode::Deferred)
///     .build()
///     .unwrap();
/// assert_eq!(*config.max_upload_bytes(), 1024);
/// assert_eq!(config.default_specs().len(), 1);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default, setter(into))]
#[serde(default)]
pub struct PipelineConfig {
    /// Largest accepted upload in bytes
    max_upload_bytes: u64,
    /// Media types accepted for ingestion
    allowed_types: AllowList,
    /// Specs derived when an upload names none
    default_specs: Vec<ThumbnailSpec>,
    /// When thumbnails are derived
    derivation: DerivationMode,
    /// Deadline for one generation
    generation_timeout_secs: u64,
    /// Age after which assets expire; `None` or `0` keeps them forever
    retention_hours: Option<u64>,
    /// Storage roots and quota
    storage: StorageConfig,
    /// Renderer options
    generator: GeneratorConfig,
    /// Storage retry policy
    retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            allowed_types: AllowList::default(),
            default_specs: vec![
                ThumbnailSpec::new(200, 200, FitMode::Contain, OutputFormat::Jpeg)
                    .with_quality(50),
            ],
            derivation: DerivationMode::default(),
            generation_timeout_secs: 30,
            retention_hours: Some(24),
            storage: StorageConfig::default(),
            generator: GeneratorConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Deadline for one generation.
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Retention window, if assets expire.
    ///
    /// `retention_hours = 0` disables expiry, since config sources cannot
    /// express `None` over the bundled default.
    pub fn retention(&self) -> Option<TimeDelta> {
        self.retention_hours
            .filter(|hours| *hours > 0)
            .and_then(|hours| i64::try_from(hours).ok())
            .and_then(TimeDelta::try_hours)
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending setting.
    pub fn validate(&self) -> Img10Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::invalid("max_upload_bytes", "must be positive").into());
        }
        if self.generation_timeout_secs == 0 {
            return Err(ConfigError::invalid("generation_timeout_secs", "must be positive").into());
        }
        if self.allowed_types.iter().next().is_none() {
            return Err(
                ConfigError::invalid("allowed_types", "must name at least one media type").into(),
            );
        }
        for spec in &self.default_specs {
            spec.validate().map_err(|e| {
                ConfigError::invalid("default_specs", format!("{} is invalid: {}", spec, e))
            })?;
        }
        Ok(())
    }

    /// Load configuration from a specific file path.
    ///
    /// Keys missing from the file keep their built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Img10Result<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                Img10Error::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                Img10Error::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: env > explicit file > user files > bundled default.
    ///
    /// User config files are optional and silently skipped when absent; an
    /// explicit `path` must exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use img10_pipeline::PipelineConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = PipelineConfig::load(None)?;
    /// println!("uploads go to {}", config.storage().uploads_dir.display());
    /// # Ok(())
    /// # }
    /// ```
    #[instrument]
    pub fn load(path: Option<&Path>) -> Img10Result<Self> {
        debug!("Loading configuration with precedence: env > file > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/img10/img10.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("img10").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("IMG10")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .map_err(|e| {
                Img10Error::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                Img10Error::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }
}
