use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_DOCUMENT_STORE_URL: &str = "postgres://localhost:5432/news";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11411";
pub const DEFAULT_COLLECTION: &str = "news_vectors";
pub const DEFAULT_TABLE: &str = "articles";
pub const DEFAULT_STATUS_FIELD: &str = "vectorization";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub document_store: DocumentStoreConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub backoff: BackoffConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("newsvec").join("config.toml"))
    }

    /// Load configuration from an explicit path, or from the default config
    /// location if one exists, falling back to built-in defaults. An explicit
    /// path that does not exist is an error; a missing default path is not.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::PathError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            let content = std::fs::read_to_string(path)?;
            return Ok(toml::from_str(&content)?);
        }

        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            return Ok(toml::from_str(&content)?);
        }

        Ok(Self::default())
    }

    /// Reject configurations that would crash or wedge the loop before it
    /// starts. This is the only fatal error path after argument parsing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker.batch_size < 1 {
            return Err(ConfigError::ValidationError(
                "worker.batch_size must be at least 1".to_string(),
            ));
        }
        if self.worker.status_field.is_empty() {
            return Err(ConfigError::ValidationError(
                "worker.status_field must not be empty".to_string(),
            ));
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be at least 1".to_string(),
            ));
        }
        if self.worker.duplicates.distance_threshold < 0.0 {
            return Err(ConfigError::ValidationError(
                "worker.duplicates.distance_threshold must not be negative".to_string(),
            ));
        }
        if self.worker.duplicates.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "worker.duplicates.top_k must be at least 1".to_string(),
            ));
        }
        if self.backoff.strategy == BackoffStrategy::Exponential && self.backoff.multiplier <= 1.0 {
            return Err(ConfigError::ValidationError(
                "backoff.multiplier must be greater than 1 for exponential backoff".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStoreConfig {
    #[serde(default = "default_document_store_url")]
    pub url: String,

    /// Table owned by the ingestion service; the worker never creates it.
    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_pool_max")]
    pub pool_max: u32,

    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_document_store_url() -> String {
    DEFAULT_DOCUMENT_STORE_URL.to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_pool_max() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    5
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        Self {
            url: default_document_store_url(),
            table: default_table(),
            pool_max: default_pool_max(),
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            collection: default_collection(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: u32,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_embedding_timeout() -> u64 {
    120
}

fn default_embedding_dimension() -> u32 {
    768
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            timeout_secs: default_embedding_timeout(),
            dimension: default_embedding_dimension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Documents fetched and processed per cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,

    /// Sleep between cycles when a batch comes back empty or fails.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Key inside the per-document status map that this task owns.
    #[serde(default = "default_status_field")]
    pub status_field: String,

    #[serde(default)]
    pub duplicates: DuplicateConfig,
}

fn default_batch_size() -> i64 {
    10
}

fn default_poll_interval() -> u64 {
    10
}

fn default_status_field() -> String {
    DEFAULT_STATUS_FIELD.to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            poll_interval_secs: default_poll_interval(),
            status_field: default_status_field(),
            duplicates: DuplicateConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateConfig {
    /// Advisory near-duplicate scan before each upsert. Off by default;
    /// candidates are logged and reported, insertion is never blocked.
    #[serde(default)]
    pub enabled: bool,

    /// Inclusive distance bound for two embeddings to count as duplicates.
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u64,

    /// Lookback window for the publish-date range filter, ending today.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

fn default_distance_threshold() -> f32 {
    0.1
}

fn default_top_k() -> u64 {
    10
}

fn default_window_days() -> u32 {
    7
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            distance_threshold: default_distance_threshold(),
            top_k: default_top_k(),
            window_days: default_window_days(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    #[serde(default = "default_backoff_strategy")]
    pub strategy: BackoffStrategy,

    /// Delay between connect attempts; the initial delay when exponential.
    #[serde(default = "default_backoff_delay")]
    pub delay_secs: u64,

    /// Cap for exponential growth.
    #[serde(default = "default_backoff_max_delay")]
    pub max_delay_secs: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub multiplier: f64,
}

fn default_backoff_strategy() -> BackoffStrategy {
    BackoffStrategy::Fixed
}

fn default_backoff_delay() -> u64 {
    5
}

fn default_backoff_max_delay() -> u64 {
    60
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            strategy: default_backoff_strategy(),
            delay_secs: default_backoff_delay(),
            max_delay_secs: default_backoff_max_delay(),
            multiplier: default_backoff_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub enable_file_logs: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "./logs".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            enable_file_logs: false,
            log_dir: default_log_dir(),
        }
    }
}
