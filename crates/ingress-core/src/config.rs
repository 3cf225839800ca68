//! Configuration module
//!
//! Worker configuration is read from the environment (optionally seeded from a
//! `.env` file) and validated once at process start. Pipeline parameters that the
//! stages need are grouped in [`PipelineSettings`] so tests can build them directly.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants;
use crate::storage_types::{RecordStoreBackend, StorageBackend};

// Common constants
const DEFAULT_REGION: &str = "us-east-1";
const QUEUE_WAIT_TIME_SECS: i32 = 20;
const QUEUE_MAX_MESSAGES: i32 = 10;

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Settings shared by every process
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub environment: String,
    pub log_format: LogFormat,
}

/// Parameters consumed by the pipeline stages.
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub http_timeout: Duration,
    pub max_redirects: u32,
    pub scratch_dir: PathBuf,
    pub jpeg_quality: u8,
    pub min_segment_size: usize,
    pub derivative_size: u32,
    pub color_hash_bin_bits: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(constants::HTTP_TIMEOUT_SECS),
            max_redirects: constants::MAX_REDIRECTS,
            scratch_dir: env::temp_dir(),
            jpeg_quality: constants::NORMALIZED_JPEG_QUALITY,
            min_segment_size: constants::MIN_SEGMENT_SIZE,
            derivative_size: constants::DERIVATIVE_SIZE,
            color_hash_bin_bits: constants::COLOR_HASH_BIN_BITS,
        }
    }
}

/// Ingestion worker configuration
#[derive(Clone, Debug)]
pub struct IngressConfig {
    pub base: BaseConfig,
    // Object store for derivatives and source buckets
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: String,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub local_storage_path: Option<String>,
    // Record store
    pub record_store: RecordStoreBackend,
    pub table_name: Option<String>,
    pub database_url: Option<String>,
    // Queue
    pub queue_url: Option<String>,
    pub queue_wait_time_secs: i32,
    pub queue_max_messages: i32,
    // Pipeline
    pub scratch_dir: PathBuf,
    pub http_timeout_secs: u64,
    pub max_redirects: u32,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IngressConfig>);

impl Config {
    fn as_ingress(&self) -> &IngressConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IngressConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn environment(&self) -> &str {
        &self.as_ingress().base.environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.as_ingress().base.log_format
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_ingress().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_ingress().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> &str {
        &self.as_ingress().s3_region
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_ingress().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_ingress().local_storage_path.as_deref()
    }

    pub fn record_store(&self) -> RecordStoreBackend {
        self.as_ingress().record_store
    }

    pub fn table_name(&self) -> Option<&str> {
        self.as_ingress().table_name.as_deref()
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_ingress().database_url.as_deref()
    }

    pub fn queue_url(&self) -> Option<&str> {
        self.as_ingress().queue_url.as_deref()
    }

    pub fn queue_wait_time_secs(&self) -> i32 {
        self.as_ingress().queue_wait_time_secs
    }

    pub fn queue_max_messages(&self) -> i32 {
        self.as_ingress().queue_max_messages
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        let config = self.as_ingress();
        PipelineSettings {
            http_timeout: Duration::from_secs(config.http_timeout_secs),
            max_redirects: config.max_redirects,
            scratch_dir: config.scratch_dir.clone(),
            ..PipelineSettings::default()
        }
    }
}

impl IngressConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let log_format = env::var("LOG_FORMAT")
            .ok()
            .map(|s| s.parse::<LogFormat>())
            .transpose()?
            .unwrap_or_default();

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .map(|s| s.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or(StorageBackend::S3);

        let record_store = env::var("RECORD_STORE")
            .ok()
            .map(|s| s.parse::<RecordStoreBackend>())
            .transpose()?
            .unwrap_or(RecordStoreBackend::DynamoDb);

        let config = IngressConfig {
            base: BaseConfig {
                environment,
                log_format,
            },
            storage_backend,
            s3_bucket: env::var("S3_BUCKET_NAME")
                .or_else(|_| env::var("S3_BUCKET"))
                .ok()
                .filter(|s| !s.is_empty()),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok().filter(|s| !s.is_empty()),
            record_store,
            table_name: env::var("TABLE_NAME").ok().filter(|s| !s.is_empty()),
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            queue_url: env::var("SQS_QUEUE_URL").ok().filter(|s| !s.is_empty()),
            queue_wait_time_secs: env::var("QUEUE_WAIT_TIME_SECS")
                .unwrap_or_else(|_| QUEUE_WAIT_TIME_SECS.to_string())
                .parse()
                .unwrap_or(QUEUE_WAIT_TIME_SECS),
            queue_max_messages: env::var("QUEUE_MAX_MESSAGES")
                .unwrap_or_else(|_| QUEUE_MAX_MESSAGES.to_string())
                .parse()
                .unwrap_or(QUEUE_MAX_MESSAGES),
            scratch_dir: env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| constants::HTTP_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(constants::HTTP_TIMEOUT_SECS),
            max_redirects: env::var("MAX_REDIRECTS")
                .unwrap_or_else(|_| constants::MAX_REDIRECTS.to_string())
                .parse()
                .unwrap_or(constants::MAX_REDIRECTS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET_NAME must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        match self.record_store {
            RecordStoreBackend::DynamoDb if self.table_name.is_none() => {
                return Err(anyhow::anyhow!(
                    "TABLE_NAME must be set when using the DynamoDB record store"
                ));
            }
            RecordStoreBackend::Postgres => match self.database_url.as_deref() {
                Some(url)
                    if url.starts_with("postgres://") || url.starts_with("postgresql://") => {}
                _ => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ));
                }
            },
            _ => {}
        }

        if !(1..=10).contains(&self.queue_max_messages) {
            return Err(anyhow::anyhow!("QUEUE_MAX_MESSAGES must be between 1 and 10"));
        }

        if !(0..=20).contains(&self.queue_wait_time_secs) {
            return Err(anyhow::anyhow!("QUEUE_WAIT_TIME_SECS must be between 0 and 20"));
        }

        if self.http_timeout_secs == 0 {
            return Err(anyhow::anyhow!("HTTP_TIMEOUT_SECS must be greater than zero"));
        }

        Ok(())
    }
}
