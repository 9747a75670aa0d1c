use std::path::PathBuf;

use serde::Deserialize;

use crate::services::compositor::LogoPosition;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Shared secret expected in the `x-api-key` header
    pub service_api_key: String,

    /// OpenAI API key for image generation
    pub openai_api_key: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(default = "default_image_model")]
    pub openai_image_model: String,

    /// Requested output size, e.g. "1024x1024"
    #[serde(default = "default_image_size")]
    pub image_size: String,

    /// Upper bound on a single image generation request
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Directory finished ads are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// S3 bucket for uploads. Uploads are disabled when unset.
    pub s3_bucket_name: Option<String>,

    pub aws_region: Option<String>,

    pub aws_access_key_id: Option<String>,

    pub aws_secret_access_key: Option<String>,

    /// Custom S3-compatible endpoint
    pub s3_endpoint: Option<String>,

    /// Lifetime of presigned download URLs
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u32,

    /// Transparent PNG of the product placed in the persona's hand
    pub product_image_path: Option<PathBuf>,

    /// Brand logo placed in a corner
    pub logo_path: Option<PathBuf>,

    #[serde(default)]
    pub logo_position: LogoPosition,

    #[serde(default = "default_product_scale")]
    pub product_scale: f32,

    #[serde(default = "default_logo_scale")]
    pub logo_scale: f32,

    /// Number of concurrent generation workers
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Maximum number of jobs waiting for a worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// Complete S3 settings, present only when uploads are enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Settings<'a> {
    pub bucket: &'a str,
    pub region: &'a str,
    pub endpoint: Option<&'a str>,
    pub access_key: &'a str,
    pub secret_key: &'a str,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_image_model() -> String {
    "gpt-image-1".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    300
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_presign_expiry_secs() -> u32 {
    43_200
}

fn default_product_scale() -> f32 {
    0.20
}

fn default_logo_scale() -> f32 {
    0.15
}

fn default_worker_count() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    64
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Build from explicit key/value pairs using the same rules as the environment.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(pairs)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("SERVICE_API_KEY must not be empty".into()));
        }
        if self.openai_api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("OPENAI_API_KEY must not be empty".into()));
        }
        for (name, scale) in [("PRODUCT_SCALE", self.product_scale), ("LOGO_SCALE", self.logo_scale)] {
            if !(scale > 0.0 && scale <= 1.0) {
                return Err(ConfigError::Invalid(format!("{name} must be in (0, 1]")));
            }
        }
        if self.worker_count == 0 {
            return Err(ConfigError::Invalid("WORKER_COUNT must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("QUEUE_CAPACITY must be at least 1".into()));
        }
        self.s3()?;
        Ok(())
    }

    /// S3 settings when uploads are configured. A bucket without the region and
    /// credentials, or credentials without a bucket, is rejected.
    pub fn s3(&self) -> Result<Option<S3Settings<'_>>, ConfigError> {
        match (
            self.s3_bucket_name.as_deref(),
            self.aws_region.as_deref(),
            self.aws_access_key_id.as_deref(),
            self.aws_secret_access_key.as_deref(),
        ) {
            (None, _, None, None) => Ok(None),
            (Some(bucket), Some(region), Some(access_key), Some(secret_key)) => Ok(Some(S3Settings {
                bucket,
                region,
                endpoint: self.s3_endpoint.as_deref(),
                access_key,
                secret_key,
            })),
            _ => Err(ConfigError::Invalid(
                "S3_BUCKET_NAME, AWS_REGION, AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together".into(),
            )),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
