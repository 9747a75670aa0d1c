use std::path::PathBuf;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

const PNG_CONTENT_TYPE: &str = "image/png";

/// Uploads a finished asset and returns a durable reference to it.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(&self, key: &str, data: &[u8]) -> Result<String, StorageError>;
}

/// Writes finished ads under a local output directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Save PNG bytes as `<root>/<file_name>`, creating the directory if needed.
    pub async fn save(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(StorageError::Io)?;

        let path = self.root.join(file_name);
        tokio::fs::write(&path, data).await.map_err(StorageError::Io)?;
        Ok(path)
    }
}

/// Client for S3-compatible object storage.
pub struct S3Uploader {
    bucket: Box<Bucket>,
    presign_expiry_secs: u32,
}

impl S3Uploader {
    /// `endpoint` selects a custom S3-compatible endpoint; otherwise `region`
    /// is parsed as an AWS region name.
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: Option<&str>,
        access_key: &str,
        secret_key: &str,
        presign_expiry_secs: u32,
    ) -> Result<Self, StorageError> {
        let region = match endpoint {
            Some(endpoint) => Region::Custom {
                region: region.to_string(),
                endpoint: endpoint.to_string(),
            },
            None => region
                .parse::<Region>()
                .map_err(|e| StorageError::Config(e.to_string()))?,
        };

        let credentials =
            Credentials::new(Some(access_key), Some(secret_key), None, None, None)
                .map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            bucket,
            presign_expiry_secs,
        })
    }
}

#[async_trait]
impl AssetUploader for S3Uploader {
    /// Upload PNG bytes and return a presigned GET URL.
    async fn upload(&self, key: &str, data: &[u8]) -> Result<String, StorageError> {
        self.bucket
            .put_object_with_content_type(key, data, PNG_CONTENT_TYPE)
            .await
            .map_err(StorageError::S3)?;

        self.bucket
            .presign_get(key, self.presign_expiry_secs, None)
            .await
            .map_err(StorageError::S3)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("Local file write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage configuration error: {0}")]
    Config(String),
}
