use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::models::ad::AdRequest;
use crate::models::job::{AssetRef, JobOutput};
use crate::services::compositor::{CompositeError, Compositor};
use crate::services::generator::{GenerationError, ImageGenerator};
use crate::services::prompt::build_prompt;
use crate::services::storage::{AssetUploader, LocalStore, StorageError};

/// Key prefix for uploaded ads in remote storage.
const REMOTE_PREFIX: &str = "ads";

/// The per-job generation pipeline: prompt, generate, composite, persist.
pub struct AdPipeline {
    generator: Arc<dyn ImageGenerator>,
    compositor: Option<Compositor>,
    local: LocalStore,
    uploader: Option<Arc<dyn AssetUploader>>,
}

impl AdPipeline {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        compositor: Option<Compositor>,
        local: LocalStore,
        uploader: Option<Arc<dyn AssetUploader>>,
    ) -> Self {
        Self {
            generator,
            compositor,
            local,
            uploader,
        }
    }

    /// Run every stage for one job. Stages run strictly in order and the first
    /// error ends the run.
    pub async fn run(&self, job_id: Uuid, request: &AdRequest) -> Result<JobOutput, PipelineError> {
        let prompt = build_prompt(request);

        tracing::debug!(job_id = %job_id, "Calling image provider");
        let start = Instant::now();
        let image = self.generator.generate(&prompt).await?;
        tracing::info!(
            job_id = %job_id,
            generation_ms = start.elapsed().as_millis() as u64,
            bytes = image.len(),
            "Image generated"
        );

        let image = match &self.compositor {
            Some(compositor) => {
                tracing::debug!(job_id = %job_id, "Compositing brand assets");
                let compositor = compositor.clone();
                let interaction = request.interaction.clone();
                tokio::task::spawn_blocking(move || compositor.compose(&image, &interaction))
                    .await
                    .map_err(|e| PipelineError::Panicked(e.to_string()))??
            }
            None => image,
        };

        let asset = self.persist(job_id, &image).await?;
        tracing::info!(job_id = %job_id, asset = %asset.as_str(), "Ad persisted");

        Ok(JobOutput {
            asset,
            prompt_used: prompt,
        })
    }

    async fn persist(&self, job_id: Uuid, image: &[u8]) -> Result<AssetRef, StorageError> {
        let file_name = format!("ad_{job_id}.png");
        let path = self.local.save(&file_name, image).await?;

        match &self.uploader {
            Some(uploader) => {
                let key = format!("{REMOTE_PREFIX}/{file_name}");
                let url = uploader.upload(&key, image).await?;
                Ok(AssetRef::RemoteUrl(url))
            }
            None => Ok(AssetRef::LocalPath(path.display().to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Image generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Compositing failed: {0}")]
    Composite(#[from] CompositeError),

    #[error("Persisting image failed: {0}")]
    Persistence(#[from] StorageError),

    #[error("Job aborted unexpectedly: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::Mutex;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(64, 64, image::Rgb([10, 120, 200]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    struct StaticGenerator(Vec<u8>);

    #[async_trait]
    impl ImageGenerator for StaticGenerator {
        async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, GenerationError> {
            Ok(self.0.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ImageGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, GenerationError> {
            Err(GenerationError::Provider {
                status: 429,
                message: "quota exceeded".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingUploader {
        keys: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AssetUploader for RecordingUploader {
        async fn upload(&self, key: &str, _data: &[u8]) -> Result<String, StorageError> {
            self.keys.lock().unwrap().push(key.to_string());
            Ok(format!("https://bucket.example/{key}?X-Amz-Signature=abc"))
        }
    }

    struct BrokenUploader;

    #[async_trait]
    impl AssetUploader for BrokenUploader {
        async fn upload(&self, _key: &str, _data: &[u8]) -> Result<String, StorageError> {
            Err(StorageError::Config("bucket unreachable".to_string()))
        }
    }

    fn request() -> AdRequest {
        AdRequest {
            product: "Red Sneaker".to_string(),
            persona: "young athlete".to_string(),
            scene: "city street".to_string(),
            interaction: "holding".to_string(),
            emotion: "confident".to_string(),
            visual_style: "vibrant".to_string(),
            tagline: "Run Free".to_string(),
        }
    }

    #[tokio::test]
    async fn test_local_only_run() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = AdPipeline::new(
            Arc::new(StaticGenerator(png_bytes())),
            None,
            LocalStore::new(dir.path()),
            None,
        );
        let job_id = Uuid::new_v4();

        let output = pipeline.run(job_id, &request()).await.unwrap();

        let expected = dir.path().join(format!("ad_{job_id}.png"));
        assert_eq!(output.asset, AssetRef::LocalPath(expected.display().to_string()));
        assert_eq!(output.prompt_used, build_prompt(&request()));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_upload_returns_remote_url() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = Arc::new(RecordingUploader::default());
        let pipeline = AdPipeline::new(
            Arc::new(StaticGenerator(png_bytes())),
            None,
            LocalStore::new(dir.path()),
            Some(uploader.clone()),
        );
        let job_id = Uuid::new_v4();

        let output = pipeline.run(job_id, &request()).await.unwrap();

        let key = format!("ads/ad_{job_id}.png");
        assert_eq!(uploader.keys.lock().unwrap().as_slice(), &[key.clone()]);
        assert_eq!(
            output.asset,
            AssetRef::RemoteUrl(format!("https://bucket.example/{key}?X-Amz-Signature=abc"))
        );
    }

    #[tokio::test]
    async fn test_generation_failure_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("outputs");
        let pipeline = AdPipeline::new(
            Arc::new(FailingGenerator),
            None,
            LocalStore::new(&out_dir),
            None,
        );

        let err = pipeline.run(Uuid::new_v4(), &request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
        assert!(err.to_string().contains("quota exceeded"));
        assert!(!out_dir.exists());
    }

    #[tokio::test]
    async fn test_upload_failure_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = AdPipeline::new(
            Arc::new(StaticGenerator(png_bytes())),
            None,
            LocalStore::new(dir.path()),
            Some(Arc::new(BrokenUploader)),
        );

        let err = pipeline.run(Uuid::new_v4(), &request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_compositor_failure_is_composite_error() {
        let dir = tempfile::tempdir().unwrap();
        let logo = image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]));
        let compositor = Compositor::new(
            None,
            Some(logo),
            0.2,
            0.15,
            crate::services::compositor::LogoPosition::TopLeft,
        );
        // Recognized PNG signature, truncated body.
        let mut corrupt = png_bytes();
        corrupt.truncate(16);
        let pipeline = AdPipeline::new(
            Arc::new(StaticGenerator(corrupt)),
            Some(compositor),
            LocalStore::new(dir.path()),
            None,
        );

        let err = pipeline.run(Uuid::new_v4(), &request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Composite(_)));
    }
}
