//! Test helper utilities for API integration testing

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ad_generator_hw::{
    app_state::AppState,
    routes,
    services::{
        generator::{GenerationError, ImageGenerator},
        pipeline::AdPipeline,
        queue::JobQueue,
        registry::JobRegistry,
        storage::{AssetUploader, LocalStore, StorageError},
        worker::WorkerPool,
    },
};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tower::ServiceExt;

pub const API_KEY: &str = "test-api-key";

/// Small valid PNG.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 16, image::Rgb([220, 30, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Generator returning a PNG, or failing when the prompt mentions "Broken".
pub struct FakeGenerator;

#[async_trait]
impl ImageGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        if prompt.contains("Broken") {
            return Err(GenerationError::Provider {
                status: 400,
                message: "Your request was rejected by the safety system".to_string(),
            });
        }
        Ok(png_bytes())
    }
}

/// Generator that waits until the test releases a permit.
pub struct GatedGenerator {
    pub gate: Arc<Semaphore>,
}

#[async_trait]
impl ImageGenerator for GatedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, GenerationError> {
        let permit = self.gate.acquire().await.expect("gate closed");
        permit.forget();
        Ok(png_bytes())
    }
}

/// Uploader that hands back a fake presigned URL.
pub struct FakeUploader;

#[async_trait]
impl AssetUploader for FakeUploader {
    async fn upload(&self, key: &str, _data: &[u8]) -> Result<String, StorageError> {
        Ok(format!(
            "https://ads-bucket.s3.amazonaws.com/{key}?X-Amz-Expires=43200&X-Amz-Signature=test"
        ))
    }
}

pub struct TestApp {
    pub router: Router,
    pub registry: Arc<JobRegistry>,
    pub workers: WorkerPool,
}

/// Build the full router backed by a real registry, queue and worker pool.
pub fn build_test_app(
    output_dir: &Path,
    generator: Arc<dyn ImageGenerator>,
    uploader: Option<Arc<dyn AssetUploader>>,
    workers: usize,
    queue_capacity: usize,
) -> TestApp {
    let pipeline = Arc::new(AdPipeline::new(
        generator,
        None,
        LocalStore::new(output_dir),
        uploader,
    ));
    let registry = Arc::new(JobRegistry::new());
    let (queue, receiver) = JobQueue::new(queue_capacity);
    let workers = WorkerPool::spawn(workers, receiver, Arc::clone(&registry), pipeline);
    let state = AppState::new(Arc::clone(&registry), queue, API_KEY);

    TestApp {
        router: routes::router(state),
        registry,
        workers,
    }
}

pub fn ad_body() -> Value {
    serde_json::json!({
        "product": "Red Sneaker",
        "persona": "young athlete",
        "scene": "city street",
        "interaction": "holding",
        "emotion": "confident",
        "visual_style": "vibrant",
        "tagline": "Run Free"
    })
}

pub async fn post_json(app: &Router, uri: &str, body: &Value, api_key: Option<&str>) -> Response<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, api_key: Option<&str>) -> Response<Body> {
    let mut builder = Request::get(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll job status until completed or failed (with timeout)
pub async fn poll_until_terminal(app: &Router, job_id: &str, timeout: Duration) -> Value {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let json = body_json(get(app, &format!("/status/{job_id}"), Some(API_KEY)).await).await;
        match json["status"].as_str() {
            Some("completed") | Some("failed") => return json,
            Some("processing") => {}
            other => panic!("Unknown job status: {other:?}"),
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("Job {job_id} did not finish within {timeout:?}");
        }
        sleep(Duration::from_millis(10)).await;
    }
}
