use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Turns a prompt into raw image bytes.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError>;
}

/// Client for the OpenAI image generation API.
pub struct OpenAiImageClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    size: String,
}

#[derive(Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
}

#[derive(Deserialize)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl OpenAiImageClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        size: &str,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GenerationError::Http)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            size: size.to_string(),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        let url = format!("{}/v1/images/generations", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ImagesRequest {
                model: &self.model,
                prompt,
                size: &self.size,
                n: 1,
            })
            .send()
            .await
            .map_err(GenerationError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GenerationError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let images: ImagesResponse = response.json().await.map_err(GenerationError::Http)?;
        decode_image(images)
    }
}

fn decode_image(images: ImagesResponse) -> Result<Vec<u8>, GenerationError> {
    let encoded = images
        .data
        .into_iter()
        .next()
        .and_then(|d| d.b64_json)
        .ok_or(GenerationError::EmptyResponse)?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .map_err(GenerationError::Decode)?;

    image::guess_format(&bytes).map_err(|_| GenerationError::NotAnImage)?;

    Ok(bytes)
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP request to image provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Image provider returned no image data")]
    EmptyResponse,

    #[error("Failed to decode base64 image payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Image provider payload is not a recognized image format")]
    NotAnImage,
}
