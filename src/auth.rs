//! Shared-secret API key extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::error::AppError;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Proof that the request carried the configured API key.
///
/// Place it before any body extractor so unauthenticated requests are
/// rejected before the body is parsed:
///
/// ```ignore
/// async fn handler(_key: ApiKey, Json(body): Json<AdRequest>) -> AppResult<()> { .. }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ApiKey;

impl FromRequestParts<AppState> for ApiKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing x-api-key header".into()))?;

        if provided != &*state.api_key {
            return Err(AppError::Unauthorized("Invalid API key".into()));
        }

        Ok(ApiKey)
    }
}
