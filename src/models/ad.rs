use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{AdJob, AssetRef, JobState, JobStatus};

/// Request body for `POST /generate-ad`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdRequest {
    #[garde(length(min = 1, max = 500))]
    pub product: String,

    #[garde(length(min = 1, max = 500))]
    pub persona: String,

    #[garde(length(min = 1, max = 500))]
    pub scene: String,

    /// How the persona interacts with the product, e.g. "holding" or "drinking".
    #[garde(length(min = 1, max = 500))]
    pub interaction: String,

    #[garde(length(min = 1, max = 500))]
    pub emotion: String,

    #[garde(length(min = 1, max = 500))]
    pub visual_style: String,

    #[garde(length(min = 1, max = 500))]
    pub tagline: String,
}

/// Response after submitting an ad for generation.
#[derive(Debug, Serialize)]
pub struct GenerateAdResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
}

/// Response for querying job status.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<AdJob> for JobStatusResponse {
    fn from(job: AdJob) -> Self {
        let mut response = Self {
            job_id: job.id,
            status: job.status(),
            image_path: None,
            image_url: None,
            prompt_used: None,
            error: None,
        };

        match job.state {
            JobState::Processing => {}
            JobState::Completed(output) => {
                match output.asset {
                    AssetRef::LocalPath(path) => response.image_path = Some(path),
                    AssetRef::RemoteUrl(url) => response.image_url = Some(url),
                }
                response.prompt_used = Some(output.prompt_used);
            }
            JobState::Failed { error } => response.error = Some(error),
        }

        response
    }
}
