use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Externally visible status of an ad generation job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Where a finished ad image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    /// Path on the local filesystem.
    LocalPath(String),
    /// Presigned URL in remote object storage.
    RemoteUrl(String),
}

impl AssetRef {
    pub fn as_str(&self) -> &str {
        match self {
            Self::LocalPath(p) | Self::RemoteUrl(p) => p,
        }
    }
}

/// Output of a successful job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutput {
    pub asset: AssetRef,
    pub prompt_used: String,
}

/// Lifecycle state of a job. Terminal payloads live inside their variant so a
/// completed job always carries its output and a failed one its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Processing,
    Completed(JobOutput),
    Failed { error: String },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Processing => JobStatus::Processing,
            Self::Completed(_) => JobStatus::Completed,
            Self::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// An ad generation job as held by the registry.
#[derive(Debug, Clone)]
pub struct AdJob {
    pub id: Uuid,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl AdJob {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            state: JobState::Processing,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }
}
