use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::job::{AdJob, JobOutput, JobState, JobStatus};

/// In-memory store of every job submitted to this process.
///
/// Backed by a sharded concurrent map: operations on distinct ids touch
/// different shards, and each entry is written under its shard lock so a
/// reader never sees a half-installed terminal state. Records are never
/// removed for the lifetime of the process.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: DashMap<Uuid, AdJob>,
}

/// Per-status totals across the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct JobCounts {
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new job in the `processing` state.
    pub fn create(&self, id: Uuid) -> Result<(), RegistryError> {
        match self.jobs.entry(id) {
            Entry::Occupied(_) => Err(RegistryError::Duplicate(id)),
            Entry::Vacant(slot) => {
                slot.insert(AdJob::new(id));
                Ok(())
            }
        }
    }

    /// Snapshot of a job's current fields.
    pub fn get(&self, id: Uuid) -> Option<AdJob> {
        self.jobs.get(&id).map(|entry| entry.value().clone())
    }

    /// Move a job into a terminal state. Terminal states are final.
    pub fn update(&self, id: Uuid, state: JobState) -> Result<(), RegistryError> {
        if !state.status().is_terminal() {
            return Err(RegistryError::NotTerminal(id));
        }

        let mut entry = self.jobs.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        let current = entry.status();
        if current.is_terminal() {
            return Err(RegistryError::AlreadyTerminal { id, status: current });
        }

        entry.state = state;
        entry.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn complete(&self, id: Uuid, output: JobOutput) -> Result<(), RegistryError> {
        self.update(id, JobState::Completed(output))
    }

    pub fn fail(&self, id: Uuid, error: impl Into<String>) -> Result<(), RegistryError> {
        self.update(id, JobState::Failed { error: error.into() })
    }

    pub fn counts(&self) -> JobCounts {
        let mut counts = JobCounts::default();
        for entry in self.jobs.iter() {
            match entry.status() {
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Job {0} already exists")]
    Duplicate(Uuid),

    #[error("Job {0} not found")]
    NotFound(Uuid),

    #[error("Job {id} is already {status}")]
    AlreadyTerminal { id: Uuid, status: JobStatus },

    #[error("Job {0} can only transition to a terminal state")]
    NotTerminal(Uuid),
}
