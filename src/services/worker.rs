use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::services::pipeline::{AdPipeline, PipelineError};
use crate::services::queue::QueuedJob;
use crate::services::registry::JobRegistry;

/// Fixed set of tasks draining the job queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks consuming from `receiver`. Workers exit once every
    /// queue sender is dropped and the remaining jobs are drained.
    pub fn spawn(
        workers: usize,
        receiver: mpsc::Receiver<QueuedJob>,
        registry: Arc<JobRegistry>,
        pipeline: Arc<AdPipeline>,
    ) -> Self {
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let receiver = Arc::clone(&receiver);
                let registry = Arc::clone(&registry);
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    tracing::debug!(worker_id, "Worker started");
                    loop {
                        match next_job(&receiver).await {
                            Some(job) => process_job(&registry, &pipeline, job).await,
                            None => break,
                        }
                    }
                    tracing::debug!(worker_id, "Worker stopped");
                })
            })
            .collect();

        Self { handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to finish.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task terminated abnormally");
            }
        }
    }
}

/// Wait for the next queued job and publish the remaining queue depth.
/// The receiver lock is held only while waiting.
async fn next_job(receiver: &Mutex<mpsc::Receiver<QueuedJob>>) -> Option<QueuedJob> {
    let mut receiver = receiver.lock().await;
    let job = receiver.recv().await;
    metrics::gauge!("ad_queue_depth").set(receiver.len() as f64);
    job
}

/// Run one job to a terminal state. Never returns an error: every failure,
/// including a panic inside the pipeline, is recorded on the job.
pub async fn process_job(registry: &JobRegistry, pipeline: &Arc<AdPipeline>, job: QueuedJob) {
    let job_id = job.job_id;
    let span = tracing::info_span!("ad_job", job_id = %job_id);

    async move {
        tracing::info!(product = %job.request.product, "Processing ad job");
        let start = Instant::now();

        let pipeline = Arc::clone(pipeline);
        let outcome = tokio::spawn(async move { pipeline.run(job.job_id, &job.request).await })
            .await
            .unwrap_or_else(|e| Err(PipelineError::Panicked(e.to_string())));

        let elapsed = start.elapsed();
        metrics::histogram!("ad_job_duration_seconds").record(elapsed.as_secs_f64());

        let recorded = match outcome {
            Ok(output) => {
                metrics::counter!("ad_jobs_completed_total").increment(1);
                tracing::info!(
                    duration_ms = elapsed.as_millis() as u64,
                    "Job completed successfully"
                );
                registry.complete(job_id, output)
            }
            Err(e) => {
                metrics::counter!("ad_jobs_failed_total").increment(1);
                tracing::error!(error = %e, "Job processing failed");
                registry.fail(job_id, e.to_string())
            }
        };

        if let Err(e) = recorded {
            tracing::error!(error = %e, "Failed to record job outcome");
        }
    }
    .instrument(span)
    .await
}
