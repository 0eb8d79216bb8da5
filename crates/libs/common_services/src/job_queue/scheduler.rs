use crate::ingest::{IngestError, IngestionPipeline};
use crate::job_queue::worker::{QueuedJob, run_worker};
use crate::job_queue::JobRegistry;
use app_state::JobSettings;
use common_types::{ErrorInfo, Job};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Runs ingestion jobs in the background on a single worker and tracks their progress.
pub struct JobScheduler {
    pipeline: IngestionPipeline,
    registry: Arc<JobRegistry>,
    sender: Mutex<Option<mpsc::Sender<QueuedJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl JobScheduler {
    /// Spawns the worker. Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(pipeline: IngestionPipeline, settings: &JobSettings) -> Self {
        let (sender, receiver) = mpsc::channel(settings.queue_capacity.max(1));
        let worker = tokio::spawn(run_worker(receiver, pipeline.clone()));
        Self {
            pipeline,
            registry: Arc::new(JobRegistry::new(settings.max_retained_jobs)),
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Lists the candidates, registers a job for them and queues it.
    ///
    /// Returns once the job is queued, waiting only when the queue is full. Listing failures
    /// are returned directly and no job is created.
    #[instrument(skip(self))]
    pub async fn schedule(&self) -> Result<Job, IngestError> {
        let sender = self
            .sender
            .lock()
            .await
            .clone()
            .ok_or(IngestError::Unavailable)?;
        let candidates = self.pipeline.list_candidates().await?;

        let job = Job::scheduled(Uuid::new_v4().to_string(), candidates.len());
        let entry = self.registry.insert(job).await;
        let snapshot = entry.snapshot().await;

        let queued = QueuedJob {
            entry: entry.clone(),
            candidates,
        };
        if sender.send(queued).await.is_err() {
            let error = IngestError::Unavailable;
            let info: ErrorInfo = error.to_error_info();
            entry.update(|job| job.abort(info)).await;
            return Err(error);
        }

        info!("Scheduled job {} with {} files", snapshot.id, snapshot.num_files);
        Ok(snapshot)
    }

    pub async fn status(&self, id: &str) -> Result<Job, IngestError> {
        self.registry.status(id).await
    }

    pub async fn list(&self) -> Vec<Job> {
        self.registry.list().await
    }

    /// Asks a job to stop. A queued job ends up CANCELLED when the worker reaches it, a
    /// running job stops before its next file. Finished jobs are returned unchanged.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: &str) -> Result<Job, IngestError> {
        let entry = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| IngestError::NotFound(format!("job {id}")))?;
        let job = entry.snapshot().await;
        if !job.is_terminal() {
            entry.request_cancel();
            info!("Cancellation requested for job {id}");
        }
        Ok(job)
    }

    /// Closes the queue and waits for the worker to finish the jobs already queued.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().await.take());
        let worker = self.worker.lock().await.take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!("Ingestion worker ended abnormally: {e}");
            }
        }
    }
}
