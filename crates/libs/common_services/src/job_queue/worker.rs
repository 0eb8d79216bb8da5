use crate::ingest::IngestionPipeline;
use crate::job_queue::JobEntry;
use common_types::{Job, RemoteFile};
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tracing::{error, info, warn};

/// A job waiting in the queue, together with the files it will process.
///
/// The candidate list lives here and not on the job, so it is released as soon as the
/// worker is done with the job.
pub(crate) struct QueuedJob {
    pub entry: Arc<JobEntry>,
    pub candidates: Vec<RemoteFile>,
}

/// Processes queued jobs one at a time until the queue is closed.
pub(crate) async fn run_worker(mut receiver: Receiver<QueuedJob>, pipeline: IngestionPipeline) {
    info!("🛠️ Ingestion worker started.");
    while let Some(queued) = receiver.recv().await {
        process_job(&pipeline, queued).await;
    }
    info!("Job queue closed, ingestion worker exiting.");
}

async fn process_job(pipeline: &IngestionPipeline, queued: QueuedJob) {
    let QueuedJob { entry, candidates } = queued;
    let job_id = entry.snapshot().await.id;

    if entry.is_cancel_requested() {
        warn!("Job {job_id} was cancelled before it started.");
        entry.update(Job::cancel).await;
        return;
    }

    entry.update(Job::start).await;
    info!("🐜 Picked up job {job_id} with {} files", candidates.len());

    let total = candidates.len();
    for (index, file) in candidates.iter().enumerate() {
        if entry.is_cancel_requested() {
            warn!("Job {job_id} cancelled after {index} of {total} files.");
            entry.update(Job::cancel).await;
            return;
        }

        if let Err(e) = pipeline.ingest_one(file).await {
            error!("Job {job_id} aborted at {}: {e}", file.id);
            let info = e.to_error_info();
            entry.update(|job| job.abort(info)).await;
            return;
        }

        // The last item is counted by `finish`, so 100% only ever shows with FINISHED.
        if index + 1 < total {
            entry.update(Job::record_progress).await;
        }
    }

    entry.update(Job::finish).await;
    info!("✅ Job {job_id} finished ({total} files).");
}
