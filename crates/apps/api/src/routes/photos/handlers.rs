use crate::api_state::ApiContext;
use crate::routes::envelope::ApiResponse;
use crate::routes::photos::error::PhotosError;
use axum::extract::{Path, State};
use common_types::{Job, RemoteFile};
use tracing::{info, instrument};

/// Ingest every missing photo right away.
///
/// Stops at the first file that fails.
///
/// # Errors
///
/// Returns a `PhotosError` if the listing fails or any file cannot be ingested.
#[utoipa::path(
    post,
    path = "/photos",
    tag = "Photos",
    responses(
        (status = 200, description = "The remote files that were added.", body = Vec<RemoteFile>),
        (status = 400, description = "No root folder is configured."),
        (status = 500, description = "Ingesting one of the files failed."),
        (status = 502, description = "The photo source could not be reached."),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(context), err(Debug))]
pub async fn ingest_now(
    State(context): State<ApiContext>,
) -> Result<ApiResponse<Vec<RemoteFile>>, PhotosError> {
    let added = context.pipeline.ingest_all().await?;
    info!("✅ Added {} photos.", added.len());
    Ok(ApiResponse(added))
}

/// Schedule a background ingestion job for every missing photo.
///
/// # Errors
///
/// Returns a `PhotosError` if the listing fails or the job queue is shut down.
#[utoipa::path(
    post,
    path = "/photos/job/schedule",
    tag = "Photos",
    responses(
        (status = 200, description = "The scheduled job.", body = Job),
        (status = 400, description = "No root folder is configured."),
        (status = 502, description = "The photo source could not be reached."),
        (status = 503, description = "The job queue is shut down."),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(context), err(Debug))]
pub async fn schedule_job(
    State(context): State<ApiContext>,
) -> Result<ApiResponse<Job>, PhotosError> {
    let job = context.scheduler.schedule().await?;
    Ok(ApiResponse(job))
}

/// List every known ingestion job, newest first.
#[utoipa::path(
    get,
    path = "/photos/job",
    tag = "Photos",
    responses(
        (status = 200, description = "All retained jobs.", body = Vec<Job>),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_jobs(State(context): State<ApiContext>) -> ApiResponse<Vec<Job>> {
    ApiResponse(context.scheduler.list().await)
}

/// Get the current status of a job.
///
/// # Errors
///
/// Returns a `PhotosError` if no job has this id.
#[utoipa::path(
    get,
    path = "/photos/job/{id}",
    tag = "Photos",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Snapshot of the job.", body = Job),
        (status = 404, description = "Job not found."),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(context), err(Debug))]
pub async fn job_status(
    State(context): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Job>, PhotosError> {
    Ok(ApiResponse(context.scheduler.status(&id).await?))
}

/// Request cancellation of a job.
///
/// A queued job never starts, a running job stops before its next file. Finished jobs are
/// returned unchanged.
///
/// # Errors
///
/// Returns a `PhotosError` if no job has this id.
#[utoipa::path(
    delete,
    path = "/photos/job/{id}",
    tag = "Photos",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Snapshot of the job after the request.", body = Job),
        (status = 404, description = "Job not found."),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(context), err(Debug))]
pub async fn cancel_job(
    State(context): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Job>, PhotosError> {
    Ok(ApiResponse(context.scheduler.cancel(&id).await?))
}

/// List the remote photos that have not been ingested yet.
///
/// # Errors
///
/// Returns a `PhotosError` if the listing or the store lookup fails.
#[utoipa::path(
    get,
    path = "/photos/folder/check",
    tag = "Photos",
    responses(
        (status = 200, description = "Photos missing from the library.", body = Vec<RemoteFile>),
        (status = 400, description = "No root folder is configured."),
        (status = 502, description = "The photo source could not be reached."),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(context), err(Debug))]
pub async fn check_folder(
    State(context): State<ApiContext>,
) -> Result<ApiResponse<Vec<RemoteFile>>, PhotosError> {
    Ok(ApiResponse(context.pipeline.check_missing().await?))
}
