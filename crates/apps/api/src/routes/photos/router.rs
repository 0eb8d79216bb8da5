use crate::api_state::ApiContext;
use crate::routes::photos::handlers::{
    cancel_job, check_folder, ingest_now, job_status, list_jobs, schedule_job,
};
use axum::Router;
use axum::routing::{get, post};

pub fn photos_protected_router() -> Router<ApiContext> {
    Router::new()
        .route("/photos", post(ingest_now))
        .route("/photos/job", get(list_jobs))
        .route("/photos/job/schedule", post(schedule_job))
        .route("/photos/job/{id}", get(job_status).delete(cancel_job))
        .route("/photos/folder/check", get(check_folder))
}
