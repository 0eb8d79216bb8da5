use app_state::{AppSettings, IngestSettings};
use axum::extract::FromRef;
use common_services::ingest::{IngestionPipeline, PhotoStore};
use common_services::job_queue::JobScheduler;
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiContext {
    pub settings: AppSettings,
    pub pipeline: IngestionPipeline,
    pub scheduler: Arc<JobScheduler>,
    pub store: Arc<dyn PhotoStore>,
}

impl ApiContext {
    /// Starts the job scheduler for `pipeline`. Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(
        settings: AppSettings,
        pipeline: IngestionPipeline,
        store: Arc<dyn PhotoStore>,
    ) -> Self {
        let scheduler = Arc::new(JobScheduler::new(pipeline.clone(), &settings.jobs));
        Self {
            settings,
            pipeline,
            scheduler,
            store,
        }
    }
}

impl FromRef<ApiContext> for AppSettings {
    fn from_ref(state: &ApiContext) -> Self {
        state.settings.clone()
    }
}

impl FromRef<ApiContext> for IngestSettings {
    fn from_ref(state: &ApiContext) -> Self {
        state.settings.ingest.clone()
    }
}
