use crate::routes::{photos, root};
use common_types::{ErrorInfo, Job, JobState, RemoteFile};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        root::handlers::root,
        root::handlers::health_check,
        // Photos handlers
        photos::handlers::ingest_now,
        photos::handlers::schedule_job,
        photos::handlers::list_jobs,
        photos::handlers::job_status,
        photos::handlers::cancel_job,
        photos::handlers::check_folder,
    ),
    components(
        schemas(Job, JobState, ErrorInfo, RemoteFile),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Photos", description = "Ingesting photos from the configured source"),
        (name = "System", description = "Health check"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
