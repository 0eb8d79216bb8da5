mod api_doc;
pub mod auth;
pub mod envelope;
pub mod photos;
pub mod root;

use crate::api_state::ApiContext;
use crate::routes::api_doc::ApiDoc;
use crate::routes::auth::middleware::Owner;
use crate::routes::photos::router::photos_protected_router;
use crate::routes::root::router::root_public_router;
use axum::Router;
use axum::middleware::from_extractor_with_state;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// --- Router Construction ---
pub fn create_router(api_state: ApiContext) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .merge(public_routes())
        .merge(protected_routes(api_state.clone()))
        .with_state(api_state)
}

fn public_routes() -> Router<ApiContext> {
    Router::new().merge(root_public_router())
}

fn protected_routes(api_state: ApiContext) -> Router<ApiContext> {
    Router::new()
        .merge(photos_protected_router())
        .route_layer(from_extractor_with_state::<Owner, ApiContext>(api_state))
}
