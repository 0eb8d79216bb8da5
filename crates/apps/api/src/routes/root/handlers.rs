use crate::api_state::ApiContext;
use crate::routes::envelope::{ApiResponse, error_response};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    responses(
        (status = 200, description = "Root message")
    )
)]
pub async fn root() -> ApiResponse<&'static str> {
    ApiResponse("Photos ingestion API")
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses(
        (status = 200, description = "API is healthy and ready to accept traffic", body = String),
        (status = 503, description = "API is not healthy, likely due to a database issue.")
    )
)]
pub async fn health_check(State(context): State<ApiContext>) -> Response {
    match context.store.ping().await {
        Ok(()) => ApiResponse("OK").into_response(),
        Err(e) => {
            error!("Health check failed: database connection error: {}", e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, "Database is unreachable.")
        }
    }
}
