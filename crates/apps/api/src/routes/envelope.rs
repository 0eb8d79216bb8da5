use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common_types::ErrorInfo;
use serde::Serialize;
use serde_json::json;

/// Successful response body: `{"data": ...}`.
#[derive(Debug)]
pub struct ApiResponse<T>(pub T);

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(json!({ "data": self.0 })).into_response()
    }
}

/// Error response body: `{"error": {"code": ..., "message": ...}}`.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let error = ErrorInfo::new(status.as_u16(), message);
    (status, Json(json!({ "error": error }))).into_response()
}

/// Like [`error_response`] for a numeric code, falling back to 500 for codes that are not
/// valid HTTP statuses.
pub fn error_response_for_code(code: u16, message: impl Into<String>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, message)
}
