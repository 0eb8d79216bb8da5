use crate::routes::envelope::error_response;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization header.")]
    MissingToken,

    #[error("Authorization header must use the Bearer scheme.")]
    InvalidToken,

    #[error("Only the owner can do this.")]
    NotOwner,

    #[error("No owner password is configured.")]
    NotConfigured,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MissingToken | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::NotOwner => {
                warn!("Rejected request with a wrong owner password.");
                StatusCode::FORBIDDEN
            }
            Self::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, self.to_string())
    }
}
