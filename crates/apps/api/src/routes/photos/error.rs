use crate::routes::envelope::error_response_for_code;
use axum::response::{IntoResponse, Response};
use common_services::ingest::{IngestAllError, IngestError};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum PhotosError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    IngestAll(#[from] IngestAllError),
}

impl IntoResponse for PhotosError {
    fn into_response(self) -> Response {
        let error = match self {
            Self::Ingest(error) => error,
            Self::IngestAll(IngestAllError { added, error }) => {
                if !added.is_empty() {
                    warn!(
                        "Ingestion stopped after adding {} photos before the failure.",
                        added.len()
                    );
                }
                error
            }
        };
        let info = error.to_error_info();
        if info.code >= 500 {
            error!("Ingestion request failed: {:?}", error);
        }
        error_response_for_code(info.code, info.message)
    }
}
