use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error object embedded in API responses and in aborted jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorInfo {
    /// HTTP-style status code.
    pub code: u16,
    pub message: String,
}

impl ErrorInfo {
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
