use crate::database::DbError;
use crate::sources::SourceError;
use color_eyre::eyre;
use common_types::{ErrorInfo, RemoteFile};
use thiserror::Error;

/// Coarse classification of ingestion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Upstream,
    Fetch,
    Derivative,
    Metadata,
    Persistence,
    NotFound,
    Unavailable,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not list remote files: {0}")]
    Upstream(#[source] SourceError),

    #[error("failed to fetch remote file {id}: {source}")]
    Fetch {
        id: String,
        #[source]
        source: SourceError,
    },

    #[error("failed to generate derivatives for {id}: {source}")]
    Derivative {
        id: String,
        #[source]
        source: eyre::Report,
    },

    #[error("failed to extract metadata for {id}: {source}")]
    Metadata {
        id: String,
        #[source]
        source: eyre::Report,
    },

    #[error("failed to store photo {id}: {source}")]
    Persistence {
        id: String,
        #[source]
        source: DbError,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("the ingestion queue is shut down")]
    Unavailable,
}

impl IngestError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Upstream(_) => ErrorKind::Upstream,
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Derivative { .. } => ErrorKind::Derivative,
            Self::Metadata { .. } => ErrorKind::Metadata,
            Self::Persistence { .. } => ErrorKind::Persistence,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unavailable => ErrorKind::Unavailable,
        }
    }

    /// HTTP status for this error. Upstream failures reuse the upstream's own status when it
    /// reported an error status, otherwise 502.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config(_) => 400,
            Self::Upstream(source) | Self::Fetch { source, .. } => source
                .upstream_status()
                .filter(|status| *status >= 400)
                .unwrap_or(502),
            Self::Derivative { .. } | Self::Metadata { .. } | Self::Persistence { .. } => 500,
            Self::NotFound(_) => 404,
            Self::Unavailable => 503,
        }
    }

    /// The error as embedded in an aborted job.
    #[must_use]
    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo::new(self.status_code(), self.to_string())
    }
}

/// A batch ingest that stopped at its first failing item.
///
/// `added` holds the files that were ingested before the failure.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct IngestAllError {
    pub added: Vec<RemoteFile>,
    #[source]
    pub error: IngestError,
}

impl From<IngestError> for IngestAllError {
    fn from(error: IngestError) -> Self {
        Self {
            added: Vec::new(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::eyre;

    #[test]
    fn per_item_errors_name_the_file() {
        let err = IngestError::Fetch {
            id: "file-c".to_owned(),
            source: SourceError::Remote {
                status: 500,
                message: "backend error".to_owned(),
            },
        };

        assert!(err.to_string().contains("file-c"));
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }

    #[test]
    fn upstream_status_is_forwarded() {
        let forbidden = IngestError::Upstream(SourceError::Remote {
            status: 403,
            message: "insufficient permissions".to_owned(),
        });
        let io = IngestError::Upstream(SourceError::Io(std::io::Error::other("reset")));

        assert_eq!(forbidden.status_code(), 403);
        assert_eq!(io.status_code(), 502);
    }

    #[test]
    fn local_failures_map_to_500() {
        let err = IngestError::Metadata {
            id: "x".to_owned(),
            source: eyre!("not an image"),
        };

        let info = err.to_error_info();

        assert_eq!(info.code, 500);
        assert!(info.message.contains("not an image"));
    }

    #[test]
    fn config_and_lookup_codes() {
        assert_eq!(IngestError::Config("no root".to_owned()).status_code(), 400);
        assert_eq!(IngestError::NotFound("job".to_owned()).status_code(), 404);
        assert_eq!(IngestError::Unavailable.status_code(), 503);
    }
}
