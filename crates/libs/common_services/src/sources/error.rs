use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to build request URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Remote source returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Remote file not found: {0}")]
    NotFound(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Status code reported by the upstream, when there is one.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::Remote { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::UrlParse(_) | Self::Io(_) => None,
        }
    }
}
