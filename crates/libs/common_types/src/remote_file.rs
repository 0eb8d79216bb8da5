use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A file as reported by a remote source listing. Never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    /// Identifier, stable and unique within its source.
    pub id: String,
    /// Original filename at the source.
    pub name: String,
    /// Content checksum as reported by the source.
    pub checksum: Option<String>,
    pub mime_type: String,
    pub created_at: Option<DateTime<Utc>>,
}
