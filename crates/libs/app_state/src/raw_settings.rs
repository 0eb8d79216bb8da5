use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct RawSettings {
    pub ingest: RawIngestSettings,
    #[serde(default)]
    pub drive: DriveSettings,
    #[serde(default)]
    pub jobs: JobSettings,
    pub logging: LoggingSettings,
    pub api: ApiSettings,
    pub secrets: SecretSettings,
    pub constants: RawConstants,
}

/// Where photos come from and where their files end up.
#[derive(Debug, Deserialize, Clone)]
pub struct RawIngestSettings {
    /// Folder that receives downloaded originals.
    pub media_folder: PathBuf,
    /// Folder that receives derivative images, one sub folder per photo.
    pub thumbnail_folder: PathBuf,
    #[serde(default)]
    pub source: SourceKind,
    /// Remote folder id (drive) or directory (local) to ingest from.
    pub root_folder: Option<String>,
    #[serde(default = "default_true")]
    pub cleanup_on_failure: bool,
    #[serde(default)]
    pub clean_on_startup: bool,
    pub thumbnails: ThumbnailSettings,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Drive,
    Local,
}

/// Configuration for derivative image generation.
#[derive(Debug, Deserialize, Clone)]
pub struct ThumbnailSettings {
    /// Heights of the aspect-preserving variants, named `{height}p.jpg`.
    pub heights: Vec<u32>,
    /// Edge length of the centre-cropped `square.jpg` variant.
    pub square_size: u32,
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
    #[serde(default)]
    pub skip_if_exists: bool,
}

/// Google Drive v3 endpoint configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct DriveSettings {
    #[serde(default = "default_drive_api_url")]
    pub api_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            api_url: default_drive_api_url(),
            page_size: default_page_size(),
        }
    }
}

/// Background ingestion job settings.
#[derive(Debug, Deserialize, Clone)]
pub struct JobSettings {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// When set, the oldest finished jobs are forgotten once more than this many are known.
    pub max_retained_jobs: Option<usize>,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_retained_jobs: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Configuration for the API server.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u32,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecretSettings {
    pub owner_password: String,
    pub database_url: String,
    pub drive_access_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawConstants {
    pub database: DatabaseConstants,
}

/// Database connection and related configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConstants {
    pub max_connections: u32,
    pub min_connection: u32,
    pub max_lifetime: u64,
    pub idle_timeout: u64,
    pub acquire_timeout: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_page_size() -> u32 {
    1000
}

const fn default_queue_capacity() -> usize {
    10
}

fn default_drive_api_url() -> String {
    "https://www.googleapis.com/drive/v3".to_owned()
}
