use crate::{
    ApiSettings, DatabaseConstants, DriveSettings, JobSettings, LoggingSettings, RawSettings,
    SecretSettings, SourceKind, ThumbnailSettings,
};
use color_eyre::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf, absolute};

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub ingest: IngestSettings,
    pub drive: DriveSettings,
    pub jobs: JobSettings,
    pub logging: LoggingSettings,
    pub api: ApiSettings,
    pub secrets: SecretSettings,
    pub database: DatabaseConstants,
}

/// Ingest settings with all folders resolved to absolute paths.
#[derive(Debug, Deserialize, Clone)]
pub struct IngestSettings {
    pub media_folder: PathBuf,
    pub thumbnail_folder: PathBuf,
    pub source: SourceKind,
    pub root_folder: Option<String>,
    pub cleanup_on_failure: bool,
    pub clean_on_startup: bool,
    pub thumbnails: ThumbnailSettings,
}

impl TryFrom<RawSettings> for AppSettings {
    type Error = color_eyre::Report;

    fn try_from(raw: RawSettings) -> Result<Self> {
        let ingest = IngestSettings {
            media_folder: absolute(&raw.ingest.media_folder)?,
            thumbnail_folder: absolute(&raw.ingest.thumbnail_folder)?,
            source: raw.ingest.source,
            root_folder: raw.ingest.root_folder.filter(|f| !f.trim().is_empty()),
            cleanup_on_failure: raw.ingest.cleanup_on_failure,
            clean_on_startup: raw.ingest.clean_on_startup,
            thumbnails: raw.ingest.thumbnails,
        };

        Ok(Self {
            ingest,
            drive: raw.drive,
            jobs: raw.jobs,
            logging: raw.logging,
            api: raw.api,
            secrets: raw.secrets,
            database: raw.constants.database,
        })
    }
}

impl IngestSettings {
    /// Folder holding every derivative of one photo.
    #[must_use]
    pub fn thumbnail_dir(&self, storage_key: &str) -> PathBuf {
        self.thumbnail_folder.join(storage_key)
    }

    /// The configured root folder, as a local path. Only meaningful for [`SourceKind::Local`].
    #[must_use]
    pub fn local_root(&self) -> Option<&Path> {
        self.root_folder.as_deref().map(Path::new)
    }
}
