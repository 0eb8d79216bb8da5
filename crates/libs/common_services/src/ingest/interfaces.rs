use crate::database::DbError;
use crate::sources::SourceError;
use async_trait::async_trait;
use color_eyre::Result;
use common_types::{MediaMetadata, Photo, RemoteFile};
use std::path::{Path, PathBuf};

/// Lists the image files in a remote folder, skipping trashed files.
#[async_trait]
pub trait RemoteFileLister: Send + Sync {
    async fn list_files(&self, folder_id: &str) -> Result<Vec<RemoteFile>, SourceError>;
}

/// Downloads one remote file to a local path.
#[async_trait]
pub trait RemoteFileFetcher: Send + Sync {
    async fn download(&self, file_id: &str, destination: &Path) -> Result<(), SourceError>;
}

/// Produces the resized and cropped variants of a source image.
#[async_trait]
pub trait DerivativeGenerator: Send + Sync {
    /// Folder that holds every variant of the photo identified by `storage_key`.
    fn output_dir(&self, storage_key: &str) -> PathBuf;

    /// Writes every variant for the photo into [`DerivativeGenerator::output_dir`] and returns
    /// that folder.
    async fn generate(&self, source: &Path, storage_key: &str) -> Result<PathBuf>;
}

/// Reads embedded metadata from a local image.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<MediaMetadata>;
}

/// Persistence boundary for photos.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn has_photo(&self, id: &str) -> Result<bool, DbError>;

    /// Inserts the photo and its metadata blob as one unit.
    async fn add_photo(&self, photo: &Photo, metadata: &MediaMetadata) -> Result<(), DbError>;

    async fn list_photo_ids(&self) -> Result<Vec<String>, DbError>;

    async fn ping(&self) -> Result<(), DbError>;
}
