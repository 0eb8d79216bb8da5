use crate::ingest::{RemoteFileFetcher, RemoteFileLister};
use crate::sources::SourceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common_types::RemoteFile;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

/// Treats a directory on disk as a photo source.
///
/// The identifier of a file is its path relative to the source root, using `/` separators.
#[derive(Debug, Clone)]
pub struct LocalFolderSource {
    root: PathBuf,
}

impl LocalFolderSource {
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Maps an identifier back to a path, refusing anything that escapes the root.
    fn resolve(&self, file_id: &str) -> Result<PathBuf, SourceError> {
        let relative = Path::new(file_id);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || file_id.is_empty() {
            return Err(SourceError::NotFound(file_id.to_owned()));
        }
        Ok(self.root.join(relative))
    }

    fn folder(&self, folder_id: &str) -> Result<PathBuf, SourceError> {
        let path = Path::new(folder_id);
        if folder_id.is_empty() || path == self.root {
            return Ok(self.root.clone());
        }
        if path.is_absolute() {
            return if path.starts_with(&self.root) {
                Ok(path.to_path_buf())
            } else {
                Err(SourceError::NotFound(folder_id.to_owned()))
            };
        }
        self.resolve(folder_id)
    }
}

fn relative_id(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_reader(File::open(path)?)?;
    Ok(hasher.finalize().to_hex().to_string())
}

fn list_images(root: &Path, folder: &Path) -> Result<Vec<RemoteFile>, SourceError> {
    if !folder.is_dir() {
        return Err(SourceError::NotFound(folder.display().to_string()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", folder.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(mime) = mime_guess::from_path(path).first() else {
            continue;
        };
        if mime.type_() != mime_guess::mime::IMAGE {
            continue;
        }
        let Some(id) = relative_id(root, path) else {
            continue;
        };

        let created_at = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from);

        files.push(RemoteFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            checksum: Some(hash_file(path)?),
            mime_type: mime.essence_str().to_owned(),
            created_at,
            id,
        });
    }
    Ok(files)
}

#[async_trait]
impl RemoteFileLister for LocalFolderSource {
    /// `folder_id` is the source root itself, an absolute directory inside it, or a directory
    /// relative to it.
    #[instrument(skip(self))]
    async fn list_files(&self, folder_id: &str) -> Result<Vec<RemoteFile>, SourceError> {
        let folder = self.folder(folder_id)?;
        let root = self.root.clone();

        let files = tokio::task::spawn_blocking(move || list_images(&root, &folder))
            .await
            .map_err(std::io::Error::other)??;
        debug!("Listed {} local images", files.len());
        Ok(files)
    }
}

#[async_trait]
impl RemoteFileFetcher for LocalFolderSource {
    #[instrument(skip(self, destination))]
    async fn download(&self, file_id: &str, destination: &Path) -> Result<(), SourceError> {
        let source = self.resolve(file_id)?;
        if !tokio::fs::try_exists(&source).await? {
            return Err(SourceError::NotFound(file_id.to_owned()));
        }
        tokio::fs::copy(&source, destination).await?;
        Ok(())
    }
}
