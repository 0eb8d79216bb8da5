//! In-memory stand-ins for every ingestion collaborator.

use crate::database::DbError;
use crate::ingest::{
    DerivativeGenerator, IngestionPipeline, MetadataExtractor, PhotoStore, RemoteFileFetcher,
    RemoteFileLister,
};
use crate::sources::SourceError;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use color_eyre::eyre::eyre;
use common_types::{MediaMetadata, Photo, RemoteFile};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tempfile::TempDir;
use tokio::sync::Semaphore;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A jpeg remote file whose name and checksum derive from `id`.
#[must_use]
pub fn remote_file(id: &str) -> RemoteFile {
    RemoteFile {
        id: id.to_owned(),
        name: format!("{id}.jpg"),
        checksum: Some(format!("md5-{id}")),
        mime_type: "image/jpeg".to_owned(),
        created_at: Utc.timestamp_opt(1_620_000_000, 0).single(),
    }
}

#[derive(Default)]
pub struct FakeStore {
    photos: Mutex<BTreeMap<String, Option<(Photo, MediaMetadata)>>>,
    added: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeStore {
    /// Marks `id` as already stored without recording an add.
    pub fn insert_existing(&self, id: &str) {
        lock(&self.photos).insert(id.to_owned(), None);
    }

    pub fn fail_on_add(&self, id: &str) {
        lock(&self.failing).insert(id.to_owned());
    }

    /// Ids passed to successful `add_photo` calls, in call order.
    #[must_use]
    pub fn added_ids(&self) -> Vec<String> {
        lock(&self.added).clone()
    }

    #[must_use]
    pub fn photo(&self, id: &str) -> Option<Photo> {
        lock(&self.photos)
            .get(id)
            .and_then(|entry| entry.as_ref().map(|(photo, _)| photo.clone()))
    }
}

#[async_trait]
impl PhotoStore for FakeStore {
    async fn has_photo(&self, id: &str) -> Result<bool, DbError> {
        Ok(lock(&self.photos).contains_key(id))
    }

    async fn add_photo(&self, photo: &Photo, metadata: &MediaMetadata) -> Result<(), DbError> {
        if lock(&self.failing).contains(&photo.id) {
            return Err(DbError::Sqlx(sqlx::Error::Protocol(format!(
                "insert of {} rejected",
                photo.id
            ))));
        }
        lock(&self.photos).insert(photo.id.clone(), Some((photo.clone(), metadata.clone())));
        lock(&self.added).push(photo.id.clone());
        Ok(())
    }

    async fn list_photo_ids(&self) -> Result<Vec<String>, DbError> {
        Ok(lock(&self.photos).keys().cloned().collect())
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}

/// Returns a fixed listing, or a scripted upstream failure.
pub struct ScriptedLister {
    files: Vec<RemoteFile>,
    failure: Mutex<Option<u16>>,
}

impl ScriptedLister {
    #[must_use]
    pub const fn new(files: Vec<RemoteFile>) -> Self {
        Self {
            files,
            failure: Mutex::new(None),
        }
    }

    pub fn fail_with(&self, status: u16) {
        *lock(&self.failure) = Some(status);
    }
}

#[async_trait]
impl RemoteFileLister for ScriptedLister {
    async fn list_files(&self, _folder_id: &str) -> Result<Vec<RemoteFile>, SourceError> {
        if let Some(status) = *lock(&self.failure) {
            return Err(SourceError::Remote {
                status,
                message: "listing rejected".to_owned(),
            });
        }
        Ok(self.files.clone())
    }
}

/// Writes a few bytes per download. Can fail for chosen ids, and can be gated so each
/// download waits for a permit.
#[derive(Default)]
pub struct FakeFetcher {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeFetcher {
    /// A fetcher whose downloads each block until a permit is added to the returned semaphore.
    #[must_use]
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let fetcher = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (fetcher, gate)
    }

    pub fn fail_on(&self, id: &str) {
        lock(&self.failing).insert(id.to_owned());
    }

    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl RemoteFileFetcher for FakeFetcher {
    async fn download(&self, file_id: &str, destination: &Path) -> Result<(), SourceError> {
        lock(&self.calls).push(file_id.to_owned());
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(std::io::Error::other)?
                .forget();
        }
        if lock(&self.failing).contains(file_id) {
            return Err(SourceError::Remote {
                status: 500,
                message: format!("backend error for {file_id}"),
            });
        }
        tokio::fs::write(destination, b"jpeg bytes").await?;
        Ok(())
    }
}

/// Writes one marker file per photo below `root`.
pub struct RecordingGenerator {
    root: PathBuf,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingGenerator {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_on(&self, storage_key: &str) {
        lock(&self.failing).insert(storage_key.to_owned());
    }

    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl DerivativeGenerator for RecordingGenerator {
    fn output_dir(&self, storage_key: &str) -> PathBuf {
        self.root.join(storage_key)
    }

    async fn generate(&self, _source: &Path, storage_key: &str) -> color_eyre::Result<PathBuf> {
        lock(&self.calls).push(storage_key.to_owned());
        let dir = self.output_dir(storage_key);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join("240p.jpg"), b"thumb").await?;
        if lock(&self.failing).contains(storage_key) {
            return Err(eyre!("cannot decode {storage_key}"));
        }
        Ok(dir)
    }
}

/// Returns the same camera for every file, failing for chosen file stems.
#[derive(Default)]
pub struct RecordingExtractor {
    calls: Mutex<Vec<PathBuf>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingExtractor {
    pub fn fail_on(&self, stem: &str) {
        lock(&self.failing).insert(stem.to_owned());
    }

    #[must_use]
    pub fn calls(&self) -> Vec<PathBuf> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl MetadataExtractor for RecordingExtractor {
    async fn extract(&self, path: &Path) -> color_eyre::Result<MediaMetadata> {
        lock(&self.calls).push(path.to_path_buf());
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if lock(&self.failing).contains(&stem) {
            return Err(eyre!("no metadata in {stem}"));
        }
        Ok(MediaMetadata {
            camera_make: Some("FUJIFILM".to_owned()),
            camera_model: Some("X-T3".to_owned()),
            width: Some(6000),
            height: Some(4000),
            ..MediaMetadata::default()
        })
    }
}

/// Fakes wired into a pipeline, with media and thumbnail folders in a temp dir.
pub struct Fixture {
    pub dir: TempDir,
    pub lister: Arc<ScriptedLister>,
    pub fetcher: Arc<FakeFetcher>,
    pub generator: Arc<RecordingGenerator>,
    pub extractor: Arc<RecordingExtractor>,
    pub store: Arc<FakeStore>,
}

impl Fixture {
    pub fn new(files: Vec<RemoteFile>) -> std::io::Result<Self> {
        Self::with_fetcher(files, FakeFetcher::default())
    }

    pub fn with_fetcher(files: Vec<RemoteFile>, fetcher: FakeFetcher) -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("media"))?;
        let generator = RecordingGenerator::new(dir.path().join("thumbnails"));
        Ok(Self {
            dir,
            lister: Arc::new(ScriptedLister::new(files)),
            fetcher: Arc::new(fetcher),
            generator: Arc::new(generator),
            extractor: Arc::new(RecordingExtractor::default()),
            store: Arc::new(FakeStore::default()),
        })
    }

    #[must_use]
    pub fn media_folder(&self) -> PathBuf {
        self.dir.path().join("media")
    }

    #[must_use]
    pub fn thumbnail_folder(&self) -> PathBuf {
        self.dir.path().join("thumbnails")
    }

    /// A pipeline over the fakes with root folder `"root"` and cleanup enabled.
    #[must_use]
    pub fn pipeline(&self) -> IngestionPipeline {
        self.pipeline_with(Some("root"), true)
    }

    #[must_use]
    pub fn pipeline_with(&self, root_folder: Option<&str>, cleanup: bool) -> IngestionPipeline {
        IngestionPipeline::builder()
            .lister(self.lister.clone())
            .fetcher(self.fetcher.clone())
            .generator(self.generator.clone())
            .extractor(self.extractor.clone())
            .store(self.store.clone())
            .maybe_root_folder(root_folder)
            .media_folder(self.media_folder())
            .cleanup_on_failure(cleanup)
            .build()
    }
}
