use crate::ingest::{
    DerivativeGenerator, IngestAllError, IngestError, MetadataExtractor, PhotoStore,
    RemoteFileFetcher, RemoteFileLister,
};
use crate::utils::{remove_dir_best_effort, remove_file_best_effort, storage_key};
use app_state::IngestSettings;
use bon::Builder;
use common_types::{Photo, RemoteFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Turns the remote listing into stored photos, one file at a time.
///
/// Every collaborator is injected, so the pipeline can run against any source and store.
#[derive(Builder, Clone)]
pub struct IngestionPipeline {
    lister: Arc<dyn RemoteFileLister>,
    fetcher: Arc<dyn RemoteFileFetcher>,
    generator: Arc<dyn DerivativeGenerator>,
    extractor: Arc<dyn MetadataExtractor>,
    store: Arc<dyn PhotoStore>,
    #[builder(into)]
    root_folder: Option<String>,
    #[builder(into)]
    media_folder: PathBuf,
    #[builder(default = true)]
    cleanup_on_failure: bool,
}

impl IngestionPipeline {
    /// Takes folder and cleanup options from the ingest settings.
    pub fn from_settings(
        settings: &IngestSettings,
        lister: Arc<dyn RemoteFileLister>,
        fetcher: Arc<dyn RemoteFileFetcher>,
        generator: Arc<dyn DerivativeGenerator>,
        extractor: Arc<dyn MetadataExtractor>,
        store: Arc<dyn PhotoStore>,
    ) -> Self {
        Self::builder()
            .lister(lister)
            .fetcher(fetcher)
            .generator(generator)
            .extractor(extractor)
            .store(store)
            .maybe_root_folder(settings.root_folder.clone())
            .media_folder(settings.media_folder.clone())
            .cleanup_on_failure(settings.cleanup_on_failure)
            .build()
    }

    /// Lists every image in the configured root folder, in source order.
    #[instrument(skip(self))]
    pub async fn list_candidates(&self) -> Result<Vec<RemoteFile>, IngestError> {
        let root = self
            .root_folder
            .as_deref()
            .ok_or_else(|| IngestError::Config("no root folder is configured".to_owned()))?;
        let files = self
            .lister
            .list_files(root)
            .await
            .map_err(IngestError::Upstream)?;
        debug!("Found {} candidates", files.len());
        Ok(files)
    }

    /// The candidates that are not stored yet. Read-only.
    #[instrument(skip(self))]
    pub async fn check_missing(&self) -> Result<Vec<RemoteFile>, IngestError> {
        let mut missing = Vec::new();
        for file in self.list_candidates().await? {
            if !self.has_photo(&file).await? {
                missing.push(file);
            }
        }
        Ok(missing)
    }

    /// Ingests a single file. Returns `false` when the photo was already stored, in which case
    /// nothing else is touched.
    #[instrument(skip_all, fields(file_id = %file.id))]
    pub async fn ingest_one(&self, file: &RemoteFile) -> Result<bool, IngestError> {
        if self.has_photo(file).await? {
            debug!("Already stored, skipping");
            return Ok(false);
        }

        let key = storage_key(&file.id);
        let filename = format!("{key}.{}", extension_for(file));
        let original = self.media_folder.join(&filename);
        let draft = Photo::draft(file, filename);

        if let Err(source) = self.fetcher.download(&file.id, &original).await {
            if self.cleanup_on_failure {
                remove_file_best_effort(&original).await;
            }
            return Err(IngestError::Fetch {
                id: file.id.clone(),
                source,
            });
        }

        match self.process(file, &key, &original, draft).await {
            Ok(()) => {
                info!("Ingested {}", file.name);
                Ok(true)
            }
            Err(e) => {
                warn!("Ingesting {} failed: {e}", file.id);
                if self.cleanup_on_failure {
                    remove_file_best_effort(&original).await;
                    remove_dir_best_effort(&self.generator.output_dir(&key)).await;
                }
                Err(e)
            }
        }
    }

    /// Ingests every candidate in listing order and returns the ones that were added.
    ///
    /// Stops at the first failing file. The files added before it are reported alongside
    /// the error.
    #[instrument(skip(self))]
    pub async fn ingest_all(&self) -> Result<Vec<RemoteFile>, IngestAllError> {
        let candidates = self.list_candidates().await?;
        let mut added = Vec::new();
        for file in candidates {
            match self.ingest_one(&file).await {
                Ok(true) => added.push(file),
                Ok(false) => {}
                Err(error) => return Err(IngestAllError { added, error }),
            }
        }
        info!("Added {} photos", added.len());
        Ok(added)
    }

    async fn has_photo(&self, file: &RemoteFile) -> Result<bool, IngestError> {
        self.store
            .has_photo(&file.id)
            .await
            .map_err(|source| IngestError::Persistence {
                id: file.id.clone(),
                source,
            })
    }

    /// Steps after the download: derivatives, metadata, then the store write.
    async fn process(
        &self,
        file: &RemoteFile,
        key: &str,
        original: &Path,
        mut draft: Photo,
    ) -> Result<(), IngestError> {
        self.generator
            .generate(original, key)
            .await
            .map_err(|source| IngestError::Derivative {
                id: file.id.clone(),
                source,
            })?;

        let metadata =
            self.extractor
                .extract(original)
                .await
                .map_err(|source| IngestError::Metadata {
                    id: file.id.clone(),
                    source,
                })?;
        draft.apply_metadata(&metadata);

        self.store
            .add_photo(&draft, &metadata)
            .await
            .map_err(|source| IngestError::Persistence {
                id: file.id.clone(),
                source,
            })
    }
}

/// File extension for the stored original, taken from the mimetype.
fn extension_for(file: &RemoteFile) -> String {
    mime_guess::get_mime_extensions_str(&file.mime_type)
        .and_then(|extensions| {
            // Prefer the common spelling where the table lists several.
            extensions
                .iter()
                .find(|ext| matches!(**ext, "jpg" | "png" | "heic" | "webp" | "gif" | "tiff"))
                .or_else(|| extensions.first())
        })
        .map_or_else(|| "jpg".to_owned(), |ext| (*ext).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ErrorKind;
    use crate::sources::LocalFolderSource;
    use crate::testing::{Fixture, remote_file};
    use color_eyre::Result;

    #[tokio::test]
    async fn stored_file_is_a_no_op() -> Result<()> {
        let fixture = Fixture::new(vec![remote_file("a")])?;
        fixture.store.insert_existing("a");
        let pipeline = fixture.pipeline();

        let added = pipeline.ingest_one(&remote_file("a")).await?;

        assert!(!added);
        assert!(fixture.fetcher.calls().is_empty());
        assert!(fixture.generator.calls().is_empty());
        assert!(fixture.extractor.calls().is_empty());
        assert!(fixture.store.added_ids().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn new_file_runs_every_step_and_is_stored() -> Result<()> {
        let fixture = Fixture::new(vec![remote_file("b")])?;
        let pipeline = fixture.pipeline();

        let added = pipeline.ingest_one(&remote_file("b")).await?;

        assert!(added);
        assert_eq!(fixture.fetcher.calls(), vec!["b"]);
        assert_eq!(fixture.generator.calls(), vec!["b"]);
        let photo = fixture.store.photo("b").ok_or_else(|| color_eyre::eyre::eyre!("missing"))?;
        assert_eq!(photo.filename, "b.jpg");
        assert_eq!(photo.camera_make.as_deref(), Some("FUJIFILM"));
        assert!(fixture.media_folder().join("b.jpg").exists());
        Ok(())
    }

    #[tokio::test]
    async fn second_run_adds_nothing() -> Result<()> {
        let fixture = Fixture::new(vec![remote_file("a"), remote_file("b")])?;
        let pipeline = fixture.pipeline();

        let first = pipeline.ingest_all().await?;
        let second = pipeline.ingest_all().await?;

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(fixture.store.added_ids(), vec!["a", "b"]);
        Ok(())
    }

    #[tokio::test]
    async fn batch_stops_at_first_failure() -> Result<()> {
        let fixture = Fixture::new(vec![
            remote_file("A"),
            remote_file("B"),
            remote_file("C"),
            remote_file("D"),
        ])?;
        fixture.store.insert_existing("A");
        fixture.fetcher.fail_on("C");
        let pipeline = fixture.pipeline();

        let Err(err) = pipeline.ingest_all().await else {
            color_eyre::eyre::bail!("batch should fail");
        };

        let added: Vec<_> = err.added.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(added, vec!["B"]);
        assert_eq!(err.error.kind(), ErrorKind::Fetch);
        assert!(err.error.to_string().contains('C'));
        assert_eq!(fixture.fetcher.calls(), vec!["B", "C"]);
        assert_eq!(fixture.store.added_ids(), vec!["B"]);
        Ok(())
    }

    #[tokio::test]
    async fn missing_root_folder_is_a_config_error() -> Result<()> {
        let fixture = Fixture::new(vec![remote_file("a")])?;
        let pipeline = fixture.pipeline_with(None, true);

        let result = pipeline.ingest_all().await;

        assert!(matches!(
            result.map_err(|e| e.error.kind()),
            Err(ErrorKind::Config)
        ));
        assert!(fixture.fetcher.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn listing_failure_is_upstream() -> Result<()> {
        let fixture = Fixture::new(Vec::new())?;
        fixture.lister.fail_with(403);
        let pipeline = fixture.pipeline();

        let Err(err) = pipeline.list_candidates().await else {
            color_eyre::eyre::bail!("listing should fail");
        };

        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.status_code(), 403);
        Ok(())
    }

    #[tokio::test]
    async fn check_missing_is_read_only() -> Result<()> {
        let fixture = Fixture::new(vec![remote_file("a"), remote_file("b"), remote_file("c")])?;
        fixture.store.insert_existing("b");
        let pipeline = fixture.pipeline();

        let missing = pipeline.check_missing().await?;

        let ids: Vec<_> = missing.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(fixture.fetcher.calls().is_empty());
        assert!(fixture.store.added_ids().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn later_failure_removes_original_and_derivatives() -> Result<()> {
        let fixture = Fixture::new(vec![remote_file("x")])?;
        fixture.extractor.fail_on("x");
        let pipeline = fixture.pipeline();

        let result = pipeline.ingest_one(&remote_file("x")).await;

        assert!(matches!(
            result.map_err(|e| e.kind()),
            Err(ErrorKind::Metadata)
        ));
        assert!(!fixture.media_folder().join("x.jpg").exists());
        assert!(!fixture.generator.output_dir("x").exists());
        assert!(fixture.store.added_ids().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failure_keeps_files_when_cleanup_is_off() -> Result<()> {
        let fixture = Fixture::new(vec![remote_file("x")])?;
        fixture.store.fail_on_add("x");
        let pipeline = fixture.pipeline_with(Some("root"), false);

        let result = pipeline.ingest_one(&remote_file("x")).await;

        assert!(matches!(
            result.map_err(|e| e.kind()),
            Err(ErrorKind::Persistence)
        ));
        assert!(fixture.media_folder().join("x.jpg").exists());
        assert!(fixture.generator.output_dir("x").exists());
        Ok(())
    }

    #[tokio::test]
    async fn local_ids_that_flatten_alike_keep_separate_originals() -> Result<()> {
        let fixture = Fixture::new(Vec::new())?;
        let source_root = fixture.dir.path().join("source");
        std::fs::create_dir_all(source_root.join("a"))?;
        std::fs::write(source_root.join("a/b.jpg"), b"FIRST")?;
        std::fs::write(source_root.join("a_b.jpg"), b"SECOND")?;
        let source = Arc::new(LocalFolderSource::new(source_root.clone()));
        let pipeline = IngestionPipeline::builder()
            .lister(source.clone())
            .fetcher(source)
            .generator(fixture.generator.clone())
            .extractor(fixture.extractor.clone())
            .store(fixture.store.clone())
            .root_folder(source_root.to_string_lossy().into_owned())
            .media_folder(fixture.media_folder())
            .build();

        let added = pipeline.ingest_all().await?;

        assert_eq!(added.len(), 2);
        let nested = fixture
            .store
            .photo("a/b.jpg")
            .ok_or_else(|| color_eyre::eyre::eyre!("a/b.jpg not stored"))?;
        let flat = fixture
            .store
            .photo("a_b.jpg")
            .ok_or_else(|| color_eyre::eyre::eyre!("a_b.jpg not stored"))?;
        assert_ne!(nested.filename, flat.filename);
        let media = fixture.media_folder();
        assert_eq!(std::fs::read(media.join(&nested.filename))?, b"FIRST");
        assert_eq!(std::fs::read(media.join(&flat.filename))?, b"SECOND");
        let generated = fixture.generator.calls();
        assert_eq!(generated.len(), 2);
        assert_ne!(generated[0], generated[1]);
        Ok(())
    }

    #[test]
    fn extension_follows_mimetype() {
        let mut png = remote_file("p");
        png.mime_type = "image/png".to_owned();
        let mut unknown = remote_file("u");
        unknown.mime_type = "image/x-made-up".to_owned();

        assert_eq!(extension_for(&remote_file("j")), "jpg");
        assert_eq!(extension_for(&png), "png");
        assert_eq!(extension_for(&unknown), "jpg");
    }
}
