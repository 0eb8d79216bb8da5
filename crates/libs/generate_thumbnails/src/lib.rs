#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

//! # Thumbnail Generation Crate
//!
//! Renders the derivative images of a photo: one JPEG per configured height (`{h}p.jpg`,
//! aspect ratio preserved, never upscaled) and a centre-cropped `square.jpg`.
//!
//! EXIF orientation is applied before resizing. Variants are rendered in parallel into a
//! temporary directory and then moved into the photo's thumbnail folder, so a failed run
//! never leaves a half-written set behind.
//!
//! ## Entry Points
//!
//! - [`ThumbnailGenerator`]: the [`DerivativeGenerator`] used by the ingestion pipeline.
//! - [`generate_thumbnails`]: renders all variants for one file into a folder.
//! - [`thumbs_exist`]: checks whether every expected variant is already present.

mod photo;
mod utils;

use app_state::{IngestSettings, ThumbnailSettings};
use async_trait::async_trait;
use color_eyre::Result;
use common_services::ingest::DerivativeGenerator;
use common_services::metadata::read_orientation;
use std::path::{Path, PathBuf};
use temp_dir::TempDir;
use tracing::{debug, instrument};

/// Checks if all the configured thumbnails already exist in `thumb_folder`.
#[must_use]
pub fn thumbs_exist(thumb_folder: &Path, config: &ThumbnailSettings) -> bool {
    let heights_exist = config
        .heights
        .iter()
        .all(|&h| thumb_folder.join(photo::height_name(h)).exists());
    let square_exists = config.square_size == 0 || thumb_folder.join(photo::SQUARE_NAME).exists();
    heights_exist && square_exists
}

/// Generates every configured thumbnail for `file` into `out_folder`.
///
/// # Errors
///
/// Returns an error if the source cannot be decoded or the output cannot be written.
pub async fn generate_thumbnails(
    file: &Path,
    out_folder: &Path,
    config: &ThumbnailSettings,
) -> Result<()> {
    if config.skip_if_exists && thumbs_exist(out_folder, config) {
        debug!("Thumbnails for {} already exist", file.display());
        return Ok(());
    }

    let temp_dir = TempDir::new()?;
    let temp_out_dir = temp_dir.path().to_path_buf();
    let source = file.to_path_buf();
    let settings = config.clone();

    tokio::task::spawn_blocking(move || {
        let orientation = read_orientation(&source).unwrap_or(1);
        photo::render_variants(&source, &temp_out_dir, &settings, orientation)
    })
    .await??;

    utils::move_dir_contents(temp_dir.path(), out_folder).await?;
    temp_dir.cleanup()?;

    Ok(())
}

/// [`DerivativeGenerator`] writing to `<thumbnail_folder>/<storage key>/`.
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    settings: IngestSettings,
}

impl ThumbnailGenerator {
    #[must_use]
    pub const fn new(settings: IngestSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl DerivativeGenerator for ThumbnailGenerator {
    fn output_dir(&self, storage_key: &str) -> PathBuf {
        self.settings.thumbnail_dir(storage_key)
    }

    #[instrument(skip(self, source))]
    async fn generate(&self, source: &Path, storage_key: &str) -> Result<PathBuf> {
        let out_folder = self.output_dir(storage_key);
        generate_thumbnails(source, &out_folder, &self.settings.thumbnails).await?;
        Ok(out_folder)
    }
}
