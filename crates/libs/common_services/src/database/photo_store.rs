use crate::database::{DbError, PhotoRepository};
use crate::ingest::PhotoStore;
use async_trait::async_trait;
use common_types::{MediaMetadata, Photo};
use sqlx::PgPool;
use tracing::{debug, instrument};

/// [`PhotoStore`] backed by Postgres.
#[derive(Clone)]
pub struct PgPhotoStore {
    pool: PgPool,
}

impl PgPhotoStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhotoStore for PgPhotoStore {
    async fn has_photo(&self, id: &str) -> Result<bool, DbError> {
        PhotoRepository::exists(&self.pool, id).await
    }

    #[instrument(skip_all, fields(photo_id = %photo.id))]
    async fn add_photo(&self, photo: &Photo, metadata: &MediaMetadata) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let camera_id = if photo.has_camera() {
            Some(
                PhotoRepository::ensure_camera(
                    &mut *tx,
                    photo.camera_make.as_deref(),
                    photo.camera_model.as_deref(),
                )
                .await?,
            )
        } else {
            None
        };
        PhotoRepository::insert(&mut *tx, photo, camera_id).await?;
        PhotoRepository::insert_metadata(&mut *tx, &photo.id, metadata).await?;

        tx.commit().await?;
        debug!("Stored photo and metadata");
        Ok(())
    }

    async fn list_photo_ids(&self) -> Result<Vec<String>, DbError> {
        PhotoRepository::list_ids(&self.pool).await
    }

    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
