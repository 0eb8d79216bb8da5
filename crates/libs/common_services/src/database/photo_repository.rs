use crate::database::DbError;
use common_types::{MediaMetadata, Photo};
use sqlx::types::Json;
use sqlx::{Executor, Postgres};

/// Queries over the `photo`, `photo_metadata` and `camera` tables.
pub struct PhotoRepository;

impl PhotoRepository {
    pub async fn exists(
        executor: impl Executor<'_, Database = Postgres>,
        photo_id: &str,
    ) -> Result<bool, DbError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM photo WHERE id = $1)")
            .bind(photo_id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    /// Returns the id of the camera row for this make/model pair, creating it if needed.
    pub async fn ensure_camera(
        executor: impl Executor<'_, Database = Postgres>,
        make: Option<&str>,
        model: Option<&str>,
    ) -> Result<i32, DbError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO camera (make, model)
            VALUES ($1, $2)
            ON CONFLICT (make, model) DO UPDATE SET make = EXCLUDED.make
            RETURNING id
            ",
        )
        .bind(make.unwrap_or_default())
        .bind(model.unwrap_or_default())
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn insert(
        executor: impl Executor<'_, Database = Postgres>,
        photo: &Photo,
        camera_id: Option<i32>,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"
            INSERT INTO photo (
                id, checksum, filename, title, keywords, description,
                source_created_at, exif_taken_at, captured_at, camera_id,
                camera_make, camera_model, lens_make, lens_model,
                focal_length, focal_length_35mm, iso, aperture, exposure_time,
                width, height, is_private, like_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23)
            ",
        )
        .bind(&photo.id)
        .bind(&photo.checksum)
        .bind(&photo.filename)
        .bind(&photo.title)
        .bind(&photo.keywords)
        .bind(&photo.description)
        .bind(photo.source_created_at)
        .bind(photo.exif_taken_at)
        .bind(photo.captured_at)
        .bind(camera_id)
        .bind(&photo.camera_make)
        .bind(&photo.camera_model)
        .bind(&photo.lens_make)
        .bind(&photo.lens_model)
        .bind(photo.focal_length)
        .bind(photo.focal_length_35mm)
        .bind(photo.iso)
        .bind(photo.aperture)
        .bind(photo.exposure_time)
        .bind(photo.width)
        .bind(photo.height)
        .bind(photo.is_private)
        .bind(photo.like_count)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn insert_metadata(
        executor: impl Executor<'_, Database = Postgres>,
        photo_id: &str,
        metadata: &MediaMetadata,
    ) -> Result<(), DbError> {
        sqlx::query("INSERT INTO photo_metadata (photo_id, data) VALUES ($1, $2)")
            .bind(photo_id)
            .bind(Json(metadata))
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn list_ids(
        executor: impl Executor<'_, Database = Postgres>,
    ) -> Result<Vec<String>, DbError> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM photo ORDER BY id")
            .fetch_all(executor)
            .await?;
        Ok(ids)
    }
}
