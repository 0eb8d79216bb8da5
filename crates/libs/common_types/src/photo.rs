use crate::{MediaMetadata, RemoteFile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A photo record. Exactly one exists per source identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub checksum: Option<String>,
    /// Name of the stored original inside the media folder.
    pub filename: String,
    pub title: Option<String>,
    pub keywords: Vec<String>,
    pub description: Option<String>,
    /// Timestamp reported by the source.
    pub source_created_at: Option<DateTime<Utc>>,
    /// Capture time from EXIF `DateTimeOriginal`, read as UTC.
    pub exif_taken_at: Option<DateTime<Utc>>,
    /// Best known capture time: EXIF when available, otherwise the source timestamp.
    pub captured_at: Option<DateTime<Utc>>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens_make: Option<String>,
    pub lens_model: Option<String>,
    pub focal_length: Option<f32>,
    pub focal_length_35mm: Option<i32>,
    pub iso: Option<i32>,
    pub aperture: Option<f32>,
    pub exposure_time: Option<f32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub is_private: bool,
    pub like_count: i32,
}

impl Photo {
    /// Builds the in-memory draft for a remote file, before anything is downloaded.
    #[must_use]
    pub fn draft(file: &RemoteFile, filename: impl Into<String>) -> Self {
        Self {
            id: file.id.clone(),
            checksum: file.checksum.clone(),
            filename: filename.into(),
            title: None,
            keywords: Vec::new(),
            description: None,
            source_created_at: file.created_at,
            exif_taken_at: None,
            captured_at: file.created_at,
            camera_make: None,
            camera_model: None,
            lens_make: None,
            lens_model: None,
            focal_length: None,
            focal_length_35mm: None,
            iso: None,
            aperture: None,
            exposure_time: None,
            width: None,
            height: None,
            is_private: true,
            like_count: 0,
        }
    }

    /// Copies the promoted metadata fields onto the photo.
    pub fn apply_metadata(&mut self, metadata: &MediaMetadata) {
        self.camera_make.clone_from(&metadata.camera_make);
        self.camera_model.clone_from(&metadata.camera_model);
        self.lens_make.clone_from(&metadata.lens_make);
        self.lens_model.clone_from(&metadata.lens_model);
        self.focal_length = metadata.focal_length.map(|f| f as f32);
        self.focal_length_35mm = metadata.focal_length_35mm.map(|f| f as i32);
        self.iso = metadata.iso.map(|iso| iso as i32);
        self.aperture = metadata.aperture.map(|a| a as f32);
        self.exposure_time = metadata.exposure_time.map(|e| e as f32);
        self.width = metadata.width.map(|w| w as i32);
        self.height = metadata.height.map(|h| h as i32);
        self.keywords.clone_from(&metadata.keywords);
        if metadata.title.is_some() {
            self.title.clone_from(&metadata.title);
        }
        if metadata.description.is_some() {
            self.description.clone_from(&metadata.description);
        }

        // A zeroed-out EXIF clock is as good as no clock.
        self.exif_taken_at = metadata
            .taken_at
            .map(|t| t.and_utc())
            .filter(|t| t.timestamp() != 0);
        if self.exif_taken_at.is_some() {
            self.captured_at = self.exif_taken_at;
        }
    }

    /// Whether the photo has a camera make or model to link to.
    #[must_use]
    pub fn has_camera(&self) -> bool {
        self.camera_make.is_some() || self.camera_model.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn remote_file() -> RemoteFile {
        RemoteFile {
            id: "abc".to_owned(),
            name: "IMG_0001.jpg".to_owned(),
            checksum: Some("d41d8cd9".to_owned()),
            mime_type: "image/jpeg".to_owned(),
            created_at: Some(Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap()),
        }
    }

    #[test]
    fn draft_uses_source_timestamp() {
        let photo = Photo::draft(&remote_file(), "abc.jpg");

        assert_eq!(photo.id, "abc");
        assert_eq!(photo.filename, "abc.jpg");
        assert_eq!(photo.captured_at, photo.source_created_at);
        assert!(photo.is_private);
        assert_eq!(photo.like_count, 0);
    }

    #[test]
    fn exif_capture_time_is_preferred() {
        let mut photo = Photo::draft(&remote_file(), "abc.jpg");
        let taken = NaiveDate::from_ymd_opt(2019, 7, 14)
            .unwrap()
            .and_hms_opt(18, 30, 5)
            .unwrap();
        let metadata = MediaMetadata {
            camera_make: Some("FUJIFILM".to_owned()),
            iso: Some(400),
            aperture: Some(2.8),
            width: Some(6000),
            taken_at: Some(taken),
            keywords: vec!["beach".to_owned()],
            ..MediaMetadata::default()
        };

        photo.apply_metadata(&metadata);

        assert_eq!(photo.captured_at, Some(taken.and_utc()));
        assert_eq!(photo.source_created_at, remote_file().created_at);
        assert_eq!(photo.camera_make.as_deref(), Some("FUJIFILM"));
        assert_eq!(photo.iso, Some(400));
        assert_eq!(photo.aperture, Some(2.8));
        assert_eq!(photo.width, Some(6000));
        assert_eq!(photo.keywords, vec!["beach".to_owned()]);
        assert!(photo.has_camera());
    }

    #[test]
    fn zero_exif_time_keeps_source_timestamp() {
        let mut photo = Photo::draft(&remote_file(), "abc.jpg");
        let metadata = MediaMetadata {
            taken_at: Some(Utc.timestamp_opt(0, 0).unwrap().naive_utc()),
            ..MediaMetadata::default()
        };

        photo.apply_metadata(&metadata);

        assert_eq!(photo.exif_taken_at, None);
        assert_eq!(photo.captured_at, remote_file().created_at);
        assert!(!photo.has_camera());
    }
}
