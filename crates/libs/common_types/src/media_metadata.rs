use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Structured summary of an image's embedded metadata.
///
/// The promoted fields end up as photo columns, the whole struct (including `raw`)
/// is stored as the photo's metadata blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens_make: Option<String>,
    pub lens_model: Option<String>,
    /// Nominal focal length in mm.
    pub focal_length: Option<f64>,
    /// 35mm-equivalent focal length in mm.
    pub focal_length_35mm: Option<u32>,
    pub iso: Option<u32>,
    /// F-number.
    pub aperture: Option<f64>,
    /// Exposure time in seconds.
    pub exposure_time: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// EXIF orientation, 1..=8.
    pub orientation: Option<u32>,
    pub keywords: Vec<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// `DateTimeOriginal`, as recorded by the camera (no timezone).
    pub taken_at: Option<NaiveDateTime>,
    /// Every field found in the file, by tag name.
    pub raw: BTreeMap<String, String>,
}
