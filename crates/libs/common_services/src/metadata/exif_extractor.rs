use crate::ingest::MetadataExtractor;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use color_eyre::eyre::{Context, eyre};
use color_eyre::Result;
use common_types::MediaMetadata;
use exif::{Exif, Field, In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Windows explorer tags, stored as UCS-2 bytes in IFD0.
const XP_TITLE: Tag = Tag(exif::Context::Tiff, 0x9C9B);
const XP_KEYWORDS: Tag = Tag(exif::Context::Tiff, 0x9C9E);

/// [`MetadataExtractor`] reading EXIF with `kamadak-exif`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifExtractor;

impl ExifExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetadataExtractor for ExifExtractor {
    #[instrument(skip(self))]
    async fn extract(&self, path: &Path) -> Result<MediaMetadata> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || read_metadata(&path)).await?
    }
}

/// Reads the metadata of one image file. Files without EXIF still get their pixel size.
pub fn read_metadata(path: &Path) -> Result<MediaMetadata> {
    let file = File::open(path).wrap_err_with(|| format!("Cannot open {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let mut metadata = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => summarize(&exif),
        Err(e) => {
            debug!("No EXIF in {}: {}", path.display(), e);
            MediaMetadata::default()
        }
    };

    if metadata.width.is_none() || metadata.height.is_none() {
        let size = imagesize::size(path)
            .map_err(|e| eyre!("{} is not a readable image: {e}", path.display()))?;
        metadata.width = Some(size.width as u32);
        metadata.height = Some(size.height as u32);
    }
    Ok(metadata)
}

/// EXIF orientation (1..=8) of an image, when it has one.
#[must_use]
pub fn read_orientation(path: &Path) -> Option<u32> {
    let file = File::open(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;
    exif.get_field(Tag::Orientation, In::PRIMARY)?
        .value
        .get_uint(0)
}

fn summarize(exif: &Exif) -> MediaMetadata {
    let field = |tag: Tag| exif.get_field(tag, In::PRIMARY);
    let text = |tag: Tag| field(tag).and_then(ascii_value);
    let rational = |tag: Tag| field(tag).and_then(rational_value);
    let uint = |tag: Tag| field(tag).and_then(|f| f.value.get_uint(0));

    let raw = exif
        .fields()
        .filter(|f| f.ifd_num == In::PRIMARY)
        .map(|f| {
            (
                f.tag.to_string(),
                f.display_value().with_unit(exif).to_string(),
            )
        })
        .collect();

    MediaMetadata {
        camera_make: text(Tag::Make),
        camera_model: text(Tag::Model),
        lens_make: text(Tag::LensMake),
        lens_model: text(Tag::LensModel),
        focal_length: rational(Tag::FocalLength),
        focal_length_35mm: uint(Tag::FocalLengthIn35mmFilm),
        iso: uint(Tag::PhotographicSensitivity),
        aperture: rational(Tag::FNumber),
        exposure_time: rational(Tag::ExposureTime),
        width: uint(Tag::PixelXDimension),
        height: uint(Tag::PixelYDimension),
        orientation: uint(Tag::Orientation),
        keywords: field(XP_KEYWORDS)
            .and_then(ucs2_value)
            .map(|k| split_keywords(&k))
            .unwrap_or_default(),
        title: field(XP_TITLE).and_then(ucs2_value),
        description: text(Tag::ImageDescription),
        taken_at: field(Tag::DateTimeOriginal).and_then(datetime_value),
        raw,
    }
}

fn ascii_value(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_matches(['\0', ' ']).to_owned())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn rational_value(field: &Field) -> Option<f64> {
    match &field.value {
        Value::Rational(values) => values
            .first()
            .filter(|r| r.denom != 0)
            .map(exif::Rational::to_f64),
        _ => None,
    }
}

fn datetime_value(field: &Field) -> Option<NaiveDateTime> {
    let Value::Ascii(parts) = &field.value else {
        return None;
    };
    let dt = exif::DateTime::from_ascii(parts.first()?).ok()?;
    NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))?
        .and_hms_opt(
            u32::from(dt.hour),
            u32::from(dt.minute),
            u32::from(dt.second),
        )
}

fn ucs2_value(field: &Field) -> Option<String> {
    let bytes = match &field.value {
        Value::Byte(bytes) => bytes.as_slice(),
        Value::Undefined(bytes, _) => bytes.as_slice(),
        _ => return None,
    };
    decode_ucs2(bytes)
}

/// Decodes little-endian UCS-2 text, stopping at the first NUL.
fn decode_ucs2(bytes: &[u8]) -> Option<String> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0)
        .collect();
    let text = String::from_utf16_lossy(&units).trim().to_owned();
    (!text.is_empty()).then_some(text)
}

fn split_keywords(keywords: &str) -> Vec<String> {
    keywords
        .split(';')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::Rational;
    use std::io::Cursor;

    fn ucs2(text: &str) -> Vec<u8> {
        text.encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(u16::to_le_bytes)
            .collect()
    }

    fn ascii(tag: Tag, text: &str) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![text.as_bytes().to_vec()]),
        }
    }

    fn write_tiff(path: &Path) -> Result<()> {
        let fields = vec![
            ascii(Tag::Make, "FUJIFILM"),
            ascii(Tag::Model, "X-T3"),
            ascii(Tag::ImageDescription, "Sunset over the dunes"),
            ascii(Tag::DateTimeOriginal, "2019:07:14 18:30:05"),
            Field {
                tag: Tag::FNumber,
                ifd_num: In::PRIMARY,
                value: Value::Rational(vec![Rational { num: 28, denom: 10 }]),
            },
            Field {
                tag: Tag::PhotographicSensitivity,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![400]),
            },
            Field {
                tag: Tag::PixelXDimension,
                ifd_num: In::PRIMARY,
                value: Value::Long(vec![6000]),
            },
            Field {
                tag: Tag::PixelYDimension,
                ifd_num: In::PRIMARY,
                value: Value::Long(vec![4000]),
            },
            Field {
                tag: XP_KEYWORDS,
                ifd_num: In::PRIMARY,
                value: Value::Byte(ucs2("beach; holiday ;;sunset")),
            },
        ];
        let mut writer = Writer::new();
        for field in &fields {
            writer.push_field(field);
        }
        let mut buffer = Cursor::new(Vec::new());
        writer.write(&mut buffer, true)?;
        std::fs::write(path, buffer.into_inner())?;
        Ok(())
    }

    #[tokio::test]
    async fn extracts_camera_exposure_and_keywords() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("photo.tif");
        write_tiff(&path)?;

        let metadata = ExifExtractor::new().extract(&path).await?;

        assert_eq!(metadata.camera_make.as_deref(), Some("FUJIFILM"));
        assert_eq!(metadata.camera_model.as_deref(), Some("X-T3"));
        assert_eq!(metadata.aperture, Some(2.8));
        assert_eq!(metadata.iso, Some(400));
        assert_eq!(metadata.width, Some(6000));
        assert_eq!(metadata.height, Some(4000));
        assert_eq!(metadata.keywords, vec!["beach", "holiday", "sunset"]);
        assert_eq!(
            metadata.description.as_deref(),
            Some("Sunset over the dunes")
        );
        assert_eq!(
            metadata.taken_at.map(|t| t.to_string()).as_deref(),
            Some("2019-07-14 18:30:05")
        );
        assert!(
            metadata
                .raw
                .get("Make")
                .is_some_and(|make| make.contains("FUJIFILM"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn image_without_exif_still_has_dimensions() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("blank.gif");
        // GIF89a header with a 3x2 logical screen.
        std::fs::write(&path, b"GIF89a\x03\x00\x02\x00\x00\x00\x00;")?;

        let metadata = ExifExtractor::new().extract(&path).await?;

        assert_eq!(metadata.width, Some(3));
        assert_eq!(metadata.height, Some(2));
        assert!(metadata.camera_make.is_none());
        assert!(metadata.raw.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn non_image_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"definitely not a jpeg")?;

        let result = ExifExtractor::new().extract(&path).await;

        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn decodes_windows_keyword_strings() {
        let decoded = decode_ucs2(&ucs2("café;bär"));

        assert_eq!(decoded.as_deref(), Some("café;bär"));
        assert_eq!(split_keywords("a; b ;;c"), vec!["a", "b", "c"]);
        assert_eq!(decode_ucs2(&[0, 0]), None);
    }
}
