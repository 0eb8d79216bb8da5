use app_state::ThumbnailSettings;
use color_eyre::eyre::{Result, eyre};
use fast_image_resize::{ResizeOptions, Resizer};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageReader};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

pub const SQUARE_NAME: &str = "square.jpg";

pub fn height_name(height: u32) -> String {
    format!("{height}p.jpg")
}

/// One output image: its file name and pixel size.
struct Variant {
    name: String,
    width: u32,
    height: u32,
    /// Centre crop to the target aspect ratio instead of stretching.
    crop: bool,
}

/// Renders every configured variant of `input_path` as JPEG into `output_dir`.
pub fn render_variants(
    input_path: &Path,
    output_dir: &Path,
    settings: &ThumbnailSettings,
    orientation: u32,
) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    let img = ImageReader::open(input_path)?
        .with_guessed_format()?
        .decode()?;

    // Correct the orientation based on the EXIF data.
    let img = match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    };
    let src = DynamicImage::ImageRgb8(img.into_rgb8());
    let (orig_w, orig_h) = (src.width(), src.height());
    if orig_w == 0 || orig_h == 0 {
        return Err(eyre!("{} has no pixels", input_path.display()));
    }

    plan(orig_w, orig_h, settings)
        .par_iter()
        .try_for_each(|variant| -> Result<()> {
            let resized = if variant.width == orig_w && variant.height == orig_h {
                src.clone()
            } else {
                let mut dst = DynamicImage::new(variant.width, variant.height, ColorType::Rgb8);
                let options = if variant.crop {
                    ResizeOptions::new().fit_into_destination(Some((0.5, 0.5)))
                } else {
                    ResizeOptions::new()
                };
                Resizer::new().resize(&src, &mut dst, &options)?;
                dst
            };

            let writer = BufWriter::new(File::create(output_dir.join(&variant.name))?);
            resized.write_with_encoder(JpegEncoder::new_with_quality(
                writer,
                settings.jpeg_quality.clamp(1, 100),
            ))?;
            Ok(())
        })
}

/// Output sizes for an `orig_w` x `orig_h` source. Nothing is ever upscaled.
fn plan(orig_w: u32, orig_h: u32, settings: &ThumbnailSettings) -> Vec<Variant> {
    let mut variants: Vec<Variant> = settings
        .heights
        .iter()
        .map(|&h| {
            let height = h.clamp(1, orig_h);
            let width = ((u64::from(orig_w) * u64::from(height)) / u64::from(orig_h)).max(1);
            Variant {
                name: height_name(h),
                width: width as u32,
                height,
                crop: false,
            }
        })
        .collect();

    if settings.square_size > 0 {
        let side = settings.square_size.min(orig_w).min(orig_h);
        variants.push(Variant {
            name: SQUARE_NAME.to_owned(),
            width: side,
            height: side,
            crop: true,
        });
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(heights: Vec<u32>, square_size: u32) -> ThumbnailSettings {
        ThumbnailSettings {
            heights,
            square_size,
            jpeg_quality: 80,
            skip_if_exists: false,
        }
    }

    #[test]
    fn plan_keeps_aspect_and_never_upscales() {
        let variants = plan(4000, 3000, &settings(vec![240, 1080, 4320], 256));

        let sizes: Vec<_> = variants
            .iter()
            .map(|v| (v.name.as_str(), v.width, v.height))
            .collect();
        assert_eq!(
            sizes,
            vec![
                ("240p.jpg", 320, 240),
                ("1080p.jpg", 1440, 1080),
                ("4320p.jpg", 4000, 3000),
                ("square.jpg", 256, 256),
            ]
        );
    }

    #[test]
    fn square_is_limited_by_the_short_edge() {
        let variants = plan(300, 100, &settings(Vec::new(), 256));

        assert_eq!(variants.len(), 1);
        assert_eq!((variants[0].width, variants[0].height), (100, 100));
        assert!(variants[0].crop);
    }
}
