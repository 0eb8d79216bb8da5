mod exif_extractor;

pub use exif_extractor::*;
