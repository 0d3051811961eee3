/// JPG fallbacks for modern image formats.
///
/// Pages serve WebP through `<picture>`; feed readers get a `.jpg` written
/// next to it. Transparent pixels are flattened onto white. HEIC has no
/// decoder here, so HEIC files are only checked for an existing fallback.
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageResult, Rgb, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackSource {
    WebP,
    Heic,
}

impl FallbackSource {
    /// Classify an asset by extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("webp") {
            Some(FallbackSource::WebP)
        } else if ext.eq_ignore_ascii_case("heic") {
            Some(FallbackSource::Heic)
        } else {
            None
        }
    }
}

/// Assets touched by [`crate::SiteBuilder::prepare_assets`].
#[derive(Debug, Default)]
pub struct AssetReport {
    /// WebP files that got a new `.jpg` sibling.
    pub converted: Vec<PathBuf>,
    /// Files still without a `.jpg` sibling.
    pub missing: Vec<PathBuf>,
}

pub fn jpg_path(path: &Path) -> PathBuf {
    path.with_extension("jpg")
}

/// Decode `src` and write it to `dest` as a JPEG.
pub fn convert_to_jpg(src: &Path, dest: &Path) -> ImageResult<()> {
    let decoded = image::open(src)?;
    let rgb = flatten_onto_white(&decoded);
    let writer = BufWriter::new(File::create(dest)?);
    let mut encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
    encoder.encode_image(&rgb)
}

pub fn flatten_onto_white(decoded: &DynamicImage) -> RgbImage {
    if !decoded.color().has_alpha() {
        return decoded.to_rgb8();
    }
    let rgba = decoded.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
