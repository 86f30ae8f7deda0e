//! Decode, color normalization, resizing, and per-container encoding.

use std::io::Cursor;

use image::codecs::png::{CompressionType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};

use crate::planner::OutputKind;

/// Quality used for JPEG output when the plan does not dictate one.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Quality used for WebP re-encodes.
pub const DEFAULT_WEBP_QUALITY: f32 = 80.0;

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Image encode failed: {0}")]
    Encode(String),
}

pub struct Transcoder;

impl Transcoder {
    /// Decode an image, retrying once with decode limits disabled. Very
    /// large but legitimate photos trip the default allocation limits.
    pub fn decode(data: &[u8]) -> Result<DynamicImage, TranscodeError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| TranscodeError::Decode(e.to_string()))?;

        match reader.decode() {
            Ok(img) => Ok(img),
            Err(first) => {
                tracing::warn!(error = %first, "Image decode failed, retrying without limits");
                let mut reader = ImageReader::new(Cursor::new(data))
                    .with_guessed_format()
                    .map_err(|e| TranscodeError::Decode(e.to_string()))?;
                reader.no_limits();
                reader
                    .decode()
                    .map_err(|e| TranscodeError::Decode(e.to_string()))
            }
        }
    }

    /// Normalize images with three or more channels to 8-bit RGB/RGBA.
    /// Grayscale images keep their color model.
    pub fn normalize_color(img: DynamicImage) -> DynamicImage {
        if img.color().channel_count() < 3 {
            return img;
        }
        if img.color().has_alpha() {
            DynamicImage::ImageRgba8(img.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(img.to_rgb8())
        }
    }

    /// Shrink so the longest edge fits `max_dimension`, preserving aspect
    /// ratio. Images already within the limit are returned untouched; this
    /// never upscales.
    pub fn resize_to_limit(img: DynamicImage, max_dimension: u32) -> DynamicImage {
        let (width, height) = img.dimensions();
        let longest = width.max(height);
        if longest <= max_dimension {
            return img;
        }

        let scale = max_dimension as f32 / longest as f32;
        img.resize(max_dimension, max_dimension, select_filter(scale))
    }

    /// Encode to the planned container. `quality` applies to the lossy
    /// containers (JPEG, WebP); PNG always uses maximum compression and GIF
    /// has no quality knob.
    pub fn encode(
        img: &DynamicImage,
        format: OutputKind,
        quality: Option<u8>,
    ) -> Result<Vec<u8>, TranscodeError> {
        match format {
            OutputKind::Jpeg => encode_jpeg(img, quality.unwrap_or(DEFAULT_JPEG_QUALITY)),
            OutputKind::Png => encode_png(img),
            OutputKind::WebP => encode_webp(img, quality),
            OutputKind::Gif => encode_gif(img),
        }
    }

    /// Read dimensions back from encoded bytes. This is the source of truth
    /// for stored width/height; the pre-encode image is not trusted.
    pub fn read_dimensions(data: &[u8]) -> Result<(u32, u32), TranscodeError> {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| TranscodeError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| TranscodeError::Decode(e.to_string()))
    }
}

/// Filter choice follows how aggressive the downscale is: heavier shrinks
/// warrant the more expensive kernels.
fn select_filter(scale: f32) -> FilterType {
    if scale <= 0.5 {
        FilterType::Lanczos3
    } else if scale <= 0.8 {
        FilterType::CatmullRom
    } else {
        FilterType::Triangle
    }
}

/// JPEG via mozjpeg: progressive, optimized entropy coding. Re-encoding
/// from decoded pixels drops every metadata segment of the original.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, TranscodeError> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality as f32);
    comp.set_progressive_mode();
    comp.set_optimize_coding(true);

    let mut comp = comp
        .start_compress(Vec::new())
        .map_err(|e| TranscodeError::Encode(e.to_string()))?;
    comp.write_scanlines(&rgb_img)
        .map_err(|e| TranscodeError::Encode(e.to_string()))?;
    comp.finish()
        .map_err(|e| TranscodeError::Encode(e.to_string()))
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, TranscodeError> {
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut buffer),
        CompressionType::Best,
        image::codecs::png::FilterType::Adaptive,
    );
    img.write_with_encoder(encoder)
        .map_err(|e| TranscodeError::Encode(e.to_string()))?;
    Ok(buffer)
}

fn encode_webp(img: &DynamicImage, quality: Option<u8>) -> Result<Vec<u8>, TranscodeError> {
    let rgba_img = img.to_rgba8();
    let (width, height) = rgba_img.dimensions();
    let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
    let quality = quality.map(f32::from).unwrap_or(DEFAULT_WEBP_QUALITY);
    Ok(encoder.encode(quality).to_vec())
}

fn encode_gif(img: &DynamicImage) -> Result<Vec<u8>, TranscodeError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Gif)
        .map_err(|e| TranscodeError::Encode(e.to_string()))?;
    Ok(buffer)
}
