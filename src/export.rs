//! Clipboard export: size-budgeted PNG encoding and delivery.

use std::borrow::Cow;
use std::io::Cursor;

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Image encoding failed: {0}")]
    Encoding(#[from] image::ImageError),

    #[error("Encoded bytes could not be decoded for delivery")]
    InvalidBuffer,

    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

/// Encoded image ready for the platform clipboard.
#[derive(Clone, Debug)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// Pasteboard type identifier for the encoded format.
    pub fn type_identifier(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "public.png",
            _ => "public.image",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Dimensions after fitting `(width, height)` inside `max_dimension`,
/// preserving aspect ratio. Never returns a zero side.
pub fn fitted_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_dimension = max_dimension.max(1);
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }
    let scale = (max_dimension as f64 / width as f64).min(max_dimension as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_dimension);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_dimension);
    (w, h)
}

fn compression_for(quality: f32) -> CompressionType {
    if quality < 0.34 {
        CompressionType::Fast
    } else if quality < 0.67 {
        CompressionType::Default
    } else {
        CompressionType::Best
    }
}

/// Downscale to fit `max_dimension` if needed, then encode as PNG.
///
/// `quality` runs from 0.0 (fastest) to 1.0 (smallest output).
pub fn encode(image: &RgbaImage, max_dimension: u32, quality: f32) -> Result<EncodedImage, EncodeError> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(EncodeError::EmptyImage);
    }

    let (tw, th) = fitted_dimensions(w, h, max_dimension);
    let resized;
    let pixels = if (tw, th) != (w, h) {
        log::info!("[EXPORT] Downscaling {}x{} to {}x{}", w, h, tw, th);
        resized = imageops::resize(image, tw, th, FilterType::Lanczos3);
        &resized
    } else {
        image
    };

    let mut bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut bytes),
        compression_for(quality),
        PngFilter::Adaptive,
    );
    encoder.write_image(pixels.as_raw(), tw, th, ExtendedColorType::Rgba8)?;

    log::debug!(
        "[EXPORT] Encoded {}x{} PNG: {} KB (raw {} KB)",
        tw,
        th,
        bytes.len() / 1024,
        pixels.as_raw().len() / 1024
    );

    Ok(EncodedImage { bytes, format: ImageFormat::Png, width: tw, height: th })
}

/// Destination for an encoded image. Implementations must not leave a
/// partial write behind when they fail.
pub trait ClipboardSink {
    fn deliver(&mut self, image: &EncodedImage) -> Result<(), EncodeError>;
}

/// The system clipboard through `arboard`.
pub struct SystemClipboard {
    clipboard: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, EncodeError> {
        let clipboard = arboard::Clipboard::new().map_err(|e| EncodeError::Clipboard(e.to_string()))?;
        Ok(SystemClipboard { clipboard })
    }
}

impl ClipboardSink for SystemClipboard {
    fn deliver(&mut self, image: &EncodedImage) -> Result<(), EncodeError> {
        // arboard takes raw RGBA; decode first so nothing is written on failure.
        let decoded = image::load_from_memory_with_format(&image.bytes, image.format)
            .map_err(|_| EncodeError::InvalidBuffer)?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        let data = arboard::ImageData {
            width: width as usize,
            height: height as usize,
            bytes: Cow::Owned(decoded.into_raw()),
        };
        self.clipboard
            .set_image(data)
            .map_err(|e| EncodeError::Clipboard(e.to_string()))?;
        log::info!("[EXPORT] Image copied to clipboard ({}x{})", width, height);
        Ok(())
    }
}

/// Keeps the last delivered image in memory.
#[derive(Default)]
pub struct MemoryClipboard {
    pub contents: Option<EncodedImage>,
}

impl ClipboardSink for MemoryClipboard {
    fn deliver(&mut self, image: &EncodedImage) -> Result<(), EncodeError> {
        self.contents = Some(image.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn fitting_preserves_aspect() {
        assert_eq!(fitted_dimensions(100, 50, 3840), (100, 50));
        assert_eq!(fitted_dimensions(7680, 4320, 3840), (3840, 2160));
        assert_eq!(fitted_dimensions(1000, 4000, 400), (100, 400));
        assert_eq!(fitted_dimensions(5000, 1, 100), (100, 1));
    }

    #[test]
    fn encodes_png_and_downscales() {
        let img = RgbaImage::from_pixel(200, 100, Rgba([10, 20, 30, 255]));
        let out = encode(&img, 50, 0.7).unwrap();
        assert_eq!(&out.bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
        assert_eq!((out.width, out.height), (50, 25));
        assert_eq!(out.type_identifier(), "public.png");
        assert_eq!(out.mime_type(), "image/png");

        let back = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((back.width(), back.height()), (50, 25));
    }

    #[test]
    fn empty_image_is_an_error() {
        let img = RgbaImage::new(0, 0);
        assert!(matches!(encode(&img, 100, 0.5), Err(EncodeError::EmptyImage)));
    }

    #[test]
    fn quality_picks_compression() {
        assert!(matches!(compression_for(0.0), CompressionType::Fast));
        assert!(matches!(compression_for(0.5), CompressionType::Default));
        assert!(matches!(compression_for(0.7), CompressionType::Best));
    }
}
