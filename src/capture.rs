//! Screen capture: the shared source bitmap and the sources that produce it.

use std::sync::Arc;

use image::RgbaImage;

use crate::geometry::Size;

/// Immutable captured raster, shared by reference for one session.
/// A new capture replaces the whole value; pixels are never edited in place.
#[derive(Clone, Debug)]
pub struct SourceBitmap {
    pixels: Arc<RgbaImage>,
}

impl SourceBitmap {
    pub fn new(pixels: RgbaImage) -> Self {
        SourceBitmap { pixels: Arc::new(pixels) }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> Size {
        Size::new(self.width() as f64, self.height() as f64)
    }

    /// True when both handles share one buffer.
    pub fn same_buffer(&self, other: &SourceBitmap) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl From<RgbaImage> for SourceBitmap {
    fn from(pixels: RgbaImage) -> Self {
        SourceBitmap::new(pixels)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No display available to capture")]
    NoDisplay,

    #[error("Screen recording permission has not been granted")]
    PermissionDenied,

    #[error("Screen capture failed: {0}")]
    Failed(String),
}

/// Anything that can produce a fresh screen image on demand.
pub trait CaptureSource {
    fn capture(&mut self) -> Result<SourceBitmap, CaptureError>;
}

/// Hands out a fixed image; used for replays and tests.
pub struct FixedCapture {
    bitmap: Option<SourceBitmap>,
}

impl FixedCapture {
    pub fn new(pixels: RgbaImage) -> Self {
        FixedCapture { bitmap: Some(SourceBitmap::new(pixels)) }
    }

    /// A source that always fails as if permission were missing.
    pub fn denied() -> Self {
        FixedCapture { bitmap: None }
    }
}

impl CaptureSource for FixedCapture {
    fn capture(&mut self) -> Result<SourceBitmap, CaptureError> {
        self.bitmap.clone().ok_or(CaptureError::PermissionDenied)
    }
}

#[cfg(target_os = "macos")]
pub use display::DisplayCapture;

#[cfg(target_os = "macos")]
mod display {
    use image::RgbaImage;
    use objc2_core_foundation::{CGFloat, CGPoint, CGRect, CGSize};
    use objc2_core_graphics::{
        CGBitmapContextCreate, CGColorSpace, CGContext, CGDirectDisplayID, CGDisplayBounds,
        CGImage, CGImageAlphaInfo, CGWindowID, CGWindowImageOption, CGWindowListOption,
    };
    #[allow(deprecated)]
    use objc2_core_graphics::CGWindowListCreateImage;

    use super::{CaptureError, CaptureSource, SourceBitmap};

    /// Captures one display through CoreGraphics at full backing resolution.
    pub struct DisplayCapture {
        display_id: CGDirectDisplayID,
    }

    impl DisplayCapture {
        pub fn new(display_id: CGDirectDisplayID) -> Self {
            DisplayCapture { display_id }
        }

        /// Probe with a minimal capture; CoreGraphics returns nothing without permission.
        #[allow(deprecated)]
        pub fn has_permission(&self) -> bool {
            let bounds = CGDisplayBounds(self.display_id);
            CGWindowListCreateImage(
                bounds,
                CGWindowListOption::OptionOnScreenOnly,
                0 as CGWindowID,
                CGWindowImageOption::NominalResolution,
            )
            .is_some()
        }
    }

    impl CaptureSource for DisplayCapture {
        #[allow(deprecated)] // CGWindowListCreateImage deprecated in favor of ScreenCaptureKit
        fn capture(&mut self) -> Result<SourceBitmap, CaptureError> {
            let bounds = CGDisplayBounds(self.display_id);
            if bounds.size.width <= 0.0 || bounds.size.height <= 0.0 {
                return Err(CaptureError::NoDisplay);
            }

            let image = CGWindowListCreateImage(
                bounds,
                CGWindowListOption::OptionOnScreenOnly,
                0 as CGWindowID,
                CGWindowImageOption::BestResolution,
            )
            .ok_or(CaptureError::PermissionDenied)?;

            let pixels = cgimage_to_rgba(&image)?;
            log::info!(
                "[CAPTURE] Display {} captured: {}x{} pixels ({}x{} points)",
                self.display_id,
                pixels.width(),
                pixels.height(),
                bounds.size.width,
                bounds.size.height,
            );
            Ok(SourceBitmap::new(pixels))
        }
    }

    /// Render a CGImage into an RGBA buffer with a top-left origin.
    fn cgimage_to_rgba(image: &CGImage) -> Result<RgbaImage, CaptureError> {
        let width = CGImage::width(Some(image));
        let height = CGImage::height(Some(image));
        let bytes_per_row = width * 4;
        let mut buffer = vec![0u8; bytes_per_row * height];

        let color_space = CGColorSpace::new_device_rgb()
            .ok_or_else(|| CaptureError::Failed("Failed to create color space".into()))?;
        let ctx = unsafe {
            CGBitmapContextCreate(
                buffer.as_mut_ptr() as *mut _,
                width,
                height,
                8,
                bytes_per_row,
                Some(&color_space),
                CGImageAlphaInfo::PremultipliedLast.0,
            )
        }
        .ok_or_else(|| CaptureError::Failed("Failed to create bitmap context".into()))?;

        let draw_rect = CGRect::new(
            CGPoint::ZERO,
            CGSize::new(width as CGFloat, height as CGFloat),
        );
        CGContext::draw_image(Some(&ctx), draw_rect, Some(image));
        drop(ctx);

        RgbaImage::from_raw(width as u32, height as u32, buffer)
            .ok_or_else(|| CaptureError::Failed("Bitmap size mismatch".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn fixed_capture_shares_one_buffer() {
        let mut source = FixedCapture::new(RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255])));
        let a = source.capture().unwrap();
        let b = source.capture().unwrap();
        assert!(a.same_buffer(&b));
        assert_eq!(a.size(), Size::new(4.0, 3.0));
    }

    #[test]
    fn denied_capture_reports_permission() {
        let mut source = FixedCapture::denied();
        assert!(matches!(source.capture(), Err(CaptureError::PermissionDenied)));
    }
}
