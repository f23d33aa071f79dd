//! Crop the source bitmap to the selection and burn strokes into it.
//!
//! Pure functions: nothing here touches session state or the clipboard.

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::annotation::model::Stroke;
use crate::annotation::renderer;
use crate::capture::SourceBitmap;
use crate::geometry::{self, PixelRect, Rect, Scale, Size};

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("View or canvas has no area; scale factors are not finite")]
    DegenerateScale,

    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error(
        "Crop rectangle ({},{},{},{}) exceeds image bounds ({}x{})",
        requested.0, requested.1, requested.2, requested.3,
        image_size.0, image_size.1
    )]
    OutOfBounds {
        requested: (i64, i64, i64, i64),
        image_size: (u32, u32),
    },
}

/// Map a view-space selection (origin bottom-left) onto the source bitmap.
///
/// The rectangle is flipped with `bitmap_y = view_height - y - height`, scaled
/// by `bitmap / view` per axis, and its edges are rounded to whole pixels.
/// An edge that lands at most one pixel outside the bitmap is pulled back to
/// it; anything further outside fails.
pub fn crop_rect(selection: &Rect, view: Size, bitmap: (u32, u32)) -> Result<PixelRect, CropError> {
    let bitmap_size = Size::new(bitmap.0 as f64, bitmap.1 as f64);
    let scaled =
        geometry::view_to_bitmap(selection, view, bitmap_size).ok_or(CropError::DegenerateScale)?;

    let (x, x1) = snap_edges(scaled.x, scaled.x + scaled.width, bitmap.0);
    let (y, y1) = snap_edges(scaled.y, scaled.y + scaled.height, bitmap.1);
    let (w, h) = (x1 - x, y1 - y);

    if w <= 0 || h <= 0 {
        return Err(CropError::ZeroDimension);
    }
    if x < 0 || y < 0 || x + w > bitmap.0 as i64 || y + h > bitmap.1 as i64 {
        return Err(CropError::OutOfBounds { requested: (x, y, w, h), image_size: bitmap });
    }

    Ok(PixelRect::new(x as u32, y as u32, w as u32, h as u32))
}

/// Round both edges of a span and absorb up to one pixel of overshoot past
/// `0..=limit`.
fn snap_edges(start: f64, end: f64, limit: u32) -> (i64, i64) {
    let limit = limit as i64;
    let snap = |v: f64| {
        let v = v.round() as i64;
        if (-1..0).contains(&v) {
            0
        } else if v == limit + 1 {
            limit
        } else {
            v
        }
    };
    (snap(start), snap(end))
}

/// Copy `rect` out of the source bitmap.
pub fn crop(source: &SourceBitmap, rect: PixelRect) -> Result<RgbaImage, CropError> {
    if rect.width == 0 || rect.height == 0 {
        return Err(CropError::ZeroDimension);
    }
    let (iw, ih) = (source.width(), source.height());
    if rect.x as u64 + rect.width as u64 > iw as u64 || rect.y as u64 + rect.height as u64 > ih as u64 {
        return Err(CropError::OutOfBounds {
            requested: (rect.x as i64, rect.y as i64, rect.width as i64, rect.height as i64),
            image_size: (iw, ih),
        });
    }
    Ok(imageops::crop_imm(source.pixels(), rect.x, rect.y, rect.width, rect.height).to_image())
}

/// Inputs for one composite.
pub struct CompositeRequest<'a> {
    pub source: &'a SourceBitmap,
    /// Crop rectangle in source-bitmap pixels.
    pub crop: PixelRect,
    /// Committed strokes, oldest first.
    pub strokes: &'a [Arc<Stroke>],
    /// Size of the canvas the strokes were drawn on.
    pub canvas: Size,
    /// Output size; normally the crop's own size.
    pub target: (u32, u32),
}

/// Crop, resample to `target` if needed, then draw strokes in commit order.
pub fn composite(request: &CompositeRequest<'_>) -> Result<RgbaImage, CropError> {
    let (tw, th) = request.target;
    if tw == 0 || th == 0 {
        return Err(CropError::ZeroDimension);
    }
    let scale = Scale::between(request.canvas, Size::new(tw as f64, th as f64))
        .ok_or(CropError::DegenerateScale)?;

    let mut output = crop(request.source, request.crop)?;
    if output.dimensions() != (tw, th) {
        output = imageops::resize(&output, tw, th, FilterType::Triangle);
    }

    renderer::draw_strokes(&mut output, request.strokes, &scale);

    log::debug!(
        "[COMPOSITE] {}x{} crop at ({},{}) -> {}x{} with {} stroke(s)",
        request.crop.width,
        request.crop.height,
        request.crop.x,
        request.crop.y,
        tw,
        th,
        request.strokes.len()
    );
    Ok(output)
}
