//! Bitmap cropping against the focus box.

use crate::error::{Error, Result};
use crate::geometry::{CropRect, Rect, coverage_percentage, map_focus_to_bitmap};
use image::RgbImage;
use tracing::debug;

/// A successful focus crop.
///
/// The bitmap is a freshly allocated copy of the framed region; it is owned
/// by the classification run that requested it and is released when dropped.
#[derive(Debug)]
pub struct FocusCrop {
    /// The cropped region.
    pub bitmap: RgbImage,
    /// Percentage of the focus box covered by the displayed image.
    pub coverage_percentage: f32,
    /// Percentage of the source bitmap area captured by the crop.
    pub area_percentage: f32,
}

/// Extract a rectangle from a bitmap.
///
/// # Errors
///
/// [`Error::InvalidCropBounds`] if the rectangle does not lie entirely
/// within the source bitmap or has zero extent. The source region is never
/// silently substituted.
pub fn crop_bitmap(source: &RgbImage, rect: CropRect) -> Result<RgbImage> {
    let (src_w, src_h) = source.dimensions();
    let out_of_bounds = rect.width == 0
        || rect.height == 0
        || rect.x >= src_w
        || rect.y >= src_h
        || rect.width > src_w - rect.x
        || rect.height > src_h - rect.y;
    if out_of_bounds {
        return Err(Error::InvalidCropBounds {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            bitmap_width: src_w,
            bitmap_height: src_h,
        });
    }

    Ok(image::imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image())
}

/// Crop the source bitmap to the region the user has framed.
///
/// Maps the focus box through the current display rectangle into bitmap
/// pixels and extracts that region. Coverage of the focus box is reported
/// but never gates success.
///
/// # Errors
///
/// Geometry errors from [`map_focus_to_bitmap`] and bounds errors from
/// [`crop_bitmap`].
pub fn crop_to_focus(source: &RgbImage, focus: &Rect, display: &Rect) -> Result<FocusCrop> {
    let (bitmap_width, bitmap_height) = source.dimensions();
    let crop_rect = map_focus_to_bitmap(focus, display, bitmap_width, bitmap_height)?;
    let coverage = coverage_percentage(focus, display);

    let bitmap = crop_bitmap(source, crop_rect)?;

    #[allow(clippy::cast_precision_loss)]
    let area_percentage =
        crop_rect.area() as f32 * 100.0 / (f64::from(bitmap_width) * f64::from(bitmap_height)) as f32;

    debug!(
        crop_width = bitmap.width(),
        crop_height = bitmap.height(),
        coverage = coverage as i32,
        "focus crop complete"
    );

    Ok(FocusCrop {
        bitmap,
        coverage_percentage: coverage,
        area_percentage,
    })
}
