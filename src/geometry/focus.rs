//! Mapping from the on-screen focus box to source-bitmap pixel coordinates.

use crate::constants::FOCUS_BOX_SIZE_RATIO;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use tracing::debug;

/// A crop rectangle in source-bitmap pixel coordinates.
///
/// Always lies entirely within the bitmap and has area >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels, at least 1.
    pub width: u32,
    /// Height in pixels, at least 1.
    pub height: u32,
}

impl CropRect {
    /// Number of pixels covered by the crop.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Percentage of the focus box covered by the displayed image.
///
/// Informational only; a low coverage never fails a crop.
pub fn coverage_percentage(focus: &Rect, display: &Rect) -> f32 {
    let Some(intersection) = focus.intersection(display) else {
        return 0.0;
    };
    let focus_area = focus.area();
    if focus_area > 0.0 {
        intersection.area() / focus_area * 100.0
    } else {
        0.0
    }
}

/// Centered square focus box for a viewport, sized at the configured ratio
/// of the shorter side.
///
/// Returns `None` for an empty viewport (layout not complete yet).
pub fn focus_box_for_viewport(viewport_width: f32, viewport_height: f32) -> Option<Rect> {
    if viewport_width <= 0.0 || viewport_height <= 0.0 {
        return None;
    }
    let size = viewport_width.min(viewport_height) * FOCUS_BOX_SIZE_RATIO;
    let left = (viewport_width - size) / 2.0;
    let top = (viewport_height - size) / 2.0;
    Some(Rect::from_origin_size(left, top, size, size))
}

/// Map the focus box into source-bitmap pixel coordinates.
///
/// Computes the intersection of `focus` and `display` in view space, then
/// scales it into bitmap space using independent per-axis factors
/// `bitmap_size / display_size`. The resulting rectangle is clamped so that
/// its origin stays within the bitmap and its extent covers at least one
/// pixel.
///
/// # Errors
///
/// - [`Error::InvalidDisplayRect`] if `display` has zero or negative extent.
/// - [`Error::FocusOutsideImage`] if the two rectangles do not overlap.
pub fn map_focus_to_bitmap(
    focus: &Rect,
    display: &Rect,
    bitmap_width: u32,
    bitmap_height: u32,
) -> Result<CropRect> {
    if display.is_degenerate() {
        return Err(Error::InvalidDisplayRect);
    }
    if bitmap_width == 0 || bitmap_height == 0 {
        return Err(Error::InvalidCropBounds {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            bitmap_width,
            bitmap_height,
        });
    }

    let intersection = focus
        .intersection(display)
        .ok_or(Error::FocusOutsideImage)?;

    let display_rect = display;
    debug!(
        focus = ?focus,
        display = ?display_rect,
        intersection = ?intersection,
        bitmap_width,
        bitmap_height,
        "mapping focus box to bitmap"
    );

    let offset_x = intersection.left - display.left;
    let offset_y = intersection.top - display.top;

    #[allow(clippy::cast_precision_loss)]
    let scale_x = bitmap_width as f32 / display.width();
    #[allow(clippy::cast_precision_loss)]
    let scale_y = bitmap_height as f32 / display.height();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let x = ((offset_x * scale_x) as i64).clamp(0, i64::from(bitmap_width) - 1) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let y = ((offset_y * scale_y) as i64).clamp(0, i64::from(bitmap_height) - 1) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let width =
        ((intersection.width() * scale_x) as i64).clamp(1, i64::from(bitmap_width - x)) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let height =
        ((intersection.height() * scale_y) as i64).clamp(1, i64::from(bitmap_height - y)) as u32;

    Ok(CropRect {
        x,
        y,
        width,
        height,
    })
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_mapping() {
        // Display fills a 100x100 view 1:1 over a 100x100 bitmap.
        let display = Rect::new(0.0, 0.0, 100.0, 100.0);
        let focus = Rect::new(10.0, 20.0, 60.0, 70.0);
        let crop = map_focus_to_bitmap(&focus, &display, 100, 100).unwrap();
        assert_eq!(
            crop,
            CropRect {
                x: 10,
                y: 20,
                width: 50,
                height: 50
            }
        );
    }

    #[test]
    fn test_zoomed_display_scales_crop() {
        // The bitmap is 200px wide but displayed across 400 view px (2x zoom),
        // so view distances halve in bitmap space.
        let display = Rect::new(0.0, 0.0, 400.0, 400.0);
        let focus = Rect::new(100.0, 100.0, 300.0, 300.0);
        let crop = map_focus_to_bitmap(&focus, &display, 200, 200).unwrap();
        assert_eq!(
            crop,
            CropRect {
                x: 50,
                y: 50,
                width: 100,
                height: 100
            }
        );
    }

    #[test]
    fn test_panned_display_offsets_crop() {
        // Image panned so its top-left sits at view (-50, -50).
        let display = Rect::new(-50.0, -50.0, 150.0, 150.0);
        let focus = Rect::new(0.0, 0.0, 100.0, 100.0);
        let crop = map_focus_to_bitmap(&focus, &display, 200, 200).unwrap();
        assert_eq!(
            crop,
            CropRect {
                x: 50,
                y: 50,
                width: 100,
                height: 100
            }
        );
    }

    #[test]
    fn test_crop_stays_within_bitmap() {
        // Focus hangs past the displayed image on the right/bottom.
        let display = Rect::new(0.0, 0.0, 90.0, 90.0);
        let focus = Rect::new(50.0, 50.0, 200.0, 200.0);
        let crop = map_focus_to_bitmap(&focus, &display, 45, 45).unwrap();
        assert!(crop.x + crop.width <= 45);
        assert!(crop.y + crop.height <= 45);
        assert!(crop.area() >= 1);
    }

    #[test]
    fn test_tiny_intersection_yields_minimum_area() {
        let display = Rect::new(0.0, 0.0, 1000.0, 1000.0);
        // Sub-pixel overlap after scaling down to a small bitmap.
        let focus = Rect::new(999.5, 999.5, 1200.0, 1200.0);
        let crop = map_focus_to_bitmap(&focus, &display, 10, 10).unwrap();
        assert_eq!(crop.width, 1);
        assert_eq!(crop.height, 1);
        assert!(crop.x < 10 && crop.y < 10);
    }

    #[test]
    fn test_no_overlap_is_an_error() {
        let display = Rect::new(0.0, 0.0, 100.0, 100.0);
        let focus = Rect::new(200.0, 200.0, 300.0, 300.0);
        let err = map_focus_to_bitmap(&focus, &display, 100, 100).unwrap_err();
        assert!(matches!(err, Error::FocusOutsideImage));
    }

    #[test]
    fn test_degenerate_display_is_a_distinct_error() {
        let display = Rect::new(50.0, 50.0, 50.0, 120.0);
        let focus = Rect::new(0.0, 0.0, 100.0, 100.0);
        let err = map_focus_to_bitmap(&focus, &display, 100, 100).unwrap_err();
        assert!(matches!(err, Error::InvalidDisplayRect));
    }

    #[test]
    fn test_empty_bitmap_is_rejected() {
        let display = Rect::new(0.0, 0.0, 100.0, 100.0);
        let focus = Rect::new(0.0, 0.0, 50.0, 50.0);
        let err = map_focus_to_bitmap(&focus, &display, 0, 100).unwrap_err();
        assert!(matches!(err, Error::InvalidCropBounds { .. }));
    }

    #[test]
    fn test_coverage_full_and_partial() {
        let focus = Rect::new(0.0, 0.0, 100.0, 100.0);
        let full = Rect::new(-10.0, -10.0, 110.0, 110.0);
        assert_eq!(coverage_percentage(&focus, &full), 100.0);

        let half = Rect::new(0.0, 0.0, 50.0, 100.0);
        assert_eq!(coverage_percentage(&focus, &half), 50.0);

        let none = Rect::new(500.0, 500.0, 600.0, 600.0);
        assert_eq!(coverage_percentage(&focus, &none), 0.0);
    }

    #[test]
    fn test_focus_box_is_centered_square() {
        let rect = focus_box_for_viewport(1000.0, 800.0).unwrap();
        assert_eq!(rect.width(), rect.height());
        assert_eq!(rect.width(), 800.0 * FOCUS_BOX_SIZE_RATIO);
        assert_eq!(rect.left, (1000.0 - rect.width()) / 2.0);
        assert_eq!(rect.top, (800.0 - rect.height()) / 2.0);
    }

    #[test]
    fn test_focus_box_requires_laid_out_viewport() {
        assert!(focus_box_for_viewport(0.0, 600.0).is_none());
        assert!(focus_box_for_viewport(800.0, -1.0).is_none());
    }
}
