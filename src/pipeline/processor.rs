//! A single classification run over the framed region.

use crate::error::Result;
use crate::geometry::Rect;
use crate::imaging::crop_to_focus;
use crate::inference::{BirdClassifier, ClassificationResult};
use image::RgbImage;
use std::time::Instant;
use tracing::debug;

/// Output of one classification run, with the crop metadata that produced it.
#[derive(Debug, Clone)]
pub struct RegionClassification {
    /// Ranked predictions for the framed region.
    pub result: ClassificationResult,
    /// Percentage of the focus box covered by the displayed image.
    pub coverage_percentage: f32,
    /// Percentage of the source bitmap captured by the crop.
    pub area_percentage: f32,
}

/// Classify the region the user has framed.
///
/// Crops the source bitmap to the focus box (through the current display
/// transform), then runs preprocessing, inference and ranking on the crop.
/// The crop is owned by this run and released on every exit path.
///
/// # Errors
///
/// Geometry and crop errors from [`crop_to_focus`], preprocessing and
/// inference errors from [`BirdClassifier::classify`]. All are local to
/// this run.
pub fn classify_region(
    classifier: &BirdClassifier,
    source: &RgbImage,
    focus: &Rect,
    display: &Rect,
    top_k: usize,
) -> Result<RegionClassification> {
    let start = Instant::now();

    let crop = crop_to_focus(source, focus, display)?;
    let result = classifier.classify(&crop.bitmap, top_k)?;

    debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        coverage = crop.coverage_percentage as i32,
        "region classified"
    );

    Ok(RegionClassification {
        result,
        coverage_percentage: crop.coverage_percentage,
        area_percentage: crop.area_percentage,
    })
}
