//! Plain-text rendering of a classification result.

use crate::constants::ALTERNATIVE_MIN_PROBABILITY;
use crate::inference::ClassificationResult;
use std::fmt::Write;

/// Build the result text shown alongside the image.
///
/// An acceptable top prediction is rendered with its scientific name,
/// confidence and any alternatives worth mentioning; a low-confidence one
/// gets framing advice instead. Pure string building, no UI concerns.
pub fn build_result_text(
    result: &ClassificationResult,
    confidence_threshold: f32,
    expert_mode: bool,
) -> String {
    let Some(best) = result.top_prediction() else {
        return "Could not classify the image".to_string();
    };

    let mut text = String::new();

    if best.is_acceptable(confidence_threshold, expert_mode) {
        let _ = write!(
            text,
            "{}\nScientific name: {}\nConfidence: {:.1}%",
            best.display_name,
            best.scientific_name,
            best.confidence_percentage()
        );

        let alternatives = result.alternatives(ALTERNATIVE_MIN_PROBABILITY);
        if !alternatives.is_empty() {
            text.push_str("\n\nOther possibilities:\n");
            for prediction in alternatives {
                let _ = writeln!(
                    text,
                    "• {} ({:.1}%)",
                    prediction.display_name,
                    prediction.confidence_percentage()
                );
            }
        }
    } else {
        let _ = write!(
            text,
            "Low confidence: {:.1}%\n\nTry:\n• Getting closer to the bird\n• Better lighting\n• A sharper image",
            best.confidence_percentage()
        );
    }

    text
}
