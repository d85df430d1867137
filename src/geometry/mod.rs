//! Focus-box geometry.
//!
//! Maps the user-framed focus rectangle and the image's current display
//! rectangle (both in view coordinates) into source-bitmap pixel space.

mod focus;
mod rect;

pub use focus::{CropRect, coverage_percentage, focus_box_for_viewport, map_focus_to_bitmap};
pub use rect::Rect;
