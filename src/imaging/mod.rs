//! Image region handling.
//!
//! Cropping of the user-framed region and conversion of a region into the
//! normalized planar tensor the model consumes.

mod crop;
mod preprocess;

pub use crop::{FocusCrop, crop_bitmap, crop_to_focus};
pub use preprocess::{InputTensor, normalize_region, prepare_region};
