//! Birdlens - bird species identification from a user-framed camera image.
//!
//! This crate is the classification core behind a live identification view:
//! the user pans and zooms a photo under a fixed focus box, and the framed
//! region is re-classified as the gesture settles. The pieces are:
//!
//! - [`labels`]: raw model class tokens resolved into scientific/regional
//!   display names.
//! - [`geometry`] and [`imaging`]: focus-box-to-bitmap mapping, cropping,
//!   and conversion into the model's normalized planar tensor.
//! - [`inference`]: the opaque model contract, softmax + top-K ranking, and
//!   the [`inference::BirdClassifier`] that ties them together.
//! - [`scheduler`]: the debounced re-classification state machine that
//!   guarantees at most one inference is ever in flight and that gesture
//!   activity during a run is reconciled, not lost.
//! - [`pipeline`]: a single run over the framed region and the
//!   [`pipeline::ClassificationSession`] that delivers generation-stamped
//!   results over a watch channel.
//!
//! Decoding images, rendering, and persisting observations are the
//! embedder's concern; the session consumes decoded RGB bitmaps and view
//! rectangles and produces ranked predictions.

#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod imaging;
pub mod inference;
pub mod labels;
pub mod pipeline;
pub mod scheduler;

pub use error::{Error, Result};
