//! Inference for bird species identification.

mod classifier;
mod model;
mod ranker;

pub use classifier::{BirdClassifier, ClassificationResult, Prediction};
pub use model::{LogitModel, OnnxModel};
pub use ranker::{softmax, top_k};
