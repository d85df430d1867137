//! The bird classifier: preprocessing, inference and ranking in one call.

use crate::error::{Error, Result};
use crate::imaging::prepare_region;
use crate::inference::model::LogitModel;
use crate::inference::ranker::{softmax, top_k};
use crate::labels::LabelCatalog;
use image::RgbImage;
use std::sync::Mutex;
use tracing::debug;

/// A single ranked prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Model class index.
    pub index: usize,
    /// Name shown to the user.
    pub display_name: String,
    /// Posterior probability in `[0, 1]`.
    pub probability: f32,
    /// Title-cased scientific name.
    pub scientific_name: String,
    /// Regional name, when the catalog maps one.
    pub regional_name: Option<String>,
    /// Sex/age qualifier, when present and distinct.
    pub variant: Option<String>,
}

impl Prediction {
    /// Probability as a percentage.
    pub fn confidence_percentage(&self) -> f32 {
        self.probability * 100.0
    }

    /// Whether this prediction is acceptable for downstream display/save.
    ///
    /// Expert mode accepts any prediction regardless of confidence.
    pub fn is_acceptable(&self, confidence_threshold: f32, expert_mode: bool) -> bool {
        expert_mode || self.probability >= confidence_threshold
    }
}

/// Ranked classification output, most probable first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationResult {
    /// Predictions in descending probability order.
    pub predictions: Vec<Prediction>,
}

impl ClassificationResult {
    /// The most probable prediction, absent for an empty result.
    pub fn top_prediction(&self) -> Option<&Prediction> {
        self.predictions.first()
    }

    /// Predictions after the top one with probability above `min_probability`.
    pub fn alternatives(&self, min_probability: f32) -> Vec<&Prediction> {
        self.predictions
            .iter()
            .skip(1)
            .filter(|p| p.probability > min_probability)
            .collect()
    }
}

/// Classifies a framed image region into ranked species predictions.
///
/// Owns the model and the label catalog. The model sits behind a mutex so a
/// shared classifier is safe by construction; the scheduler already
/// guarantees runs never overlap, so the lock is uncontended in practice.
pub struct BirdClassifier {
    model: Mutex<Box<dyn LogitModel>>,
    catalog: LabelCatalog,
}

impl BirdClassifier {
    /// Build a classifier from a model and a catalog.
    ///
    /// An empty catalog is allowed; predictions then carry synthetic
    /// `Class <index>` names.
    pub fn new(model: Box<dyn LogitModel>, catalog: LabelCatalog) -> Self {
        Self {
            model: Mutex::new(model),
            catalog,
        }
    }

    /// Build a classifier from asset paths in the configuration.
    ///
    /// A missing or malformed model is fatal; missing label assets degrade
    /// to synthetic names.
    pub fn from_config(config: &crate::config::ModelConfig) -> Result<Self> {
        let model = crate::inference::OnnxModel::from_file(&config.path, config.intra_threads)?;
        let catalog = LabelCatalog::from_files(&config.labels, &config.regional_names);
        Ok(Self::new(Box::new(model), catalog))
    }

    /// The label catalog backing this classifier.
    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    /// Classify an image region.
    ///
    /// The region is resized to the model input size, normalized, pushed
    /// through the model, and the softmax posterior is truncated to the
    /// `top_k` most probable classes.
    pub fn classify(&self, region: &RgbImage, k: usize) -> Result<ClassificationResult> {
        let input = prepare_region(region)?;

        let logits = {
            let mut model = self.model.lock().map_err(|_| Error::Internal {
                message: "model lock poisoned".to_string(),
            })?;
            model.infer(&input)?
        };

        let probabilities = softmax(&logits);
        let ranked = top_k(&probabilities, k);

        debug!(
            classes = logits.len(),
            returned = ranked.len(),
            "classification complete"
        );

        let predictions = ranked
            .into_iter()
            .map(|(index, probability)| self.prediction_for(index, probability))
            .collect();

        Ok(ClassificationResult { predictions })
    }

    fn prediction_for(&self, index: usize, probability: f32) -> Prediction {
        self.catalog.record(index).map_or_else(
            || {
                let synthetic = self.catalog.display_name(index);
                Prediction {
                    index,
                    display_name: synthetic.clone(),
                    probability,
                    scientific_name: synthetic,
                    regional_name: None,
                    variant: None,
                }
            },
            |record| Prediction {
                index,
                display_name: record.display_name.clone(),
                probability,
                scientific_name: record.scientific_name.clone(),
                regional_name: record.regional_name.clone(),
                variant: record.variant.clone(),
            },
        )
    }
}
