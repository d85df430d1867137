//! The opaque model behind the classifier.

use crate::error::{Error, Result};
use crate::imaging::InputTensor;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use tracing::info;

/// A model that maps a normalized input tensor to a dense logit vector.
///
/// Implementations must be callable from a worker thread. They are never
/// called concurrently with themselves; that exclusivity is enforced by the
/// classifier and scheduler, not by this trait.
pub trait LogitModel: Send {
    /// Run the model on one input, returning one logit per class.
    fn infer(&mut self, input: &InputTensor) -> Result<Vec<f32>>;
}

/// ONNX Runtime backed model with input `[1, 3, 256, 256]` and output
/// `[1, num_classes]`, both f32.
pub struct OnnxModel {
    session: Session,
}

impl OnnxModel {
    /// Load a model from an ONNX file.
    ///
    /// `intra_threads` is handed to the runtime as a tuning knob; zero
    /// leaves the runtime default in place.
    ///
    /// # Errors
    ///
    /// [`Error::ModelFileNotFound`] if the file is absent and
    /// [`Error::ClassifierBuild`] for a malformed artifact. Both are fatal
    /// to the session; the caller reports "classifier unavailable" and must
    /// not attempt classification.
    pub fn from_file(path: &Path, intra_threads: usize) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ModelFileNotFound {
                path: path.to_path_buf(),
            });
        }

        let build = || -> std::result::Result<Session, ort::Error> {
            let mut builder = Session::builder()?;
            if intra_threads > 0 {
                builder = builder.with_intra_threads(intra_threads)?;
            }
            builder.commit_from_file(path)
        };

        let session = build().map_err(|e| Error::ClassifierBuild {
            reason: e.to_string(),
        })?;

        info!("loaded model: {}", path.display());
        Ok(Self { session })
    }
}

impl LogitModel for OnnxModel {
    fn infer(&mut self, input: &InputTensor) -> Result<Vec<f32>> {
        let tensor = TensorRef::from_array_view((InputTensor::dims().to_vec(), input.as_slice()))
            .map_err(|e| Error::Inference {
            reason: format!("failed to build input tensor: {e}"),
        })?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;

        let (shape, data) =
            outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| Error::Inference {
                    reason: format!("failed to extract logits: {e}"),
                })?;

        // Accept [1, n] or a flat [n]; anything else is a contract breach.
        let valid = match shape.len() {
            1 => true,
            2 => shape[0] == 1,
            _ => false,
        };
        if !valid || data.is_empty() {
            return Err(Error::Inference {
                reason: format!("unexpected output shape {shape:?}, expected [1, num_classes]"),
            });
        }

        Ok(data.to_vec())
    }
}
