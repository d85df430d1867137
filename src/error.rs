//! Error types for birdlens.

/// Result type alias for birdlens operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for birdlens.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: std::path::PathBuf,
    },

    /// Failed to build classifier.
    #[error("failed to build classifier: {reason}")]
    ClassifierBuild {
        /// Description of the build failure.
        reason: String,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// A region with dimensions other than the model input size was passed
    /// to normalization without resizing.
    #[error("input region is {width}x{height}, expected {expected}x{expected}")]
    InputSizeMismatch {
        /// Width of the rejected region.
        width: u32,
        /// Height of the rejected region.
        height: u32,
        /// Required side length.
        expected: u32,
    },

    /// The focus box and the displayed image do not overlap.
    #[error("adjust the image so it lies within the focus box")]
    FocusOutsideImage,

    /// The display rectangle has zero or negative extent.
    #[error("display rectangle invalid")]
    InvalidDisplayRect,

    /// Crop coordinates failed bounds validation against the source bitmap.
    #[error(
        "crop rectangle {x},{y} {width}x{height} is out of bounds for a \
         {bitmap_width}x{bitmap_height} bitmap"
    )]
    InvalidCropBounds {
        /// Crop origin X in bitmap pixels.
        x: u32,
        /// Crop origin Y in bitmap pixels.
        y: u32,
        /// Crop width in pixels.
        width: u32,
        /// Crop height in pixels.
        height: u32,
        /// Source bitmap width.
        bitmap_width: u32,
        /// Source bitmap height.
        bitmap_height: u32,
    },

    /// Classification was requested before an image was loaded.
    #[error("no image loaded")]
    NoImageLoaded,

    /// Classification was requested before the focus box was laid out.
    #[error("focus box not initialized")]
    FocusNotSet,

    /// Classification was requested before the image transform produced a
    /// display rectangle.
    #[error("image not visible")]
    DisplayNotSet,

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}
