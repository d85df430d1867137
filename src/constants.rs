//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Library name used for config directories and user-facing messages.
pub const APP_NAME: &str = "birdlens";

/// Side length of the square model input, in pixels.
///
/// Fixed by the trained input resolution of the model. Regions of any other
/// size must be resized with bilinear resampling before normalization.
pub const MODEL_INPUT_SIZE: u32 = 256;

/// Number of color channels in the model input.
pub const MODEL_INPUT_CHANNELS: usize = 3;

/// Default number of top predictions to return per classification.
pub const DEFAULT_TOP_K: usize = 3;

/// Default confidence threshold above which the top prediction is considered
/// acceptable for downstream display/save.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.55;

/// Probability floor for listing alternative predictions below the top one.
pub const ALTERNATIVE_MIN_PROBABILITY: f32 = 0.1;

/// Fraction of the shorter viewport side occupied by the centered focus box.
pub const FOCUS_BOX_SIZE_RATIO: f32 = 0.7;

/// Normalization statistics applied to model input pixels.
///
/// These are the standard ImageNet statistics for channels R, G, B in that
/// order. They are part of the model input contract, not a tuning knob.
pub mod imagenet {
    /// Per-channel mean, applied after scaling pixels to `[0, 1]`.
    pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
    /// Per-channel standard deviation.
    pub const STD: [f32; 3] = [0.229, 0.224, 0.225];
}

/// Re-classification scheduler timing.
///
/// These values were tuned empirically against real gesture streams and are
/// part of the observable behavior contract. They are exposed as
/// configuration so embedders can adjust them, but the defaults should not
/// be re-derived.
pub mod scheduler {
    /// Debounce window after the last geometry change before a run starts.
    pub const DEBOUNCE_MS: u64 = 500;

    /// If a change arrived within `DEBOUNCE_MS - RESCHEDULE_MARGIN_MS` of the
    /// deadline firing, the run is rescheduled instead of started.
    pub const RESCHEDULE_MARGIN_MS: u64 = 50;

    /// Hold after a run completes, absorbing transform jitter from the
    /// viewer's settle animation.
    pub const QUIET_PERIOD_MS: u64 = 200;

    /// A pending change older than this at quiet-period end is not acted on.
    pub const RECONCILE_WINDOW_MS: u64 = 400;
}

/// Label parsing constants.
pub mod labels {
    /// Age/sex qualifier tokens stripped when retrying a regional-name match.
    pub const IGNORED_VARIANT_TOKENS: &[&str] = &[
        "macho", "hembra", "juvenil", "adulto", "juvenile", "adult", "male", "female",
    ];

    /// Prefix of the synthetic display name used when the catalog has no
    /// record for a class index.
    pub const SYNTHETIC_LABEL_PREFIX: &str = "Class";
}

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 1.0;
}
