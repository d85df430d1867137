//! Configuration type definitions.

use crate::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_TOP_K, confidence, scheduler as timing,
};
use crate::error::{Error, Result};
use crate::scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete library configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model and label asset locations.
    #[serde(default)]
    pub model: ModelConfig,

    /// Classification request defaults.
    #[serde(default)]
    pub classify: ClassifyConfig,

    /// Re-classification scheduler timing.
    #[serde(default)]
    pub scheduler: SchedulerTimingConfig,
}

/// Model and label asset configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: PathBuf,

    /// Path to the class label list (one token per line).
    pub labels: PathBuf,

    /// Path to the scientific-key to regional-name JSON map.
    pub regional_names: PathBuf,

    /// Intra-op thread count handed to the runtime. Tuning only; does not
    /// affect results.
    pub intra_threads: usize,
}

/// Per-request classification defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Number of ranked predictions to return.
    pub top_k: usize,

    /// Confidence threshold for an acceptable top prediction.
    pub confidence_threshold: f32,

    /// Accept the top prediction regardless of confidence.
    pub expert_mode: bool,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            expert_mode: false,
        }
    }
}

/// Scheduler timing knobs, in milliseconds.
///
/// The defaults are the empirically tuned contract values; changing them
/// changes observable behavior, not just performance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerTimingConfig {
    /// Debounce window after the last geometry change.
    pub debounce_ms: u64,

    /// Margin under the debounce window that forces a reschedule.
    pub reschedule_margin_ms: u64,

    /// Post-run hold that absorbs viewer settle jitter.
    pub quiet_period_ms: u64,

    /// Maximum age of a pending change acted on after the quiet period.
    pub reconcile_window_ms: u64,
}

impl Default for SchedulerTimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: timing::DEBOUNCE_MS,
            reschedule_margin_ms: timing::RESCHEDULE_MARGIN_MS,
            quiet_period_ms: timing::QUIET_PERIOD_MS,
            reconcile_window_ms: timing::RECONCILE_WINDOW_MS,
        }
    }
}

impl From<&SchedulerTimingConfig> for SchedulerConfig {
    fn from(timing: &SchedulerTimingConfig) -> Self {
        Self {
            debounce: Duration::from_millis(timing.debounce_ms),
            reschedule_margin: Duration::from_millis(timing.reschedule_margin_ms),
            quiet_period: Duration::from_millis(timing.quiet_period_ms),
            reconcile_window: Duration::from_millis(timing.reconcile_window_ms),
        }
    }
}

/// Validate a configuration.
///
/// # Errors
///
/// [`Error::ConfigValidation`] describing the first failed check.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.classify.top_k == 0 {
        return Err(Error::ConfigValidation {
            message: "classify.top_k must be at least 1".to_string(),
        });
    }

    let threshold = config.classify.confidence_threshold;
    if !(confidence::MIN..=confidence::MAX).contains(&threshold) {
        return Err(Error::ConfigValidation {
            message: format!(
                "classify.confidence_threshold must be within [{}, {}], got {threshold}",
                confidence::MIN,
                confidence::MAX
            ),
        });
    }

    if config.scheduler.debounce_ms == 0 {
        return Err(Error::ConfigValidation {
            message: "scheduler.debounce_ms must be non-zero".to_string(),
        });
    }

    if config.scheduler.reschedule_margin_ms >= config.scheduler.debounce_ms {
        return Err(Error::ConfigValidation {
            message: "scheduler.reschedule_margin_ms must be below scheduler.debounce_ms"
                .to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_contract_values() {
        let config = Config::default();
        assert_eq!(config.classify.top_k, 3);
        assert_eq!(config.classify.confidence_threshold, 0.55);
        assert!(!config.classify.expert_mode);
        assert_eq!(config.scheduler.debounce_ms, 500);
        assert_eq!(config.scheduler.reschedule_margin_ms, 50);
        assert_eq!(config.scheduler.quiet_period_ms, 200);
        assert_eq!(config.scheduler.reconcile_window_ms, 400);
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = Config::default();
        config.classify.top_k = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.classify.confidence_threshold = 1.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_margin_at_or_above_debounce() {
        let mut config = Config::default();
        config.scheduler.reschedule_margin_ms = 500;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_scheduler_config_conversion() {
        let timing = SchedulerTimingConfig::default();
        let scheduler: SchedulerConfig = (&timing).into();
        assert_eq!(scheduler.debounce, Duration::from_millis(500));
        assert_eq!(scheduler.quiet_period, Duration::from_millis(200));
    }
}
