//! Configuration loading and management.

mod file;
mod paths;
mod types;

pub use file::{load_config, load_default_config, save_config};
pub use paths::config_file_path;
pub use types::{ClassifyConfig, Config, ModelConfig, SchedulerTimingConfig, validate_config};
