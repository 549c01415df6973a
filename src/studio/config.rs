//! Session configuration.

use crate::image::{Model, ValidationRules};
use std::env;
use std::path::PathBuf;

/// Directory name used under the platform data directory.
const APP_DIR: &str = "freeai-studio";

/// Knobs that distinguish one studio flavour from another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    /// Model preselected when the user does not pick one.
    pub default_model: Model,
    /// Record successful generations into the persisted gallery.
    pub history_enabled: bool,
    /// Reject steps outside 1..=4 before calling the API.
    pub enforce_steps_range: bool,
    /// Drive the cosmetic progress indicator while a request is in flight.
    pub show_progress: bool,
    /// Where durable state lives. `None` means the platform default.
    pub data_dir: Option<PathBuf>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            default_model: Model::default(),
            history_enabled: true,
            enforce_steps_range: true,
            show_progress: true,
            data_dir: None,
        }
    }
}

impl StudioConfig {
    /// Same as [`StudioConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The single-model studio: no gallery and no steps check.
    pub fn classic() -> Self {
        Self {
            history_enabled: false,
            enforce_steps_range: false,
            ..Self::default()
        }
    }

    /// Reads overrides from `FREEAI_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let flag = |name: &str, default: bool| {
            env::var(name)
                .ok()
                .map_or(default, |val| matches!(val.as_str(), "1" | "true" | "yes"))
        };

        Self {
            default_model: env::var("FREEAI_MODEL")
                .ok()
                .and_then(|id| Model::from_id(&id))
                .unwrap_or(defaults.default_model),
            history_enabled: flag("FREEAI_HISTORY", defaults.history_enabled),
            enforce_steps_range: flag("FREEAI_STEPS_CHECK", defaults.enforce_steps_range),
            show_progress: flag("FREEAI_PROGRESS", defaults.show_progress),
            data_dir: env::var_os("FREEAI_DATA_DIR").map(PathBuf::from),
        }
    }

    /// Sets the preselected model.
    pub fn with_model(mut self, model: Model) -> Self {
        self.default_model = model;
        self
    }

    /// Turns the gallery on or off.
    pub fn with_history(mut self, enabled: bool) -> Self {
        self.history_enabled = enabled;
        self
    }

    /// Turns the steps range check on or off.
    pub fn with_steps_check(mut self, enabled: bool) -> Self {
        self.enforce_steps_range = enabled;
        self
    }

    /// Turns the progress indicator on or off.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Stores durable state under `dir`.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Validation rules implied by this configuration.
    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            enforce_steps_range: self.enforce_steps_range,
        }
    }

    /// Resolves the data directory, falling back to the platform default
    /// and then to a dot-directory in the working directory.
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR)))
    }
}
