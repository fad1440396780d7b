use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for an editor session.
///
/// Every field has a default, so a partial JSON document (or `{}`) is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old configs
pub struct SessionConfig {
    /// Maximum number of history entries kept. `None` keeps everything.
    pub history_capacity: Option<usize>,
    /// Offset applied to both axes when pasting clipboard objects
    pub paste_offset: f32,
    /// Width used by [`crate::surface::Canvas::from_config`]
    pub canvas_width: f32,
    /// Height used by [`crate::surface::Canvas::from_config`]
    pub canvas_height: f32,
    /// Commit the surface state as the first history entry when the session starts
    pub record_initial_state: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: None,
            paste_offset: 10.0,
            canvas_width: 800.0,
            canvas_height: 600.0,
            record_initial_state: true,
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from JSON, falling back to defaults for missing fields
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_history_capacity(mut self, capacity: Option<usize>) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == Some(0) {
            return Err(ConfigError::Invalid("history_capacity must be at least 1".into()));
        }
        if !(self.canvas_width > 0.0 && self.canvas_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "canvas size must be positive, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        Ok(())
    }
}
