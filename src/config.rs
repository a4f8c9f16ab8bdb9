//! Table Configuration
//!
//! Local, per-process settings. Nothing here is synchronised: every peer must
//! load the same rack or replicas drift on the first break.

use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::game::collision::balls_overlap;
use crate::game::state::BALL_COUNT;
use crate::game::table::{Rack, FIXED_STEP, MAX_FRAME_DELTA};

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Break layout.
    pub rack: Rack,
    /// Longest frame delta fed to the step accumulator (seconds).
    pub max_frame_delta: f32,
    /// Log every packet as hex at debug level.
    pub dump_packets: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            rack: Rack::standard(),
            max_frame_delta: MAX_FRAME_DELTA,
            dump_packets: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Could not read the file.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Not valid JSON for this schema.
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// Parsed but unusable.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl TableConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TableConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Reject settings the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_frame_delta.is_finite() || self.max_frame_delta < FIXED_STEP {
            return Err(ConfigError::Invalid(format!(
                "max_frame_delta must be at least {} s, got {}",
                FIXED_STEP, self.max_frame_delta
            )));
        }

        if !self.rack.is_on_table() {
            return Err(ConfigError::Invalid("rack places a ball off the table".into()));
        }

        for a in 0..BALL_COUNT {
            for b in (a + 1)..BALL_COUNT {
                if balls_overlap(self.rack.positions[a], self.rack.positions[b]) {
                    return Err(ConfigError::Invalid(format!("rack overlaps balls {} and {}", a, b)));
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;

    #[test]
    fn test_default_is_valid() {
        assert!(TableConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = TableConfig::from_json(r#"{ "dump_packets": true }"#).unwrap();
        assert!(config.dump_packets);
        assert_eq!(config.max_frame_delta, MAX_FRAME_DELTA);
        assert_eq!(config.rack, Rack::standard());
    }

    #[test]
    fn test_json_round_trip() {
        let config = TableConfig { dump_packets: true, ..TableConfig::default() };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(TableConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_tiny_frame_delta() {
        let result = TableConfig::from_json(r#"{ "max_frame_delta": 0.001 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_overlapping_rack() {
        let mut config = TableConfig::default();
        config.rack.positions[5] = config.rack.positions[6] + Vec2::new(0.01, 0.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(TableConfig::from_json("not json"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = TableConfig::load("/nonexistent/eightball.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
