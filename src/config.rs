// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scene units per normalized image unit.
pub const DEFAULT_SCENE_SCALE: f64 = 2.0;
/// Landmarks below this visibility are treated as missing.
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.3;
/// Vectors shorter than this are degenerate.
pub const DEFAULT_MIN_VECTOR_LENGTH: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    pub scene_scale: f64,
    pub visibility_threshold: f64,
    pub min_vector_length: f64,
    /// Tick period of the live measurement task
    pub live_cadence_ms: u64,
    pub output_directory: PathBuf,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            scene_scale: DEFAULT_SCENE_SCALE,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            min_vector_length: DEFAULT_MIN_VECTOR_LENGTH,
            live_cadence_ms: 33,
            output_directory: default_output_directory(),
        }
    }
}

fn default_output_directory() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|p| p.join("AngleTracker")))
        .unwrap_or_else(|| PathBuf::from("./output"))
}

impl MeasurementConfig {
    /// Load a JSON config file. Keys that are absent keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: MeasurementConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.scene_scale.is_finite() && self.scene_scale > 0.0) {
            return Err(Error::Config(format!(
                "scene_scale must be a positive number, got {}",
                self.scene_scale
            )));
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(Error::Config(format!(
                "visibility_threshold must lie in [0, 1], got {}",
                self.visibility_threshold
            )));
        }
        if !(self.min_vector_length.is_finite() && self.min_vector_length > 0.0) {
            return Err(Error::Config(format!(
                "min_vector_length must be a positive number, got {}",
                self.min_vector_length
            )));
        }
        if self.live_cadence_ms == 0 {
            return Err(Error::Config("live_cadence_ms must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Live tick period, never shorter than 1 ms.
    pub fn live_cadence(&self) -> Duration {
        Duration::from_millis(self.live_cadence_ms.max(1))
    }
}
