use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use facestate_core::estimation::domain::state_classifier::StateThresholds;
use facestate_core::shared::constants::APP_DIR_NAME;

const CONFIG_FILE_NAME: &str = "thresholds.json";

/// Threshold overrides read from a JSON file.
///
/// `eye_threshold` sets both eyes; the per-eye keys win over it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdFile {
    pub eye_threshold: Option<f64>,
    pub left_eye_threshold: Option<f64>,
    pub right_eye_threshold: Option<f64>,
    pub mouth_threshold: Option<f64>,
}

/// Per-flag overrides from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdFlags {
    pub left_eye: Option<f64>,
    pub right_eye: Option<f64>,
    pub mouth: Option<f64>,
}

impl ThresholdFile {
    /// Default location: `<config dir>/FaceState/thresholds.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Reads an explicitly requested file. Missing or malformed files are errors.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
        serde_json::from_str(&json)
            .map_err(|e| format!("Invalid config {}: {e}", path.display()).into())
    }

    /// Reads the default-location file. An absent file means no overrides;
    /// an unreadable or malformed one is an error.
    pub fn load_default() -> Result<Self, Box<dyn std::error::Error>> {
        match Self::default_path() {
            Some(path) => Self::load_if_present(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_if_present(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = Self::load(path)?;
        log::info!("Loaded thresholds from {}", path.display());
        Ok(file)
    }

    /// Layers defaults, then this file, then explicit flags.
    pub fn resolve(&self, flags: ThresholdFlags) -> StateThresholds {
        let defaults = StateThresholds::default();
        let left_eye = self.left_eye_threshold.or(self.eye_threshold);
        let right_eye = self.right_eye_threshold.or(self.eye_threshold);
        StateThresholds {
            left_eye: flags.left_eye.or(left_eye).unwrap_or(defaults.left_eye),
            right_eye: flags.right_eye.or(right_eye).unwrap_or(defaults.right_eye),
            mouth: flags
                .mouth
                .or(self.mouth_threshold)
                .unwrap_or(defaults.mouth),
        }
    }
}
