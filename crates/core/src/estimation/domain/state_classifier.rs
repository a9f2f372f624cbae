use std::fmt;

use super::config_error::RegionConfigError;

/// Eye threshold used by the live demo for both eyes.
pub const DEFAULT_EYE_THRESHOLD: f64 = 0.005;

/// Looser eye threshold suited to faces further from the camera.
pub const DEFAULT_EYE_THRESHOLD_GENERIC: f64 = 0.02;

pub const DEFAULT_MOUTH_THRESHOLD: f64 = 0.03;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EyeState {
    Open,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouthState {
    Open,
    Closed,
}

impl fmt::Display for EyeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EyeState::Open => write!(f, "open"),
            EyeState::Closed => write!(f, "closed"),
        }
    }
}

impl fmt::Display for MouthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouthState::Open => write!(f, "open"),
            MouthState::Closed => write!(f, "closed"),
        }
    }
}

/// Closed iff `separation < threshold`; a separation exactly at the
/// threshold counts as open.
pub fn classify_eye(separation: f64, threshold: f64) -> EyeState {
    if separation < threshold {
        EyeState::Closed
    } else {
        EyeState::Open
    }
}

/// Open iff `separation > threshold`; a separation exactly at the threshold
/// counts as closed. The comparison runs the opposite way to [`classify_eye`].
pub fn classify_mouth(separation: f64, threshold: f64) -> MouthState {
    if separation > threshold {
        MouthState::Open
    } else {
        MouthState::Closed
    }
}

/// Per-call-site thresholds, in normalized image-height units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateThresholds {
    pub left_eye: f64,
    pub right_eye: f64,
    pub mouth: f64,
}

impl Default for StateThresholds {
    fn default() -> Self {
        Self {
            left_eye: DEFAULT_EYE_THRESHOLD,
            right_eye: DEFAULT_EYE_THRESHOLD,
            mouth: DEFAULT_MOUTH_THRESHOLD,
        }
    }
}

impl StateThresholds {
    pub fn validate(&self) -> Result<(), RegionConfigError> {
        for (name, value) in [
            ("left-eye", self.left_eye),
            ("right-eye", self.right_eye),
            ("mouth", self.mouth),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RegionConfigError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }
}
