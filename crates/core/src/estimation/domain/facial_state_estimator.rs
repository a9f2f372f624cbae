use crate::detection::domain::face_landmarks::{FaceLandmarkSet, LandmarkError, LandmarkScheme};

use super::anatomical_region::{AnatomicalRegion, RegionPair};
use super::aperture::mean_vertical_separation;
use super::config_error::RegionConfigError;
use super::region_tables;
use super::state_classifier::{classify_eye, classify_mouth, EyeState, MouthState, StateThresholds};

/// Raw mean separations behind one [`FacialState`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FacialMetrics {
    pub left_eye: f64,
    pub right_eye: f64,
    pub mouth: f64,
}

/// Discrete states for one face in one frame. Recomputed every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FacialState {
    pub left_eye: EyeState,
    pub right_eye: EyeState,
    pub mouth: MouthState,
    pub metrics: FacialMetrics,
}

/// Turns a face landmark set into eye and mouth states.
///
/// Holds no per-frame memory: every call to [`estimate`](Self::estimate) is
/// independent of the previous ones.
#[derive(Clone, Debug)]
pub struct FacialStateEstimator {
    left_eye: RegionPair,
    right_eye: RegionPair,
    mouth: RegionPair,
    thresholds: StateThresholds,
}

impl FacialStateEstimator {
    /// Estimator over the built-in face-mesh tables.
    pub fn face_mesh(thresholds: StateThresholds) -> Result<Self, RegionConfigError> {
        Self::new(
            (region_tables::LEFT_EYE_UPPER, region_tables::LEFT_EYE_LOWER),
            (region_tables::RIGHT_EYE_UPPER, region_tables::RIGHT_EYE_LOWER),
            (region_tables::UPPER_LIP, region_tables::LOWER_LIP),
            thresholds,
            &region_tables::SCHEME,
        )
    }

    /// Validates every table and threshold up front. Any failure here is a
    /// configuration error; nothing is checked lazily per frame except the
    /// length of each incoming landmark set.
    pub fn new(
        left_eye: (AnatomicalRegion, AnatomicalRegion),
        right_eye: (AnatomicalRegion, AnatomicalRegion),
        mouth: (AnatomicalRegion, AnatomicalRegion),
        thresholds: StateThresholds,
        scheme: &LandmarkScheme,
    ) -> Result<Self, RegionConfigError> {
        let left_eye = RegionPair::new(left_eye.0, left_eye.1)?;
        let right_eye = RegionPair::new(right_eye.0, right_eye.1)?;
        let mouth = RegionPair::new(mouth.0, mouth.1)?;
        for pair in [&left_eye, &right_eye, &mouth] {
            pair.validate_for(scheme)?;
        }
        thresholds.validate()?;

        log::debug!(
            "Facial state estimator ready: eyes {}/{} mouth {} over `{}`",
            thresholds.left_eye,
            thresholds.right_eye,
            thresholds.mouth,
            scheme.name()
        );

        Ok(Self {
            left_eye,
            right_eye,
            mouth,
            thresholds,
        })
    }

    pub fn thresholds(&self) -> &StateThresholds {
        &self.thresholds
    }

    /// Smallest landmark set length this estimator can classify.
    pub fn required_landmarks(&self) -> usize {
        [&self.left_eye, &self.right_eye, &self.mouth]
            .iter()
            .map(|p| p.max_index() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn estimate(&self, landmarks: &FaceLandmarkSet) -> Result<FacialState, LandmarkError> {
        let metrics = FacialMetrics {
            left_eye: mean_vertical_separation(landmarks, &self.left_eye)?,
            right_eye: mean_vertical_separation(landmarks, &self.right_eye)?,
            mouth: mean_vertical_separation(landmarks, &self.mouth)?,
        };

        Ok(FacialState {
            left_eye: classify_eye(metrics.left_eye, self.thresholds.left_eye),
            right_eye: classify_eye(metrics.right_eye, self.thresholds.right_eye),
            mouth: classify_mouth(metrics.mouth, self.thresholds.mouth),
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_landmarks::{LandmarkPoint, FACE_MESH};
    use approx::assert_relative_eq;

    fn uniform_face(y: f64) -> FaceLandmarkSet {
        FaceLandmarkSet::new(vec![LandmarkPoint::new(0.5, y, 0.0); FACE_MESH.len()])
    }

    fn set_region_y(points: &mut [LandmarkPoint], region: &AnatomicalRegion, y: f64) {
        for &i in region.indices {
            points[i].y = y;
        }
    }

    #[test]
    fn test_face_mesh_tables_construct() {
        let est = FacialStateEstimator::face_mesh(StateThresholds::default()).unwrap();
        assert_eq!(est.required_landmarks(), 467);
    }

    #[test]
    fn test_flat_face_is_all_closed() {
        let est = FacialStateEstimator::face_mesh(StateThresholds::default()).unwrap();
        let state = est.estimate(&uniform_face(0.5)).unwrap();
        assert_eq!(state.left_eye, EyeState::Closed);
        assert_eq!(state.right_eye, EyeState::Closed);
        assert_eq!(state.mouth, MouthState::Closed);
        assert_eq!(state.metrics.left_eye, 0.0);
        assert_eq!(state.metrics.mouth, 0.0);
    }

    #[test]
    fn test_open_mouth_on_face_mesh_tables() {
        let est = FacialStateEstimator::face_mesh(StateThresholds::default()).unwrap();
        let mut points = uniform_face(0.5).points().to_vec();
        set_region_y(&mut points, &region_tables::UPPER_LIP, 0.50);
        set_region_y(&mut points, &region_tables::LOWER_LIP, 0.55);
        let state = est.estimate(&FaceLandmarkSet::new(points)).unwrap();
        assert_relative_eq!(state.metrics.mouth, 0.05, epsilon = 1e-12);
        assert_eq!(state.mouth, MouthState::Open);
    }

    #[test]
    fn test_short_landmark_set_is_a_data_error() {
        let est = FacialStateEstimator::face_mesh(StateThresholds::default()).unwrap();
        let short = FaceLandmarkSet::new(vec![LandmarkPoint::new(0.5, 0.5, 0.0); 300]);
        assert!(matches!(
            est.estimate(&short),
            Err(LandmarkError::Missing { len: 300, .. })
        ));
    }

    #[test]
    fn test_invalid_threshold_blocks_construction() {
        let thresholds = StateThresholds {
            mouth: -1.0,
            ..StateThresholds::default()
        };
        assert!(matches!(
            FacialStateEstimator::face_mesh(thresholds),
            Err(RegionConfigError::InvalidThreshold { name: "mouth", .. })
        ));
    }

    #[test]
    fn test_mismatched_tables_block_construction() {
        const UPPER: AnatomicalRegion = AnatomicalRegion::new("upper", &[1, 2, 3]);
        const LOWER: AnatomicalRegion = AnatomicalRegion::new("lower", &[4, 5]);
        let err = FacialStateEstimator::new(
            (UPPER, LOWER),
            (region_tables::RIGHT_EYE_UPPER, region_tables::RIGHT_EYE_LOWER),
            (region_tables::UPPER_LIP, region_tables::LOWER_LIP),
            StateThresholds::default(),
            &FACE_MESH,
        )
        .unwrap_err();
        assert!(matches!(err, RegionConfigError::LengthMismatch { .. }));
    }

    #[test]
    fn test_tables_outside_scheme_block_construction() {
        const TINY: LandmarkScheme = LandmarkScheme::new("tiny", 100);
        let err = FacialStateEstimator::new(
            (region_tables::LEFT_EYE_UPPER, region_tables::LEFT_EYE_LOWER),
            (region_tables::RIGHT_EYE_UPPER, region_tables::RIGHT_EYE_LOWER),
            (region_tables::UPPER_LIP, region_tables::LOWER_LIP),
            StateThresholds::default(),
            &TINY,
        )
        .unwrap_err();
        assert!(matches!(err, RegionConfigError::IndexOutOfScheme { .. }));
    }
}
