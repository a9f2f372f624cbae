use crate::detection::domain::face_landmarks::{FaceLandmarkSet, LandmarkError};

use super::anatomical_region::RegionPair;

/// Mean absolute vertical separation between the paired edges of an aperture.
///
/// For each `(upper[i], lower[i])` the absolute y difference is taken; the
/// result is their average, in normalized image-height units. Coincident
/// edges give exactly 0.0.
pub fn mean_vertical_separation(
    landmarks: &FaceLandmarkSet,
    pair: &RegionPair,
) -> Result<f64, LandmarkError> {
    let mut sum = 0.0;
    for (upper, lower) in pair.pairs() {
        sum += (landmarks.point(upper)?.y - landmarks.point(lower)?.y).abs();
    }
    Ok(sum / pair.len() as f64)
}
