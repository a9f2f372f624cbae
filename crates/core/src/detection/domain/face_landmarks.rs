//! Dense per-face landmark sets as produced by a face-mesh model.
//!
//! Points are normalized to the source image: x and y in [0, 1] relative to
//! width and height, z a depth relative to the face center on roughly the
//! same scale as x.

use thiserror::Error;

/// A landmark index requested by a region table is not present in the set.
///
/// This is a per-frame data error: the provider returned a shorter set than
/// the numbering scheme promises. Callers skip the face for that frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("landmark {index} missing from a {len}-point face landmark set")]
    Missing { index: usize, len: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LandmarkPoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Pixel position of this point in a `width` × `height` image.
    pub fn to_pixel(&self, width: u32, height: u32) -> (i64, i64) {
        (
            (self.x * width as f64).round() as i64,
            (self.y * height as f64).round() as i64,
        )
    }
}

/// A stable anatomical numbering scheme: index `i` always denotes the same
/// facial feature for every set the provider produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LandmarkScheme {
    name: &'static str,
    len: usize,
}

impl LandmarkScheme {
    pub const fn new(name: &'static str, len: usize) -> Self {
        Self { name, len }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.len
    }
}

/// MediaPipe face mesh.
pub const FACE_MESH: LandmarkScheme = LandmarkScheme::new("face-mesh", 468);

/// MediaPipe face mesh with refined iris landmarks (indices 468..478).
pub const FACE_MESH_WITH_IRIS: LandmarkScheme = LandmarkScheme::new("face-mesh-iris", 478);

/// One detected face for one frame. Not tracked across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarkSet {
    points: Box<[LandmarkPoint]>,
}

impl FaceLandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self {
            points: points.into_boxed_slice(),
        }
    }

    /// Bounds-checked access by anatomical index.
    pub fn point(&self, index: usize) -> Result<LandmarkPoint, LandmarkError> {
        self.points
            .get(index)
            .copied()
            .ok_or(LandmarkError::Missing {
                index,
                len: self.points.len(),
            })
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the set carries every index of `scheme`.
    pub fn covers(&self, scheme: &LandmarkScheme) -> bool {
        self.points.len() >= scheme.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn flat_set(len: usize) -> FaceLandmarkSet {
        FaceLandmarkSet::new(
            (0..len)
                .map(|i| LandmarkPoint::new(i as f64 / 1000.0, 0.5, 0.0))
                .collect(),
        )
    }

    #[test]
    fn test_point_returns_indexed_landmark() {
        let set = flat_set(10);
        let p = set.point(7).unwrap();
        assert_relative_eq!(p.x, 0.007);
        assert_relative_eq!(p.y, 0.5);
    }

    #[test]
    fn test_point_past_end_is_missing() {
        let set = flat_set(10);
        assert_eq!(
            set.point(10),
            Err(LandmarkError::Missing { index: 10, len: 10 })
        );
    }

    #[test]
    fn test_empty_set_has_no_points() {
        let set = FaceLandmarkSet::new(Vec::new());
        assert!(set.is_empty());
        assert!(set.point(0).is_err());
    }

    #[test]
    fn test_missing_error_message_names_index_and_length() {
        let err = LandmarkError::Missing { index: 466, len: 100 };
        assert_eq!(
            err.to_string(),
            "landmark 466 missing from a 100-point face landmark set"
        );
    }

    #[rstest]
    #[case::exact_mesh(468, FACE_MESH, true)]
    #[case::short_mesh(467, FACE_MESH, false)]
    #[case::iris_on_plain_mesh(468, FACE_MESH_WITH_IRIS, false)]
    #[case::iris(478, FACE_MESH_WITH_IRIS, true)]
    fn test_covers_scheme(
        #[case] len: usize,
        #[case] scheme: LandmarkScheme,
        #[case] expected: bool,
    ) {
        assert_eq!(flat_set(len).covers(&scheme), expected);
    }

    #[test]
    fn test_scheme_contains() {
        assert!(FACE_MESH.contains(467));
        assert!(!FACE_MESH.contains(468));
        assert!(FACE_MESH_WITH_IRIS.contains(477));
    }

    #[test]
    fn test_to_pixel_rounds() {
        let p = LandmarkPoint::new(0.5, 0.251, 0.0);
        assert_eq!(p.to_pixel(640, 480), (320, 120));
    }
}
