use crate::detection::domain::face_landmarks::FaceLandmarkSet;
use crate::shared::frame::Frame;

/// Given an image, returns zero or more face landmark sets.
///
/// Implementations may hold inference sessions, hence `&mut self`.
pub trait LandmarkProvider: Send {
    fn detect(&mut self, frame: &Frame)
        -> Result<Vec<FaceLandmarkSet>, Box<dyn std::error::Error>>;
}
