use crate::detection::domain::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Domain interface for coarse face localisation (boxes plus a few keypoints).
///
/// Used both on its own by the face-detection demo and as the first stage of
/// a landmark provider.
pub trait FaceLocator: Send {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>>;
}
