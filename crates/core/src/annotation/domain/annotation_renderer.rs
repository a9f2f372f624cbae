use crate::detection::domain::face_box::FaceBox;
use crate::detection::domain::face_landmarks::FaceLandmarkSet;
use crate::shared::frame::Frame;

/// Draws diagnostic overlays in place onto an RGB frame.
///
/// Rendering never fails: points outside the frame are clipped and indices
/// a set does not carry are skipped.
pub trait AnnotationRenderer: Send {
    /// Turns an acquired frame into the image overlays are drawn onto.
    fn canvas_for(&self, frame: Frame) -> Frame;

    fn draw_landmarks(&self, canvas: &mut Frame, face: &FaceLandmarkSet);

    fn draw_face_box(&self, canvas: &mut Frame, face: &FaceBox);
}
