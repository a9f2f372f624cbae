//! Face-mesh landmark provider: a face locator followed by a dense mesh model.
//!
//! Each located face is expanded to a padded square crop, resized to the mesh
//! model's input and run through ONNX Runtime. The model reports landmarks in
//! input-pixel units; they are mapped back to frame-normalized coordinates so
//! downstream thresholds do not depend on the camera resolution.

use std::path::Path;

use crate::detection::domain::face_box::SquareCrop;
use crate::detection::domain::face_landmarks::{FaceLandmarkSet, LandmarkPoint};
use crate::detection::domain::face_locator::FaceLocator;
use crate::detection::domain::landmark_provider::LandmarkProvider;
use crate::shared::frame::Frame;

use super::execution_provider::{image_input_shape, load_session};

/// Face-mesh model input resolution when the model doesn't declare one.
const DEFAULT_INPUT_SIZE: u32 = 192;

/// How far the crop extends beyond the located box on each side, relative to
/// the box's longer edge.
const CROP_PADDING: f64 = 0.25;

/// Minimum face-presence probability for a mesh to be reported.
const PRESENCE_THRESH: f32 = 0.5;

pub const DEFAULT_MAX_FACES: usize = 1;

pub struct OnnxFaceMeshProvider {
    session: ort::session::Session,
    locator: Box<dyn FaceLocator>,
    input_size: u32,
    channels_first: bool,
    max_faces: usize,
}

impl OnnxFaceMeshProvider {
    pub fn new(
        model_path: &Path,
        locator: Box<dyn FaceLocator>,
        max_faces: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        if max_faces == 0 {
            return Err("max_faces must be >= 1".into());
        }
        let session = load_session(model_path)?;
        let (input_size, channels_first) =
            image_input_shape(&session).unwrap_or((DEFAULT_INPUT_SIZE, true));
        log::debug!(
            "Face mesh input {input_size}x{input_size} ({})",
            if channels_first { "NCHW" } else { "NHWC" }
        );

        Ok(Self {
            session,
            locator,
            input_size,
            channels_first,
            max_faces,
        })
    }

    fn run_mesh(
        &mut self,
        frame: &Frame,
        crop: &SquareCrop,
    ) -> Result<Option<FaceLandmarkSet>, Box<dyn std::error::Error>> {
        let tensor = crop_to_tensor(frame, crop, self.input_size, self.channels_first);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Face mesh model produced no outputs".into());
        }

        // A single-element output is the face-presence logit
        for i in 1..outputs.len() {
            let extra = outputs[i].try_extract_array::<f32>()?;
            if extra.len() == 1 {
                let logit = extra.iter().copied().next().unwrap_or(0.0);
                if sigmoid(logit) < PRESENCE_THRESH {
                    return Ok(None);
                }
            }
        }

        let landmarks = outputs[0].try_extract_array::<f32>()?;
        let raw: Vec<f32> = landmarks.iter().copied().collect();
        let points = map_to_frame(&raw, crop, self.input_size, frame.width(), frame.height())?;
        Ok(Some(FaceLandmarkSet::new(points)))
    }
}

impl LandmarkProvider for OnnxFaceMeshProvider {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<FaceLandmarkSet>, Box<dyn std::error::Error>> {
        // Boxes come back confidence-sorted from NMS
        let boxes = self.locator.locate(frame)?;

        let mut faces = Vec::new();
        for face in boxes.iter().take(self.max_faces) {
            let Some(crop) = face.square_crop(CROP_PADDING, frame.width(), frame.height()) else {
                log::debug!("Frame {}: face box too small for mesh", frame.index());
                continue;
            };
            if let Some(set) = self.run_mesh(frame, &crop)? {
                faces.push(set);
            }
        }
        Ok(faces)
    }
}

/// Samples the crop (nearest neighbor) into a `[0, 1]` float tensor of
/// `size` × `size`, NCHW or NHWC.
fn crop_to_tensor(
    frame: &Frame,
    crop: &SquareCrop,
    size: u32,
    channels_first: bool,
) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let s = size as usize;
    let step = crop.size as f64 / s as f64;
    let max_x = frame.width() as usize - 1;
    let max_y = frame.height() as usize - 1;

    let mut tensor = if channels_first {
        ndarray::Array4::<f32>::zeros((1, 3, s, s))
    } else {
        ndarray::Array4::<f32>::zeros((1, s, s, 3))
    };

    for y in 0..s {
        let src_y = (crop.y as usize + ((y as f64 + 0.5) * step) as usize).min(max_y);
        for x in 0..s {
            let src_x = (crop.x as usize + ((x as f64 + 0.5) * step) as usize).min(max_x);
            for c in 0..3 {
                let v = src[[src_y, src_x, c]] as f32 / 255.0;
                if channels_first {
                    tensor[[0, c, y, x]] = v;
                } else {
                    tensor[[0, y, x, c]] = v;
                }
            }
        }
    }
    tensor
}

/// Maps flat `(x, y, z)` triples in model-input pixels to frame-normalized
/// landmark points.
fn map_to_frame(
    raw: &[f32],
    crop: &SquareCrop,
    input_size: u32,
    frame_w: u32,
    frame_h: u32,
) -> Result<Vec<LandmarkPoint>, Box<dyn std::error::Error>> {
    if raw.is_empty() || raw.len() % 3 != 0 {
        return Err(format!(
            "Face mesh output of {} values is not a list of (x, y, z) triples",
            raw.len()
        )
        .into());
    }

    let scale = crop.size as f64 / input_size as f64;
    let fw = frame_w as f64;
    let fh = frame_h as f64;

    Ok(raw
        .chunks_exact(3)
        .map(|p| {
            let px = crop.x as f64 + p[0] as f64 * scale;
            let py = crop.y as f64 + p[1] as f64 * scale;
            LandmarkPoint::new(px / fw, py / fh, p[2] as f64 * scale / fw)
        })
        .collect())
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CROP: SquareCrop = SquareCrop {
        x: 100,
        y: 50,
        size: 192,
    };

    #[test]
    fn test_map_to_frame_normalizes_by_frame_size() {
        // Crop is at native resolution: model px == frame px offset by crop origin
        let raw = [96.0, 96.0, 19.2];
        let points = map_to_frame(&raw, &CROP, 192, 400, 300).unwrap();
        assert_eq!(points.len(), 1);
        assert_relative_eq!(points[0].x, 196.0 / 400.0);
        assert_relative_eq!(points[0].y, 146.0 / 300.0);
        assert_relative_eq!(points[0].z, 19.2f32 as f64 / 400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_map_to_frame_scales_larger_crops() {
        let crop = SquareCrop {
            x: 0,
            y: 0,
            size: 384,
        };
        let points = map_to_frame(&[192.0, 96.0, 0.0], &crop, 192, 384, 384).unwrap();
        assert_relative_eq!(points[0].x, 1.0);
        assert_relative_eq!(points[0].y, 0.5);
    }

    #[test]
    fn test_map_to_frame_rejects_partial_triples() {
        assert!(map_to_frame(&[1.0, 2.0], &CROP, 192, 400, 300).is_err());
        assert!(map_to_frame(&[], &CROP, 192, 400, 300).is_err());
    }

    #[test]
    fn test_map_to_frame_keeps_full_mesh_length() {
        let raw = vec![0.0f32; 468 * 3];
        let points = map_to_frame(&raw, &CROP, 192, 400, 300).unwrap();
        assert_eq!(points.len(), 468);
    }

    #[test]
    fn test_crop_to_tensor_layouts() {
        let frame = Frame::new(vec![255u8; 400 * 300 * 3], 400, 300, 3, 0);
        let nchw = crop_to_tensor(&frame, &CROP, 192, true);
        let nhwc = crop_to_tensor(&frame, &CROP, 192, false);
        assert_eq!(nchw.shape(), &[1, 3, 192, 192]);
        assert_eq!(nhwc.shape(), &[1, 192, 192, 3]);
        assert_relative_eq!(nchw[[0, 2, 10, 10]], 1.0);
        assert_relative_eq!(nhwc[[0, 10, 10, 2]], 1.0);
    }

    #[test]
    fn test_crop_to_tensor_samples_inside_crop() {
        // Left half black, right half white; crop entirely in the right half
        let (w, h) = (100u32, 40u32);
        let mut data = vec![0u8; (w * h * 3) as usize];
        for y in 0..h as usize {
            for x in 50..w as usize {
                let o = (y * w as usize + x) * 3;
                data[o..o + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        let frame = Frame::new(data, w, h, 3, 0);
        let crop = SquareCrop {
            x: 60,
            y: 0,
            size: 40,
        };
        let t = crop_to_tensor(&frame, &crop, 8, true);
        assert!(t.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }
}
