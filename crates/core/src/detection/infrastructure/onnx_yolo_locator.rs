/// YOLO-pose face locator using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference and NMS post-processing. Each
/// detection carries up to five keypoints (eyes, nose, mouth corners).
use std::path::Path;

use crate::detection::domain::face_box::FaceBox;
use crate::detection::domain::face_locator::FaceLocator;
use crate::shared::frame::Frame;

use super::execution_provider::{image_input_shape, load_session};

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.45;

/// Number of keypoint values per detection (5 landmarks × x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to report a keypoint.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

pub struct OnnxYoloLocator {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloLocator {
    /// Load a YOLO ONNX model. The input resolution is read from the model's
    /// NCHW input shape, falling back to 640 when dynamic.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let input_size = image_input_shape(&session)
            .map(|(size, _)| size)
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceLocator for OnnxYoloLocator {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let (input_tensor, letterbox) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        Ok(parse_detections(data, &shape, self.confidence, &letterbox))
    }
}

/// Letterbox geometry needed to map model coordinates back to the frame.
#[derive(Clone, Copy, Debug)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn to_frame(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Decodes YOLO rows (`[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`)
/// from either `[1, features, detections]` or `[1, detections, features]`.
fn parse_detections(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
    lb: &Letterbox,
) -> Vec<FaceBox> {
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };

    let mut raw = Vec::new();
    for i in 0..num_dets {
        let row: Vec<f32> = if transposed {
            (0..num_feats).map(|f| data[f * num_dets + i]).collect()
        } else {
            data[i * num_feats..(i + 1) * num_feats].to_vec()
        };

        if row.len() < 5 {
            continue;
        }
        let conf = row[4] as f64;
        if conf < confidence {
            continue;
        }

        let (cx, cy, w, h) = (row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);
        let (x1, y1) = lb.to_frame(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = lb.to_frame(cx + w / 2.0, cy + h / 2.0);

        let keypoints = if row.len() >= 5 + NUM_KEYPOINT_VALUES {
            (0..5)
                .filter(|k| row[5 + k * 3 + 2] as f64 >= KEYPOINT_CONF_THRESH)
                .map(|k| lb.to_frame(row[5 + k * 3] as f64, row[5 + k * 3 + 1] as f64))
                .collect()
        } else {
            Vec::new()
        };

        raw.push(FaceBox {
            x1,
            y1,
            x2,
            y2,
            confidence: conf,
            keypoints,
        });
    }

    FaceBox::non_max_suppression(raw, NMS_IOU_THRESH)
}

/// Letterbox-resize a frame to `target_size` × `target_size` as an NCHW
/// float32 tensor, padding with YOLO's 114 gray.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = (fw * scale).round() as u32;
    let new_h = (fh * scale).round() as u32;
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, Letterbox { scale, pad_x, pad_y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const IDENTITY: Letterbox = Letterbox {
        scale: 1.0,
        pad_x: 0,
        pad_y: 0,
    };

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → scale 3.2, content 640x320, pad_y 160
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let (tensor, lb) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2, epsilon = 0.01);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let (tensor, lb) = letterbox(&frame, 640);

        let y = lb.pad_y as usize + 1;
        assert_relative_eq!(tensor[[0, 0, y, 1]], 1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 114.0 / 255.0, epsilon = 0.01);
    }

    #[test]
    fn test_letterbox_mapping_inverts_padding() {
        let lb = Letterbox {
            scale: 2.0,
            pad_x: 0,
            pad_y: 100,
        };
        let (x, y) = lb.to_frame(200.0, 300.0);
        assert_relative_eq!(x, 100.0);
        assert_relative_eq!(y, 100.0);
    }

    #[test]
    fn test_parse_row_major_detection_with_keypoints() {
        // One detection, 20 features: box + conf + 5 keypoints (one low-confidence)
        let mut row = vec![50.0, 60.0, 20.0, 40.0, 0.9];
        for k in 0..5 {
            let conf = if k == 2 { 0.1 } else { 0.9 };
            row.extend_from_slice(&[10.0 * k as f32, 5.0, conf]);
        }
        // Pad to 30 rows so the layout reads as [1, detections, features]
        let mut data = row;
        data.resize(30 * 20, 0.0);
        let faces = parse_detections(&data, &[1, 30, 20], 0.5, &IDENTITY);

        assert_eq!(faces.len(), 1);
        let f = &faces[0];
        assert_relative_eq!(f.x1, 40.0);
        assert_relative_eq!(f.y1, 40.0);
        assert_relative_eq!(f.x2, 60.0);
        assert_relative_eq!(f.y2, 80.0);
        assert_eq!(f.keypoints.len(), 4);
    }

    #[test]
    fn test_parse_transposed_layout() {
        // [1, 5 features, 8 detections]: feature-major, only detection 0 is confident
        let num_dets = 8;
        let mut data = vec![0.0f32; 5 * num_dets];
        data[0] = 10.0; // cx
        data[num_dets] = 10.0; // cy
        data[2 * num_dets] = 4.0; // w
        data[3 * num_dets] = 4.0; // h
        data[4 * num_dets] = 0.8; // conf
        let faces = parse_detections(&data, &[1, 5, num_dets], 0.5, &IDENTITY);
        assert_eq!(faces.len(), 1);
        assert_relative_eq!(faces[0].x1, 8.0);
        assert_relative_eq!(faces[0].y2, 12.0);
        assert!(faces[0].keypoints.is_empty());
    }

    #[test]
    fn test_parse_filters_low_confidence() {
        let data: Vec<f32> = (0..8)
            .flat_map(|_| [50.0, 60.0, 20.0, 40.0, 0.3])
            .collect();
        assert!(parse_detections(&data, &[1, 8, 5], 0.5, &IDENTITY).is_empty());
    }
}
