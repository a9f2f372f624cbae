/// BlazeFace short-range face locator using ONNX Runtime via `ort`.
///
/// The detector behind MediaPipe's face-detection solution: a box plus six
/// keypoints (eyes, nose tip, mouth center, ear tragions) per face.
use std::path::Path;

use crate::detection::domain::face_box::FaceBox;
use crate::detection::domain::face_locator::FaceLocator;
use crate::shared::frame::Frame;

use super::execution_provider::load_session;

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output: box (4) + 6 keypoints × (x, y).
const REGRESSOR_STRIDE: usize = 16;

const NUM_KEYPOINTS: usize = 6;

pub struct OnnxBlazefaceLocator {
    session: ort::session::Session,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceLocator {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        Ok(Self {
            session,
            confidence,
            anchors: generate_anchors(),
        })
    }
}

impl FaceLocator for OnnxBlazefaceLocator {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let input_tensor = preprocess(frame, INPUT_SIZE);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let raw = decode(
            reg_data,
            score_data,
            &self.anchors,
            self.confidence,
            frame.width(),
            frame.height(),
        );
        Ok(FaceBox::non_max_suppression(raw, NMS_IOU_THRESH))
    }
}

/// Decodes anchor-relative boxes and keypoints into frame pixel coordinates.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    confidence: f64,
    fw: u32,
    fh: u32,
) -> Vec<FaceBox> {
    let (fw, fh) = (fw as f32, fh as f32);
    let size = INPUT_SIZE as f32;
    let num_anchors = anchors.len().min(NUM_ANCHORS);

    let mut raw = Vec::new();
    for (i, &raw_score) in score_data.iter().enumerate().take(num_anchors) {
        let score = sigmoid(raw_score);
        if (score as f64) < confidence {
            continue;
        }

        let offset = i * REGRESSOR_STRIDE;
        if offset + REGRESSOR_STRIDE > reg_data.len() {
            break;
        }
        let reg = &reg_data[offset..offset + REGRESSOR_STRIDE];
        let anchor = anchors[i];

        let cx = anchor[0] + reg[0] / size;
        let cy = anchor[1] + reg[1] / size;
        let w = reg[2] / size;
        let h = reg[3] / size;

        let keypoints = (0..NUM_KEYPOINTS)
            .map(|k| {
                let kx = anchor[0] + reg[4 + k * 2] / size;
                let ky = anchor[1] + reg[4 + k * 2 + 1] / size;
                ((kx * fw) as f64, (ky * fh) as f64)
            })
            .collect();

        raw.push(FaceBox {
            x1: ((cx - w / 2.0) * fw).max(0.0) as f64,
            y1: ((cy - h / 2.0) * fh).max(0.0) as f64,
            x2: ((cx + w / 2.0) * fw).min(fw) as f64,
            y2: ((cy + h / 2.0) * fh).min(fh) as f64,
            confidence: score as f64,
            keypoints,
        });
    }
    raw
}

/// Resize frame to `size × size` and normalize to [0,1] NCHW float32.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

/// Anchors for the short-range model: 16×16 and 8×8 feature maps with 2 and
/// 6 anchors per cell.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_preprocess_shape() {
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let tensor = preprocess(&frame, 128);
        assert_eq!(tensor.shape(), &[1, 3, 128, 128]);
    }

    #[test]
    fn test_generate_anchors_count() {
        // 16×16 × 2 + 8×8 × 6 = 512 + 384
        assert_eq!(generate_anchors().len(), NUM_ANCHORS);
    }

    #[test]
    fn test_anchors_in_unit_range() {
        for a in &generate_anchors() {
            assert!(a[0] > 0.0 && a[0] < 1.0);
            assert!(a[1] > 0.0 && a[1] < 1.0);
        }
    }

    #[test]
    fn test_sigmoid_midpoint() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn test_decode_single_anchor_with_keypoints() {
        let anchors = vec![[0.5f32, 0.5f32]];
        // Box 32x32 model px centered on the anchor, keypoints at the anchor
        let mut reg = vec![0.0f32; REGRESSOR_STRIDE];
        reg[2] = 32.0;
        reg[3] = 32.0;
        let faces = decode(&reg, &[5.0], &anchors, 0.5, 256, 256);

        assert_eq!(faces.len(), 1);
        let f = &faces[0];
        // 32/128 of 256 = 64 px wide, centered at 128
        assert_relative_eq!(f.x1, 96.0, epsilon = 1e-3);
        assert_relative_eq!(f.x2, 160.0, epsilon = 1e-3);
        assert_eq!(f.keypoints.len(), NUM_KEYPOINTS);
        assert_relative_eq!(f.keypoints[0].0, 128.0, epsilon = 1e-3);
    }

    #[test]
    fn test_decode_skips_low_scores() {
        let anchors = vec![[0.5f32, 0.5f32]];
        let reg = vec![0.0f32; REGRESSOR_STRIDE];
        assert!(decode(&reg, &[-5.0], &anchors, 0.5, 256, 256).is_empty());
    }
}
