/// A located face in frame pixel coordinates.
///
/// Keypoints are coarse anchors reported by the detector (eyes, nose, mouth,
/// optionally ear tragions); points the detector was unsure about are omitted.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
    pub keypoints: Vec<(f64, f64)>,
}

/// Square pixel window inside a frame, used to crop a face for the mesh model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SquareCrop {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// Crops smaller than this are not worth running a mesh model on.
const MIN_CROP_SIZE: f64 = 8.0;

impl FaceBox {
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn iou(&self, other: &FaceBox) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        let area_a = self.width() * self.height();
        let area_b = other.width() * other.height();
        inter / (area_a + area_b - inter)
    }

    /// Greedy NMS: sort by confidence descending, drop boxes overlapping a
    /// kept box by more than `iou_thresh`.
    pub fn non_max_suppression(mut boxes: Vec<FaceBox>, iou_thresh: f64) -> Vec<FaceBox> {
        boxes.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut keep: Vec<FaceBox> = Vec::with_capacity(boxes.len());
        for candidate in boxes {
            if keep.iter().all(|k| k.iou(&candidate) <= iou_thresh) {
                keep.push(candidate);
            }
        }
        keep
    }

    /// Square window around the box, enlarged by `pad_ratio` and clamped to
    /// the frame. Returns `None` when the clamped window is too small.
    pub fn square_crop(&self, pad_ratio: f64, frame_w: u32, frame_h: u32) -> Option<SquareCrop> {
        let size = self.width().max(self.height()) * (1.0 + pad_ratio);
        let cx = (self.x1 + self.x2) / 2.0;
        let cy = (self.y1 + self.y2) / 2.0;

        let mut x = cx - size / 2.0;
        let mut y = cy - size / 2.0;
        let mut s = size;

        if x < 0.0 {
            s += x;
            x = 0.0;
        }
        if y < 0.0 {
            s += y;
            y = 0.0;
        }
        s = s.min(frame_w as f64 - x).min(frame_h as f64 - y);

        if s < MIN_CROP_SIZE {
            return None;
        }

        Some(SquareCrop {
            x: x.round() as u32,
            y: y.round() as u32,
            size: s.floor() as u32,
        })
    }
}
