use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, BresenhamLineIter,
};
use imageproc::rect::Rect;

use crate::annotation::domain::annotation_renderer::AnnotationRenderer;
use crate::annotation::domain::drawing_spec::{
    AnnotationStyle, Canvas, DrawingSpec, OverlayLayer, GREEN, KEYPOINT_RED, RED, WHITE,
};
use crate::detection::domain::face_box::FaceBox;
use crate::detection::domain::face_landmarks::{FaceLandmarkSet, FACE_MESH_WITH_IRIS};
use crate::shared::frame::Frame;

use super::face_mesh_connections::{
    Connection, FACE_OVAL, LEFT_EYE, LEFT_EYEBROW, LEFT_IRIS, LIPS, RIGHT_EYE, RIGHT_EYEBROW,
    RIGHT_IRIS,
};

/// Drawing coordinates are clamped to ±COORD_LIMIT.
const COORD_LIMIT: i64 = 1 << 20;

const MESH_SPEC: DrawingSpec = DrawingSpec::new(WHITE, 1, 1);
const BOX_SPEC: DrawingSpec = DrawingSpec::new(WHITE, 1, 0);
const KEYPOINT_SPEC: DrawingSpec = DrawingSpec::new(KEYPOINT_RED, 1, 2);

/// Contour groups with their default stroke.
const CONTOURS: &[(&[Connection], DrawingSpec)] = &[
    (LIPS, DrawingSpec::new(WHITE, 2, 0)),
    (LEFT_EYE, DrawingSpec::new(GREEN, 2, 0)),
    (LEFT_EYEBROW, DrawingSpec::new(GREEN, 2, 0)),
    (RIGHT_EYE, DrawingSpec::new(RED, 2, 0)),
    (RIGHT_EYEBROW, DrawingSpec::new(RED, 2, 0)),
    (FACE_OVAL, DrawingSpec::new(WHITE, 2, 0)),
];

const IRISES: &[(&[Connection], DrawingSpec)] = &[
    (LEFT_IRIS, DrawingSpec::new(GREEN, 2, 0)),
    (RIGHT_IRIS, DrawingSpec::new(RED, 2, 0)),
];

/// Software overlay renderer drawing with `imageproc` over the frame bytes.
/// Everything outside the canvas is clipped.
pub struct CpuAnnotationRenderer {
    style: AnnotationStyle,
}

impl CpuAnnotationRenderer {
    pub fn new(style: AnnotationStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    fn spec_or(&self, default: DrawingSpec) -> DrawingSpec {
        self.style.landmark_spec.unwrap_or(default)
    }

    fn draw_mesh(&self, img: &mut RgbImage, face: &FaceLandmarkSet) {
        let spec = self.spec_or(MESH_SPEC);
        let (w, h) = img.dimensions();
        for point in face.points() {
            dot(img, point.to_pixel(w, h), spec.circle_radius, spec.color);
        }
    }

    fn draw_connections(
        &self,
        img: &mut RgbImage,
        face: &FaceLandmarkSet,
        groups: &[(&[Connection], DrawingSpec)],
    ) {
        let (w, h) = img.dimensions();
        for &(edges, default) in groups {
            let spec = self.spec_or(default);
            for &(a, b) in edges {
                let (Ok(start), Ok(end)) = (face.point(a), face.point(b)) else {
                    continue;
                };
                stroke(img, start.to_pixel(w, h), end.to_pixel(w, h), &spec);
            }
        }
    }
}

impl Default for CpuAnnotationRenderer {
    fn default() -> Self {
        Self::new(AnnotationStyle::default())
    }
}

impl AnnotationRenderer for CpuAnnotationRenderer {
    fn canvas_for(&self, frame: Frame) -> Frame {
        match self.style.canvas {
            Canvas::Frame => frame,
            Canvas::Black => Frame::black(frame.width(), frame.height(), frame.index()),
        }
    }

    fn draw_landmarks(&self, canvas: &mut Frame, face: &FaceLandmarkSet) {
        canvas.with_rgb_image(|img| {
            for layer in &self.style.layers {
                match layer {
                    OverlayLayer::Mesh => self.draw_mesh(img, face),
                    OverlayLayer::Contours => self.draw_connections(img, face, CONTOURS),
                    OverlayLayer::Irises => {
                        if face.covers(&FACE_MESH_WITH_IRIS) {
                            self.draw_connections(img, face, IRISES);
                        }
                    }
                }
            }
        });
    }

    fn draw_face_box(&self, canvas: &mut Frame, face: &FaceBox) {
        canvas.with_rgb_image(|img| {
            let [x1, y1, x2, y2] =
                [face.x1, face.y1, face.x2, face.y2].map(|v| to_i32(v.round() as i64));
            let width = (x2 - x1 + 1).max(1) as u32;
            let height = (y2 - y1 + 1).max(1) as u32;
            let rect = Rect::at(x1, y1).of_size(width, height);
            draw_hollow_rect_mut(img, rect, Rgb(BOX_SPEC.color));
            for &(kx, ky) in &face.keypoints {
                let center = (kx.round() as i64, ky.round() as i64);
                dot(img, center, KEYPOINT_SPEC.circle_radius, KEYPOINT_SPEC.color);
            }
        });
    }
}

fn to_i32(v: i64) -> i32 {
    v.clamp(-COORD_LIMIT, COORD_LIMIT) as i32
}

/// Filled disc; radius 0 sets a single pixel.
fn dot(img: &mut RgbImage, center: (i64, i64), radius: u32, color: [u8; 3]) {
    let center = (to_i32(center.0), to_i32(center.1));
    draw_filled_circle_mut(img, center, radius.min(COORD_LIMIT as u32) as i32, Rgb(color));
}

/// Line segment; thicknesses above 2 stamp a disc at every step.
fn stroke(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), spec: &DrawingSpec) {
    let start = (to_i32(from.0) as f32, to_i32(from.1) as f32);
    let end = (to_i32(to.0) as f32, to_i32(to.1) as f32);
    let brush = spec.thickness.saturating_sub(1) / 2;
    if brush == 0 {
        draw_line_segment_mut(img, start, end, Rgb(spec.color));
        return;
    }
    for (x, y) in BresenhamLineIter::new(start, end) {
        dot(img, (x as i64, y as i64), brush, spec.color);
    }
}
