use std::fmt;
use std::str::FromStr;

pub type Rgb = [u8; 3];

pub const RED: Rgb = [255, 48, 48];
pub const GREEN: Rgb = [48, 255, 48];
pub const WHITE: Rgb = [224, 224, 224];
pub const KEYPOINT_RED: Rgb = [255, 0, 0];

/// Stroke style for one overlay feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawingSpec {
    pub color: Rgb,
    pub thickness: u32,
    pub circle_radius: u32,
}

impl DrawingSpec {
    pub const fn new(color: Rgb, thickness: u32, circle_radius: u32) -> Self {
        Self {
            color,
            thickness,
            circle_radius,
        }
    }
}

impl Default for DrawingSpec {
    fn default() -> Self {
        Self::new(WHITE, 2, 2)
    }
}

/// One group of overlay strokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlayLayer {
    /// Every landmark as a dot. The tesselation edge set is not drawn.
    Mesh,
    /// Lips, eyes, eyebrows and face oval.
    Contours,
    /// Iris rings; only drawn for sets carrying refined iris points.
    Irises,
}

impl OverlayLayer {
    pub const ALL: &[OverlayLayer] = &[
        OverlayLayer::Mesh,
        OverlayLayer::Contours,
        OverlayLayer::Irises,
    ];
}

impl fmt::Display for OverlayLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayLayer::Mesh => write!(f, "mesh"),
            OverlayLayer::Contours => write!(f, "contours"),
            OverlayLayer::Irises => write!(f, "irises"),
        }
    }
}

impl FromStr for OverlayLayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mesh" => Ok(OverlayLayer::Mesh),
            "contours" => Ok(OverlayLayer::Contours),
            "irises" => Ok(OverlayLayer::Irises),
            other => Err(format!(
                "unknown overlay layer '{other}', expected one of: mesh, contours, irises"
            )),
        }
    }
}

/// What the overlay is drawn onto.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Canvas {
    /// The camera frame itself.
    #[default]
    Frame,
    /// A black image of the frame's size, showing the overlay alone.
    Black,
}

/// Full overlay configuration for a renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationStyle {
    pub layers: Vec<OverlayLayer>,
    /// Overrides the per-feature default colors when set.
    pub landmark_spec: Option<DrawingSpec>,
    pub canvas: Canvas,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            layers: OverlayLayer::ALL.to_vec(),
            landmark_spec: None,
            canvas: Canvas::Frame,
        }
    }
}
