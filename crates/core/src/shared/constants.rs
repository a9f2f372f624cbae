pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// MediaPipe short-range face detector exported to ONNX. Not downloadable;
/// must be placed in the model cache or passed by path.
pub const BLAZEFACE_MODEL_NAME: &str = "face_detection_short_range.onnx";

/// MediaPipe face-mesh landmark model exported to ONNX (468 or 478 points).
/// Not downloadable; must be placed in the model cache or passed by path.
pub const FACE_MESH_MODEL_NAME: &str = "face_landmark.onnx";

/// Application directory name under the platform cache directory.
pub const APP_DIR_NAME: &str = "FaceState";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Width × height the "black cover" demo normalises camera frames to.
pub const COVER_FRAME_SIZE: (u32, u32) = (800, 600);
