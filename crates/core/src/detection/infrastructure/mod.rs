pub mod execution_provider;
pub mod onnx_blazeface_locator;
pub mod onnx_face_mesh_provider;
pub mod onnx_yolo_locator;
