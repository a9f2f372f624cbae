pub mod cpu_annotation_renderer;
pub mod face_mesh_connections;
