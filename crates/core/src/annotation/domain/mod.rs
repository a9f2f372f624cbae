pub mod annotation_renderer;
pub mod drawing_spec;
