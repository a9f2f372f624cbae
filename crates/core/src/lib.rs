//! Face landmark acquisition and per-frame facial-state estimation.
//!
//! The estimation core (`estimation`) is pure: it turns one face's landmark
//! set into eye-open/closed and mouth-open/closed states. Everything else in
//! this crate adapts cameras, ONNX models and image buffers around it.

pub mod annotation;
pub mod detection;
pub mod estimation;
pub mod pipeline;
pub mod shared;
pub mod video;
