use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Acquires frames from a camera, a video file or a still image.
///
/// The loop only sees RGB [`Frame`]s and [`VideoMetadata`]; device and codec
/// details stay behind this trait.
pub trait VideoReader: Send {
    /// Opens the source (a file path or a capture device name) and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in acquisition order.
    ///
    /// For live sources the iterator only ends when the device stops
    /// delivering frames.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases the underlying handle. Must be safe to call more than once.
    fn close(&mut self);
}
