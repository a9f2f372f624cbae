use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::shared::video_metadata::VideoMetadata;

use super::video_reader::VideoReader;

/// Keeps a [`VideoReader`] open for the guard's lifetime and closes it on drop,
/// so the capture device is released on every exit path.
pub struct ReaderGuard<'a> {
    reader: &'a mut dyn VideoReader,
}

impl<'a> ReaderGuard<'a> {
    /// Opens `source` on `reader`. On failure the reader is closed before returning.
    pub fn open(
        reader: &'a mut dyn VideoReader,
        source: &Path,
    ) -> Result<(Self, VideoMetadata), Box<dyn std::error::Error>> {
        match reader.open(source) {
            Ok(metadata) => Ok((Self { reader }, metadata)),
            Err(e) => {
                reader.close();
                Err(e)
            }
        }
    }
}

impl<'a> Deref for ReaderGuard<'a> {
    type Target = dyn VideoReader + 'a;

    fn deref(&self) -> &Self::Target {
        self.reader
    }
}

impl DerefMut for ReaderGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.reader
    }
}

impl Drop for ReaderGuard<'_> {
    fn drop(&mut self) {
        log::debug!("Closing frame source");
        self.reader.close();
    }
}
