use std::path::Path;
use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::shared::frame::Frame;
use crate::video::domain::reader_guard::ReaderGuard;
use crate::video::domain::video_reader::VideoReader;

use super::pipeline_logger::{stage, PipelineLogger};

/// Preprocessing applied to every acquired frame before detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameOptions {
    /// Flip horizontally so a front camera reads like a mirror.
    pub mirror: bool,
    /// Resize to exactly this width × height.
    pub resize: Option<(u32, u32)>,
}

impl FrameOptions {
    pub fn apply(&self, frame: Frame) -> Result<Frame, Box<dyn std::error::Error>> {
        let frame = if self.mirror { frame.mirrored() } else { frame };
        match self.resize {
            Some((w, h)) if (w, h) != (frame.width(), frame.height()) => {
                Ok(frame.resized(w, h)?)
            }
            _ => Ok(frame),
        }
    }
}

/// When the frame loop stops besides the source running dry.
#[derive(Default)]
pub struct LoopControl {
    /// Any message, or every sender hanging up, ends the loop before the next frame.
    pub exit: Option<Receiver<()>>,
    pub max_frames: Option<usize>,
}

impl LoopControl {
    fn should_stop(&self, frames_done: usize) -> bool {
        if self.max_frames.is_some_and(|max| frames_done >= max) {
            return true;
        }
        match &self.exit {
            Some(rx) => match rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => {
                    log::info!("Exit requested after {frames_done} frames");
                    true
                }
                Err(TryRecvError::Empty) => false,
            },
            None => false,
        }
    }
}

/// Drives `on_frame` over every frame of `source`, one frame at a time.
///
/// The reader is opened here and closed on every exit path, including a
/// reader or handler error. Returns the number of frames handed to `on_frame`.
pub fn run_frames<F>(
    reader: &mut dyn VideoReader,
    source: &Path,
    control: &LoopControl,
    options: &FrameOptions,
    logger: &mut dyn PipelineLogger,
    mut on_frame: F,
) -> Result<usize, Box<dyn std::error::Error>>
where
    F: FnMut(Frame, &mut dyn PipelineLogger) -> Result<(), Box<dyn std::error::Error>>,
{
    let (mut guard, metadata) = ReaderGuard::open(reader, source)?;
    logger.info(&format!(
        "Reading {} ({}x{}{})",
        source.display(),
        metadata.width,
        metadata.height,
        if metadata.is_live() { ", live" } else { "" }
    ));

    let mut frames = guard.frames();
    let mut done = 0;

    while !control.should_stop(done) {
        let t = Instant::now();
        let Some(next) = frames.next() else {
            break;
        };
        let frame = options.apply(next?)?;
        logger.timing(stage::READ, t.elapsed().as_secs_f64() * 1000.0);

        on_frame(frame, logger)?;
        done += 1;
        logger.progress(done, metadata.total_frames);
    }

    logger.summary();
    Ok(done)
}


#[cfg(test)]
mod tests {
    use super::test_support::{closed, StubReader};
    use super::*;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;

    fn run(
        reader: &mut StubReader,
        control: &LoopControl,
        options: &FrameOptions,
        seen: &mut Vec<Frame>,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        run_frames(
            reader,
            Path::new("cam"),
            control,
            options,
            &mut NullPipelineLogger,
            |frame, _| {
                seen.push(frame);
                Ok(())
            },
        )
    }

    #[test]
    fn test_runs_until_source_ends() {
        let mut reader = StubReader::new(3);
        let flag = reader.is_closed();
        let mut seen = Vec::new();
        let n = run(
            &mut reader,
            &LoopControl::default(),
            &FrameOptions::default(),
            &mut seen,
        )
        .unwrap();
        assert_eq!(n, 3);
        assert_eq!(seen.iter().map(|f| f.index()).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(closed(&flag));
    }

    #[test]
    fn test_max_frames_stops_early() {
        let mut reader = StubReader::new(10);
        let control = LoopControl {
            max_frames: Some(4),
            ..LoopControl::default()
        };
        let mut seen = Vec::new();
        assert_eq!(run(&mut reader, &control, &FrameOptions::default(), &mut seen).unwrap(), 4);
    }

    #[test]
    fn test_exit_message_stops_before_next_frame() {
        let mut reader = StubReader::new(10);
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(()).unwrap();
        let control = LoopControl {
            exit: Some(rx),
            max_frames: None,
        };
        let mut seen = Vec::new();
        assert_eq!(run(&mut reader, &control, &FrameOptions::default(), &mut seen).unwrap(), 0);
        drop(tx);
    }

    #[test]
    fn test_disconnected_exit_channel_stops() {
        let mut reader = StubReader::new(10);
        let (tx, rx) = crossbeam_channel::unbounded::<()>();
        drop(tx);
        let control = LoopControl {
            exit: Some(rx),
            max_frames: None,
        };
        let mut seen = Vec::new();
        assert_eq!(run(&mut reader, &control, &FrameOptions::default(), &mut seen).unwrap(), 0);
    }

    #[test]
    fn test_open_exit_channel_keeps_running() {
        let mut reader = StubReader::new(5);
        let (_tx, rx) = crossbeam_channel::unbounded::<()>();
        let control = LoopControl {
            exit: Some(rx),
            max_frames: None,
        };
        let mut seen = Vec::new();
        assert_eq!(run(&mut reader, &control, &FrameOptions::default(), &mut seen).unwrap(), 5);
    }

    #[test]
    fn test_reader_error_is_fatal_and_closes_source() {
        let mut reader = StubReader::new(5);
        reader.fail_at = Some(2);
        let flag = reader.is_closed();
        let mut seen = Vec::new();
        let err = run(&mut reader, &LoopControl::default(), &FrameOptions::default(), &mut seen)
            .unwrap_err();
        assert!(err.to_string().contains("unplugged"));
        assert_eq!(seen.len(), 2);
        assert!(closed(&flag));
    }

    #[test]
    fn test_handler_error_closes_source() {
        let mut reader = StubReader::new(5);
        let flag = reader.is_closed();
        let result = run_frames(
            &mut reader,
            Path::new("cam"),
            &LoopControl::default(),
            &FrameOptions::default(),
            &mut NullPipelineLogger,
            |_, _| Err("preview disk full".into()),
        );
        assert!(result.is_err());
        assert!(closed(&flag));
    }

    #[test]
    fn test_options_mirror_and_resize() {
        let mut data = vec![0u8; 6];
        data[0] = 255;
        let frame = Frame::new(data, 2, 1, 3, 0);

        let mirrored = FrameOptions {
            mirror: true,
            resize: None,
        }
        .apply(frame.clone())
        .unwrap();
        assert_eq!(mirrored.data()[3], 255);

        let resized = FrameOptions {
            mirror: false,
            resize: Some((8, 6)),
        }
        .apply(frame)
        .unwrap();
        assert_eq!((resized.width(), resized.height()), (8, 6));
    }

    #[test]
    fn test_resize_to_zero_is_an_error() {
        let options = FrameOptions {
            mirror: false,
            resize: Some((0, 6)),
        };
        assert!(options.apply(Frame::black(4, 4, 0)).is_err());
    }
}
