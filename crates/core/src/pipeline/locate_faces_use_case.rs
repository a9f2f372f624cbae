use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::annotation::domain::annotation_renderer::AnnotationRenderer;
use crate::detection::domain::face_box::FaceBox;
use crate::detection::domain::face_locator::FaceLocator;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

use super::frame_loop::{run_frames, FrameOptions, LoopControl};
use super::pipeline_logger::{stage, NullPipelineLogger, PipelineLogger, FACES_PER_FRAME};

/// Receives `(frame_index, boxes)` for every frame.
pub type BoxObserver = Box<dyn FnMut(usize, &[FaceBox]) + Send>;

/// Face-box demo loop: locate faces, draw boxes and keypoints, present.
pub struct LocateFacesUseCase {
    reader: Box<dyn VideoReader>,
    locator: Box<dyn FaceLocator>,
    renderer: Box<dyn AnnotationRenderer>,
    preview: Option<(Box<dyn ImageWriter>, PathBuf)>,
    observer: Option<BoxObserver>,
    control: LoopControl,
    options: FrameOptions,
    logger: Box<dyn PipelineLogger>,
}

impl LocateFacesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        locator: Box<dyn FaceLocator>,
        renderer: Box<dyn AnnotationRenderer>,
    ) -> Self {
        Self {
            reader,
            locator,
            renderer,
            preview: None,
            observer: None,
            control: LoopControl::default(),
            options: FrameOptions::default(),
            logger: Box::new(NullPipelineLogger),
        }
    }

    pub fn with_preview(mut self, writer: Box<dyn ImageWriter>, path: PathBuf) -> Self {
        self.preview = Some((writer, path));
        self
    }

    pub fn with_observer(mut self, observer: BoxObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_control(mut self, control: LoopControl) -> Self {
        self.control = control;
        self
    }

    pub fn with_options(mut self, options: FrameOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Returns the number of frames processed.
    pub fn execute(&mut self, source: &Path) -> Result<usize, Box<dyn std::error::Error>> {
        let locator = &mut self.locator;
        let renderer = &self.renderer;
        let preview = &self.preview;
        let observer = &mut self.observer;

        run_frames(
            self.reader.as_mut(),
            source,
            &self.control,
            &self.options,
            self.logger.as_mut(),
            |frame, logger| {
                let index = frame.index();
                let t = Instant::now();
                let boxes = locator.locate(&frame).unwrap_or_else(|e| {
                    log::warn!("Face detection failed on frame {index}: {e}");
                    Vec::new()
                });
                logger.timing(stage::DETECT, t.elapsed().as_secs_f64() * 1000.0);
                logger.metric(FACES_PER_FRAME, boxes.len() as f64);

                if let Some(observer) = observer.as_mut() {
                    observer(index, &boxes);
                }

                let t = Instant::now();
                let mut canvas = renderer.canvas_for(frame);
                for face in &boxes {
                    renderer.draw_face_box(&mut canvas, face);
                }
                logger.timing(stage::RENDER, t.elapsed().as_secs_f64() * 1000.0);

                if let Some((writer, path)) = preview {
                    let t = Instant::now();
                    writer.write(path, &canvas, None)?;
                    logger.timing(stage::PRESENT, t.elapsed().as_secs_f64() * 1000.0);
                }
                Ok(())
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::infrastructure::cpu_annotation_renderer::CpuAnnotationRenderer;
    use crate::pipeline::frame_loop::test_support::StubReader;
    use crate::shared::frame::Frame;
    use std::sync::{Arc, Mutex};

    struct FixedLocator {
        fail_on: Option<usize>,
    }

    impl FaceLocator for FixedLocator {
        fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
            if Some(frame.index()) == self.fail_on {
                return Err("session crashed".into());
            }
            Ok(vec![FaceBox {
                x1: 0.0,
                y1: 0.0,
                x2: 3.0,
                y2: 3.0,
                confidence: 0.9,
                keypoints: Vec::new(),
            }])
        }
    }

    #[test]
    fn test_reports_boxes_per_frame_and_survives_failures() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut uc = LocateFacesUseCase::new(
            Box::new(StubReader::new(3)),
            Box::new(FixedLocator { fail_on: Some(1) }),
            Box::new(CpuAnnotationRenderer::default()),
        )
        .with_observer(Box::new(move |index, boxes: &[FaceBox]| {
            sink.lock().unwrap().push((index, boxes.len()));
        }));

        assert_eq!(uc.execute(Path::new("cam")).unwrap(), 3);
        assert_eq!(*seen.lock().unwrap(), vec![(0, 1), (1, 0), (2, 1)]);
    }

    #[test]
    fn test_preview_gets_drawn_boxes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boxes.png");
        let mut uc = LocateFacesUseCase::new(
            Box::new(StubReader::new(1)),
            Box::new(FixedLocator { fail_on: None }),
            Box::new(CpuAnnotationRenderer::default()),
        )
        .with_preview(
            Box::new(crate::video::infrastructure::image_file_writer::ImageFileWriter::new()),
            path.clone(),
        );
        uc.execute(Path::new("cam")).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_ne!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0]);
    }
}
