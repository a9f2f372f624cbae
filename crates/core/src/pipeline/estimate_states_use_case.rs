use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::annotation::domain::annotation_renderer::AnnotationRenderer;
use crate::detection::domain::landmark_provider::LandmarkProvider;
use crate::estimation::domain::facial_state_estimator::{FacialState, FacialStateEstimator};
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

use super::frame_loop::{run_frames, FrameOptions, LoopControl};
use super::pipeline_logger::{stage, NullPipelineLogger, PipelineLogger, FACES_PER_FRAME};

/// Receives `(frame_index, face_index, state)` for every classified face.
pub type StateObserver = Box<dyn FnMut(usize, usize, &FacialState) + Send>;

/// Counters for one run of the estimation loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: usize,
    pub faces_classified: usize,
    /// Faces whose landmark set was too short for the region tables.
    pub faces_skipped: usize,
    /// Frames on which the landmark provider failed.
    pub detection_failures: usize,
}

/// Runs acquire → detect → estimate → render → present over a frame source,
/// strictly one frame at a time.
///
/// Per-frame failures are contained: a provider error leaves the frame
/// without faces, and a short landmark set skips only that face. Only a
/// failing source or presenter ends the run with an error.
pub struct EstimateStatesUseCase {
    reader: Box<dyn VideoReader>,
    stages: Stages,
    control: LoopControl,
    options: FrameOptions,
    logger: Box<dyn PipelineLogger>,
}

struct Stages {
    provider: Box<dyn LandmarkProvider>,
    estimator: FacialStateEstimator,
    renderer: Option<Box<dyn AnnotationRenderer>>,
    preview: Option<(Box<dyn ImageWriter>, PathBuf)>,
    observer: Option<StateObserver>,
}

impl EstimateStatesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        provider: Box<dyn LandmarkProvider>,
        estimator: FacialStateEstimator,
    ) -> Self {
        Self {
            reader,
            stages: Stages {
                provider,
                estimator,
                renderer: None,
                preview: None,
                observer: None,
            },
            control: LoopControl::default(),
            options: FrameOptions::default(),
            logger: Box::new(NullPipelineLogger),
        }
    }

    /// Draws landmarks onto each frame before it is presented.
    pub fn with_renderer(mut self, renderer: Box<dyn AnnotationRenderer>) -> Self {
        self.stages.renderer = Some(renderer);
        self
    }

    /// Presents each frame by rewriting the image at `path`.
    pub fn with_preview(mut self, writer: Box<dyn ImageWriter>, path: PathBuf) -> Self {
        self.stages.preview = Some((writer, path));
        self
    }

    pub fn with_observer(mut self, observer: StateObserver) -> Self {
        self.stages.observer = Some(observer);
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

    pub fn execute(&mut self, source: &Path) -> Result<LoopSummary, Box<dyn std::error::Error>> {
        let mut summary = LoopSummary::default();
        let stages = &mut self.stages;

        let frames = run_frames(
            self.reader.as_mut(),
            source,
            &self.control,
            &self.options,
            self.logger.as_mut(),
            |frame, logger| stages.process(frame, logger, &mut summary),
        )?;
        summary.frames = frames;

        log::info!(
            "Estimated {} faces over {} frames ({} skipped, {} detection failures)",
            summary.faces_classified,
            summary.frames,
            summary.faces_skipped,
            summary.detection_failures
        );
        Ok(summary)
    }
}

impl Stages {
    fn process(
        &mut self,
        frame: Frame,
        logger: &mut dyn PipelineLogger,
        summary: &mut LoopSummary,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let index = frame.index();

        let t = Instant::now();
        let faces = match self.provider.detect(&frame) {
            Ok(faces) => faces,
            Err(e) => {
                log::warn!("Landmark detection failed on frame {index}: {e}");
                summary.detection_failures += 1;
                Vec::new()
            }
        };
        logger.timing(stage::DETECT, ms_since(t));
        logger.metric(FACES_PER_FRAME, faces.len() as f64);

        let t = Instant::now();
        for (face_index, face) in faces.iter().enumerate() {
            match self.estimator.estimate(face) {
                Ok(state) => {
                    summary.faces_classified += 1;
                    if let Some(observer) = self.observer.as_mut() {
                        observer(index, face_index, &state);
                    }
                }
                Err(e) => {
                    log::warn!("Skipping face {face_index} on frame {index}: {e}");
                    summary.faces_skipped += 1;
                }
            }
        }
        logger.timing(stage::ESTIMATE, ms_since(t));

        let t = Instant::now();
        let canvas = match &self.renderer {
            Some(renderer) => {
                let mut canvas = renderer.canvas_for(frame);
                for face in &faces {
                    renderer.draw_landmarks(&mut canvas, face);
                }
                canvas
            }
            None => frame,
        };
        logger.timing(stage::RENDER, ms_since(t));

        if let Some((writer, path)) = &self.preview {
            let t = Instant::now();
            writer.write(path, &canvas, None)?;
            logger.timing(stage::PRESENT, ms_since(t));
        }

        Ok(())
    }
}

fn ms_since(t: Instant) -> f64 {
    t.elapsed().as_secs_f64() * 1000.0
}
