mod config;
mod exit_signal;

use std::io::{BufReader, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};

use facestate_core::annotation::domain::drawing_spec::{AnnotationStyle, Canvas, OverlayLayer};
use facestate_core::annotation::infrastructure::cpu_annotation_renderer::CpuAnnotationRenderer;
use facestate_core::detection::domain::face_box::FaceBox;
use facestate_core::detection::domain::face_locator::FaceLocator;
use facestate_core::detection::infrastructure::onnx_blazeface_locator::OnnxBlazefaceLocator;
use facestate_core::detection::infrastructure::onnx_face_mesh_provider::{
    OnnxFaceMeshProvider, DEFAULT_MAX_FACES,
};
use facestate_core::detection::infrastructure::onnx_yolo_locator::OnnxYoloLocator;
use facestate_core::estimation::domain::facial_state_estimator::{
    FacialState, FacialStateEstimator,
};
use facestate_core::estimation::domain::state_classifier::StateThresholds;
use facestate_core::pipeline::estimate_states_use_case::EstimateStatesUseCase;
use facestate_core::pipeline::frame_loop::{FrameOptions, LoopControl};
use facestate_core::pipeline::locate_faces_use_case::LocateFacesUseCase;
use facestate_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facestate_core::shared::constants::{
    BLAZEFACE_MODEL_NAME, COVER_FRAME_SIZE, FACE_MESH_MODEL_NAME, IMAGE_EXTENSIONS,
    YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use facestate_core::shared::model_resolver;
use facestate_core::video::domain::video_reader::VideoReader;
use facestate_core::video::infrastructure::ffmpeg_reader::{
    default_camera_format, is_camera_source, FfmpegReader,
};
use facestate_core::video::infrastructure::image_file_reader::{is_image_path, ImageFileReader};
use facestate_core::video::infrastructure::image_file_writer::ImageFileWriter;

use config::{ThresholdFile, ThresholdFlags};

#[cfg(target_os = "linux")]
const DEFAULT_SOURCE: &str = "/dev/video0";
#[cfg(not(target_os = "linux"))]
const DEFAULT_SOURCE: &str = "0";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Demo {
    /// Face boxes with keypoints.
    Detect,
    /// Face-mesh overlay only.
    Mesh,
    /// Face-mesh overlay plus eye and mouth states.
    States,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Detector {
    Yolo,
    Blazeface,
}

/// Live face landmarks and eye/mouth open-closed states from a camera,
/// video or image.
#[derive(Parser)]
#[command(name = "facestate")]
struct Cli {
    /// Camera device (e.g. /dev/video0 or 0), video file, or image file.
    #[arg(long, default_value = DEFAULT_SOURCE)]
    source: PathBuf,

    /// Capture input format for cameras: v4l2, avfoundation or dshow.
    #[arg(long)]
    camera_format: Option<String>,

    /// Capture size requested from the camera as WIDTHxHEIGHT (e.g. 640x480).
    #[arg(long, value_parser = parse_size)]
    camera_size: Option<(u32, u32)>,

    /// Which demo to run.
    #[arg(long, value_enum, default_value_t = Demo::States)]
    demo: Demo,

    /// Left eye counts as closed below this mean lid separation.
    #[arg(long)]
    left_eye_threshold: Option<f64>,

    /// Right eye counts as closed below this mean lid separation.
    #[arg(long)]
    right_eye_threshold: Option<f64>,

    /// Mouth counts as open above this mean lip separation.
    #[arg(long)]
    mouth_threshold: Option<f64>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Maximum faces passed to the mesh model per frame.
    #[arg(long, default_value_t = DEFAULT_MAX_FACES)]
    max_faces: usize,

    /// Face detector used to locate faces.
    #[arg(long, value_enum, default_value_t = Detector::Yolo)]
    detector: Detector,

    /// Face detector model path (defaults to the model cache).
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Face-mesh landmark model path (defaults to the model cache).
    #[arg(long)]
    mesh_model: Option<PathBuf>,

    /// Overlay layers (comma-separated): mesh, contours, irises.
    #[arg(long, value_delimiter = ',', default_value = "mesh,contours,irises")]
    overlay: Vec<OverlayLayer>,

    /// Draw onto the camera frame or onto a black canvas.
    #[arg(long, default_value = "frame", value_parser = parse_canvas)]
    canvas: Canvas,

    /// Flip frames horizontally.
    #[arg(long)]
    mirror: bool,

    /// Resize frames to WIDTHxHEIGHT before detection.
    #[arg(long, value_parser = parse_size)]
    resize: Option<(u32, u32)>,

    /// Image file refreshed with the annotated frame after every frame.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// JSON file with threshold overrides.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let reader = open_reader(&cli);
    let control = LoopControl {
        exit: stop_signal(),
        max_frames: cli.max_frames,
    };
    let options = FrameOptions {
        mirror: cli.mirror,
        resize: cli.resize.or(match cli.canvas {
            Canvas::Black => Some(COVER_FRAME_SIZE),
            Canvas::Frame => None,
        }),
    };
    let renderer = Box::new(CpuAnnotationRenderer::new(AnnotationStyle {
        layers: cli.overlay.clone(),
        landmark_spec: None,
        canvas: cli.canvas,
    }));

    match cli.demo {
        Demo::Detect => {
            let mut use_case = LocateFacesUseCase::new(reader, build_locator(&cli)?, renderer)
                .with_control(control)
                .with_options(options)
                .with_logger(Box::new(StdoutPipelineLogger::default()))
                .with_observer(Box::new(|index, boxes: &[FaceBox]| {
                    println!("frame {index}: {} face(s)", boxes.len());
                }));
            if let Some(path) = cli.preview.clone() {
                use_case = use_case.with_preview(Box::new(ImageFileWriter::new()), path);
            }
            let frames = use_case.execute(&cli.source)?;
            log::info!("Processed {frames} frames");
        }
        Demo::Mesh | Demo::States => {
            let estimator = FacialStateEstimator::face_mesh(thresholds(&cli)?)?;
            let provider = Box::new(
                OnnxFaceMeshProvider::new(
                    &resolve_model(cli.mesh_model.as_deref(), FACE_MESH_MODEL_NAME, None)?,
                    build_locator(&cli)?,
                    cli.max_faces,
                )?,
            );
            let mut use_case = EstimateStatesUseCase::new(reader, provider, estimator)
                .with_renderer(renderer)
                .with_control(control)
                .with_options(options)
                .with_logger(Box::new(StdoutPipelineLogger::default()));
            if cli.demo == Demo::States {
                use_case = use_case.with_observer(Box::new(print_state));
            }
            if let Some(path) = cli.preview.clone() {
                use_case = use_case.with_preview(Box::new(ImageFileWriter::new()), path);
            }
            use_case.execute(&cli.source)?;
        }
    }

    Ok(())
}

fn print_state(frame: usize, face: usize, state: &FacialState) {
    println!(
        "frame {frame} face {face}: left eye {}, right eye {}, mouth {}",
        state.left_eye, state.right_eye, state.mouth
    );
}

fn thresholds(cli: &Cli) -> Result<StateThresholds, Box<dyn std::error::Error>> {
    let file = match &cli.config {
        Some(path) => ThresholdFile::load(path)?,
        None => ThresholdFile::load_default()?,
    };
    Ok(file.resolve(ThresholdFlags {
        left_eye: cli.left_eye_threshold,
        right_eye: cli.right_eye_threshold,
        mouth: cli.mouth_threshold,
    }))
}

/// Ctrl-C, and `q` or end of input on a terminal, all stop the loop between
/// frames. `None` when neither source could be armed.
fn stop_signal() -> Option<crossbeam_channel::Receiver<()>> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let mut armed = match exit_signal::install_interrupt_handler(tx.clone()) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Ctrl-C handler unavailable: {e}");
            false
        }
    };
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!("Type q then Enter to stop.");
        armed |= exit_signal::spawn_exit_watcher(BufReader::new(stdin), tx);
    }
    armed.then_some(rx)
}

fn camera_input_format(cli: &Cli) -> Option<String> {
    match (&cli.camera_format, is_camera_source(&cli.source)) {
        (Some(format), _) => Some(format.clone()),
        (None, true) => Some(default_camera_format().to_string()),
        (None, false) => None,
    }
}

fn open_reader(cli: &Cli) -> Box<dyn VideoReader> {
    if is_image_path(&cli.source) {
        return Box::new(ImageFileReader::new());
    }
    let Some(format) = camera_input_format(cli) else {
        return Box::new(FfmpegReader::new());
    };
    let mut reader = FfmpegReader::new().with_input_format(format);
    if let Some((width, height)) = cli.camera_size {
        reader = reader.with_option("video_size", format!("{width}x{height}"));
    }
    Box::new(reader)
}

fn build_locator(cli: &Cli) -> Result<Box<dyn FaceLocator>, Box<dyn std::error::Error>> {
    let model = cli.detector_model.as_deref();
    match cli.detector {
        Detector::Yolo => {
            let path = resolve_model(model, YOLO_MODEL_NAME, Some(YOLO_MODEL_URL))?;
            Ok(Box::new(OnnxYoloLocator::new(&path, cli.confidence)?))
        }
        Detector::Blazeface => {
            let path = resolve_model(model, BLAZEFACE_MODEL_NAME, None)?;
            Ok(Box::new(OnnxBlazefaceLocator::new(&path, cli.confidence)?))
        }
    }
}

fn resolve_model(
    explicit: Option<&Path>,
    name: &str,
    url: Option<&str>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    log::info!("Resolving model: {name}");
    let path = model_resolver::resolve(name, url, None, Some(Box::new(download_progress)))?;
    Ok(path)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let camera = camera_input_format(cli).is_some();
    if !camera && !cli.source.exists() {
        return Err(format!("Source not found: {}", cli.source.display()).into());
    }
    if !camera && cli.camera_size.is_some() {
        return Err("--camera-size only applies to camera sources".into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.max_faces == 0 {
        return Err("--max-faces must be at least 1".into());
    }
    if cli.max_frames == Some(0) {
        return Err("--max-frames must be at least 1".into());
    }
    for (name, path) in [
        ("--detector-model", &cli.detector_model),
        ("--mesh-model", &cli.mesh_model),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                return Err(format!("{name} not found: {}", path.display()).into());
            }
        }
    }
    if let Some(preview) = &cli.preview {
        let supported = preview
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()));
        if !supported {
            return Err(format!(
                "Preview must be an image file ({}), got {}",
                IMAGE_EXTENSIONS.join(", "),
                preview.display()
            )
            .into());
        }
    }
    Ok(())
}

fn parse_canvas(s: &str) -> Result<Canvas, String> {
    match s.to_ascii_lowercase().as_str() {
        "frame" => Ok(Canvas::Frame),
        "black" => Ok(Canvas::Black),
        other => Err(format!("unknown canvas '{other}', expected frame or black")),
    }
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(|c| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |v: &str| -> Result<u32, String> {
        match v.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("invalid dimension '{v}' in '{s}'")),
        }
    };
    Ok((parse(w)?, parse(h)?))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
