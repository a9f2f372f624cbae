use std::path::Path;

/// Return the preferred ONNX execution providers for the current platform.
///
/// Falls back to CPU if the platform-specific provider is unavailable.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Loads an ONNX model with the platform's preferred execution providers.
pub fn load_session(
    model_path: &Path,
) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    if !model_path.exists() {
        return Err(format!("Model not found at {}", model_path.display()).into());
    }
    log::debug!("Loading ONNX model {}", model_path.display());
    let session = ort::session::Session::builder()?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// Reads the square spatial size and channel layout from a model's first
/// input. Returns `None` for dynamic or non-image shapes.
pub fn image_input_shape(session: &ort::session::Session) -> Option<(u32, bool)> {
    let input = session.inputs().first()?;
    let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() else {
        return None;
    };
    if shape.len() < 4 {
        return None;
    }
    // NCHW: [1, 3, H, W]; NHWC: [1, H, W, 3]
    if shape[1] == 3 && shape[2] > 0 {
        Some((shape[2] as u32, true))
    } else if shape[3] == 3 && shape[1] > 0 {
        Some((shape[1] as u32, false))
    } else {
        None
    }
}
