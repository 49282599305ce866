use thiserror::Error;

/// Failures raised by the adapters around the tracking core.
///
/// Missing data (no valid pixels, no detections) is never an error; it is
/// carried as `None` or an empty table.
#[derive(Debug, Error)]
pub enum ThermalError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("frame size mismatch: expected {expected} pixels, got {actual}")]
    FrameSize { expected: usize, actual: usize },

    #[error("detector failed: {0}")]
    Detector(String),

    #[error("visualization failed: {0}")]
    Visualization(String),
}

pub type Result<T> = std::result::Result<T, ThermalError>;
