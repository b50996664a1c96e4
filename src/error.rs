use thiserror::Error;

/// Errors reported by the detection core.
///
/// None of these are fatal: the caller can drop the offending frame and
/// move on to the next one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    #[error("invalid frame format: expected 3 channels, got {channels}")]
    InvalidFrameFormat { channels: u8 },

    #[error("empty frame ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },

    #[error("frame buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("detector configuration error: {0}")]
    Configuration(String),
}

pub type DetectResult<T> = Result<T, DetectError>;
