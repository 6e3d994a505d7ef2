use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::capture_pipeline::illumination::IlluminationPattern;

/// The point in a pattern's cycle at which the sequencer was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStage {
    IlluminationApplied,
    PhotoTaken,
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitStage::IlluminationApplied => f.write_str("illumination applied"),
            WaitStage::PhotoTaken => f.write_str("photo taken"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Invalid buffer dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Row stride of {bytes_per_row} bytes is smaller than one row ({min} bytes)")]
    StrideTooSmall { bytes_per_row: usize, min: usize },

    #[error("Row stride of {bytes_per_row} bytes is not a multiple of the {sample_size}-byte sample size")]
    MisalignedStride { bytes_per_row: usize, sample_size: usize },

    #[error("Buffer holds {len} bytes but {required} are required")]
    BufferTooSmall { len: usize, required: usize },

    #[error("Unknown illumination pattern id: {0}")]
    UnknownPattern(i32),

    #[error("Invalid capture sequence: {0}")]
    InvalidSequence(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("A capture sequence is already running")]
    SequenceInProgress,

    #[error("Timed out after {waited:?} waiting for {stage} signal at pattern {pattern}")]
    SignalTimeout {
        stage: WaitStage,
        pattern: IlluminationPattern,
        waited: Duration,
    },

    #[error("Illumination change failed: {0}")]
    IlluminationFailed(String),

    #[error("Photo capture failed: {0}")]
    CaptureFailed(String),

    #[error("Failed to encode depth frame: {0}")]
    EncodeError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
