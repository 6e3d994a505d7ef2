//! Photometric capture pipeline module
//!
//! Sequences display illumination patterns against bracketed depth captures,
//! then normalizes and stores the depth frames the camera delivers.

pub mod common;
pub mod illumination;
pub mod sequence;
pub mod depth;
pub mod persistence;
pub mod session;
pub mod simulated;

pub use common::{
    CaptureError,
    Result,
    WaitStage,
};

pub use illumination::{
    IlluminationPattern,
    IlluminationLayout,
    IlluminationService,
    ScreenSize,
};

pub use sequence::{
    AutoIlluminationMode,
    CaptureSequence,
    CaptureSequencer,
    CaptureService,
    SequencerConfig,
    SequenceReport,
};

pub use depth::{
    CoverageMask,
    DepthNormalizer,
    NormalizerConfig,
    RawDepthFrame,
};

pub use persistence::{
    DepthFrameStore,
    TiffCompression,
    TiffDepthStore,
    TiffStoreConfig,
};

pub use session::{
    CaptureSession,
    SessionStats,
};
