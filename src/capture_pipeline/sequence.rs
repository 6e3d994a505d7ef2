//! Capture sequencing module
//!
//! Turns the asynchronous "apply illumination" and "capture photo" services
//! into a strictly ordered multi-shot run driven from one dedicated thread.

mod signal;
mod types;
mod pending;
mod capture;
mod sequencer;


pub use signal::{CompletionSignal, Notifier, Signal};
pub use types::{
    AutoIlluminationMode, CaptureSequence, PatternOutcome, PatternStatus, SequenceReport,
    SequencerConfig, SequencerConfigBuilder,
};
pub use pending::{PendingCapture, PendingCaptures, RequestId};
pub use capture::{CaptureCallbacks, CaptureRequest, CaptureService, CaptureSettings, DeliveredCapture};
pub use sequencer::{CaptureSequencer, SequenceHandle};
