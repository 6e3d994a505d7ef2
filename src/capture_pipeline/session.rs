//! Capture session module
//!
//! Ties a sequencer run to per-frame normalization and storage.

mod capture_session;

#[cfg(test)]
mod tests;

pub use capture_session::{CaptureSession, SessionStats};
