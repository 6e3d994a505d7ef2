//! Common utilities module
//!
//! This module contains the error type shared across the capture pipeline.

pub mod error;

pub use error::{CaptureError, Result, WaitStage};
