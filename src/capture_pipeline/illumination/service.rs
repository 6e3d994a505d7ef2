use crate::capture_pipeline::common::error::Result;
use crate::capture_pipeline::illumination::pattern::IlluminationPattern;
use crate::capture_pipeline::sequence::Notifier;

/// A display that can show illumination patterns.
///
/// `apply` starts the change and returns; the implementation calls
/// `applied.notify()` once the pattern is actually on screen. Returning an
/// error means the change was never started and no notification will follow.
pub trait IlluminationService: Send + Sync {
    fn apply(&self, pattern: IlluminationPattern, applied: Notifier) -> Result<()>;

    /// Restores the display after a run has completed.
    fn reset(&self) {}
}
