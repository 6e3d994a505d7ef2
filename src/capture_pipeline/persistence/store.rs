use crate::capture_pipeline::common::error::Result;
use crate::capture_pipeline::persistence::types::NormalizedFrame;

/// Destination for normalized depth frames.
///
/// Called from the session's frame worker, never from the sequencing thread,
/// so a slow store does not hold up captures.
pub trait DepthFrameStore: Send + Sync {
    fn store(&self, frame: &NormalizedFrame) -> Result<()>;
}
