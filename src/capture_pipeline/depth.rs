//! Depth map normalization module
//!
//! Raw half-float depth frames, their coverage masks, the coordinate mapping
//! between the two, and the in-place min/max normalizer.

pub mod types;
mod mapping;
mod normalizer;

#[cfg(test)]
mod tests;

pub use types::{CoverageMask, RawDepthFrame};
pub use mapping::{MaskMapping, MaskOrientation};
pub use normalizer::{
    DepthNormalizer, FLAT_RANGE_VALUE, NormalizationStats, NormalizerConfig,
    NormalizerConfigBuilder,
};
