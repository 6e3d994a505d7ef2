use half::f16;
use tracing::{debug, instrument};

use crate::capture_pipeline::common::error::Result;
use crate::capture_pipeline::depth::mapping::{MaskMapping, MaskOrientation};
use crate::capture_pipeline::depth::types::{CoverageMask, RawDepthFrame};

/// Output for covered pixels when every covered sample has the same depth.
pub const FLAT_RANGE_VALUE: f32 = 0.0;

/// Configuration for [`DepthNormalizer`]
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Mask samples strictly above this value mark a pixel as covered
    pub coverage_threshold: u8,
    /// Orientation of the mask relative to the depth frame
    pub orientation: MaskOrientation,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            coverage_threshold: 100,
            orientation: MaskOrientation::Aligned,
        }
    }
}

impl NormalizerConfig {
    pub fn builder() -> NormalizerConfigBuilder {
        NormalizerConfigBuilder::default()
    }
}

/// Builder for NormalizerConfig
#[derive(Default)]
pub struct NormalizerConfigBuilder {
    coverage_threshold: Option<u8>,
    orientation: Option<MaskOrientation>,
}

impl NormalizerConfigBuilder {
    pub fn coverage_threshold(mut self, threshold: u8) -> Self {
        self.coverage_threshold = Some(threshold);
        self
    }

    pub fn orientation(mut self, orientation: MaskOrientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn build(self) -> NormalizerConfig {
        let default = NormalizerConfig::default();
        NormalizerConfig {
            coverage_threshold: self.coverage_threshold.unwrap_or(default.coverage_threshold),
            orientation: self.orientation.unwrap_or(default.orientation),
        }
    }
}

/// Range information from one normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationStats {
    /// Number of pixels that were covered and finite
    pub covered: usize,
    /// Minimum used for rescaling (0 when nothing was covered)
    pub min: f32,
    /// Maximum used for rescaling (1 when nothing was covered)
    pub max: f32,
}

/// Rescales covered depth samples to `[0, 1]` and zeroes everything else.
#[derive(Debug, Clone, Default)]
pub struct DepthNormalizer {
    config: NormalizerConfig,
}

impl DepthNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalizes `depth` in place against `mask`.
    ///
    /// Both buffers are validated before anything is written, so on error
    /// the frame is untouched. A pixel is covered when its mask sample is
    /// above the threshold and its depth is finite. Covered pixels become
    /// `(v - min) / (max - min)`, or [`FLAT_RANGE_VALUE`] when `max == min`;
    /// all other pixels become 0.
    #[instrument(skip_all, fields(width = depth.width, height = depth.height))]
    pub fn normalize(&self, depth: &mut RawDepthFrame, mask: &CoverageMask) -> Result<NormalizationStats> {
        depth.validate()?;
        mask.validate()?;

        let mapping = MaskMapping::new(depth, mask, self.config.orientation);
        let threshold = self.config.coverage_threshold;
        let (width, height, stride) = (depth.width, depth.height, depth.stride());
        let is_covered = |x: usize, y: usize, value: f32| {
            value.is_finite() && mask.data[mapping.mask_index(x, y)] > threshold
        };

        let mut covered = 0usize;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        {
            let _span = tracing::debug_span!("range_discovery").entered();
            for y in 0..height {
                let row = &depth.data[y * stride..y * stride + width];
                for (x, sample) in row.iter().enumerate() {
                    let value = sample.to_f32();
                    if is_covered(x, y, value) {
                        covered += 1;
                        min = min.min(value);
                        max = max.max(value);
                    }
                }
            }
        }

        if covered == 0 {
            min = 0.0;
            max = 1.0;
        }
        let range = max - min;
        debug!(covered, min, max, "Depth range");

        {
            let _span = tracing::debug_span!("rescale").entered();
            for y in 0..height {
                let row = &mut depth.data[y * stride..y * stride + width];
                for (x, sample) in row.iter_mut().enumerate() {
                    let value = sample.to_f32();
                    let output = if !is_covered(x, y, value) {
                        0.0
                    } else if range > 0.0 {
                        ((value - min) / range).clamp(0.0, 1.0)
                    } else {
                        FLAT_RANGE_VALUE
                    };
                    *sample = f16::from_f32(output);
                }
            }
        }

        Ok(NormalizationStats { covered, min, max })
    }
}
