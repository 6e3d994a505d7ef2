//! Persistence configuration and frame types

use crate::capture_pipeline::depth::{NormalizationStats, RawDepthFrame};
use crate::capture_pipeline::illumination::IlluminationPattern;
use crate::capture_pipeline::sequence::RequestId;

/// A depth frame after normalization, with the capture it came from.
#[derive(Debug, Clone)]
pub struct NormalizedFrame {
    pub request_id: RequestId,
    pub sequence_index: usize,
    pub pattern: IlluminationPattern,
    pub depth: RawDepthFrame,
    pub stats: NormalizationStats,
}

impl NormalizedFrame {
    /// File stem identifying the frame, e.g. `03_top-half_12`.
    pub fn file_stem(&self) -> String {
        format!(
            "{:02}_{}_{}",
            self.sequence_index,
            self.pattern.name(),
            self.request_id.value()
        )
    }
}

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

/// Configuration for [`TiffDepthStore`](super::TiffDepthStore)
#[derive(Debug, Clone)]
pub struct TiffStoreConfig {
    /// Compression method to use
    pub compression: TiffCompression,
    /// Whether to create the output directory if it does not exist
    pub create_dir: bool,
}

impl Default for TiffStoreConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::DeflateBalanced,
            create_dir: true,
        }
    }
}

impl TiffStoreConfig {
    pub fn builder() -> TiffStoreConfigBuilder {
        TiffStoreConfigBuilder::default()
    }
}

/// Builder for TiffStoreConfig
#[derive(Default)]
pub struct TiffStoreConfigBuilder {
    compression: Option<TiffCompression>,
    create_dir: Option<bool>,
}

impl TiffStoreConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn create_dir(mut self, create: bool) -> Self {
        self.create_dir = Some(create);
        self
    }

    pub fn build(self) -> TiffStoreConfig {
        let default = TiffStoreConfig::default();
        TiffStoreConfig {
            compression: self.compression.unwrap_or(default.compression),
            create_dir: self.create_dir.unwrap_or(default.create_dir),
        }
    }
}
