//! Mapping from depth-frame pixels to coverage-mask samples.

use crate::capture_pipeline::depth::types::{CoverageMask, RawDepthFrame};

/// How the mask image is oriented relative to the depth frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskOrientation {
    /// Mask rows and columns run the same way as the depth frame's.
    #[default]
    Aligned,
    /// The mask is the depth frame rotated a quarter turn clockwise: mask
    /// columns follow depth rows (bottom to top) and mask rows follow depth
    /// columns.
    Rotated90,
}

/// Nearest-neighbour mapping from depth pixel coordinates to a byte index in
/// the mask buffer.
///
/// Derived only from both buffers' dimensions, the mask row stride and the
/// orientation, so any pair of resolutions maps consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskMapping {
    depth_width: usize,
    depth_height: usize,
    mask_width: usize,
    mask_height: usize,
    mask_bytes_per_row: usize,
    orientation: MaskOrientation,
}

impl MaskMapping {
    pub fn new(depth: &RawDepthFrame, mask: &CoverageMask, orientation: MaskOrientation) -> Self {
        Self {
            depth_width: depth.width,
            depth_height: depth.height,
            mask_width: mask.width,
            mask_height: mask.height,
            mask_bytes_per_row: mask.bytes_per_row,
            orientation,
        }
    }

    /// Mask column and row for depth pixel `(x, y)`.
    ///
    /// Both inputs must be inside the depth frame; the result is then inside
    /// the mask.
    pub fn mask_coords(&self, x: usize, y: usize) -> (usize, usize) {
        match self.orientation {
            MaskOrientation::Aligned => (
                scale(x, self.depth_width, self.mask_width),
                scale(y, self.depth_height, self.mask_height),
            ),
            MaskOrientation::Rotated90 => (
                scale(self.depth_height - 1 - y, self.depth_height, self.mask_width),
                scale(x, self.depth_width, self.mask_height),
            ),
        }
    }

    pub fn mask_index(&self, x: usize, y: usize) -> usize {
        let (mx, my) = self.mask_coords(x, y);
        my * self.mask_bytes_per_row + mx
    }
}

/// Scales `v` in `0..from` to `0..to`, rounding down.
fn scale(v: usize, from: usize, to: usize) -> usize {
    ((v as u64 * to as u64) / from as u64) as usize
}
