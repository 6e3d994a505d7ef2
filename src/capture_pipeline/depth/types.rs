//! Depth frame and coverage mask buffers

use half::f16;

use crate::capture_pipeline::common::error::{CaptureError, Result};

/// Size in bytes of one depth sample.
pub const DEPTH_SAMPLE_SIZE: usize = std::mem::size_of::<f16>();

/// A raw depth map as delivered by the camera.
///
/// Samples are row-major. Rows may be padded: `bytes_per_row` can exceed
/// `width * DEPTH_SAMPLE_SIZE`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDepthFrame {
    /// Width of the frame in pixels
    pub width: usize,
    /// Height of the frame in pixels
    pub height: usize,
    /// Distance between the starts of consecutive rows, in bytes
    pub bytes_per_row: usize,
    /// Half-float depth samples, including row padding
    pub data: Vec<f16>,
}

impl RawDepthFrame {
    /// Builds a frame from tightly packed `f32` values, padding each row out
    /// to `bytes_per_row` with zeros.
    pub fn from_f32(width: usize, height: usize, bytes_per_row: usize, values: &[f32]) -> Result<Self> {
        if values.len() != width * height {
            return Err(CaptureError::BufferTooSmall {
                len: values.len() * DEPTH_SAMPLE_SIZE,
                required: width * height * DEPTH_SAMPLE_SIZE,
            });
        }
        check_layout(width, height, bytes_per_row, DEPTH_SAMPLE_SIZE, usize::MAX)?;

        let stride = bytes_per_row / DEPTH_SAMPLE_SIZE;
        let mut data = vec![f16::ZERO; stride * height];
        for (row, values) in data.chunks_exact_mut(stride).zip(values.chunks_exact(width)) {
            for (sample, &value) in row.iter_mut().zip(values) {
                *sample = f16::from_f32(value);
            }
        }

        Ok(Self {
            width,
            height,
            bytes_per_row,
            data,
        })
    }

    /// Builds a frame from little-endian binary16 bytes as laid out in memory.
    pub fn from_le_bytes(width: usize, height: usize, bytes_per_row: usize, bytes: &[u8]) -> Result<Self> {
        check_layout(width, height, bytes_per_row, DEPTH_SAMPLE_SIZE, bytes.len())?;
        let data = bytes
            .chunks_exact(DEPTH_SAMPLE_SIZE)
            .map(|pair| f16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(Self {
            width,
            height,
            bytes_per_row,
            data,
        })
    }

    pub fn validate(&self) -> Result<()> {
        check_layout(
            self.width,
            self.height,
            self.bytes_per_row,
            DEPTH_SAMPLE_SIZE,
            self.data.len() * DEPTH_SAMPLE_SIZE,
        )
    }

    /// Row stride in samples.
    pub fn stride(&self) -> usize {
        self.bytes_per_row / DEPTH_SAMPLE_SIZE
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride() + x).map(|v| v.to_f32())
    }

    /// Copies the visible pixels, without row padding, into a packed `f32` buffer.
    pub fn to_f32_packed(&self) -> Vec<f32> {
        let stride = self.stride();
        (0..self.height)
            .flat_map(|y| self.data[y * stride..y * stride + self.width].iter().map(|v| v.to_f32()))
            .collect()
    }
}

/// Per-pixel validity of a depth frame. Resolution and stride are
/// independent of the frame it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageMask {
    pub width: usize,
    pub height: usize,
    pub bytes_per_row: usize,
    pub data: Vec<u8>,
}

impl CoverageMask {
    /// Builds a mask from tightly packed rows.
    pub fn from_packed(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        let mask = Self {
            width,
            height,
            bytes_per_row: width,
            data,
        };
        mask.validate()?;
        Ok(mask)
    }

    /// A mask of the given size with every sample set to `value`.
    pub fn filled(width: usize, height: usize, bytes_per_row: usize, value: u8) -> Self {
        Self {
            width,
            height,
            bytes_per_row,
            data: vec![value; bytes_per_row * height],
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_layout(self.width, self.height, self.bytes_per_row, 1, self.data.len())
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.bytes_per_row + x).copied()
    }
}

/// Checks that a buffer of `len` bytes can hold `height` rows of `width`
/// samples spaced `bytes_per_row` apart. The last row may omit its padding.
fn check_layout(width: usize, height: usize, bytes_per_row: usize, sample_size: usize, len: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(CaptureError::InvalidDimensions(width, height));
    }
    if bytes_per_row % sample_size != 0 {
        return Err(CaptureError::MisalignedStride {
            bytes_per_row,
            sample_size,
        });
    }
    let row = width * sample_size;
    if bytes_per_row < row {
        return Err(CaptureError::StrideTooSmall {
            bytes_per_row,
            min: row,
        });
    }
    let required = bytes_per_row * (height - 1) + row;
    if len < required {
        return Err(CaptureError::BufferTooSmall { len, required });
    }
    Ok(())
}
