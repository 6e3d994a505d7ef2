use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::capture_pipeline::common::error::Result;
use crate::capture_pipeline::depth::{CoverageMask, RawDepthFrame};
use crate::capture_pipeline::depth::types::DEPTH_SAMPLE_SIZE;
use crate::capture_pipeline::sequence::{CaptureCallbacks, CaptureRequest, CaptureService};

/// Shape of the synthetic frames and timing of the simulated camera.
#[derive(Debug, Clone)]
pub struct SimulatedCameraConfig {
    pub depth_width: usize,
    pub depth_height: usize,
    /// Extra bytes at the end of every depth row
    pub depth_row_padding: usize,
    pub mask_width: usize,
    pub mask_height: usize,
    /// Extra bytes at the end of every mask row
    pub mask_row_padding: usize,
    /// Delay before each exposure of a bracket is reported
    pub exposure_latency: Duration,
}

impl Default for SimulatedCameraConfig {
    fn default() -> Self {
        Self {
            depth_width: 64,
            depth_height: 48,
            depth_row_padding: 16,
            mask_width: 128,
            mask_height: 96,
            mask_row_padding: 8,
            exposure_latency: Duration::from_millis(5),
        }
    }
}

/// A depth camera that looks at an ellipsoidal bump in front of a far
/// background. The bump is covered by the mask, the background is not.
pub struct SimulatedCamera {
    config: SimulatedCameraConfig,
    captures: AtomicUsize,
}

// Semi-axes of the covered ellipse, as fractions of the frame size.
const ELLIPSE_X: f32 = 0.35;
const ELLIPSE_Y: f32 = 0.4;
const BACKGROUND_DEPTH: f32 = 2.0;

impl SimulatedCamera {
    pub fn new(config: SimulatedCameraConfig) -> Self {
        Self {
            config,
            captures: AtomicUsize::new(0),
        }
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::Acquire)
    }

    /// Squared normalized distance from the frame centre; `< 1` inside the ellipse.
    fn radius_sq(x: usize, y: usize, width: usize, height: usize) -> f32 {
        let u = (x as f32 + 0.5) / width as f32 - 0.5;
        let v = (y as f32 + 0.5) / height as f32 - 0.5;
        (u / ELLIPSE_X).powi(2) + (v / ELLIPSE_Y).powi(2)
    }

    fn synthesize(&self, pattern_id: i32) -> Result<(RawDepthFrame, CoverageMask)> {
        let c = &self.config;
        let tilt = 0.002 * pattern_id as f32;

        let mut values = Vec::with_capacity(c.depth_width * c.depth_height);
        for y in 0..c.depth_height {
            for x in 0..c.depth_width {
                // Sample the object where the mask samples it so coverage lines up.
                let mx = x * c.mask_width / c.depth_width;
                let my = y * c.mask_height / c.depth_height;
                let r2 = Self::radius_sq(mx, my, c.mask_width, c.mask_height);
                let value = if r2 < 1.0 {
                    0.45 - 0.08 * (1.0 - r2).sqrt() + tilt * (x as f32 / c.depth_width as f32)
                } else {
                    BACKGROUND_DEPTH + 0.01 * ((x * 7 + y * 13) % 5) as f32
                };
                values.push(value);
            }
        }
        let depth = RawDepthFrame::from_f32(
            c.depth_width,
            c.depth_height,
            c.depth_width * DEPTH_SAMPLE_SIZE + c.depth_row_padding,
            &values,
        )?;

        let mut mask = CoverageMask::filled(
            c.mask_width,
            c.mask_height,
            c.mask_width + c.mask_row_padding,
            0,
        );
        for y in 0..c.mask_height {
            for x in 0..c.mask_width {
                if Self::radius_sq(x, y, c.mask_width, c.mask_height) < 1.0 {
                    mask.data[y * mask.bytes_per_row + x] = 255;
                }
            }
        }
        Ok((depth, mask))
    }
}

impl CaptureService for SimulatedCamera {
    fn capture(&self, request: CaptureRequest, callbacks: CaptureCallbacks) -> Result<()> {
        let frames = if request.settings.depth_data_delivery {
            Some(self.synthesize(request.pattern.id())?)
        } else {
            None
        };
        let exposures = request.bracket_width;
        let latency = self.config.exposure_latency;
        self.captures.fetch_add(1, Ordering::AcqRel);

        thread::Builder::new()
            .name("simulated-camera".into())
            .spawn(move || {
                if let Some((depth, mask)) = frames {
                    callbacks.deliver(depth, mask);
                }
                for exposure in 0..exposures {
                    thread::sleep(latency);
                    debug!(request = %request.id, exposure, "Exposure captured");
                    callbacks.photo_taken();
                }
                callbacks.finish();
            })?;
        Ok(())
    }
}
