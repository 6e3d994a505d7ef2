//! Camera-side service trait and the callbacks handed to it per request.

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use crate::capture_pipeline::common::error::Result;
use crate::capture_pipeline::depth::{CoverageMask, RawDepthFrame};
use crate::capture_pipeline::illumination::IlluminationPattern;
use crate::capture_pipeline::sequence::pending::{PendingCaptures, RequestId};
use crate::capture_pipeline::sequence::signal::Notifier;

/// Per-request camera settings
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    /// Exposure target bias (EV) for each bracketed exposure. Empty lets the
    /// camera choose.
    pub exposure_biases: Vec<f32>,
    /// Whether the camera should deliver depth data with the photo
    pub depth_data_delivery: bool,
    pub flash_enabled: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            exposure_biases: vec![-2.0, -1.0, 0.0, 1.0],
            depth_data_delivery: true,
            flash_enabled: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub id: RequestId,
    /// Position of the pattern within the running sequence
    pub sequence_index: usize,
    pub pattern: IlluminationPattern,
    /// Number of "photo taken" signals the sequencer will wait for
    pub bracket_width: usize,
    pub settings: CaptureSettings,
}

/// A depth frame and its coverage mask delivered by a capture.
#[derive(Debug, Clone)]
pub struct DeliveredCapture {
    pub request_id: RequestId,
    pub sequence_index: usize,
    pub pattern: IlluminationPattern,
    pub depth: RawDepthFrame,
    pub mask: CoverageMask,
}

/// Handle a [`CaptureService`] uses to report progress on one request.
///
/// May be cloned and moved to whichever thread runs the capture.
#[derive(Clone)]
pub struct CaptureCallbacks {
    request_id: RequestId,
    sequence_index: usize,
    pattern: IlluminationPattern,
    photo_taken: Notifier,
    pending: PendingCaptures,
    delivery: Option<Sender<DeliveredCapture>>,
}

impl CaptureCallbacks {
    pub(crate) fn new(
        request: &CaptureRequest,
        photo_taken: Notifier,
        pending: PendingCaptures,
        delivery: Option<Sender<DeliveredCapture>>,
    ) -> Self {
        Self {
            request_id: request.id,
            sequence_index: request.sequence_index,
            pattern: request.pattern,
            photo_taken,
            pending,
            delivery,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Reports one exposure of the bracket as taken.
    pub fn photo_taken(&self) {
        let taken = self.pending.record_exposure(self.request_id);
        debug!(request = %self.request_id, ?taken, "Photo taken");
        self.photo_taken.notify();
    }

    /// Hands a depth frame and mask to whoever processes captured frames.
    pub fn deliver(&self, depth: RawDepthFrame, mask: CoverageMask) {
        let Some(delivery) = &self.delivery else {
            debug!(request = %self.request_id, "No frame consumer attached, dropping depth frame");
            return;
        };
        let capture = DeliveredCapture {
            request_id: self.request_id,
            sequence_index: self.sequence_index,
            pattern: self.pattern,
            depth,
            mask,
        };
        if delivery.send(capture).is_err() {
            warn!(request = %self.request_id, "Frame consumer has shut down, dropping depth frame");
        }
    }

    /// Reports that the capture is done; its pending record is released.
    pub fn finish(&self) {
        if self.pending.remove(self.request_id).is_none() {
            debug!(request = %self.request_id, "Finish reported for unknown capture");
        }
    }
}

/// A camera that takes bracketed photos.
///
/// `capture` starts the capture and returns. The implementation then calls
/// `photo_taken` once per exposure, `deliver` at most once, and `finish` when
/// it no longer needs the request. Returning an error means nothing was
/// started.
pub trait CaptureService: Send + Sync {
    fn capture(&self, request: CaptureRequest, callbacks: CaptureCallbacks) -> Result<()>;
}
