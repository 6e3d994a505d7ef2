use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, unbounded};
use tracing::{info, instrument, warn};

use crate::capture_pipeline::common::error::Result;
use crate::capture_pipeline::depth::{DepthNormalizer, NormalizerConfig};
use crate::capture_pipeline::illumination::IlluminationService;
use crate::capture_pipeline::persistence::{DepthFrameStore, NormalizedFrame};
use crate::capture_pipeline::sequence::{
    AutoIlluminationMode, CaptureSequence, CaptureSequencer, CaptureService, DeliveredCapture,
    SequenceReport, SequencerConfig,
};

/// Counters kept by the session's frame worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames successfully normalized
    pub normalized: usize,
    /// Frames rejected by the normalizer
    pub rejected: usize,
    /// Normalized frames the store accepted
    pub stored: usize,
    /// Normalized frames the store failed to write
    pub store_failed: usize,
}

/// A capture sequencer plus a background worker that normalizes and stores
/// every depth frame the camera delivers.
pub struct CaptureSession<I: IlluminationService, C: CaptureService> {
    sequencer: CaptureSequencer<I, C>,
    stats: Arc<Mutex<SessionStats>>,
    worker: JoinHandle<()>,
}

impl<I, C> CaptureSession<I, C>
where
    I: IlluminationService + 'static,
    C: CaptureService + 'static,
{
    pub fn new<S: DepthFrameStore + 'static>(
        illumination: Arc<I>,
        camera: Arc<C>,
        store: Arc<S>,
        sequencer_config: SequencerConfig,
        normalizer_config: NormalizerConfig,
    ) -> Result<Self> {
        let (delivery, frames) = unbounded();
        let sequencer =
            CaptureSequencer::new(illumination, camera, sequencer_config)?.with_delivery(delivery);
        let stats = Arc::new(Mutex::new(SessionStats::default()));

        let normalizer = DepthNormalizer::new(normalizer_config);
        let worker_stats = Arc::clone(&stats);
        let worker = thread::Builder::new()
            .name("depth-frames".into())
            .spawn(move || process_frames(frames, normalizer, store, worker_stats))?;

        Ok(Self {
            sequencer,
            stats,
            worker,
        })
    }

    pub fn sequencer(&self) -> &CaptureSequencer<I, C> {
        &self.sequencer
    }

    /// Runs one of the predefined sequences to completion.
    pub fn run(&self, mode: AutoIlluminationMode) -> Result<SequenceReport> {
        self.run_sequence(mode.sequence())
    }

    /// Runs `sequence` to completion, blocking the caller.
    ///
    /// The display is reset on a separate thread once the run completes;
    /// this returns after the reset has finished.
    #[instrument(skip(self, sequence), fields(patterns = sequence.len()))]
    pub fn run_sequence(&self, sequence: CaptureSequence) -> Result<SequenceReport> {
        let handle = self.sequencer.run_sequence(sequence)?;

        let illumination = Arc::clone(self.sequencer.illumination());
        let cleanup = handle.completion().on_complete(move || {
            info!("Resetting illumination");
            illumination.reset();
        })?;

        let report = handle.wait()?;
        // Settled by now: the reset has either run or been skipped.
        if let Err(panic) = cleanup.join() {
            std::panic::resume_unwind(panic);
        }
        info!(
            captured = report.captured(),
            failed = report.failed(),
            "Capture run finished"
        );
        Ok(report)
    }

    pub fn stats(&self) -> SessionStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stops accepting frames, waits for queued ones to be processed and
    /// returns the final counters.
    ///
    /// Blocks until every capture callback handed to the camera is dropped.
    pub fn shutdown(self) -> SessionStats {
        let Self {
            sequencer,
            stats,
            worker,
        } = self;
        drop(sequencer);
        if let Err(panic) = worker.join() {
            std::panic::resume_unwind(panic);
        }
        *stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn process_frames<S: DepthFrameStore>(
    frames: Receiver<DeliveredCapture>,
    normalizer: DepthNormalizer,
    store: Arc<S>,
    stats: Arc<Mutex<SessionStats>>,
) {
    for mut capture in frames.iter() {
        let _span = tracing::info_span!(
            "depth_frame",
            request = %capture.request_id,
            pattern = %capture.pattern
        )
        .entered();

        let outcome = match normalizer.normalize(&mut capture.depth, &capture.mask) {
            Ok(normalization) => {
                let frame = NormalizedFrame {
                    request_id: capture.request_id,
                    sequence_index: capture.sequence_index,
                    pattern: capture.pattern,
                    depth: capture.depth,
                    stats: normalization,
                };
                Ok(store.store(&frame))
            }
            Err(e) => Err(e),
        };

        let mut counters = stats.lock().unwrap_or_else(PoisonError::into_inner);
        match outcome {
            Ok(Ok(())) => {
                counters.normalized += 1;
                counters.stored += 1;
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to store depth frame");
                counters.normalized += 1;
                counters.store_failed += 1;
            }
            Err(e) => {
                warn!(error = %e, "Rejected depth frame");
                counters.rejected += 1;
            }
        }
    }
}
