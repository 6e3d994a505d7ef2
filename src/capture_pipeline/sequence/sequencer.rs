use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use tracing::{debug, error, info, instrument, warn};

use crate::capture_pipeline::common::error::{CaptureError, Result, WaitStage};
use crate::capture_pipeline::illumination::{IlluminationPattern, IlluminationService};
use crate::capture_pipeline::sequence::capture::{
    CaptureCallbacks, CaptureRequest, CaptureService, DeliveredCapture,
};
use crate::capture_pipeline::sequence::pending::PendingCaptures;
use crate::capture_pipeline::sequence::signal::{CompletionSignal, Signal};
use crate::capture_pipeline::sequence::types::{
    CaptureSequence, PatternOutcome, PatternStatus, SequenceReport, SequencerConfig,
};

/// Drives an illumination service and a capture service through a
/// [`CaptureSequence`], one pattern at a time.
pub struct CaptureSequencer<I: IlluminationService, C: CaptureService> {
    illumination: Arc<I>,
    camera: Arc<C>,
    config: SequencerConfig,
    pending: PendingCaptures,
    delivery: Option<Sender<DeliveredCapture>>,
    running: Arc<AtomicBool>,
}

impl<I, C> CaptureSequencer<I, C>
where
    I: IlluminationService + 'static,
    C: CaptureService + 'static,
{
    pub fn new(illumination: Arc<I>, camera: Arc<C>, config: SequencerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            illumination,
            camera,
            config,
            pending: PendingCaptures::new(),
            delivery: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Routes frames delivered by the capture service into `delivery`.
    pub fn with_delivery(mut self, delivery: Sender<DeliveredCapture>) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn pending(&self) -> &PendingCaptures {
        &self.pending
    }

    pub fn illumination(&self) -> &Arc<I> {
        &self.illumination
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts a run on a dedicated sequencing thread.
    ///
    /// Fails with [`CaptureError::SequenceInProgress`] while another run of
    /// this sequencer is active.
    #[instrument(skip(self, sequence), fields(patterns = sequence.len()))]
    pub fn run_sequence(&self, sequence: CaptureSequence) -> Result<SequenceHandle> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejecting capture sequence, a run is already in progress");
            return Err(CaptureError::SequenceInProgress);
        }

        let completion = CompletionSignal::new();
        let run = SequenceRun {
            illumination: Arc::clone(&self.illumination),
            camera: Arc::clone(&self.camera),
            config: self.config.clone(),
            pending: self.pending.clone(),
            delivery: self.delivery.clone(),
            completion: completion.clone(),
            index: 0,
            photos_at_pattern: 0,
            completed: false,
        };
        let running = RunningGuard(Arc::clone(&self.running));

        let worker = thread::Builder::new()
            .name("capture-sequencer".into())
            .spawn(move || {
                let _running = running;
                run.execute(sequence)
            });

        match worker {
            Ok(worker) => Ok(SequenceHandle { completion, worker }),
            // The closure (and its guard) was dropped, so `running` is clear again.
            Err(e) => Err(CaptureError::IoError(e)),
        }
    }
}

/// Clears the sequencer's running flag when the sequencing thread exits,
/// including by panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handle to a run started by [`CaptureSequencer::run_sequence`].
pub struct SequenceHandle {
    completion: CompletionSignal,
    worker: JoinHandle<Result<SequenceReport>>,
}

impl SequenceHandle {
    pub fn completion(&self) -> &CompletionSignal {
        &self.completion
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Blocks until the sequencing thread exits and returns its result.
    ///
    /// A panic inside a service is resumed on the calling thread.
    pub fn wait(self) -> Result<SequenceReport> {
        match self.worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// State of one run, owned by the sequencing thread.
struct SequenceRun<I, C> {
    illumination: Arc<I>,
    camera: Arc<C>,
    config: SequencerConfig,
    pending: PendingCaptures,
    delivery: Option<Sender<DeliveredCapture>>,
    completion: CompletionSignal,
    index: usize,
    photos_at_pattern: usize,
    completed: bool,
}

// A run that unwinds out of a service still releases completion waiters.
impl<I, C> Drop for SequenceRun<I, C> {
    fn drop(&mut self) {
        self.completion.abandon();
    }
}

impl<I: IlluminationService, C: CaptureService> SequenceRun<I, C> {
    /// Runs every entry of `sequence` in order.
    ///
    /// The run completes, and the completion signal fires, only when the last
    /// entry was captured. A transient failure on the last entry leaves the
    /// run incomplete and abandons the signal.
    fn execute(mut self, sequence: CaptureSequence) -> Result<SequenceReport> {
        info!(
            patterns = sequence.len(),
            bracket_width = self.config.bracket_width,
            "Starting capture sequence"
        );
        let mut outcomes = Vec::with_capacity(sequence.len());

        for (index, &pattern) in sequence.patterns().iter().enumerate() {
            self.index = index;
            self.photos_at_pattern = 0;

            let status = {
                let _span = tracing::info_span!("pattern", index, %pattern).entered();
                match self.step(pattern) {
                    Ok(status) => status,
                    Err(e) => {
                        error!(error = %e, "Capture sequence aborted");
                        let dropped = self.pending.clear();
                        if dropped > 0 {
                            debug!(dropped, "Dropped pending capture records");
                        }
                        self.completion.abandon();
                        return Err(e);
                    }
                }
            };

            // Only the last entry counts; the final pattern may also appear earlier.
            if index + 1 == sequence.len() {
                self.completed = status == PatternStatus::Captured;
            }
            outcomes.push(PatternOutcome {
                index,
                pattern,
                status,
                exposures: self.photos_at_pattern,
            });
        }

        let report = SequenceReport {
            outcomes,
            completed: self.completed,
        };
        if report.completed {
            self.completion.fire();
            info!(captured = report.captured(), "Capture sequence complete");
        } else {
            warn!(pattern = %sequence.final_pattern(), "Final pattern was not captured");
            self.completion.abandon();
        }
        Ok(report)
    }

    fn step(&mut self, pattern: IlluminationPattern) -> Result<PatternStatus> {
        let applied = Signal::new();
        if let Err(e) = self.illumination.apply(pattern, applied.notifier()) {
            warn!(error = %e, "Illumination change failed, skipping pattern");
            return Ok(PatternStatus::IlluminationFailed(e.to_string()));
        }
        self.wait_for(&applied, WaitStage::IlluminationApplied, pattern)?;
        debug!("Illumination applied");

        if !self.pending.is_empty() {
            debug!(outstanding = self.pending.len(), "Earlier captures have not reported finish yet");
        }

        let taken = Signal::new();
        let request = CaptureRequest {
            id: self.pending.insert(pattern),
            sequence_index: self.index,
            pattern,
            bracket_width: self.config.bracket_width,
            settings: self.config.capture_settings.clone(),
        };
        let id = request.id;
        let callbacks = CaptureCallbacks::new(
            &request,
            taken.notifier(),
            self.pending.clone(),
            self.delivery.clone(),
        );

        if let Err(e) = self.camera.capture(request, callbacks) {
            self.pending.remove(id);
            warn!(request = %id, error = %e, "Photo capture failed, skipping pattern");
            return Ok(PatternStatus::CaptureFailed(e.to_string()));
        }

        while self.photos_at_pattern < self.config.bracket_width {
            if let Err(e) = self.wait_for(&taken, WaitStage::PhotoTaken, pattern) {
                self.pending.remove(id);
                return Err(e);
            }
            self.photos_at_pattern += 1;
            debug!(
                request = %id,
                taken = self.photos_at_pattern,
                of = self.config.bracket_width,
                "Exposure complete"
            );
        }
        Ok(PatternStatus::Captured)
    }

    fn wait_for(&self, signal: &Signal, stage: WaitStage, pattern: IlluminationPattern) -> Result<()> {
        let timeout = match stage {
            WaitStage::IlluminationApplied => self.config.illumination_timeout,
            WaitStage::PhotoTaken => self.config.capture_timeout,
        };
        if signal.wait(timeout) {
            return Ok(());
        }
        Err(CaptureError::SignalTimeout {
            stage,
            pattern,
            waited: timeout.unwrap_or_default(),
        })
    }
}
