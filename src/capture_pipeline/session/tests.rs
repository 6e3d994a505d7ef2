use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use half::f16;

use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::depth::{CoverageMask, NormalizerConfig, RawDepthFrame};
use crate::capture_pipeline::illumination::{IlluminationPattern, ScreenSize};
use crate::capture_pipeline::persistence::{DepthFrameStore, NormalizedFrame};
use crate::capture_pipeline::sequence::{
    AutoIlluminationMode, CaptureCallbacks, CaptureRequest, CaptureSequence, CaptureService,
    SequencerConfig,
};
use crate::capture_pipeline::session::{CaptureSession, SessionStats};
use crate::capture_pipeline::simulated::{SimulatedCamera, SimulatedCameraConfig, SimulatedDisplay};

#[derive(Default)]
struct MemoryStore {
    frames: Mutex<Vec<NormalizedFrame>>,
}

impl DepthFrameStore for MemoryStore {
    fn store(&self, frame: &NormalizedFrame) -> Result<()> {
        self.frames.lock().unwrap().push(frame.clone());
        Ok(())
    }
}

struct FailingStore;

impl DepthFrameStore for FailingStore {
    fn store(&self, _frame: &NormalizedFrame) -> Result<()> {
        Err(CaptureError::OutputWriteError("disk full".to_string()))
    }
}

/// Delivers a frame whose stride cannot hold a row.
struct MalformedCamera;

impl CaptureService for MalformedCamera {
    fn capture(&self, request: CaptureRequest, callbacks: CaptureCallbacks) -> Result<()> {
        let depth = RawDepthFrame {
            width: 4,
            height: 4,
            bytes_per_row: 2,
            data: vec![f16::ONE; 16],
        };
        callbacks.deliver(depth, CoverageMask::filled(4, 4, 4, 255));
        for _ in 0..request.bracket_width {
            callbacks.photo_taken();
        }
        callbacks.finish();
        Ok(())
    }
}

/// Accepts every request and never reports a photo.
struct StalledCamera;

impl CaptureService for StalledCamera {
    fn capture(&self, _request: CaptureRequest, _callbacks: CaptureCallbacks) -> Result<()> {
        Ok(())
    }
}

fn display() -> Arc<SimulatedDisplay> {
    Arc::new(SimulatedDisplay::new(
        ScreenSize::new(320.0, 240.0),
        Duration::from_millis(1),
    ))
}

fn camera() -> Arc<SimulatedCamera> {
    Arc::new(SimulatedCamera::new(SimulatedCameraConfig {
        exposure_latency: Duration::from_millis(1),
        ..SimulatedCameraConfig::default()
    }))
}

fn config() -> SequencerConfig {
    SequencerConfig::builder()
        .bracket_width(2)
        .timeout(Some(Duration::from_secs(5)))
        .build()
        .unwrap()
}

#[test]
fn test_session_normalizes_and_stores_every_frame() {
    let display = display();
    let camera = camera();
    let store = Arc::new(MemoryStore::default());
    let session = CaptureSession::new(
        Arc::clone(&display),
        Arc::clone(&camera),
        Arc::clone(&store),
        config(),
        NormalizerConfig::default(),
    )
    .unwrap();

    let report = session.run(AutoIlluminationMode::Mode0).unwrap();
    assert!(report.completed);
    assert_eq!(report.captured(), 8);
    assert_eq!(
        display.history(),
        AutoIlluminationMode::Mode0.sequence().patterns().to_vec()
    );
    assert_eq!(camera.captures(), 8);

    let stats = session.shutdown();
    assert_eq!(
        stats,
        SessionStats {
            normalized: 8,
            rejected: 0,
            stored: 8,
            store_failed: 0,
        }
    );

    let frames = store.frames.lock().unwrap();
    assert_eq!(frames.len(), 8);
    for frame in frames.iter() {
        assert!(frame.stats.covered > 0);
        assert!(frame.stats.min < frame.stats.max);
        assert!(frame.depth.to_f32_packed().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

#[test]
fn test_display_reset_after_completion() {
    let display = display();
    let session = CaptureSession::new(
        Arc::clone(&display),
        camera(),
        Arc::new(MemoryStore::default()),
        config(),
        NormalizerConfig::default(),
    )
    .unwrap();

    session.run(AutoIlluminationMode::Mode1).unwrap();
    assert_eq!(display.resets(), 1);
    assert_eq!(display.current_layout(), None);
    session.shutdown();
}

#[test]
fn test_display_not_reset_when_run_aborts() {
    let display = display();
    let config = SequencerConfig::builder()
        .bracket_width(2)
        .capture_timeout(Some(Duration::from_millis(20)))
        .build()
        .unwrap();
    let session = CaptureSession::new(
        Arc::clone(&display),
        Arc::new(StalledCamera),
        Arc::new(MemoryStore::default()),
        config,
        NormalizerConfig::default(),
    )
    .unwrap();

    let result = session.run(AutoIlluminationMode::Mode1);
    assert!(matches!(result, Err(CaptureError::SignalTimeout { .. })));
    thread::sleep(Duration::from_millis(50));
    assert_eq!(display.resets(), 0);
    session.shutdown();
}

#[test]
fn test_invalid_config_rejected() {
    let config = SequencerConfig {
        bracket_width: 3,
        ..SequencerConfig::default()
    };
    let session = CaptureSession::new(
        display(),
        camera(),
        Arc::new(MemoryStore::default()),
        config,
        NormalizerConfig::default(),
    );
    assert!(matches!(session, Err(CaptureError::InvalidConfig(_))));
}

#[test]
fn test_malformed_frames_are_rejected() {
    let session = CaptureSession::new(
        display(),
        Arc::new(MalformedCamera),
        Arc::new(MemoryStore::default()),
        config(),
        NormalizerConfig::default(),
    )
    .unwrap();

    let sequence = CaptureSequence::new(
        vec![IlluminationPattern::LeftHalf, IlluminationPattern::Off],
        IlluminationPattern::Off,
    )
    .unwrap();
    let report = session.run_sequence(sequence).unwrap();
    assert!(report.completed);

    let stats = session.shutdown();
    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.normalized, 0);
    assert_eq!(stats.stored, 0);
}

#[test]
fn test_store_failures_are_counted() {
    let session = CaptureSession::new(
        display(),
        camera(),
        Arc::new(FailingStore),
        config(),
        NormalizerConfig::default(),
    )
    .unwrap();

    let report = session.run(AutoIlluminationMode::Mode1).unwrap();
    assert_eq!(report.captured(), 4);

    let stats = session.shutdown();
    assert_eq!(stats.normalized, 4);
    assert_eq!(stats.store_failed, 4);
    assert_eq!(stats.stored, 0);
}

#[test]
fn test_no_frames_without_depth_delivery() {
    let config = SequencerConfig::builder()
        .bracket_width(1)
        .depth_data_delivery(false)
        .build()
        .unwrap();
    let store = Arc::new(MemoryStore::default());
    let session = CaptureSession::new(
        display(),
        camera(),
        Arc::clone(&store),
        config,
        NormalizerConfig::default(),
    )
    .unwrap();

    let report = session.run(AutoIlluminationMode::Mode1).unwrap();
    assert!(report.completed);
    assert_eq!(session.shutdown(), SessionStats::default());
    assert!(store.frames.lock().unwrap().is_empty());
}

#[test]
fn test_session_can_run_twice() {
    let store = Arc::new(MemoryStore::default());
    let session = CaptureSession::new(
        display(),
        camera(),
        Arc::clone(&store),
        config(),
        NormalizerConfig::default(),
    )
    .unwrap();

    session.run(AutoIlluminationMode::Mode1).unwrap();
    session.run(AutoIlluminationMode::Mode1).unwrap();
    assert_eq!(session.shutdown().stored, 8);

    let frames = store.frames.lock().unwrap();
    let ids: Vec<u64> = frames.iter().map(|f| f.request_id.value()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 8);
}
