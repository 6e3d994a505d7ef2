use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use photometric_capture_rs::capture_pipeline::depth::NormalizerConfig;
use photometric_capture_rs::capture_pipeline::persistence::{TiffCompression, TiffDepthStore, TiffStoreConfig};
use photometric_capture_rs::capture_pipeline::illumination::ScreenSize;
use photometric_capture_rs::capture_pipeline::sequence::{AutoIlluminationMode, PatternStatus, SequencerConfig};
use photometric_capture_rs::capture_pipeline::session::CaptureSession;
use photometric_capture_rs::capture_pipeline::simulated::{
    SimulatedCamera, SimulatedCameraConfig, SimulatedDisplay,
};
use photometric_capture_rs::logger;

/// Runs an illumination-sequenced capture against simulated hardware and
/// writes the normalized depth frames as TIFF files.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Predefined sequence to run: 0 (halves and quadrants) or 1 (corner squares)
    #[arg(short, long, default_value = "0")]
    mode: AutoIlluminationMode,

    /// Photos taken per illumination pattern
    #[arg(short, long, default_value_t = 4)]
    bracket_width: usize,

    /// How long to wait for each illumination or photo signal
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Wait for signals indefinitely
    #[arg(long, conflicts_with = "timeout_ms")]
    no_timeout: bool,

    /// Directory the normalized depth frames are written to
    #[arg(short, long, default_value = "depth_output")]
    output_dir: PathBuf,

    /// Mask values above this count as covered
    #[arg(long, default_value_t = 100)]
    coverage_threshold: u8,

    /// Write uncompressed TIFF files
    #[arg(long)]
    uncompressed: bool,

    /// Simulated display latency in milliseconds
    #[arg(long, default_value_t = 30)]
    display_latency_ms: u64,

    /// Simulated exposure latency in milliseconds
    #[arg(long, default_value_t = 20)]
    exposure_latency_ms: u64,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(&args.log);

    info!("Starting photometric capture...");

    let timeout = (!args.no_timeout).then(|| Duration::from_millis(args.timeout_ms));
    let sequencer_config = SequencerConfig::builder()
        .bracket_width(args.bracket_width)
        .timeout(timeout)
        .build()
        .context("invalid sequencer configuration")?;
    let normalizer_config = NormalizerConfig::builder()
        .coverage_threshold(args.coverage_threshold)
        .build();
    let store_config = TiffStoreConfig::builder()
        .compression(if args.uncompressed {
            TiffCompression::None
        } else {
            TiffCompression::DeflateBalanced
        })
        .build();

    let store = Arc::new(
        TiffDepthStore::new(args.output_dir.clone(), store_config)
            .with_context(|| format!("cannot use output directory {}", args.output_dir.display()))?,
    );
    let display = Arc::new(SimulatedDisplay::new(
        ScreenSize::new(1170.0, 2532.0),
        Duration::from_millis(args.display_latency_ms),
    ));
    let camera = Arc::new(SimulatedCamera::new(SimulatedCameraConfig {
        exposure_latency: Duration::from_millis(args.exposure_latency_ms),
        ..SimulatedCameraConfig::default()
    }));

    info!(mode = ?args.mode, bracket_width = args.bracket_width, ?timeout, "Capture session initialized");
    info!("Output directory: {}", args.output_dir.display());

    let session = CaptureSession::new(display, camera, store, sequencer_config, normalizer_config)?;
    let result = session.run(args.mode);
    let stats = session.shutdown();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!("Capture failed: {}", e);
            return Err(e.into());
        }
    };

    for outcome in &report.outcomes {
        match &outcome.status {
            PatternStatus::Captured => {}
            PatternStatus::IlluminationFailed(reason) | PatternStatus::CaptureFailed(reason) => {
                warn!(pattern = %outcome.pattern, "Pattern skipped: {}", reason);
            }
        }
    }

    info!(
        captured = report.captured(),
        failed = report.failed(),
        normalized = stats.normalized,
        rejected = stats.rejected,
        stored = stats.stored,
        store_failed = stats.store_failed,
        "Capture finished"
    );

    Ok(())
}
