use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::capture_pipeline::common::error::Result;
use crate::capture_pipeline::illumination::{
    IlluminationLayout, IlluminationPattern, IlluminationService, ScreenSize,
};
use crate::capture_pipeline::sequence::Notifier;

#[derive(Default)]
struct DisplayState {
    layout: Option<IlluminationLayout>,
    history: Vec<IlluminationPattern>,
}

/// A screen that applies layouts on its own thread after a fixed latency.
pub struct SimulatedDisplay {
    screen: ScreenSize,
    latency: Duration,
    state: Arc<Mutex<DisplayState>>,
    resets: AtomicUsize,
}

impl SimulatedDisplay {
    pub fn new(screen: ScreenSize, latency: Duration) -> Self {
        Self {
            screen,
            latency,
            state: Arc::default(),
            resets: AtomicUsize::new(0),
        }
    }

    /// Layout currently on screen, `None` before the first pattern or after a reset.
    pub fn current_layout(&self) -> Option<IlluminationLayout> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).layout
    }

    /// Patterns applied so far, in order.
    pub fn history(&self) -> Vec<IlluminationPattern> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .clone()
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::Acquire)
    }
}

impl IlluminationService for SimulatedDisplay {
    fn apply(&self, pattern: IlluminationPattern, applied: Notifier) -> Result<()> {
        let layout = pattern.layout(self.screen);
        let state = Arc::clone(&self.state);
        let latency = self.latency;

        thread::Builder::new()
            .name("simulated-display".into())
            .spawn(move || {
                thread::sleep(latency);
                {
                    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                    state.layout = Some(layout);
                    state.history.push(pattern);
                }
                debug!(%pattern, "Display updated");
                applied.notify();
            })?;
        Ok(())
    }

    fn reset(&self) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).layout = None;
        self.resets.fetch_add(1, Ordering::AcqRel);
    }
}
