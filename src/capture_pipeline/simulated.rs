//! In-process stand-ins for the display and the depth camera.
//!
//! Used by the demo binary and tests to drive full capture sessions without
//! hardware.

mod display;
mod camera;

pub use display::SimulatedDisplay;
pub use camera::{SimulatedCamera, SimulatedCameraConfig};
