//! Screen illumination module
//!
//! Illumination patterns, the screen geometry each one lights up, and the
//! service trait through which the sequencer asks a display to show them.

mod pattern;
mod layout;
mod service;


pub use pattern::IlluminationPattern;
pub use layout::{Color, ColoredRect, IlluminationLayout, Rect, ScreenSize};
pub use service::IlluminationService;
