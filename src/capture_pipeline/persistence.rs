//! Depth frame persistence module
//!
//! The store trait normalized frames are handed to, and a TIFF-backed
//! implementation writing one single-channel float image per frame.

mod store;
mod tiff_store;
pub mod types;


pub use store::DepthFrameStore;
pub use tiff_store::TiffDepthStore;
pub use types::{NormalizedFrame, TiffCompression, TiffStoreConfig, TiffStoreConfigBuilder};
