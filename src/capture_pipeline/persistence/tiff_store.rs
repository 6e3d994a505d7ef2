use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder, colortype};
use tracing::{debug, info};

use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::persistence::store::DepthFrameStore;
use crate::capture_pipeline::persistence::types::{NormalizedFrame, TiffCompression, TiffStoreConfig};

/// Writes each normalized frame to `<output_dir>/<file stem>.tiff` as a
/// 32-bit float grayscale image.
pub struct TiffDepthStore {
    output_dir: PathBuf,
    config: TiffStoreConfig,
}

impl TiffDepthStore {
    pub fn new(output_dir: impl Into<PathBuf>, config: TiffStoreConfig) -> Result<Self> {
        let output_dir = output_dir.into();
        if config.create_dir {
            std::fs::create_dir_all(&output_dir).map_err(|e| {
                CaptureError::OutputWriteError(format!("{}: {}", output_dir.display(), e))
            })?;
        }
        Ok(Self { output_dir, config })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn config(&self) -> &TiffStoreConfig {
        &self.config
    }

    pub fn path_for(&self, frame: &NormalizedFrame) -> PathBuf {
        self.output_dir.join(format!("{}.tiff", frame.file_stem()))
    }

    /// Encodes the visible part of the frame, dropping row padding.
    pub fn encode(&self, frame: &NormalizedFrame, output: &mut dyn Write) -> Result<()> {
        let depth = &frame.depth;
        depth.validate()?;
        debug!("Encoding depth TIFF: {}x{}", depth.width, depth.height);

        let compression = match self.config.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        };

        let samples = depth.to_f32_packed();
        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(|e| CaptureError::EncodeError(e.to_string()))?
            .with_compression(compression);

        encoder
            .write_image::<colortype::Gray32Float>(depth.width as u32, depth.height as u32, &samples)
            .map_err(|e| CaptureError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;
        Ok(())
    }
}

impl DepthFrameStore for TiffDepthStore {
    fn store(&self, frame: &NormalizedFrame) -> Result<()> {
        let path = self.path_for(frame);
        let mut file = std::fs::File::create(&path)
            .map_err(|e| CaptureError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
        self.encode(frame, &mut file)?;
        info!(path = %path.display(), pattern = %frame.pattern, "Stored depth frame");
        Ok(())
    }
}
