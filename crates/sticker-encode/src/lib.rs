//! # sticker-encode
//!
//! Encoding for Sticker Studio: an asynchronous encoder service that turns
//! rendered frames into an animated GIF, plus single-frame PNG export.

pub mod gif;
pub mod naming;
pub mod still;

use async_trait::async_trait;
use sticker_core::frame::FrameBuffer;
use sticker_core::{ExportSettings, StickerResult};

pub use gif::{GifEncoder, GifEncoderService};
pub use naming::export_filename;
pub use still::{export_png, StillImage};

/// Per-encode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    pub width: u32,
    pub height: u32,
    /// 1 (best) ..= 20 (smallest).
    pub quality: u8,
}

impl From<&ExportSettings> for EncoderConfig {
    fn from(settings: &ExportSettings) -> Self {
        Self {
            width: settings.width,
            height: settings.height,
            quality: settings.quality,
        }
    }
}

/// A finished encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBlob {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl EncodedBlob {
    pub fn new(bytes: Vec<u8>, mime: &'static str) -> Self {
        Self { bytes, mime }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Starts encodes. Implementations may run the actual work off-thread; the
/// caller only ever awaits.
#[async_trait]
pub trait EncoderService: Send + Sync {
    async fn begin(&self, config: EncoderConfig) -> StickerResult<Box<dyn EncoderSession>>;
}

/// One in-progress encode. Frames are copied on submission, so the caller
/// may keep drawing into the same surface.
#[async_trait]
pub trait EncoderSession: Send {
    fn add_frame(&mut self, frame: &FrameBuffer, delay_ms: u32) -> StickerResult<()>;

    fn frame_count(&self) -> usize;

    /// Complete the encode. Exactly one outcome per session: the blob or an
    /// encode error.
    async fn finish(self: Box<Self>) -> StickerResult<EncodedBlob>;
}
