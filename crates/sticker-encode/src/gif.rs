use std::io::Write;

use async_trait::async_trait;
use image::codecs::gif::Repeat;
use image::{Delay, Frame, RgbaImage};
use sticker_core::frame::FrameBuffer;
use sticker_core::settings::{MAX_QUALITY, MIN_QUALITY};
use sticker_core::{StickerError, StickerResult};

use crate::{EncodedBlob, EncoderConfig, EncoderService, EncoderSession};

pub const GIF_MIME: &str = "image/gif";

/// Native GIF encoder using the `image` crate.
///
/// `quality` follows the usual GIF-tool convention: 1 samples every pixel
/// when building the palette (best, largest), 20 samples sparsely (smaller,
/// coarser).
pub struct GifEncoder;

impl GifEncoder {
    /// Encode frames with their per-frame delays into a looping GIF.
    pub fn encode_to<W: Write>(
        writer: W,
        frames: &[(FrameBuffer, u32)],
        config: &EncoderConfig,
    ) -> StickerResult<()> {
        if frames.is_empty() {
            return Err(StickerError::Encode("no frames to encode for GIF".into()));
        }

        let speed = config.quality.clamp(MIN_QUALITY, MAX_QUALITY) as i32;
        let mut encoder = image::codecs::gif::GifEncoder::new_with_speed(writer, speed);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| StickerError::Encode(format!("failed to set GIF repeat: {}", e)))?;

        for (i, (frame, delay_ms)) in frames.iter().enumerate() {
            if frame.width != config.width || frame.height != config.height {
                return Err(StickerError::Encode(format!(
                    "frame {} has dimensions {}x{}, expected {}x{}",
                    i, frame.width, frame.height, config.width, config.height
                )));
            }
            let image = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
                .ok_or_else(|| StickerError::Encode(format!("invalid frame data at frame {}", i)))?;
            let gif_frame =
                Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(*delay_ms, 1));
            encoder.encode_frame(gif_frame).map_err(|e| {
                StickerError::Encode(format!("failed to encode GIF frame {}: {}", i, e))
            })?;
        }
        Ok(())
    }

    /// Encode into memory.
    pub fn encode_to_vec(
        frames: &[(FrameBuffer, u32)],
        config: &EncoderConfig,
    ) -> StickerResult<Vec<u8>> {
        let mut out = Vec::new();
        Self::encode_to(&mut out, frames, config)?;
        Ok(out)
    }
}

/// Encoder service producing GIFs on the blocking thread pool.
#[derive(Debug, Clone, Default)]
pub struct GifEncoderService;

#[async_trait]
impl EncoderService for GifEncoderService {
    async fn begin(&self, config: EncoderConfig) -> StickerResult<Box<dyn EncoderSession>> {
        Ok(Box::new(GifSession {
            config,
            frames: Vec::new(),
        }))
    }
}

/// Frames buffered for one GIF.
pub struct GifSession {
    config: EncoderConfig,
    frames: Vec<(FrameBuffer, u32)>,
}

#[async_trait]
impl EncoderSession for GifSession {
    fn add_frame(&mut self, frame: &FrameBuffer, delay_ms: u32) -> StickerResult<()> {
        if frame.width != self.config.width || frame.height != self.config.height {
            return Err(StickerError::Encode(format!(
                "frame {}x{} does not match encoder size {}x{}",
                frame.width, frame.height, self.config.width, self.config.height
            )));
        }
        self.frames.push((frame.clone(), delay_ms));
        Ok(())
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    async fn finish(self: Box<Self>) -> StickerResult<EncodedBlob> {
        let GifSession { config, frames } = *self;
        let count = frames.len();
        let bytes = tokio::task::spawn_blocking(move || GifEncoder::encode_to_vec(&frames, &config))
            .await
            .map_err(|e| StickerError::Encode(format!("GIF worker failed: {}", e)))??;
        tracing::debug!(
            "encoded {} frames to GIF ({}x{}, q{}): {} bytes",
            count,
            config.width,
            config.height,
            config.quality,
            bytes.len()
        );
        Ok(EncodedBlob::new(bytes, GIF_MIME))
    }
}
