#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sticker_core::frame::FrameBuffer;
use sticker_core::config::FontConfig;
use sticker_core::{Color, StickerError, StickerResult, StudioConfig};
use sticker_encode::{EncodedBlob, EncoderConfig, EncoderService, EncoderSession};
use sticker_render::TextRenderer;
use sticker_studio::{MediaContent, MediaDecoder, MediaFile, MediaKind, Studio, VideoClip};

pub const CANVAS: u32 = 16;

/// Blob size is a pure function of the settings:
/// `frames × pixels × (25 - quality) / 10`.
#[derive(Debug, Default)]
pub struct SizedEncoder {
    pub sessions: AtomicUsize,
}

impl SizedEncoder {
    pub fn expected_size(frames: u64, width: u32, height: u32, quality: u8) -> u64 {
        frames * (width * height) as u64 * (25 - quality as u64) / 10
    }
}

struct SizedSession {
    config: EncoderConfig,
    frames: usize,
}

#[async_trait]
impl EncoderService for SizedEncoder {
    async fn begin(&self, config: EncoderConfig) -> StickerResult<Box<dyn EncoderSession>> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SizedSession { config, frames: 0 }))
    }
}

#[async_trait]
impl EncoderSession for SizedSession {
    fn add_frame(&mut self, frame: &FrameBuffer, _delay_ms: u32) -> StickerResult<()> {
        assert_eq!((frame.width, frame.height), (self.config.width, self.config.height));
        self.frames += 1;
        Ok(())
    }

    fn frame_count(&self) -> usize {
        self.frames
    }

    async fn finish(self: Box<Self>) -> StickerResult<EncodedBlob> {
        let size = SizedEncoder::expected_size(
            self.frames as u64,
            self.config.width,
            self.config.height,
            self.config.quality,
        );
        Ok(EncodedBlob::new(vec![0; size as usize], "image/gif"))
    }
}

/// Every session fails at finish.
pub struct FailingEncoder;

struct FailingSession;

#[async_trait]
impl EncoderService for FailingEncoder {
    async fn begin(&self, _config: EncoderConfig) -> StickerResult<Box<dyn EncoderSession>> {
        Ok(Box::new(FailingSession))
    }
}

#[async_trait]
impl EncoderSession for FailingSession {
    fn add_frame(&mut self, _frame: &FrameBuffer, _delay_ms: u32) -> StickerResult<()> {
        Ok(())
    }

    fn frame_count(&self) -> usize {
        0
    }

    async fn finish(self: Box<Self>) -> StickerResult<EncodedBlob> {
        Err(StickerError::Encode("encoder unavailable".into()))
    }
}

/// Images become a solid frame, videos a short clip of solid frames.
pub struct SolidDecoder;

#[async_trait]
impl MediaDecoder for SolidDecoder {
    async fn decode(&self, kind: MediaKind, _name: &str, bytes: Vec<u8>) -> StickerResult<MediaContent> {
        let shade = bytes.first().copied().unwrap_or(0) as f32 / 255.0;
        let color = Color::rgb(shade, 1.0 - shade, 0.5);
        match kind {
            MediaKind::Image => Ok(MediaContent::Image(FrameBuffer::solid(8, 8, &color))),
            MediaKind::Video => {
                let frames = (0..10)
                    .map(|i| FrameBuffer::solid(8, 8, &Color::rgb(shade, i as f32 / 10.0, 0.0)))
                    .collect();
                Ok(MediaContent::Video(VideoClip::new(frames, 10.0)))
            }
        }
    }
}

pub fn small_config() -> StudioConfig {
    let mut config = StudioConfig::default();
    config.canvas.width = CANVAS;
    config.canvas.height = CANVAS;
    config
}

/// System-font renderer. Layer tests need a font installed.
pub fn text_renderer() -> TextRenderer {
    let text = TextRenderer::from_config(&FontConfig::default());
    assert!(
        text.has_fonts(),
        "no font found in {:?}",
        FontConfig::default().search_paths
    );
    text
}

pub fn studio_with(config: StudioConfig, encoder: Arc<dyn EncoderService>) -> Studio {
    Studio::new(config)
        .with_text_renderer(text_renderer())
        .with_decoder(Arc::new(SolidDecoder))
        .with_encoder(encoder)
}

pub fn studio() -> Studio {
    studio_with(small_config(), Arc::new(SizedEncoder::default()))
}

/// A studio holding `count` decoded images.
pub async fn studio_with_images(count: u8) -> Studio {
    let mut studio = studio();
    for i in 0..count {
        studio.add_media(MediaFile::new(format!("image-{}.png", i), vec![i * 40]));
    }
    assert_eq!(studio.decode_media().await, count as usize);
    studio
}
