//! The render-all-frames-and-encode pass shared by every export.
//!
//! A pass never touches live playback state: it runs its own clock, its own
//! media rotation and animation states, and draws onto a private surface
//! sized for the trial.

use rand_core::RngCore;
use sticker_core::frame::{FrameBuffer, PixelFormat};
use sticker_core::hash::{ContentHash, SequenceHasher};
use sticker_core::{AnimationStates, ExportSettings, LayerStore, PlaybackClock, StickerResult};
use sticker_encode::{EncodedBlob, EncoderConfig, EncoderService};
use sticker_render::{Compositor, TextRenderer};

use crate::media::MediaLibrary;
use crate::scheduler::MediaRotation;

/// Result of one complete pass.
#[derive(Debug, Clone)]
pub struct PassOutput {
    pub blob: EncodedBlob,
    pub settings: ExportSettings,
    pub frame_count: u32,
    /// Digest over every submitted frame, in order.
    pub digest: ContentHash,
}

/// Everything a pass reads, borrowed from the application state.
pub struct RenderPass<'a> {
    pub layers: &'a LayerStore,
    pub media: &'a MediaLibrary,
    pub text: &'a TextRenderer,
    pub compositor: &'a Compositor,
    /// Dwell configuration and the starting index.
    pub rotation: MediaRotation,
    pub speed: f64,
    pub rng: &'a mut dyn RngCore,
    pub encoder: &'a dyn EncoderService,
}

impl<'a> RenderPass<'a> {
    /// Assets counted by the optimizer's size estimate.
    pub fn asset_count(&self) -> usize {
        self.media.len()
    }

    /// Render `duration × fps` frames at clock time `i / fps` and encode
    /// them. Encoder errors abort the pass.
    pub async fn run(&mut self, settings: &ExportSettings) -> StickerResult<PassOutput> {
        let total = settings.total_frames();
        let delay = settings.frame_delay_ms();
        let mut session = self.encoder.begin(EncoderConfig::from(settings)).await?;

        let mut surface = FrameBuffer::new(settings.width, settings.height, PixelFormat::Rgba8);
        let mut clock = PlaybackClock::default();
        let mut rotation = self.rotation.clone();
        let mut states = AnimationStates::new();
        let mut hasher = SequenceHasher::new();

        for i in 0..total {
            clock.set_elapsed(i as f64 / settings.fps as f64);
            let t = clock.elapsed();
            rotation.update(self.media, t, self.speed);
            states.update(self.layers.layers(), t, self.speed, &mut *self.rng);

            let background = self.media.frame_at(rotation.current_index(), Some(t));
            self.compositor
                .render_scene(&mut surface, background, self.layers, &states, self.text);

            hasher.push(&surface);
            session.add_frame(&surface, delay)?;
            tokio::task::yield_now().await;
        }

        let blob = session.finish().await?;
        tracing::info!("pass {} → {} bytes ({} frames)", settings, blob.size(), total);
        Ok(PassOutput {
            blob,
            settings: *settings,
            frame_count: total,
            digest: hasher.finish(),
        })
    }

    /// Encode one already-rendered frame as a single-frame GIF.
    pub async fn run_single(
        &mut self,
        frame: &FrameBuffer,
        settings: &ExportSettings,
    ) -> StickerResult<PassOutput> {
        let settings = ExportSettings {
            width: frame.width,
            height: frame.height,
            duration: 1,
            ..*settings
        };
        let mut session = self.encoder.begin(EncoderConfig::from(&settings)).await?;
        session.add_frame(frame, settings.frame_delay_ms())?;
        let blob = session.finish().await?;

        let mut hasher = SequenceHasher::new();
        hasher.push(frame);
        tracing::info!("static frame → {} bytes", blob.size());
        Ok(PassOutput {
            blob,
            settings,
            frame_count: 1,
            digest: hasher.finish(),
        })
    }
}
