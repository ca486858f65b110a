//! The application-state object.
//!
//! One `Studio` owns everything: layers, media, the live clock and surface,
//! the frame loop and the encoder. Exports take `&mut self`, so no live tick
//! can run while an export is in progress.

use std::sync::Arc;

use rand_core::{OsRng, RngCore};
use sticker_core::frame::{FrameBuffer, PixelFormat};
use sticker_core::{
    AnimationStates, ExportSettings, LayerId, LayerPatch, LayerStore, PlaybackClock, StickerError,
    StickerResult, StudioConfig, TextLayer,
};
use sticker_encode::still::{self, StillImage};
use sticker_encode::{naming, EncoderService, GifEncoderService};
use sticker_render::{Compositor, TextRenderer, VideoDecoder};

use crate::driver::{FrameLoop, TickHandle, TickScheduler};
use crate::export::RenderPass;
use crate::media::{MediaDecoder, MediaFile, MediaLibrary, StandardDecoder};
use crate::optimizer::{OptimizationOutcome, SizeOptimizer, Trial};
use crate::scheduler::{apply_switch, play_current, MediaRotation};
use crate::source::{ExportPrompt, ExportRequest, PromptChoice, SettingsSource};

/// How a GIF export was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Size-optimized search.
    Optimized,
    /// One pass at the requested settings.
    Standard,
    /// One frame of the live surface.
    StaticFrame,
}

#[derive(Debug, Clone)]
pub struct GifExport {
    pub outcome: OptimizationOutcome,
    pub mode: ExportMode,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct PngExport {
    pub still: StillImage,
    pub filename: String,
}

pub struct Studio {
    config: StudioConfig,
    layers: LayerStore,
    animations: AnimationStates,
    media: MediaLibrary,
    rotation: MediaRotation,
    clock: PlaybackClock,
    frame_loop: FrameLoop,
    surface: FrameBuffer,
    text: TextRenderer,
    compositor: Compositor,
    rng: Box<dyn RngCore + Send>,
    decoder: Arc<dyn MediaDecoder>,
    encoder: Arc<dyn EncoderService>,
}

impl Studio {
    /// A studio with system fonts, FFmpeg video decoding and the native GIF
    /// encoder.
    pub fn new(config: StudioConfig) -> Self {
        let text = TextRenderer::from_config(&config.fonts);
        let decoder = StandardDecoder::new(VideoDecoder::from_config(&config.decode));
        Self {
            layers: LayerStore::new(),
            animations: AnimationStates::new(),
            media: MediaLibrary::new(),
            rotation: MediaRotation::new(&config.playback),
            clock: PlaybackClock::new(config.playback.speed()),
            frame_loop: FrameLoop::new(),
            surface: FrameBuffer::new(config.canvas.width, config.canvas.height, PixelFormat::Rgba8),
            text,
            compositor: Compositor::new(config.canvas.background),
            rng: Box::new(OsRng),
            decoder: Arc::new(decoder),
            encoder: Arc::new(GifEncoderService),
            config,
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn EncoderService>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn MediaDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_rng(mut self, rng: Box<dyn RngCore + Send>) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_text_renderer(mut self, text: TextRenderer) -> Self {
        self.text = text;
        self
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    // --- Layers ---

    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    /// The layer field edits apply to.
    pub fn current_layer(&self) -> Option<&TextLayer> {
        self.layers.current()
    }

    pub fn add_layer(&mut self, text: Option<&str>) -> LayerId {
        let id = self.layers.add_layer(text, None, None).id;
        self.render_live();
        id
    }

    /// Remove a layer. False (and no change) for the last layer or an
    /// unknown id.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        if !self.layers.remove_layer(id) {
            return false;
        }
        self.animations.remove(id);
        self.render_live();
        true
    }

    pub fn select_layer(&mut self, id: LayerId) {
        self.layers.set_current(id);
    }

    pub fn update_layer(&mut self, id: LayerId, patch: LayerPatch) {
        self.layers.update(id, patch);
        self.render_live();
    }

    pub fn update_current_layer(&mut self, patch: LayerPatch) {
        self.layers.update_current(patch);
        self.render_live();
    }

    pub fn toggle_layer_visibility(&mut self, id: LayerId) {
        self.layers.toggle_visibility(id);
        self.render_live();
    }

    pub fn toggle_layer_lock(&mut self, id: LayerId) {
        self.layers.toggle_lock(id);
        self.render_live();
    }

    /// Pull pending edits from the host and return its export values.
    pub fn apply_source(&mut self, source: &dyn SettingsSource) -> ExportRequest {
        for (id, patch) in source.layer_field_edits() {
            self.layers.update(id, patch);
        }
        self.render_live();
        source.export_settings()
    }

    // --- Media ---

    pub fn media(&self) -> &MediaLibrary {
        &self.media
    }

    pub fn current_media_index(&self) -> usize {
        self.rotation.current_index()
    }

    pub fn add_media(&mut self, file: MediaFile) -> Option<usize> {
        self.media.add(file)
    }

    pub fn add_media_batch(&mut self, files: Vec<MediaFile>) -> Vec<usize> {
        self.media.add_batch(files)
    }

    /// Decode every pending upload. Returns how many became drawable.
    pub async fn decode_media(&mut self) -> usize {
        let decoder = Arc::clone(&self.decoder);
        let decoded = self.media.decode_pending(decoder.as_ref()).await;
        self.render_live();
        decoded
    }

    /// Remove an asset. Emptying the library stops playback.
    pub fn remove_media(&mut self, index: usize, host: &mut dyn TickScheduler) -> bool {
        if !self.media.remove(index) {
            return false;
        }
        self.rotation.clamp(self.media.len());
        if self.media.is_empty() {
            self.pause(host);
        }
        self.render_live();
        true
    }

    pub fn reorder_media(&mut self, from: usize, to: usize) -> bool {
        let moved = self.media.reorder(from, to);
        if moved {
            self.render_live();
        }
        moved
    }

    /// Stop playback and drop every asset.
    pub fn reset_media(&mut self, host: &mut dyn TickScheduler) {
        self.pause(host);
        let released = self.media.reset();
        self.rotation.set_current_index(0);
        self.clock.reset();
        tracing::info!("media reset ({} released)", released);
        self.render_live();
    }

    // --- Playback ---

    /// Start the live loop. A no-op returning false when no asset is
    /// drawable.
    pub fn play(&mut self, host: &mut dyn TickScheduler) -> bool {
        if !self.rotation.ensure_valid(&self.media) {
            tracing::warn!("nothing to play: no decoded media");
            return false;
        }
        self.clock.set_running(true);
        if self.frame_loop.start(host) {
            play_current(&mut self.media, self.rotation.current_index());
            tracing::info!("playback started at {}", self.clock.speed_control());
        }
        self.render_live();
        true
    }

    /// Stop the live loop and pause every video. No tick runs after this
    /// returns.
    pub fn pause(&mut self, host: &mut dyn TickScheduler) {
        let was_running = self.frame_loop.stop(host);
        self.clock.set_running(false);
        self.media.pause_all();
        if was_running {
            tracing::info!("playback paused at t={:.2}", self.clock.elapsed());
        }
    }

    pub fn is_playing(&self) -> bool {
        self.frame_loop.is_running()
    }

    pub fn speed(&self) -> f64 {
        self.clock.speed()
    }

    /// Next speed step, wrapping.
    pub fn cycle_speed(&mut self) -> f64 {
        let speed = self.clock.speed_control_mut().cycle();
        tracing::info!("playback speed {}x", speed);
        speed
    }

    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    /// Deliver a tick from the host. Stale ticks are ignored; returns whether
    /// a frame was produced.
    pub fn tick(&mut self, handle: TickHandle, host: &mut dyn TickScheduler) -> bool {
        if !self.frame_loop.accept_tick(handle, host) {
            return false;
        }
        let delta = self.clock.advance(self.config.playback.tick_increment);
        let t = self.clock.elapsed();
        let speed = self.clock.speed();

        self.animations
            .update(self.layers.layers(), t, speed, &mut *self.rng);
        if let Some(switch) = self.rotation.update(&self.media, t, speed) {
            tracing::debug!("media {} → {} at t={:.2}", switch.from, switch.to, t);
            apply_switch(&mut self.media, switch);
        }
        self.media.advance_playing(delta);
        self.render_live();
        true
    }

    /// Redraw the live surface from the current state.
    pub fn render_live(&mut self) {
        let background = self.media.frame_at(self.rotation.current_index(), None);
        self.compositor.render_scene(
            &mut self.surface,
            background,
            &self.layers,
            &self.animations,
            &self.text,
        );
    }

    pub fn surface(&self) -> &FrameBuffer {
        &self.surface
    }

    // --- Export ---

    /// A render pass over the current state, starting from the live media
    /// index.
    pub fn render_pass(&mut self) -> RenderPass<'_> {
        RenderPass {
            layers: &self.layers,
            media: &self.media,
            text: &self.text,
            compositor: &self.compositor,
            rotation: self.rotation.clone(),
            speed: self.clock.speed(),
            rng: &mut *self.rng,
            encoder: self.encoder.as_ref(),
        }
    }

    /// Export an animated GIF. While playback is stopped the prompt decides
    /// between starting it, a one-frame GIF, or nothing (`Ok(None)`).
    pub async fn export_gif(
        &mut self,
        request: ExportRequest,
        prompt: &mut dyn ExportPrompt,
        host: &mut dyn TickScheduler,
    ) -> StickerResult<Option<GifExport>> {
        if !self.clock.is_running() {
            match prompt.choose() {
                PromptChoice::Cancel => return Ok(None),
                PromptChoice::StaticFrame => return self.export_static(request).await.map(Some),
                PromptChoice::StartPlayback => {
                    if !self.play(host) {
                        return Err(StickerError::Playback(
                            "cannot start playback without decoded media".into(),
                        ));
                    }
                }
            }
        }

        let settings = request.to_settings(self.config.canvas.width, self.config.canvas.height);
        let optimizer = SizeOptimizer::from_config(&self.config.export);
        tracing::info!(
            "exporting GIF at {} ({})",
            settings,
            if request.optimize { "optimized" } else { "standard" }
        );

        let mut pass = self.render_pass();
        let (outcome, mode) = if request.optimize {
            (optimizer.optimize(&mut pass, settings).await, ExportMode::Optimized)
        } else {
            (standard_export(&mut pass, settings).await, ExportMode::Standard)
        };
        tracing::info!("export finished: {}", outcome.summary());

        Ok(Some(GifExport {
            outcome,
            mode,
            filename: naming::export_filename("gif"),
        }))
    }

    async fn export_static(&mut self, request: ExportRequest) -> StickerResult<GifExport> {
        self.render_live();
        let frame = self.surface.clone();
        let settings = request.to_settings(frame.width, frame.height);
        let output = self.render_pass().run_single(&frame, &settings).await?;
        let size = output.blob.size();
        Ok(GifExport {
            outcome: OptimizationOutcome {
                success: true,
                blob: Some(output.blob),
                settings: output.settings,
                original_settings: settings,
                attempts: 1,
                trials: vec![Trial {
                    settings: output.settings,
                    adjustment: None,
                    size: Some(size),
                    error: None,
                }],
                error: None,
            },
            mode: ExportMode::StaticFrame,
            filename: naming::export_filename("gif"),
        })
    }

    /// Encode the live surface as a PNG data URL.
    pub fn export_png(&mut self) -> StickerResult<PngExport> {
        self.render_live();
        let still = still::export_png(&self.surface)?;
        tracing::info!("PNG export: ~{} bytes", still.estimated_size);
        Ok(PngExport {
            still,
            filename: naming::export_filename("png"),
        })
    }
}

/// One pass at the requested settings, reported in the optimizer's shape.
async fn standard_export(pass: &mut RenderPass<'_>, settings: ExportSettings) -> OptimizationOutcome {
    match pass.run(&settings).await {
        Ok(output) => {
            let size = output.blob.size();
            OptimizationOutcome {
                success: true,
                blob: Some(output.blob),
                settings,
                original_settings: settings,
                attempts: 1,
                trials: vec![Trial {
                    settings,
                    adjustment: None,
                    size: Some(size),
                    error: None,
                }],
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!("export failed: {}", e);
            OptimizationOutcome {
                success: false,
                blob: None,
                settings,
                original_settings: settings,
                attempts: 1,
                trials: vec![Trial {
                    settings,
                    adjustment: None,
                    size: None,
                    error: Some(e.to_string()),
                }],
                error: Some(e.to_string()),
            }
        }
    }
}
