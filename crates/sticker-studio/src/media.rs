//! Media library: uploaded images and video clips used as rotating
//! background content.
//!
//! Assets are decoded asynchronously; the rest of the engine only ever sees
//! the settled [`DecodeState`].

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

use sticker_core::frame::FrameBuffer;
use sticker_core::{StickerError, StickerResult};
use sticker_render::image_loader;
use sticker_render::VideoDecoder;

const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "webm", "mov", "avi", "m4v", "3gp", "mkv"];
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Decide the kind of an upload from its declared MIME type, falling back to
/// the file extension. `None` means the file is not usable media.
pub fn classify(name: &str, mime: Option<&str>) -> Option<MediaKind> {
    if let Some(mime) = mime.map(str::to_ascii_lowercase) {
        if mime.starts_with("video/") {
            return Some(MediaKind::Video);
        }
        if mime.starts_with("image/") {
            return Some(MediaKind::Image);
        }
    }
    let ext = extension(name)?;
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else {
        None
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// An upload as handed over by the host.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    /// Declared MIME type, if the host knows it.
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk.
    pub fn read(path: &Path) -> StickerResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| StickerError::asset(format!("failed to read media: {}", e), path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeState {
    Pending,
    Decoded,
    Failed(String),
}

/// A decoded video sampled into frames, with its own playback position.
#[derive(Debug, Clone)]
pub struct VideoClip {
    frames: Vec<FrameBuffer>,
    fps: f64,
    position: f64,
    playing: bool,
}

impl VideoClip {
    pub fn new(frames: Vec<FrameBuffer>, fps: f64) -> Self {
        Self {
            frames,
            fps: if fps > 0.0 { fps } else { 1.0 },
            position: 0.0,
            playing: false,
        }
    }

    /// Clip length in seconds.
    pub fn duration(&self) -> f64 {
        self.frames.len() as f64 / self.fps
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start playback. Idempotent; fails only when there is nothing to show.
    pub fn play(&mut self) -> StickerResult<()> {
        if self.frames.is_empty() {
            return Err(StickerError::Playback("video has no decoded frames".into()));
        }
        self.playing = true;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Move the playback position forward, looping at the end. No-op while
    /// paused.
    pub fn advance(&mut self, delta: f64) {
        if !self.playing || self.frames.is_empty() {
            return;
        }
        self.position = (self.position + delta).rem_euclid(self.duration());
    }

    /// Frame shown at media time `t`, looping.
    pub fn frame_at(&self, t: f64) -> Option<&FrameBuffer> {
        if self.frames.is_empty() {
            return None;
        }
        let looped = t.max(0.0).rem_euclid(self.duration());
        let index = ((looped * self.fps).floor() as usize).min(self.frames.len() - 1);
        self.frames.get(index)
    }

    /// Frame at the current playback position.
    pub fn current_frame(&self) -> Option<&FrameBuffer> {
        self.frame_at(self.position)
    }
}

/// Drawable content of a decoded asset.
#[derive(Debug, Clone)]
pub enum MediaContent {
    Image(FrameBuffer),
    Video(VideoClip),
}

impl MediaContent {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaContent::Image(_) => MediaKind::Image,
            MediaContent::Video(_) => MediaKind::Video,
        }
    }

    /// Intrinsic size of the content.
    pub fn size(&self) -> Option<(u32, u32)> {
        match self {
            MediaContent::Image(fb) => Some((fb.width, fb.height)),
            MediaContent::Video(clip) => clip.frame_at(0.0).map(|fb| (fb.width, fb.height)),
        }
    }
}

/// One uploaded asset.
#[derive(Debug)]
pub struct MediaAsset {
    pub name: String,
    pub kind: MediaKind,
    pub mime: Option<String>,
    bytes: Option<Vec<u8>>,
    state: DecodeState,
    content: Option<MediaContent>,
}

impl MediaAsset {
    fn new(file: MediaFile, kind: MediaKind) -> Self {
        let mime = file.mime.or_else(|| {
            mime_guess::from_path(&file.name)
                .first_raw()
                .map(str::to_string)
        });
        Self {
            name: file.name,
            kind,
            mime,
            bytes: Some(file.bytes),
            state: DecodeState::Pending,
            content: None,
        }
    }

    pub fn state(&self) -> &DecodeState {
        &self.state
    }

    /// Decoded and drawable.
    pub fn is_valid(&self) -> bool {
        self.state == DecodeState::Decoded && self.content.is_some()
    }

    pub fn content(&self) -> Option<&MediaContent> {
        self.content.as_ref()
    }

    pub fn video(&self) -> Option<&VideoClip> {
        match &self.content {
            Some(MediaContent::Video(clip)) => Some(clip),
            _ => None,
        }
    }

    fn video_mut(&mut self) -> Option<&mut VideoClip> {
        match &mut self.content {
            Some(MediaContent::Video(clip)) => Some(clip),
            _ => None,
        }
    }

    /// Whether the raw upload is still held.
    pub fn holds_bytes(&self) -> bool {
        self.bytes.is_some()
    }

    /// Drop the raw upload. Returns false if it was already released.
    fn release(&mut self) -> bool {
        match self.bytes.take() {
            Some(bytes) => {
                tracing::debug!("released {} ({} bytes)", self.name, bytes.len());
                true
            }
            None => false,
        }
    }

    /// Background frame at media time `t`, or at the live playback position
    /// when `t` is `None`.
    fn frame(&self, t: Option<f64>) -> Option<&FrameBuffer> {
        if !self.is_valid() {
            return None;
        }
        match self.content.as_ref()? {
            MediaContent::Image(fb) => Some(fb),
            MediaContent::Video(clip) => match t {
                Some(t) => clip.frame_at(t),
                None => clip.current_frame(),
            },
        }
    }
}

/// Turns raw uploads into drawable content.
#[async_trait]
pub trait MediaDecoder: Send + Sync {
    async fn decode(&self, kind: MediaKind, name: &str, bytes: Vec<u8>) -> StickerResult<MediaContent>;
}

/// Decodes images with the `image` crate and video through FFmpeg, both on
/// the blocking thread pool.
#[derive(Debug, Clone, Default)]
pub struct StandardDecoder {
    video: VideoDecoder,
}

impl StandardDecoder {
    pub fn new(video: VideoDecoder) -> Self {
        Self { video }
    }
}

#[async_trait]
impl MediaDecoder for StandardDecoder {
    async fn decode(&self, kind: MediaKind, name: &str, bytes: Vec<u8>) -> StickerResult<MediaContent> {
        match kind {
            MediaKind::Image => {
                let frame = tokio::task::spawn_blocking(move || image_loader::decode_image(&bytes))
                    .await
                    .map_err(|e| StickerError::Decode(format!("decode task failed: {}", e)))??;
                Ok(MediaContent::Image(frame))
            }
            MediaKind::Video => {
                let decoder = self.video.clone();
                let ext = extension(name).unwrap_or_else(|| "mp4".to_string());
                let clip = tokio::task::spawn_blocking(move || decoder.decode_bytes(&bytes, &ext))
                    .await
                    .map_err(|e| StickerError::Decode(format!("decode task failed: {}", e)))??;
                Ok(MediaContent::Video(VideoClip::new(clip.frames, clip.fps)))
            }
        }
    }
}

/// Ordered sequence of uploaded assets.
#[derive(Debug, Default)]
pub struct MediaLibrary {
    assets: Vec<MediaAsset>,
}

impl MediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one upload. Unrecognised files are rejected with `None`.
    pub fn add(&mut self, file: MediaFile) -> Option<usize> {
        let Some(kind) = classify(&file.name, file.mime.as_deref()) else {
            tracing::warn!("unsupported media file: {}", file.name);
            return None;
        };
        tracing::info!("added {:?} {}", kind, file.name);
        self.assets.push(MediaAsset::new(file, kind));
        Some(self.assets.len() - 1)
    }

    /// Append several uploads, sorted by file name first.
    pub fn add_batch(&mut self, mut files: Vec<MediaFile>) -> Vec<usize> {
        files.sort_by(|a, b| a.name.cmp(&b.name));
        files.into_iter().filter_map(|f| self.add(f)).collect()
    }

    /// Append content that is already decoded.
    pub fn push_decoded(&mut self, name: impl Into<String>, content: MediaContent) -> usize {
        let name = name.into();
        let mime = mime_guess::from_path(&name).first_raw().map(str::to_string);
        self.assets.push(MediaAsset {
            name,
            kind: content.kind(),
            mime,
            bytes: None,
            state: DecodeState::Decoded,
            content: Some(content),
        });
        self.assets.len() - 1
    }

    /// Settle every pending asset. Failures are recorded on the asset and do
    /// not affect the others. Returns how many decoded successfully.
    pub async fn decode_pending(&mut self, decoder: &dyn MediaDecoder) -> usize {
        let mut decoded = 0;
        for asset in self.assets.iter_mut() {
            if asset.state != DecodeState::Pending {
                continue;
            }
            let Some(bytes) = asset.bytes.clone() else {
                asset.state = DecodeState::Failed("media bytes were released".into());
                continue;
            };
            match decoder.decode(asset.kind, &asset.name, bytes).await {
                Ok(content) => {
                    if let Some((w, h)) = content.size() {
                        tracing::info!("decoded {} ({}x{})", asset.name, w, h);
                    }
                    asset.kind = content.kind();
                    asset.content = Some(content);
                    asset.state = DecodeState::Decoded;
                    decoded += 1;
                }
                Err(e) => {
                    tracing::warn!("failed to decode {}: {}", asset.name, e);
                    asset.state = DecodeState::Failed(e.to_string());
                }
            }
        }
        decoded
    }

    /// Remove an asset, releasing its upload.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.assets.len() {
            return false;
        }
        let mut asset = self.assets.remove(index);
        asset.release();
        true
    }

    /// Move the asset at `from` to position `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.assets.len() || to >= self.assets.len() {
            return false;
        }
        let asset = self.assets.remove(from);
        self.assets.insert(to, asset);
        true
    }

    /// Release every asset exactly once and empty the library.
    pub fn reset(&mut self) -> usize {
        let released = self
            .assets
            .iter_mut()
            .map(MediaAsset::release)
            .filter(|released| *released)
            .count();
        self.assets.clear();
        released
    }

    pub fn assets(&self) -> &[MediaAsset] {
        &self.assets
    }

    pub fn get(&self, index: usize) -> Option<&MediaAsset> {
        self.assets.get(index)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn kind_at(&self, index: usize) -> Option<MediaKind> {
        self.assets.get(index).map(|a| a.kind)
    }

    /// Indices of decoded, drawable assets in sequence order.
    pub fn valid_indices(&self) -> Vec<usize> {
        self.assets
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_valid())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_valid(&self) -> bool {
        self.assets.iter().any(MediaAsset::is_valid)
    }

    /// Background at `index` for media time `t`; `None` uses the live
    /// playback position for video.
    pub fn frame_at(&self, index: usize, t: Option<f64>) -> Option<&FrameBuffer> {
        self.assets.get(index)?.frame(t)
    }

    /// Start the video at `index`. Non-video assets are a no-op.
    pub fn play(&mut self, index: usize) -> StickerResult<()> {
        match self.assets.get_mut(index).and_then(MediaAsset::video_mut) {
            Some(clip) => clip.play(),
            None => Ok(()),
        }
    }

    pub fn pause(&mut self, index: usize) {
        if let Some(clip) = self.assets.get_mut(index).and_then(MediaAsset::video_mut) {
            clip.pause();
        }
    }

    pub fn pause_all(&mut self) {
        for clip in self.assets.iter_mut().filter_map(MediaAsset::video_mut) {
            clip.pause();
        }
    }

    /// Advance every playing video by `delta`.
    pub fn advance_playing(&mut self, delta: f64) {
        for clip in self.assets.iter_mut().filter_map(MediaAsset::video_mut) {
            clip.advance(delta);
        }
    }
}
