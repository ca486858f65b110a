//! Media rotation: which asset is on screen at a given clock time.

use sticker_core::config::PlaybackConfig;

use crate::media::{MediaKind, MediaLibrary};

/// A change of the current asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaSwitch {
    pub from: usize,
    pub to: usize,
}

/// Tracks the current index into the media sequence and rotates through the
/// valid assets as the clock advances. Inert while no asset is valid.
#[derive(Debug, Clone)]
pub struct MediaRotation {
    current_index: usize,
    image_dwell: f64,
    video_dwell: f64,
}

impl MediaRotation {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            current_index: 0,
            image_dwell: config.image_dwell,
            video_dwell: config.video_dwell,
        }
    }

    /// Same dwell times, starting at `index`.
    pub fn starting_at(&self, index: usize) -> Self {
        Self {
            current_index: index,
            ..self.clone()
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn set_current_index(&mut self, index: usize) {
        self.current_index = index;
    }

    /// Time an asset of `kind` stays on screen at `speed`.
    pub fn switch_interval(&self, kind: Option<MediaKind>, speed: f64) -> f64 {
        let dwell = match kind {
            Some(MediaKind::Video) => self.video_dwell,
            _ => self.image_dwell,
        };
        dwell / speed.max(f64::EPSILON)
    }

    /// Index that should be current at `elapsed`, or `None` when nothing is
    /// valid.
    pub fn target_index(&self, library: &MediaLibrary, elapsed: f64, speed: f64) -> Option<usize> {
        let valid = library.valid_indices();
        if valid.is_empty() {
            return None;
        }
        let interval = self.switch_interval(library.kind_at(self.current_index), speed);
        let slot = (elapsed / interval).floor().max(0.0) as usize % valid.len();
        Some(valid[slot])
    }

    /// Move to the target index. Returns the switch when the index changed.
    pub fn update(&mut self, library: &MediaLibrary, elapsed: f64, speed: f64) -> Option<MediaSwitch> {
        let to = self.target_index(library, elapsed, speed)?;
        if to == self.current_index {
            return None;
        }
        let switch = MediaSwitch {
            from: self.current_index,
            to,
        };
        self.current_index = to;
        Some(switch)
    }

    /// If the current index is not a valid asset, move to the first valid
    /// one. Returns true when the current index is valid afterwards.
    pub fn ensure_valid(&mut self, library: &MediaLibrary) -> bool {
        if library.get(self.current_index).is_some_and(|a| a.is_valid()) {
            return true;
        }
        match library.valid_indices().first() {
            Some(&first) => {
                tracing::debug!("current media {} not ready, using {}", self.current_index, first);
                self.current_index = first;
                true
            }
            None => false,
        }
    }

    /// Keep the index inside a library of `len` assets.
    pub fn clamp(&mut self, len: usize) {
        self.current_index = self.current_index.min(len.saturating_sub(1));
    }
}

/// Pause the outgoing video and start the incoming one. Playback failure is
/// logged; the frame keeps rendering from the last decoded frame.
pub fn apply_switch(library: &mut MediaLibrary, switch: MediaSwitch) {
    library.pause(switch.from);
    play_current(library, switch.to);
}

/// Request playback of the asset at `index` if it is a video.
pub fn play_current(library: &mut MediaLibrary, index: usize) {
    if library.kind_at(index) != Some(MediaKind::Video) {
        return;
    }
    match library.play(index) {
        Ok(()) => tracing::debug!("playing media {}", index),
        Err(e) => tracing::warn!("could not play media {}: {}", index, e),
    }
}
