//! Export settings and the adjustments the size optimizer applies to them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest accepted encoder quality value (best quality, largest output).
pub const MIN_QUALITY: u8 = 1;
/// Highest accepted encoder quality value (strongest compression).
pub const MAX_QUALITY: u8 = 20;

/// One export attempt's parameters.
///
/// Values are copied, never shared: the optimizer derives each trial with
/// [`ExportSettings::adjusted`], so settings already handed to an encoder are
/// never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Encoder quality, 1 (best) ..= 20 (most compressed).
    pub quality: u8,
    pub fps: u32,
    /// Whole seconds; the frame count is always `duration * fps`.
    pub duration: u32,
    pub width: u32,
    pub height: u32,
}

impl ExportSettings {
    /// Build settings, clamping quality into range and keeping fps and
    /// duration at one or more.
    pub fn new(quality: u8, fps: u32, duration: u32, width: u32, height: u32) -> Self {
        Self {
            quality: quality.clamp(MIN_QUALITY, MAX_QUALITY),
            fps: fps.max(1),
            duration: duration.max(1),
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn total_frames(&self) -> u32 {
        self.duration * self.fps
    }

    /// Per-frame delay handed to the encoder, in whole milliseconds.
    pub fn frame_delay_ms(&self) -> u32 {
        1000 / self.fps.max(1)
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// A copy with one dimension changed.
    pub fn adjusted(&self, adjustment: AdjustDimension) -> Self {
        let mut next = *self;
        match adjustment {
            AdjustDimension::Quality(q) => next.quality = q.clamp(MIN_QUALITY, MAX_QUALITY),
            AdjustDimension::Fps(fps) => next.fps = fps.max(1),
            AdjustDimension::Duration(factor) => {
                next.duration = ((self.duration as f64 * factor).floor() as u32).max(1)
            }
        }
        next
    }

    /// Settings that differ between `original` and `self`, in display order.
    pub fn changes_from(&self, original: &ExportSettings) -> Vec<SettingChange> {
        let mut changes = Vec::new();
        if self.quality != original.quality {
            changes.push(SettingChange::Quality(original.quality, self.quality));
        }
        if self.fps != original.fps {
            changes.push(SettingChange::Fps(original.fps, self.fps));
        }
        if self.duration != original.duration {
            changes.push(SettingChange::Duration(original.duration, self.duration));
        }
        if self.width != original.width {
            changes.push(SettingChange::Width(original.width, self.width));
        }
        changes
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::new(10, 10, 3, 300, 300)
    }
}

impl fmt::Display for ExportSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "q{} {}fps {}s {}x{}",
            self.quality, self.fps, self.duration, self.width, self.height
        )
    }
}

/// A single-dimension change applied by the optimizer's stepped search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdjustDimension {
    /// Absolute quality value.
    Quality(u8),
    /// Absolute frame rate.
    Fps(u32),
    /// Multiplier on the current duration, truncated to whole seconds.
    Duration(f64),
}

impl fmt::Display for AdjustDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjustDimension::Quality(q) => write!(f, "quality={}", q),
            AdjustDimension::Fps(fps) => write!(f, "fps={}", fps),
            AdjustDimension::Duration(m) => write!(f, "duration×{}", m),
        }
    }
}

/// A before/after pair reported once optimization finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SettingChange {
    Quality(u8, u8),
    Fps(u32, u32),
    Duration(u32, u32),
    Width(u32, u32),
}

impl fmt::Display for SettingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingChange::Quality(a, b) => write!(f, "quality {}→{}", a, b),
            SettingChange::Fps(a, b) => write!(f, "fps {}→{}", a, b),
            SettingChange::Duration(a, b) => write!(f, "duration {}s→{}s", a, b),
            SettingChange::Width(a, b) => write!(f, "width {}px→{}px", a, b),
        }
    }
}

/// Human-readable byte size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `1 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut exp = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && exp < UNITS.len() - 1 {
        value /= 1024.0;
        exp += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exp])
}
