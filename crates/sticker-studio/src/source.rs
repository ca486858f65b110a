//! Capabilities the host supplies: user-entered values and the
//! "playback is not running" prompt.

use serde::{Deserialize, Serialize};
use sticker_core::config::ExportConfig;
use sticker_core::{ExportSettings, LayerId, LayerPatch};

/// Export values as entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRequest {
    pub quality: u8,
    pub fps: u32,
    /// Whole seconds.
    pub duration: u32,
    /// Search for settings under the size ceiling.
    pub optimize: bool,
}

impl ExportRequest {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            quality: config.quality,
            fps: config.fps,
            duration: config.duration,
            optimize: config.optimize,
        }
    }

    /// Settings for a surface of `width × height`.
    pub fn to_settings(&self, width: u32, height: u32) -> ExportSettings {
        ExportSettings::new(self.quality, self.fps, self.duration, width, height)
    }
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

/// Where the engine reads user input from. The engine never looks at any
/// UI itself.
pub trait SettingsSource {
    fn export_settings(&self) -> ExportRequest;

    /// Pending field edits, applied in order.
    fn layer_field_edits(&self) -> Vec<(LayerId, LayerPatch)>;
}

/// Answer to "playback is stopped; what should export do?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    /// Start live playback, then export the animation.
    StartPlayback,
    /// Export the current frame as a one-frame GIF.
    StaticFrame,
    Cancel,
}

pub trait ExportPrompt {
    fn choose(&mut self) -> PromptChoice;
}

/// A prompt that always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedChoice(pub PromptChoice);

impl ExportPrompt for FixedChoice {
    fn choose(&mut self) -> PromptChoice {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_follow_config() {
        let request = ExportRequest::default();
        assert_eq!((request.quality, request.fps, request.duration), (10, 10, 3));
        assert!(request.optimize);
        assert_eq!(request.to_settings(300, 300), ExportSettings::default());
    }

    #[test]
    fn test_request_clamps_through_settings() {
        let request = ExportRequest {
            quality: 40,
            fps: 0,
            duration: 0,
            optimize: false,
        };
        let settings = request.to_settings(120, 80);
        assert_eq!((settings.quality, settings.fps, settings.duration), (20, 1, 1));
    }
}
