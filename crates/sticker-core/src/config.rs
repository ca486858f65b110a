use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{StickerError, StickerResult};
use crate::settings::ExportSettings;
use crate::time::{PlaybackSpeed, DEFAULT_SPEEDS};
use crate::Color;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    /// Fill used when no media item is current.
    pub background: Color,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            background: Color::rgb(0xf8 as f32 / 255.0, 0xf9 as f32 / 255.0, 0xfa as f32 / 255.0),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Base clock increment per tick, before the speed multiplier.
    pub tick_increment: f64,
    pub speeds: Vec<f64>,
    /// Seconds an image stays current before rotation, at 1x.
    pub image_dwell: f64,
    /// Seconds a video stays current before rotation, at 1x.
    pub video_dwell: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_increment: 0.05,
            speeds: DEFAULT_SPEEDS.to_vec(),
            image_dwell: 2.0,
            video_dwell: 3.0,
        }
    }
}

impl PlaybackConfig {
    pub fn speed(&self) -> PlaybackSpeed {
        PlaybackSpeed::new(self.speeds.clone())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    pub quality: u8,
    pub fps: u32,
    pub duration: u32,
    pub optimize: bool,
    /// Size ceiling the optimizer searches under.
    pub ceiling_bytes: u64,
    /// Calibration for the up-front size estimate.
    pub estimate_bytes_per_pixel: f64,
    pub quality_steps: Vec<u8>,
    pub fps_steps: Vec<u32>,
    pub duration_steps: Vec<f64>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            quality: 10,
            fps: 10,
            duration: 3,
            optimize: true,
            ceiling_bytes: 1024 * 1024,
            estimate_bytes_per_pixel: 0.25,
            quality_steps: vec![10, 12, 15, 18, 20],
            fps_steps: vec![10, 8, 6],
            duration_steps: vec![1.0, 0.9, 0.8, 0.7],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FontConfig {
    /// Files tried in order for the fallback font.
    pub search_paths: Vec<PathBuf>,
    /// Family name (case-insensitive) to font file.
    pub families: HashMap<String, PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            search_paths: [
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/TTF/DejaVuSans.ttf",
                "/usr/share/fonts/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
                "/System/Library/Fonts/Supplemental/Arial.ttf",
                "/Library/Fonts/Arial.ttf",
                "C:\\Windows\\Fonts\\arial.ttf",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
            families: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Rate at which video clips are sampled into frames.
    pub video_fps: u32,
    pub max_video_frames: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            video_fps: 10,
            max_video_frames: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StudioConfig {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub fonts: FontConfig,
    #[serde(default)]
    pub decode: DecodeConfig,
}

impl StudioConfig {
    pub fn load_from_file(path: &Path) -> StickerResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> StickerResult<Self> {
        toml::from_str(contents).map_err(|e| StickerError::Config(e.to_string()))
    }

    pub fn save_to_file(&self, path: &Path) -> StickerResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| StickerError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Initial export settings at the configured canvas size.
    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings::new(
            self.export.quality,
            self.export.fps,
            self.export.duration,
            self.canvas.width,
            self.canvas.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StudioConfig::default();
        assert_eq!(config.canvas.width, 300);
        assert_eq!(config.canvas.background.to_string(), "#f8f9fa");
        assert_eq!(config.export.ceiling_bytes, 1_048_576);
        assert_eq!(config.playback.speeds, vec![1.0, 1.5, 2.0, 3.0]);
        assert_eq!(config.export_settings(), ExportSettings::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StudioConfig::from_toml(
            r##"
            [export]
            quality = 15
            ceiling_bytes = 512000

            [canvas]
            background = "#000000"
            "##,
        )
        .unwrap();
        assert_eq!(config.export.quality, 15);
        assert_eq!(config.export.fps, 10);
        assert_eq!(config.export.ceiling_bytes, 512_000);
        assert_eq!(config.canvas.background, Color::BLACK);
        assert_eq!(config.canvas.width, 300);
        assert_eq!(config.decode.video_fps, 10);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = StudioConfig::from_toml("[export]\nquality = \"high\"").unwrap_err();
        assert!(matches!(err, StickerError::Config(_)));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studio.toml");
        let mut config = StudioConfig::default();
        config.export.fps = 8;
        config
            .fonts
            .families
            .insert("impact".into(), PathBuf::from("/fonts/impact.ttf"));
        config.save_to_file(&path).unwrap();

        let loaded = StudioConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.export.fps, 8);
        assert_eq!(
            loaded.fonts.families.get("impact"),
            Some(&PathBuf::from("/fonts/impact.ttf"))
        );
    }
}
