//! Project files: a TOML description of one sticker.
//!
//! ```toml
//! media = ["cat.png", "clip.mp4"]
//!
//! [export]
//! quality = 10
//! fps = 10
//! duration = 3
//! optimize = true
//!
//! [[layers]]
//! text = "Hello!"
//! animation = "bounce"
//! color = "#ff6b6b"
//!
//! [studio.canvas]
//! width = 300
//! height = 300
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sticker_core::{AnimationKind, Color, LayerId, LayerPatch, StudioConfig};
use sticker_studio::{ExportRequest, MediaFile, SettingsSource, Studio};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub media: Vec<PathBuf>,
    pub export: ExportRequest,
    pub layers: Vec<LayerPatch>,
    pub studio: StudioConfig,
    /// Directory media paths are relative to.
    #[serde(skip)]
    pub base_dir: PathBuf,
    /// Studio ids of `layers`, filled by [`Project::build_layers`].
    #[serde(skip)]
    layer_ids: Vec<LayerId>,
}

impl Project {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read project: {}", path.display()))?;
        let mut project: Project = toml::from_str(&contents)
            .with_context(|| format!("invalid project file: {}", path.display()))?;
        project.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(project)
    }

    /// A starter project with one animated layer.
    pub fn sample() -> Self {
        Self {
            layers: vec![LayerPatch {
                text: Some("Hello!".into()),
                color: Some(Color::rgb(1.0, 107.0 / 255.0, 107.0 / 255.0)),
                animation: Some(AnimationKind::Bounce),
                ..LayerPatch::default()
            }],
            ..Self::default()
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize project")
    }

    pub fn media_paths(&self) -> Vec<PathBuf> {
        self.media.iter().map(|p| self.base_dir.join(p)).collect()
    }

    /// Create one studio layer per entry. The studio's initial layer takes
    /// the first entry.
    pub fn build_layers(&mut self, studio: &mut Studio) {
        self.layer_ids.clear();
        for i in 0..self.layers.len() {
            let id = match (i, studio.current_layer()) {
                (0, Some(layer)) => layer.id,
                _ => studio.add_layer(None),
            };
            self.layer_ids.push(id);
        }
    }

    /// Read every media file into the studio and decode it.
    pub async fn load_media(&self, studio: &mut Studio) -> Result<usize> {
        let mut files = Vec::new();
        for path in self.media_paths() {
            let file = MediaFile::read(&path)
                .with_context(|| format!("failed to read media: {}", path.display()))?;
            files.push(file);
        }
        let accepted = studio.add_media_batch(files).len();
        if accepted < self.media.len() {
            tracing::warn!(
                "{} media file(s) skipped: unsupported type",
                self.media.len() - accepted
            );
        }
        Ok(studio.decode_media().await)
    }
}

impl SettingsSource for Project {
    fn export_settings(&self) -> ExportRequest {
        self.export
    }

    fn layer_field_edits(&self) -> Vec<(LayerId, LayerPatch)> {
        self.layer_ids
            .iter()
            .copied()
            .zip(self.layers.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project() {
        let project: Project = toml::from_str(
            r##"
media = ["a.png"]

[export]
fps = 8
optimize = false

[[layers]]
text = "Hi"
animation = "wave"
color = "#00ff00"

[studio.canvas]
width = 64
height = 48
"##,
        )
        .unwrap();
        assert_eq!(project.media, vec![PathBuf::from("a.png")]);
        assert_eq!(project.export.fps, 8);
        assert_eq!(project.export.quality, 10);
        assert!(!project.export.optimize);
        assert_eq!(project.layers[0].animation, Some(AnimationKind::Wave));
        assert_eq!(project.studio.canvas.width, 64);
        assert_eq!(project.studio.export.fps, 10);
    }

    #[test]
    fn test_sample_round_trips_through_toml() {
        let text = Project::sample().to_toml().unwrap();
        let project: Project = toml::from_str(&text).unwrap();
        assert_eq!(project.layers, Project::sample().layers);
    }

    #[test]
    fn test_media_paths_are_relative_to_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sticker.toml");
        std::fs::write(&path, "media = [\"img/cat.png\"]\n").unwrap();
        let project = Project::load(&path).unwrap();
        assert_eq!(project.media_paths(), vec![dir.path().join("img/cat.png")]);
    }

    #[test]
    fn test_missing_project_reports_path() {
        let err = Project::load(Path::new("/nonexistent/sticker.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/sticker.toml"));
    }
}
