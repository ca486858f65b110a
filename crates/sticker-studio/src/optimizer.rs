//! GIF size optimizer.
//!
//! Finds export settings whose encoded GIF fits under a byte ceiling, trying
//! to give up as little quality as possible. A cheap size estimate picks the
//! starting point, then a stepped search walks quality, frame rate and
//! duration in a fixed order and accepts the first trial that fits. The best
//! oversized result is always kept, so the caller gets something back even
//! when the ceiling cannot be met.

use serde::Serialize;
use sticker_core::config::ExportConfig;
use sticker_core::settings::{format_file_size, SettingChange, MAX_QUALITY, MIN_QUALITY};
use sticker_core::{AdjustDimension, ExportSettings};
use sticker_encode::EncodedBlob;

use crate::export::RenderPass;

/// One render-and-encode attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Trial {
    pub settings: ExportSettings,
    /// The search step that produced these settings; `None` for the
    /// confirming render of the starting settings.
    #[serde(skip)]
    pub adjustment: Option<AdjustDimension>,
    pub size: Option<u64>,
    pub error: Option<String>,
}

impl Trial {
    pub fn fits(&self, ceiling: u64) -> bool {
        self.size.is_some_and(|s| s <= ceiling)
    }
}

/// Final result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    /// The returned blob is at or under the ceiling.
    pub success: bool,
    /// Best blob found; `None` only when every render failed.
    pub blob: Option<EncodedBlob>,
    pub settings: ExportSettings,
    pub original_settings: ExportSettings,
    /// Renders performed.
    pub attempts: u32,
    pub trials: Vec<Trial>,
    pub error: Option<String>,
}

impl OptimizationOutcome {
    pub fn size(&self) -> Option<u64> {
        self.blob.as_ref().map(EncodedBlob::size)
    }

    /// Settings that differ from what was requested.
    pub fn changes(&self) -> Vec<SettingChange> {
        self.settings.changes_from(&self.original_settings)
    }

    /// One-line report for display.
    pub fn summary(&self) -> String {
        let size = self
            .size()
            .map_or_else(|| "no output".to_string(), format_file_size);
        let changes: Vec<String> = self.changes().iter().map(ToString::to_string).collect();
        let changes = if changes.is_empty() {
            "no changes".to_string()
        } else {
            changes.join(", ")
        };
        let status = if self.success { "fits" } else { "over limit" };
        format!(
            "{} ({}) after {} attempt(s): {}",
            size, status, self.attempts, changes
        )
    }
}

/// Search dimensions, tried in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Quality,
    Fps,
    Duration,
}

#[derive(Debug, Clone)]
pub struct SizeOptimizer {
    pub ceiling_bytes: u64,
    pub bytes_per_pixel: f64,
    pub quality_steps: Vec<u8>,
    pub fps_steps: Vec<u32>,
    pub duration_steps: Vec<f64>,
}

impl SizeOptimizer {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            ceiling_bytes: config.ceiling_bytes,
            bytes_per_pixel: config.estimate_bytes_per_pixel,
            quality_steps: config.quality_steps.clone(),
            fps_steps: config.fps_steps.clone(),
            duration_steps: config.duration_steps.clone(),
        }
    }

    pub fn with_ceiling(mut self, ceiling_bytes: u64) -> Self {
        self.ceiling_bytes = ceiling_bytes;
        self
    }

    /// Predicted output size: every frame's pixels, scaled up 10% per asset.
    pub fn estimate_bytes(&self, settings: &ExportSettings, asset_count: usize) -> f64 {
        let complexity = 1.0 + 0.1 * asset_count as f64;
        settings.duration as f64
            * settings.fps as f64
            * settings.pixel_count() as f64
            * complexity
            * self.bytes_per_pixel
    }

    /// Starting settings for the search, and whether the estimate says the
    /// requested settings already fit.
    pub fn estimate_start(&self, settings: &ExportSettings, asset_count: usize) -> (ExportSettings, bool) {
        let estimate = self.estimate_bytes(settings, asset_count);
        if estimate <= self.ceiling_bytes as f64 {
            return (*settings, true);
        }
        let ratio = self.ceiling_bytes as f64 / estimate;
        let start = if ratio > 0.7 {
            let quality = (settings.quality as f64 * 1.5).ceil() as u8;
            settings.adjusted(AdjustDimension::Quality(quality.clamp(MIN_QUALITY, MAX_QUALITY)))
        } else if ratio > 0.5 {
            settings
                .adjusted(AdjustDimension::Quality(15))
                .adjusted(AdjustDimension::Fps(8))
        } else {
            settings
                .adjusted(AdjustDimension::Quality(18))
                .adjusted(AdjustDimension::Fps(6))
                .adjusted(AdjustDimension::Duration(0.8))
        };
        tracing::info!(
            "estimated {} exceeds {}; starting search at {}",
            format_file_size(estimate as u64),
            format_file_size(self.ceiling_bytes),
            start
        );
        (start, false)
    }

    fn candidates(&self, dimension: Dimension) -> Vec<AdjustDimension> {
        match dimension {
            Dimension::Quality => self
                .quality_steps
                .iter()
                .map(|q| AdjustDimension::Quality(*q))
                .collect(),
            Dimension::Fps => self.fps_steps.iter().map(|f| AdjustDimension::Fps(*f)).collect(),
            Dimension::Duration => self
                .duration_steps
                .iter()
                .map(|m| AdjustDimension::Duration(*m))
                .collect(),
        }
    }

    /// Run the full search.
    pub async fn optimize(&self, pass: &mut RenderPass<'_>, settings: ExportSettings) -> OptimizationOutcome {
        let mut search = Search::new(self.ceiling_bytes, settings);
        let (start, fits) = self.estimate_start(&settings, pass.asset_count());

        // Single confirming render; the search only runs if it misses.
        if fits && search.attempt(pass, start, None).await {
            return search.finish();
        }

        let mut baseline = start;
        for dimension in [Dimension::Quality, Dimension::Fps, Dimension::Duration] {
            for adjustment in self.candidates(dimension) {
                let candidate = baseline.adjusted(adjustment);
                if candidate == baseline || search.tried(&candidate) {
                    continue;
                }
                if search.attempt(pass, candidate, Some(adjustment)).await {
                    return search.finish();
                }
                if search.best_settings() == Some(candidate) {
                    baseline = candidate;
                }
                tokio::task::yield_now().await;
            }
            if let Some(best) = search.best_settings() {
                baseline = best;
            }
        }
        search.finish()
    }
}

impl Default for SizeOptimizer {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

/// Bookkeeping for one optimization run.
struct Search {
    ceiling: u64,
    original: ExportSettings,
    trials: Vec<Trial>,
    best: Option<(EncodedBlob, ExportSettings)>,
}

impl Search {
    fn new(ceiling: u64, original: ExportSettings) -> Self {
        Self {
            ceiling,
            original,
            trials: Vec::new(),
            best: None,
        }
    }

    fn tried(&self, settings: &ExportSettings) -> bool {
        self.trials.iter().any(|t| t.settings == *settings)
    }

    fn best_settings(&self) -> Option<ExportSettings> {
        self.best.as_ref().map(|(_, s)| *s)
    }

    /// Render one trial. Returns true when it fits the ceiling.
    async fn attempt(
        &mut self,
        pass: &mut RenderPass<'_>,
        settings: ExportSettings,
        adjustment: Option<AdjustDimension>,
    ) -> bool {
        match pass.run(&settings).await {
            Ok(output) => {
                let size = output.blob.size();
                let fits = size <= self.ceiling;
                tracing::info!(
                    "trial {}: {} ({})",
                    settings,
                    format_file_size(size),
                    if fits { "fits" } else { "too large" }
                );
                self.trials.push(Trial {
                    settings,
                    adjustment,
                    size: Some(size),
                    error: None,
                });
                let improves = self.best.as_ref().map_or(true, |(b, _)| size < b.size());
                if fits || improves {
                    self.best = Some((output.blob, settings));
                }
                fits
            }
            Err(e) => {
                tracing::warn!("trial {} failed: {}", settings, e);
                self.trials.push(Trial {
                    settings,
                    adjustment,
                    size: None,
                    error: Some(e.to_string()),
                });
                false
            }
        }
    }

    fn finish(self) -> OptimizationOutcome {
        let attempts = self.trials.len() as u32;
        match self.best {
            Some((blob, settings)) => {
                let success = blob.size() <= self.ceiling;
                if !success {
                    tracing::warn!(
                        "could not reach {}; best was {} at {}",
                        format_file_size(self.ceiling),
                        format_file_size(blob.size()),
                        settings
                    );
                }
                OptimizationOutcome {
                    success,
                    blob: Some(blob),
                    settings,
                    original_settings: self.original,
                    attempts,
                    trials: self.trials,
                    error: None,
                }
            }
            None => OptimizationOutcome {
                success: false,
                blob: None,
                settings: self.original,
                original_settings: self.original,
                attempts,
                trials: self.trials,
                error: Some(format!(
                    "could not produce a GIF under {}: every attempt failed",
                    format_file_size(self.ceiling)
                )),
            },
        }
    }
}
