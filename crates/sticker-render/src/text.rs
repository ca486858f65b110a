//! Text rendering module.
//! Uses fontdue for CPU-based font rasterization.
//!
//! Text is drawn the way a sticker caption is: a dark outline first, then the
//! fill on top, every line horizontally centered on the anchor and the whole
//! block vertically centered on it.

use std::collections::HashMap;
use std::path::Path;

use fontdue::{Font, FontSettings};
use sticker_core::config::FontConfig;
use sticker_core::frame::FrameBuffer;
use sticker_core::layer::FontWeight;
use sticker_core::{Color, PixelFormat, StickerError, StickerResult};

/// Line advance as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.3;
pub const DEFAULT_STROKE_WIDTH: f32 = 2.0;

/// How one run of text should look.
#[derive(Debug, Clone)]
pub struct TextStyle<'a> {
    /// Comma-separated family list; the first registered family wins.
    pub family: &'a str,
    pub size: f32,
    pub weight: FontWeight,
    pub fill: Color,
    /// Outline color and line width, drawn beneath the fill.
    pub stroke: Option<(Color, f32)>,
}

impl<'a> TextStyle<'a> {
    pub fn new(family: &'a str, size: f32, fill: Color) -> Self {
        Self {
            family,
            size,
            weight: FontWeight::Normal,
            fill,
            stroke: Some((Color::BLACK, DEFAULT_STROKE_WIDTH)),
        }
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }
}

/// Rasterized text plus the point in sprite space that maps to the layer's
/// anchor position.
#[derive(Debug, Clone)]
pub struct TextSprite {
    pub buffer: FrameBuffer,
    pub anchor_x: f64,
    pub anchor_y: f64,
}

/// A rasterized glyph placed relative to the anchor.
struct PlacedGlyph {
    x: i32,
    y: i32,
    width: usize,
    height: usize,
    coverage: Vec<u8>,
}

/// Rasterizes text to a FrameBuffer.
pub struct TextRenderer {
    font_cache: HashMap<String, Font>,
    default_font: Option<Font>,
}

impl TextRenderer {
    /// A renderer with no fonts. Text is skipped until one is loaded.
    pub fn new() -> Self {
        Self {
            font_cache: HashMap::new(),
            default_font: None,
        }
    }

    /// Load the configured family map and the first usable fallback font.
    /// Missing files are logged and skipped.
    pub fn from_config(config: &FontConfig) -> Self {
        let mut renderer = Self::new();
        for (family, path) in &config.families {
            if let Err(e) = renderer.load_font(family, path) {
                tracing::warn!("skipping font family '{}': {}", family, e);
            }
        }
        for path in &config.search_paths {
            match read_font(path) {
                Ok(font) => {
                    tracing::debug!("default font: {}", path.display());
                    renderer.default_font = Some(font);
                    break;
                }
                Err(e) => tracing::trace!("font candidate unavailable: {}", e),
            }
        }
        if renderer.default_font.is_none() {
            tracing::warn!("no default font found; text layers will not be drawn");
        }
        renderer
    }

    /// Register a font file under a family name (case-insensitive).
    pub fn load_font(&mut self, name: &str, path: &Path) -> StickerResult<()> {
        let font = read_font(path)?;
        self.font_cache.insert(family_key(name), font);
        Ok(())
    }

    /// Register a font from memory.
    pub fn load_font_bytes(&mut self, name: &str, data: Vec<u8>) -> StickerResult<()> {
        let font = parse_font(name, data)?;
        self.font_cache.insert(family_key(name), font);
        Ok(())
    }

    /// Whether any family at all can be drawn.
    pub fn has_fonts(&self) -> bool {
        self.default_font.is_some() || !self.font_cache.is_empty()
    }

    /// Resolve a CSS-style family list to a font.
    fn resolve(&self, family_list: &str) -> Option<&Font> {
        family_list
            .split(',')
            .map(family_key)
            .find_map(|key| self.font_cache.get(&key))
            .or(self.default_font.as_ref())
            .or_else(|| self.font_cache.values().next())
    }

    /// Rasterize `text`. Returns `None` when there is nothing to draw: no
    /// font, or every line is blank.
    pub fn render(&self, text: &str, style: &TextStyle<'_>) -> Option<TextSprite> {
        let font = self.resolve(style.family)?;
        if style.size <= 0.0 {
            return None;
        }
        let size = style.size;

        let (ascent, descent) = match font.horizontal_line_metrics(size) {
            Some(m) => (m.ascent, m.descent),
            None => (size * 0.8, -size * 0.2),
        };
        // Offset from a line's vertical middle to its baseline.
        let middle_to_baseline = (ascent + descent) / 2.0;

        let lines: Vec<&str> = text.split('\n').collect();
        let line_height = size * LINE_HEIGHT_FACTOR;
        let start_y = -((lines.len() as f32 - 1.0) * line_height) / 2.0;

        let mut glyphs = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            // Blank lines keep their slot in the block.
            if line.trim().is_empty() {
                continue;
            }
            let width: f32 = line
                .chars()
                .map(|ch| font.metrics(ch, size).advance_width)
                .sum();
            let baseline = start_y + i as f32 * line_height + middle_to_baseline;
            let mut cursor_x = -width / 2.0;
            for ch in line.chars() {
                let (metrics, coverage) = font.rasterize(ch, size);
                if metrics.width > 0 && metrics.height > 0 {
                    glyphs.push(PlacedGlyph {
                        x: (cursor_x + metrics.xmin as f32).round() as i32,
                        y: (baseline - (metrics.height as i32 + metrics.ymin) as f32).round() as i32,
                        width: metrics.width,
                        height: metrics.height,
                        coverage,
                    });
                }
                cursor_x += metrics.advance_width;
            }
        }
        if glyphs.is_empty() {
            return None;
        }

        let bold_radius = match style.weight {
            FontWeight::Bold => (size / 24.0).ceil().max(1.0) as i32,
            FontWeight::Normal => 0,
        };
        let stroke_radius = style
            .stroke
            .map_or(0, |(_, w)| (w / 2.0).ceil().max(0.0) as i32);
        let pad = bold_radius + stroke_radius + 1;

        let min_x = glyphs.iter().map(|g| g.x).min().unwrap_or(0) - pad;
        let min_y = glyphs.iter().map(|g| g.y).min().unwrap_or(0) - pad;
        let max_x = glyphs.iter().map(|g| g.x + g.width as i32).max().unwrap_or(0) + pad;
        let max_y = glyphs.iter().map(|g| g.y + g.height as i32).max().unwrap_or(0) + pad;
        let width = (max_x - min_x).max(1) as usize;
        let height = (max_y - min_y).max(1) as usize;

        let mut fill_mask = vec![0u8; width * height];
        for glyph in &glyphs {
            let ox = (glyph.x - min_x) as usize;
            let oy = (glyph.y - min_y) as usize;
            for gy in 0..glyph.height {
                let row = (oy + gy) * width + ox;
                for gx in 0..glyph.width {
                    let c = glyph.coverage[gy * glyph.width + gx];
                    let d = &mut fill_mask[row + gx];
                    *d = (*d).max(c);
                }
            }
        }
        if bold_radius > 0 {
            fill_mask = dilate(&fill_mask, width, height, bold_radius);
        }

        let mut buffer = FrameBuffer::new(width as u32, height as u32, PixelFormat::Rgba8);
        if let Some((stroke_color, _)) = style.stroke {
            let stroke_mask = dilate(&fill_mask, width, height, stroke_radius);
            paint_mask(&mut buffer, &stroke_mask, stroke_color);
        }
        paint_mask(&mut buffer, &fill_mask, style.fill);

        Some(TextSprite {
            buffer,
            anchor_x: -min_x as f64,
            anchor_y: -min_y as f64,
        })
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn family_key(name: &str) -> String {
    name.trim().trim_matches(|c| c == '"' || c == '\'').to_ascii_lowercase()
}

fn read_font(path: &Path) -> StickerResult<Font> {
    let data = std::fs::read(path).map_err(|e| {
        StickerError::asset(format!("failed to read font file: {}", e), path)
    })?;
    parse_font(&path.display().to_string(), data)
}

fn parse_font(name: &str, data: Vec<u8>) -> StickerResult<Font> {
    Font::from_bytes(data, FontSettings::default())
        .map_err(|e| StickerError::Render(format!("failed to parse font {}: {}", name, e)))
}

/// Grayscale max filter over a square neighbourhood.
fn dilate(mask: &[u8], width: usize, height: usize, radius: i32) -> Vec<u8> {
    if radius <= 0 {
        return mask.to_vec();
    }
    let mut out = vec![0u8; mask.len()];
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let mut best = 0u8;
            for dy in -radius..=radius {
                let sy = y + dy;
                if sy < 0 || sy >= height as i32 {
                    continue;
                }
                for dx in -radius..=radius {
                    let sx = x + dx;
                    if sx < 0 || sx >= width as i32 {
                        continue;
                    }
                    best = best.max(mask[sy as usize * width + sx as usize]);
                }
            }
            out[y as usize * width + x as usize] = best;
        }
    }
    out
}

fn paint_mask(fb: &mut FrameBuffer, mask: &[u8], color: Color) {
    let rgba = color.to_rgba8();
    let width = fb.width as usize;
    for (i, &coverage) in mask.iter().enumerate() {
        if coverage == 0 {
            continue;
        }
        let x = (i % width) as u32;
        let y = (i / width) as u32;
        fb.blend_pixel(x, y, rgba, coverage as f32 / 255.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Renderer backed by a system font. Text tests need one installed
    /// (e.g. `fonts-dejavu-core`).
    fn renderer() -> TextRenderer {
        let renderer = TextRenderer::from_config(&FontConfig::default());
        assert!(
            renderer.has_fonts(),
            "no font found in {:?}",
            FontConfig::default().search_paths
        );
        renderer
    }

    fn opaque_pixels(fb: &FrameBuffer) -> usize {
        fb.data.chunks_exact(4).filter(|p| p[3] > 0).count()
    }

    #[test]
    fn test_no_font_renders_nothing() {
        let renderer = TextRenderer::new();
        assert!(!renderer.has_fonts());
        assert!(renderer
            .render("Hello", &TextStyle::new("Arial", 24.0, Color::WHITE))
            .is_none());
    }

    #[test]
    fn test_render_single_line() {
        let renderer = renderer();
        let sprite = renderer
            .render("Hello", &TextStyle::new("Arial, sans-serif", 24.0, Color::WHITE))
            .unwrap();
        assert!(opaque_pixels(&sprite.buffer) > 0);
        // Anchor sits near the middle of a single centered line.
        let mid_x = sprite.buffer.width as f64 / 2.0;
        assert!((sprite.anchor_x - mid_x).abs() <= 2.0);
    }

    #[test]
    fn test_render_multi_line_is_taller() {
        let renderer = renderer();
        let style = TextStyle::new("Arial", 24.0, Color::WHITE);
        let single = renderer.render("Hello", &style).unwrap();
        let multi = renderer.render("Hello\nWorld", &style).unwrap();
        assert!(multi.buffer.height > single.buffer.height);
    }

    #[test]
    fn test_blank_lines_keep_their_slot() {
        let renderer = renderer();
        let style = TextStyle::new("Arial", 24.0, Color::WHITE);
        let gap = renderer.render("A\n\nB", &style).unwrap();
        let tight = renderer.render("A\nB", &style).unwrap();
        assert!(gap.buffer.height > tight.buffer.height);
        assert!(renderer.render("  \n\n", &style).is_none());
    }

    #[test]
    fn test_stroke_is_dark_and_fill_on_top() {
        let renderer = renderer();
        let sprite = renderer
            .render("X", &TextStyle::new("Arial", 48.0, Color::RED))
            .unwrap();
        let px: Vec<&[u8]> = sprite.buffer.data.chunks_exact(4).collect();
        assert!(px.iter().any(|p| p[3] == 255 && p[0] > 200 && p[1] < 50));
        assert!(px.iter().any(|p| p[3] > 0 && p[0] < 30 && p[1] < 30 && p[2] < 30));
    }

    #[test]
    fn test_bold_covers_more() {
        let renderer = renderer();
        let mut style = TextStyle::new("Arial", 32.0, Color::WHITE);
        style.stroke = None;
        let normal = renderer.render("Bold", &style).unwrap();
        let bold = renderer
            .render("Bold", &style.clone().with_weight(FontWeight::Bold))
            .unwrap();
        assert!(opaque_pixels(&bold.buffer) > opaque_pixels(&normal.buffer));
    }

    #[test]
    fn test_load_missing_font_is_error() {
        let mut renderer = TextRenderer::new();
        let result = renderer.load_font("missing", Path::new("/nonexistent/font.ttf"));
        assert!(result.is_err());
        assert!(renderer.load_font_bytes("junk", vec![1, 2, 3]).is_err());
    }

    #[test]
    fn test_family_key_normalizes() {
        assert_eq!(family_key(" 'Comic Sans MS' "), "comic sans ms");
        assert_eq!(family_key("Arial"), "arial");
    }

    #[test]
    fn test_dilate_grows_a_point() {
        let mut mask = vec![0u8; 25];
        mask[12] = 255;
        let grown = dilate(&mask, 5, 5, 1);
        assert_eq!(grown.iter().filter(|&&c| c == 255).count(), 9);
        assert_eq!(dilate(&mask, 5, 5, 0), mask);
    }
}
