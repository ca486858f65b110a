//! CPU compositor: one frame of background media plus animated text layers.

use sticker_core::animation::{AnimationStates, LayerAnimationState};
use sticker_core::frame::FrameBuffer;
use sticker_core::layer::{LayerStore, TextLayer};
use sticker_core::math::Affine;
use sticker_core::Color;

use crate::text::{TextRenderer, TextSprite, TextStyle};

/// A rasterized layer ready to be placed on the surface.
#[derive(Debug, Clone)]
pub struct LayerDraw {
    pub sprite: TextSprite,
    /// Maps sprite pixels to surface pixels.
    pub transform: Affine,
    pub opacity: f32,
}

impl LayerDraw {
    /// Rasterize `layer` in its current animation state. Returns `None` for
    /// layers that draw nothing this frame.
    pub fn prepare(
        layer: &TextLayer,
        state: &LayerAnimationState,
        text: &TextRenderer,
    ) -> Option<Self> {
        if layer.locked || layer.text.is_empty() {
            return None;
        }
        let shown = state.display_text(&layer.text);
        if shown.is_empty() {
            return None;
        }
        let style = TextStyle::new(
            &layer.font_family,
            layer.font_size as f32,
            state.fill_color(layer.color),
        )
        .with_weight(layer.font_weight);
        let sprite = text.render(shown, &style)?;

        let transform = state
            .transform(layer.x, layer.y)
            .translate_by(layer.x - sprite.anchor_x, layer.y - sprite.anchor_y);
        Some(Self {
            sprite,
            transform,
            opacity: state.opacity as f32,
        })
    }
}

/// Draws frames onto a surface.
#[derive(Debug, Clone)]
pub struct Compositor {
    /// Fill used when there is no background media.
    pub placeholder: Color,
}

impl Compositor {
    pub fn new(placeholder: Color) -> Self {
        Self { placeholder }
    }

    /// Clear the surface, draw the background cover-fitted (or the
    /// placeholder fill), then every layer in order.
    pub fn render(
        &self,
        surface: &mut FrameBuffer,
        background: Option<&FrameBuffer>,
        layers: &[LayerDraw],
    ) {
        surface.clear();
        match background {
            Some(media) => draw_cover(surface, media),
            None => surface.fill(&self.placeholder),
        }
        for layer in layers {
            surface.draw_transformed(&layer.sprite.buffer, &layer.transform, layer.opacity);
        }
    }

    /// Render a whole scene: visible layers in paint order with their
    /// animation state.
    pub fn render_scene(
        &self,
        surface: &mut FrameBuffer,
        background: Option<&FrameBuffer>,
        layers: &LayerStore,
        states: &AnimationStates,
        text: &TextRenderer,
    ) {
        let draws: Vec<LayerDraw> = layers
            .paint_order()
            .into_iter()
            .filter_map(|layer| LayerDraw::prepare(layer, &states.get(layer.id), text))
            .collect();
        self.render(surface, background, &draws);
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(Color::rgb(
            0xf8 as f32 / 255.0,
            0xf9 as f32 / 255.0,
            0xfa as f32 / 255.0,
        ))
    }
}

/// Scale `media` to cover the whole surface, centered, cropping overflow.
pub fn draw_cover(surface: &mut FrameBuffer, media: &FrameBuffer) {
    if media.width == 0 || media.height == 0 {
        return;
    }
    let (w, h) = (surface.width as f64, surface.height as f64);
    let (sw, sh) = (media.width as f64, media.height as f64);
    let scale = (w / sw).max(h / sh);
    let (dw, dh) = (sw * scale, sh * scale);
    surface.draw_scaled(media, (w - dw) / 2.0, (h - dh) / 2.0, dw, dh);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sticker_core::config::FontConfig;
    use sticker_core::layer::LayerPatch;
    use sticker_core::PixelFormat;

    fn surface() -> FrameBuffer {
        FrameBuffer::new(60, 40, PixelFormat::Rgba8)
    }

    #[test]
    fn test_placeholder_without_media() {
        let mut fb = surface();
        Compositor::default().render(&mut fb, None, &[]);
        assert_eq!(fb.get_pixel(0, 0), Some([0xf8, 0xf9, 0xfa, 255]));
        assert_eq!(fb.get_pixel(59, 39), Some([0xf8, 0xf9, 0xfa, 255]));
    }

    #[test]
    fn test_cover_fit_crops_wide_media() {
        // 4x1 media: left half red, right half blue. Covering a 60x40 surface
        // scales by 40 and crops the sides.
        let mut media = FrameBuffer::new(4, 1, PixelFormat::Rgba8);
        for x in 0..4 {
            let px = if x < 2 { [255, 0, 0, 255] } else { [0, 0, 255, 255] };
            media.set_pixel(x, 0, px);
        }
        let mut fb = surface();
        Compositor::default().render(&mut fb, Some(&media), &[]);
        assert_eq!(fb.get_pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(fb.get_pixel(59, 39), Some([0, 0, 255, 255]));
        assert!(fb.data.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_layer_draw_respects_opacity_and_offset() {
        let sprite = TextSprite {
            buffer: FrameBuffer::solid(2, 2, &Color::WHITE),
            anchor_x: 1.0,
            anchor_y: 1.0,
        };
        let layer = LayerDraw {
            sprite,
            transform: Affine::translate(10.0, 10.0),
            opacity: 0.5,
        };
        let mut fb = surface();
        let black = FrameBuffer::solid(1, 1, &Color::BLACK);
        Compositor::default().render(&mut fb, Some(&black), &[layer]);
        let [r, _, _, a] = fb.get_pixel(10, 10).unwrap();
        assert!((120..=135).contains(&r));
        assert_eq!(a, 255);
        assert_eq!(fb.get_pixel(12, 12), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_locked_and_empty_layers_are_skipped() {
        let text = TextRenderer::from_config(&FontConfig::default());
        let mut store = LayerStore::new();
        let state = LayerAnimationState::default();
        // Empty text.
        assert!(LayerDraw::prepare(store.current().unwrap(), &state, &text).is_none());
        store.update_current(LayerPatch::text("Hi"));
        let id = store.current_id();
        store.toggle_lock(id);
        assert!(LayerDraw::prepare(store.get(id).unwrap(), &state, &text).is_none());
    }

    #[test]
    fn test_scene_draws_text_over_placeholder() {
        let text = TextRenderer::from_config(&FontConfig::default());
        assert!(text.has_fonts(), "scene test needs a system font");
        let mut store = LayerStore::new();
        store.update_current(LayerPatch {
            text: Some("OK".into()),
            x: Some(30.0),
            y: Some(20.0),
            ..LayerPatch::default()
        });
        let mut fb = surface();
        let compositor = Compositor::default();
        compositor.render_scene(&mut fb, None, &store, &AnimationStates::new(), &text);
        let placeholder = [0xf8, 0xf9, 0xfa, 255];
        let changed = fb.data.chunks_exact(4).filter(|p| *p != placeholder).count();
        assert!(changed > 0);
    }
}
