//! Text layers: independently positioned, styled and animated overlays.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::animation::AnimationKind;
use crate::Color;

/// Unique, monotonically assigned layer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

pub const DEFAULT_FONT_FAMILY: &str = "Arial, sans-serif";
pub const DEFAULT_FONT_SIZE: f64 = 24.0;
pub const DEFAULT_POSITION: (f64, f64) = (150.0, 150.0);
/// Vertical spacing added per existing layer so new layers do not stack.
pub const NEW_LAYER_Y_STEP: f64 = 50.0;

/// One text overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    pub id: LayerId,
    pub name: String,
    /// May contain `\n` line breaks.
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub color: Color,
    pub font_family: String,
    pub font_weight: FontWeight,
    pub animation: AnimationKind,
    pub visible: bool,
    pub locked: bool,
    /// Paint order; kept equal to the 1-based list position.
    pub z_index: u32,
}

impl TextLayer {
    /// Characters in the text, the unit the typewriter animation counts in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn apply(&mut self, patch: LayerPatch) {
        let LayerPatch {
            text,
            x,
            y,
            font_size,
            color,
            font_family,
            font_weight,
            animation,
        } = patch;
        if let Some(v) = text {
            self.text = v;
        }
        if let Some(v) = x {
            self.x = v;
        }
        if let Some(v) = y {
            self.y = v;
        }
        if let Some(v) = font_size {
            self.font_size = v;
        }
        if let Some(v) = color {
            self.color = v;
        }
        if let Some(v) = font_family {
            self.font_family = v;
        }
        if let Some(v) = font_weight {
            self.font_weight = v;
        }
        if let Some(v) = animation {
            self.animation = v;
        }
    }
}

/// Partial update of a layer's user-editable fields. `None` leaves a field
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerPatch {
    pub text: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub font_size: Option<f64>,
    pub color: Option<Color>,
    pub font_family: Option<String>,
    pub font_weight: Option<FontWeight>,
    pub animation: Option<AnimationKind>,
}

impl LayerPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn animation(kind: AnimationKind) -> Self {
        Self {
            animation: Some(kind),
            ..Self::default()
        }
    }

    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }
}

/// Ordered collection of text layers plus the "current" selection.
///
/// Always holds at least one layer.
#[derive(Debug, Clone)]
pub struct LayerStore {
    layers: Vec<TextLayer>,
    current: LayerId,
    next_id: u32,
}

impl LayerStore {
    /// A store holding one empty default layer.
    pub fn new() -> Self {
        let mut store = Self {
            layers: Vec::new(),
            current: LayerId(1),
            next_id: 1,
        };
        store.add_layer(None, None, None);
        store
    }

    /// Append a layer and make it current. `y` is pushed down by
    /// [`NEW_LAYER_Y_STEP`] per existing layer.
    pub fn add_layer(&mut self, text: Option<&str>, x: Option<f64>, y: Option<f64>) -> &TextLayer {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        let position = self.layers.len();
        let layer = TextLayer {
            id,
            name: layer_name(position),
            text: text.unwrap_or_default().to_string(),
            x: x.unwrap_or(DEFAULT_POSITION.0),
            y: y.unwrap_or(DEFAULT_POSITION.1) + position as f64 * NEW_LAYER_Y_STEP,
            font_size: DEFAULT_FONT_SIZE,
            color: Color::WHITE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_weight: FontWeight::Normal,
            animation: AnimationKind::None,
            visible: true,
            locked: false,
            z_index: position as u32 + 1,
        };
        self.layers.push(layer);
        self.current = id;
        tracing::debug!("added layer {} ({} total)", id, self.layers.len());
        &self.layers[position]
    }

    /// Remove a layer. Refuses (returns false) when it is the only layer or
    /// the id is unknown. Names and z-indices are renumbered by position and
    /// the selection falls back to the first layer if it was removed.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        if self.layers.len() <= 1 {
            return false;
        }
        let Some(pos) = self.layers.iter().position(|l| l.id == id) else {
            return false;
        };
        self.layers.remove(pos);

        if self.current == id {
            self.current = self.layers[0].id;
        }
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.name = layer_name(i);
            layer.z_index = i as u32 + 1;
        }
        true
    }

    /// Select a layer. Unknown ids are ignored.
    pub fn set_current(&mut self, id: LayerId) {
        if self.get(id).is_some() {
            self.current = id;
        }
    }

    pub fn current_id(&self) -> LayerId {
        self.current
    }

    /// The layer every "current layer" field edit goes through.
    pub fn current(&self) -> Option<&TextLayer> {
        self.get(self.current)
    }

    pub fn get(&self, id: LayerId) -> Option<&TextLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn get_mut(&mut self, id: LayerId) -> Option<&mut TextLayer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Apply a partial update. Unknown ids are a silent no-op.
    pub fn update(&mut self, id: LayerId, patch: LayerPatch) {
        if let Some(layer) = self.get_mut(id) {
            layer.apply(patch);
        }
    }

    pub fn update_current(&mut self, patch: LayerPatch) {
        self.update(self.current, patch);
    }

    pub fn toggle_visibility(&mut self, id: LayerId) {
        if let Some(layer) = self.get_mut(id) {
            layer.visible = !layer.visible;
        }
    }

    pub fn toggle_lock(&mut self, id: LayerId) {
        if let Some(layer) = self.get_mut(id) {
            layer.locked = !layer.locked;
        }
    }

    /// All layers in list order.
    pub fn layers(&self) -> &[TextLayer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn visible_layers(&self) -> impl Iterator<Item = &TextLayer> {
        self.layers.iter().filter(|l| l.visible)
    }

    /// Visible layers in ascending paint order.
    pub fn paint_order(&self) -> Vec<&TextLayer> {
        let mut layers: Vec<&TextLayer> = self.visible_layers().collect();
        layers.sort_by_key(|l| l.z_index);
        layers
    }

    /// Drop every layer and start over with one default layer. Ids keep
    /// counting up.
    pub fn reset(&mut self) {
        self.layers.clear();
        self.add_layer(None, None, None);
    }
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

fn layer_name(position: usize) -> String {
    format!("Layer {}", position + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_has_one_layer() {
        let store = LayerStore::new();
        assert_eq!(store.len(), 1);
        let layer = store.current().unwrap();
        assert_eq!(layer.id, LayerId(1));
        assert_eq!(layer.name, "Layer 1");
        assert_eq!((layer.x, layer.y), (150.0, 150.0));
        assert_eq!(layer.z_index, 1);
    }

    #[test]
    fn test_add_layer_offsets_and_selects() {
        let mut store = LayerStore::new();
        let id = store.add_layer(Some("hi"), None, None).id;
        let layer = store.get(id).unwrap();
        assert_eq!(layer.y, 200.0);
        assert_eq!(layer.z_index, 2);
        assert_eq!(store.current_id(), id);
        let third = store.add_layer(None, Some(10.0), Some(10.0));
        assert_eq!(third.y, 110.0);
        assert_eq!(third.id, LayerId(3));
    }

    #[test]
    fn test_remove_sole_layer_is_rejected() {
        let mut store = LayerStore::new();
        let before = store.layers().to_vec();
        assert!(!store.remove_layer(LayerId(1)));
        assert_eq!(store.layers(), before.as_slice());
    }

    #[test]
    fn test_remove_renumbers_names_and_z() {
        let mut store = LayerStore::new();
        store.add_layer(Some("b"), None, None);
        store.add_layer(Some("c"), None, None);
        store.add_layer(Some("d"), None, None);
        assert!(store.remove_layer(LayerId(2)));

        for (i, layer) in store.layers().iter().enumerate() {
            assert_eq!(layer.z_index, i as u32 + 1);
            assert_eq!(layer.name, format!("Layer {}", i + 1));
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_remove_current_selects_first() {
        let mut store = LayerStore::new();
        let id = store.add_layer(None, None, None).id;
        assert!(store.remove_layer(id));
        assert_eq!(store.current_id(), LayerId(1));
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut store = LayerStore::new();
        store.add_layer(None, None, None);
        assert!(!store.remove_layer(LayerId(42)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut store = LayerStore::new();
        let id = store.add_layer(None, None, None).id;
        store.remove_layer(id);
        assert_eq!(store.add_layer(None, None, None).id, LayerId(3));
    }

    #[test]
    fn test_unknown_ids_are_silent() {
        let mut store = LayerStore::new();
        store.update(LayerId(9), LayerPatch::text("nope"));
        store.toggle_lock(LayerId(9));
        store.toggle_visibility(LayerId(9));
        store.set_current(LayerId(9));
        assert!(store.get(LayerId(9)).is_none());
        assert_eq!(store.current_id(), LayerId(1));
    }

    #[test]
    fn test_update_current_patch() {
        let mut store = LayerStore::new();
        store.update_current(LayerPatch {
            text: Some("hello\nworld".into()),
            animation: Some(AnimationKind::Bounce),
            ..LayerPatch::default()
        });
        let layer = store.current().unwrap();
        assert_eq!(layer.text, "hello\nworld");
        assert_eq!(layer.animation, AnimationKind::Bounce);
        assert_eq!(layer.font_size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_toggles_and_paint_order() {
        let mut store = LayerStore::new();
        let second = store.add_layer(Some("2"), None, None).id;
        store.toggle_visibility(LayerId(1));
        store.toggle_lock(second);
        let order: Vec<LayerId> = store.paint_order().iter().map(|l| l.id).collect();
        assert_eq!(order, vec![second]);
        assert!(store.get(second).unwrap().locked);
    }
}
