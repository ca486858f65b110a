//! Per-layer animation evaluator.
//!
//! Every kind is a closed-form function of the clock time `t` and the speed
//! multiplier `s`, so evaluating the same `(t, s)` twice yields the same
//! state. `Glitch` is the one exception: it draws fresh randomness on every
//! evaluation.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::layer::{LayerId, TextLayer};
use crate::math::Affine;
use crate::Color;

/// Typewriter cursor pauses this many steps past the end before restarting.
pub const TYPEWRITER_TAIL: usize = 10;
const ORBIT_RADIUS: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    #[default]
    None,
    Bounce,
    Fade,
    Rotate,
    Shake,
    Typewriter,
    Slide,
    Zoom,
    Rainbow,
    Wave,
    Flip,
    Elastic,
    Glitch,
    Orbit,
}

impl AnimationKind {
    pub const ALL: [AnimationKind; 14] = [
        AnimationKind::None,
        AnimationKind::Bounce,
        AnimationKind::Fade,
        AnimationKind::Rotate,
        AnimationKind::Shake,
        AnimationKind::Typewriter,
        AnimationKind::Slide,
        AnimationKind::Zoom,
        AnimationKind::Rainbow,
        AnimationKind::Wave,
        AnimationKind::Flip,
        AnimationKind::Elastic,
        AnimationKind::Glitch,
        AnimationKind::Orbit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AnimationKind::None => "none",
            AnimationKind::Bounce => "bounce",
            AnimationKind::Fade => "fade",
            AnimationKind::Rotate => "rotate",
            AnimationKind::Shake => "shake",
            AnimationKind::Typewriter => "typewriter",
            AnimationKind::Slide => "slide",
            AnimationKind::Zoom => "zoom",
            AnimationKind::Rainbow => "rainbow",
            AnimationKind::Wave => "wave",
            AnimationKind::Flip => "flip",
            AnimationKind::Elastic => "elastic",
            AnimationKind::Glitch => "glitch",
            AnimationKind::Orbit => "orbit",
        }
    }

    /// False only for `Glitch`, whose output is random by design.
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, AnimationKind::Glitch)
    }
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnimationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnimationKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown animation kind '{}'", s))
    }
}

/// Scratch state for one layer, recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerAnimationState {
    pub offset_x: f64,
    pub offset_y: f64,
    /// Radians, pivoting on the layer position.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub opacity: f64,
    /// Overrides the layer's fill color with `hsl(hue, 80%, 60%)`.
    pub hue: Option<f64>,
    /// Typewriter cursor, before clamping to the text length.
    pub visible_chars: Option<usize>,
}

impl Default for LayerAnimationState {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            hue: None,
            visible_chars: None,
        }
    }
}

impl LayerAnimationState {
    /// Canvas transform for a layer anchored at `(pivot_x, pivot_y)`:
    /// translate by the offset, then rotate and scale around the pivot.
    pub fn transform(&self, pivot_x: f64, pivot_y: f64) -> Affine {
        let m = Affine::translate(self.offset_x, self.offset_y);
        if self.rotation == 0.0 && self.scale_x == 1.0 && self.scale_y == 1.0 {
            return m;
        }
        m.translate_by(pivot_x, pivot_y)
            .rotate_by(self.rotation)
            .scale_by(self.scale_x, self.scale_y)
            .translate_by(-pivot_x, -pivot_y)
    }

    /// Fill color for this frame.
    pub fn fill_color(&self, base: Color) -> Color {
        match self.hue {
            Some(hue) => Color::from_hsl(hue as f32, 0.8, 0.6),
            None => base,
        }
    }

    /// The portion of `text` shown this frame.
    pub fn display_text<'a>(&self, text: &'a str) -> &'a str {
        match self.visible_chars {
            Some(n) => match text.char_indices().nth(n) {
                Some((byte, _)) => &text[..byte],
                None => text,
            },
            None => text,
        }
    }
}

fn unit_random(rng: &mut dyn RngCore) -> f64 {
    rng.next_u32() as f64 / (u32::MAX as f64 + 1.0)
}

/// Evaluate one animation kind at clock time `t` with speed multiplier `s`.
pub fn evaluate(
    kind: AnimationKind,
    text_len: usize,
    t: f64,
    s: f64,
    rng: &mut dyn RngCore,
) -> LayerAnimationState {
    let mut st = LayerAnimationState::default();
    let ts = t * s;
    match kind {
        AnimationKind::None => {}
        AnimationKind::Bounce => st.offset_y = (4.0 * ts).sin() * 10.0,
        AnimationKind::Fade => st.opacity = ((3.0 * ts).sin() + 1.0) / 2.0,
        AnimationKind::Rotate => {
            st.rotation = 2.0 * ts;
            let scale = 0.8 + st.rotation.sin() * 0.2;
            st.scale_x = scale;
            st.scale_y = scale;
        }
        AnimationKind::Shake => st.offset_x = (8.0 * ts).sin() * 5.0,
        AnimationKind::Typewriter => {
            let step = (3.0 * ts).floor().max(0.0) as usize;
            st.visible_chars = Some(step % (text_len + TYPEWRITER_TAIL));
        }
        AnimationKind::Slide => {
            let progress = ((2.0 * ts).sin() + 1.0) / 2.0;
            st.offset_x = (progress - 0.5) * 100.0;
        }
        AnimationKind::Zoom => {
            let scale = 0.8 + (4.0 * ts).sin() * 0.4;
            st.scale_x = scale;
            st.scale_y = scale;
        }
        AnimationKind::Rainbow => st.hue = Some((60.0 * ts).rem_euclid(360.0)),
        AnimationKind::Wave => {
            st.offset_y = (3.0 * ts).sin() * 15.0;
            st.offset_x = (5.0 * ts).sin() * 3.0;
        }
        AnimationKind::Flip => st.scale_x = (4.0 * ts).cos(),
        AnimationKind::Elastic => {
            let scale = 1.0 + (6.0 * ts).sin() * 0.3;
            st.scale_x = scale;
            st.scale_y = scale;
        }
        AnimationKind::Glitch => {
            st.offset_x = unit_random(rng) * 4.0 - 2.0;
            st.opacity = 0.5 + unit_random(rng) * 0.5;
        }
        AnimationKind::Orbit => {
            let angle = 3.0 * ts;
            st.offset_x = angle.cos() * ORBIT_RADIUS;
            st.offset_y = angle.sin() * ORBIT_RADIUS;
        }
    }
    st
}

/// Animation state for every layer, keyed by layer id.
///
/// Entries are created on first use and pruned when their layer goes away;
/// nothing here is persisted.
#[derive(Debug, Clone, Default)]
pub struct AnimationStates {
    states: HashMap<LayerId, LayerAnimationState>,
}

impl AnimationStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a layer; identity if it was never evaluated.
    pub fn get(&self, id: LayerId) -> LayerAnimationState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    /// Re-evaluate every visible layer at `(t, s)`.
    pub fn update<'a>(
        &mut self,
        layers: impl IntoIterator<Item = &'a TextLayer>,
        t: f64,
        s: f64,
        rng: &mut dyn RngCore,
    ) {
        for layer in layers.into_iter().filter(|l| l.visible) {
            let state = evaluate(layer.animation, layer.char_len(), t, s, rng);
            self.states.insert(layer.id, state);
        }
    }

    /// Drop state for layers no longer present.
    pub fn retain_layers<'a>(&mut self, layers: impl IntoIterator<Item = &'a TextLayer>) {
        let live: Vec<LayerId> = layers.into_iter().map(|l| l.id).collect();
        self.states.retain(|id, _| live.contains(id));
    }

    pub fn remove(&mut self, id: LayerId) {
        self.states.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}
