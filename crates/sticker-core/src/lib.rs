//! # sticker-core
//!
//! Core types and primitives for Sticker Studio.
//! This crate holds the foundational pieces shared by every other crate:
//! raster surfaces, colors, affine transforms, the text-layer model, the
//! per-layer animation evaluator, the playback clock, export settings,
//! configuration and error types.

pub mod animation;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod hash;
pub mod layer;
pub mod math;
pub mod settings;
pub mod time;

pub use config::*;

pub use animation::{AnimationKind, AnimationStates, LayerAnimationState};
pub use color::Color;
pub use error::{StickerError, StickerResult};
pub use frame::{FrameBuffer, PixelFormat};
pub use layer::{FontWeight, LayerId, LayerPatch, LayerStore, TextLayer};
pub use math::Affine;
pub use settings::{AdjustDimension, ExportSettings};
pub use time::{PlaybackClock, PlaybackSpeed};
