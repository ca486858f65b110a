//! # sticker-render
//!
//! CPU raster for Sticker Studio: rasterizes text layers, composites them
//! over cover-fitted background media, and decodes images and video clips
//! into frame buffers.

pub mod compositor;
pub mod image_loader;
pub mod text;
pub mod video_decoder;

pub use compositor::{Compositor, LayerDraw};
pub use text::{TextRenderer, TextSprite, TextStyle};
pub use video_decoder::{DecodedClip, VideoDecoder, VideoInfo};
