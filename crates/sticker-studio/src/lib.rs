//! # sticker-studio
//!
//! The Sticker Studio engine: the media library and its rotation schedule,
//! the live frame loop, export passes and the GIF size optimizer, tied
//! together by [`Studio`].

pub mod driver;
pub mod export;
pub mod media;
pub mod optimizer;
pub mod scheduler;
pub mod source;
pub mod studio;

pub use driver::{FrameLoop, LoopState, TickHandle, TickQueue, TickScheduler};
pub use export::{PassOutput, RenderPass};
pub use media::{
    DecodeState, MediaAsset, MediaContent, MediaDecoder, MediaFile, MediaKind, MediaLibrary,
    StandardDecoder, VideoClip,
};
pub use optimizer::{OptimizationOutcome, SizeOptimizer, Trial};
pub use scheduler::{MediaRotation, MediaSwitch};
pub use source::{ExportPrompt, ExportRequest, FixedChoice, PromptChoice, SettingsSource};
pub use studio::{ExportMode, GifExport, PngExport, Studio};
