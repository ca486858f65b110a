//! Video decoding module.
//! Uses an FFmpeg subprocess to sample a clip into RGBA frames at a fixed
//! rate. Clips are decoded once, up front; playback then indexes into the
//! decoded frames.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use sticker_core::config::DecodeConfig;
use sticker_core::frame::FrameBuffer;
use sticker_core::{StickerError, StickerResult};

/// Metadata about a video file.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Native frame rate (fps).
    pub fps: f64,
}

/// A clip sampled into frames.
#[derive(Debug, Clone)]
pub struct DecodedClip {
    pub info: VideoInfo,
    pub frames: Vec<FrameBuffer>,
    /// Rate the frames were sampled at.
    pub fps: f64,
}

/// A video decoder backed by FFmpeg.
#[derive(Debug, Clone)]
pub struct VideoDecoder {
    sample_fps: u32,
    max_frames: usize,
}

impl VideoDecoder {
    pub fn new(sample_fps: u32, max_frames: usize) -> Self {
        Self {
            sample_fps: sample_fps.max(1),
            max_frames: max_frames.max(1),
        }
    }

    pub fn from_config(config: &DecodeConfig) -> Self {
        Self::new(config.video_fps, config.max_video_frames)
    }

    /// Check if FFmpeg is available on the system.
    pub fn is_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Probe a video file to get its metadata (width, height, duration, fps).
    pub fn probe(&self, path: &Path) -> StickerResult<VideoInfo> {
        if !path.exists() {
            return Err(StickerError::asset(
                format!("video file not found: {}", path.display()),
                path,
            ));
        }

        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| StickerError::Decode(format!("failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StickerError::Decode(format!("ffprobe failed: {}", stderr)));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        parse_probe(&json)
    }

    /// Decode a clip from a file on disk.
    pub fn decode_file(&self, path: &Path) -> StickerResult<DecodedClip> {
        if !Self::is_available() {
            return Err(StickerError::Decode(
                "ffmpeg/ffprobe not found in PATH. Install FFmpeg: https://ffmpeg.org/download.html"
                    .into(),
            ));
        }
        let info = self.probe(path)?;
        let frame_size = info.width as usize * info.height as usize * 4;
        if frame_size == 0 {
            return Err(StickerError::Decode("video has zero-sized frames".into()));
        }

        let output = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args([
                "-vf",
                &format!("fps={}", self.sample_fps),
                "-frames:v",
                &self.max_frames.to_string(),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| StickerError::Decode(format!("failed to run ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StickerError::Decode(format!("ffmpeg failed: {}", stderr)));
        }

        let frames = split_frames(&output.stdout, info.width, info.height);
        if frames.is_empty() {
            return Err(StickerError::Decode("no frames decoded".into()));
        }
        tracing::debug!(
            "decoded {} frames at {}fps ({}x{})",
            frames.len(),
            self.sample_fps,
            info.width,
            info.height
        );

        Ok(DecodedClip {
            info,
            frames,
            fps: self.sample_fps as f64,
        })
    }

    /// Decode a clip held in memory. The bytes are staged in a temporary file
    /// named with `extension` so FFmpeg can pick the demuxer.
    pub fn decode_bytes(&self, data: &[u8], extension: &str) -> StickerResult<DecodedClip> {
        let staged = StagedFile::write(data, extension)?;
        self.decode_file(&staged.path)
    }
}

impl Default for VideoDecoder {
    fn default() -> Self {
        Self::from_config(&DecodeConfig::default())
    }
}

/// Temporary copy of in-memory media, removed on drop.
struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    fn write(data: &[u8], extension: &str) -> StickerResult<Self> {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let ext: String = extension
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let ext = if ext.is_empty() { "bin".to_string() } else { ext };
        let path = std::env::temp_dir().join(format!(
            "sticker-media-{}-{}.{}",
            std::process::id(),
            n,
            ext
        ));
        std::fs::write(&path, data)?;
        Ok(Self { path })
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!("failed to remove {}: {}", self.path.display(), e);
        }
    }
}

fn parse_probe(json: &serde_json::Value) -> StickerResult<VideoInfo> {
    let streams = json["streams"]
        .as_array()
        .ok_or_else(|| StickerError::Decode("no streams found in video".into()))?;

    let video_stream = streams
        .iter()
        .find(|s| s["codec_type"].as_str() == Some("video"))
        .ok_or_else(|| StickerError::Decode("no video stream found".into()))?;

    let width = video_stream["width"]
        .as_u64()
        .ok_or_else(|| StickerError::Decode("missing width in video stream".into()))?
        as u32;
    let height = video_stream["height"]
        .as_u64()
        .ok_or_else(|| StickerError::Decode("missing height in video stream".into()))?
        as u32;

    let fps = parse_frame_rate(video_stream["r_frame_rate"].as_str().unwrap_or("30/1"));

    let duration_secs = json["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| {
            video_stream["duration"]
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    Ok(VideoInfo {
        width,
        height,
        duration_secs,
        fps,
    })
}

/// Cut a raw RGBA stream into whole frames; a trailing partial frame is dropped.
fn split_frames(raw: &[u8], width: u32, height: u32) -> Vec<FrameBuffer> {
    let frame_size = width as usize * height as usize * 4;
    if frame_size == 0 {
        return Vec::new();
    }
    raw.chunks_exact(frame_size)
        .filter_map(|chunk| FrameBuffer::from_rgba(width, height, chunk.to_vec()))
        .collect()
}

/// Parse a frame rate string like "30/1" or "24000/1001" into a float.
fn parse_frame_rate(rate_str: &str) -> f64 {
    if let Some((num_str, den_str)) = rate_str.split_once('/') {
        let num: f64 = num_str.parse().unwrap_or(30.0);
        let den: f64 = den_str.parse().unwrap_or(1.0);
        if den > 0.0 {
            num / den
        } else {
            30.0
        }
    } else {
        rate_str.parse::<f64>().unwrap_or(30.0)
    }
}
