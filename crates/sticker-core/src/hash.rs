//! Content hashing for deterministic rendering verification.
//!
//! Export passes feed every rendered frame through a [`SequenceHasher`] so
//! two passes over identical state can be compared bit-for-bit.

use sha2::{Digest, Sha256};

use crate::frame::FrameBuffer;

/// A SHA-256 digest of frame content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

fn feed(hasher: &mut Sha256, frame: &FrameBuffer) {
    // Dimensions and format are part of the digest so buffers with equal
    // bytes but different shapes never collide.
    hasher.update(frame.width.to_le_bytes());
    hasher.update(frame.height.to_le_bytes());
    hasher.update([frame.format as u8]);
    hasher.update(&frame.data);
}

fn finish(hasher: Sha256) -> ContentHash {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    ContentHash(bytes)
}

/// Hash a single frame.
pub fn hash_frame(frame: &FrameBuffer) -> ContentHash {
    let mut hasher = Sha256::new();
    feed(&mut hasher, frame);
    finish(hasher)
}

/// Incremental hash over an ordered frame sequence.
#[derive(Clone, Default)]
pub struct SequenceHasher {
    hasher: Sha256,
    frames: u64,
    per_frame: Vec<ContentHash>,
}

impl SequenceHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: &FrameBuffer) {
        feed(&mut self.hasher, frame);
        self.per_frame.push(hash_frame(frame));
        self.frames += 1;
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Per-frame digests in submission order.
    pub fn frame_hashes(&self) -> &[ContentHash] {
        &self.per_frame
    }

    pub fn finish(self) -> ContentHash {
        let mut hasher = self.hasher;
        hasher.update(self.frames.to_le_bytes());
        finish(hasher)
    }
}
