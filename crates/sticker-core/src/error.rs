/// Core error types for Sticker Studio.
use std::path::PathBuf;

/// A specialized Result type for Sticker Studio operations.
pub type StickerResult<T> = Result<T, StickerError>;

/// Top-level error type encompassing all Sticker Studio subsystems.
#[derive(Debug, thiserror::Error)]
pub enum StickerError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("playback error: {0}")]
    Playback(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("asset error: {message} ({path:?})")]
    Asset { message: String, path: PathBuf },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Other(String),
}

impl StickerError {
    /// Create an asset error.
    pub fn asset(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        StickerError::Asset {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Whether this error came out of the encoder. The optimizer skips such
    /// trials instead of aborting the search.
    pub fn is_encode(&self) -> bool {
        matches!(self, StickerError::Encode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_error_display() {
        let err = StickerError::Encode("worker crashed".into());
        assert_eq!(err.to_string(), "encode error: worker crashed");
        assert!(err.is_encode());
    }

    #[test]
    fn test_asset_error_display() {
        let err = StickerError::asset("file not found", "/assets/cat.mp4");
        assert!(err.to_string().contains("file not found"));
        assert!(!err.is_encode());
    }
}
