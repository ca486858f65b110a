//! Single-frame PNG export, delivered as a data URL.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use sticker_core::frame::{FrameBuffer, PixelFormat};
use sticker_core::{StickerError, StickerResult};

pub const PNG_MIME: &str = "image/png";

/// An encoded still ready to hand to a download or preview.
#[derive(Debug, Clone, PartialEq)]
pub struct StillImage {
    pub data_url: String,
    /// Size derived from the data URL's base64 payload (`len × 0.75`).
    pub estimated_size: u64,
}

/// Encode one RGBA frame to PNG bytes using the `png` crate.
pub fn encode_png(frame: &FrameBuffer) -> StickerResult<Vec<u8>> {
    if frame.format != PixelFormat::Rgba8 {
        return Err(StickerError::Encode("PNG export expects an RGBA surface".into()));
    }
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, frame.width, frame.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| StickerError::Encode(format!("failed to write PNG header: {}", e)))?;
        writer
            .write_image_data(&frame.data)
            .map_err(|e| StickerError::Encode(format!("failed to write PNG data: {}", e)))?;
        writer
            .finish()
            .map_err(|e| StickerError::Encode(format!("failed to finalize PNG: {}", e)))?;
    }
    Ok(out)
}

/// `data:<mime>;base64,<payload>`.
pub fn to_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, BASE64_STANDARD.encode(bytes))
}

/// Byte size implied by a base64 data URL's payload.
pub fn estimate_data_url_size(data_url: &str) -> u64 {
    let payload = data_url
        .split_once(',')
        .map_or(data_url, |(_, payload)| payload);
    (payload.len() as f64 * 0.75).round() as u64
}

/// Encode the surface as a PNG data URL.
pub fn export_png(frame: &FrameBuffer) -> StickerResult<StillImage> {
    let bytes = encode_png(frame)?;
    let data_url = to_data_url(&bytes, PNG_MIME);
    let estimated_size = estimate_data_url_size(&data_url);
    tracing::debug!("PNG still: {} bytes (~{} from data URL)", bytes.len(), estimated_size);
    Ok(StillImage {
        data_url,
        estimated_size,
    })
}

/// Decode a data URL produced by [`to_data_url`] back to bytes.
pub fn decode_data_url(data_url: &str) -> StickerResult<Vec<u8>> {
    let (_, payload) = data_url
        .split_once(";base64,")
        .ok_or_else(|| StickerError::InvalidArgument("not a base64 data URL".into()))?;
    BASE64_STANDARD
        .decode(payload)
        .map_err(|e| StickerError::InvalidArgument(format!("invalid base64 payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sticker_core::Color;

    #[test]
    fn test_export_png_data_url() {
        let frame = FrameBuffer::solid(8, 8, &Color::RED);
        let still = export_png(&frame).unwrap();
        assert!(still.data_url.starts_with("data:image/png;base64,"));

        let bytes = decode_data_url(&still.data_url).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        // Estimate is within padding of the true size.
        assert!((still.estimated_size as i64 - bytes.len() as i64).abs() <= 2);

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(3, 3).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_rgb_surface_rejected() {
        let frame = FrameBuffer::new(2, 2, PixelFormat::Rgb8);
        assert!(encode_png(&frame).unwrap_err().is_encode());
    }

    #[test]
    fn test_estimate_data_url_size() {
        assert_eq!(estimate_data_url_size("data:image/png;base64,AAAA"), 3);
        assert!(decode_data_url("nope").is_err());
    }
}
