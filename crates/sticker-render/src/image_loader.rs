//! Image loading module.
//! Decodes PNG, JPEG, GIF, WebP, and other formats into FrameBuffers.
//! Animated GIFs contribute their first frame only.

use std::path::Path;

use image::DynamicImage;
use sticker_core::frame::FrameBuffer;
use sticker_core::{StickerError, StickerResult};

/// Load an image file and convert it to a FrameBuffer.
pub fn load_image(path: &Path) -> StickerResult<FrameBuffer> {
    let img = image::open(path).map_err(|e| {
        StickerError::asset(
            format!("failed to load image '{}': {}", path.display(), e),
            path,
        )
    })?;
    Ok(to_frame(img))
}

/// Decode an image held in memory.
pub fn decode_image(data: &[u8]) -> StickerResult<FrameBuffer> {
    let img = image::load_from_memory(data)
        .map_err(|e| StickerError::Decode(format!("failed to decode image: {}", e)))?;
    Ok(to_frame(img))
}

fn to_frame(img: DynamicImage) -> FrameBuffer {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    // Dimensions come from the buffer itself, so the length always matches.
    FrameBuffer::from_rgba(width, height, rgba.into_raw())
        .unwrap_or_else(|| FrameBuffer::new(width, height, sticker_core::PixelFormat::Rgba8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_pixel(w, h, Rgba(px));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_load_image_missing_file() {
        let result = load_image(Path::new("/nonexistent/image.png"));
        assert!(matches!(result, Err(StickerError::Asset { .. })));
    }

    #[test]
    fn test_decode_png_bytes() {
        let fb = decode_image(&png_bytes(4, 3, [10, 20, 30, 255])).unwrap();
        assert_eq!((fb.width, fb.height), (4, 3));
        assert_eq!(fb.get_pixel(2, 1), Some([10, 20, 30, 255]));
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(StickerError::Decode(_))));
    }
}
