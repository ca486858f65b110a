use serde::{Deserialize, Serialize};

use crate::math::Affine;
use crate::Color;

/// Pixel format of a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit RGBA (4 bytes per pixel).
    Rgba8,
    /// 8-bit RGB (3 bytes per pixel, no alpha).
    Rgb8,
}

impl PixelFormat {
    /// Bytes per pixel for this format.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// A raster surface: decoded media, rasterized text and the canvas itself
/// are all frame buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    /// Raw pixel data.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: PixelFormat,
}

impl FrameBuffer {
    /// Create a new frame buffer filled with zeros (transparent black).
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let size = (width as usize) * (height as usize) * format.bytes_per_pixel();
        Self {
            data: vec![0u8; size],
            width,
            height,
            format,
        }
    }

    /// Create an RGBA frame buffer filled with a solid color.
    pub fn solid(width: u32, height: u32, color: &Color) -> Self {
        let mut fb = Self::new(width, height, PixelFormat::Rgba8);
        fb.fill(color);
        fb
    }

    /// Wrap raw RGBA bytes. Returns `None` when the length does not match.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            format: PixelFormat::Rgba8,
        })
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Total byte size of the pixel data.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|b| *b = 0);
    }

    /// Overwrite every pixel with `color`.
    pub fn fill(&mut self, color: &Color) {
        let rgba = color.to_rgba8();
        let bpp = self.format.bytes_per_pixel();
        for px in self.data.chunks_exact_mut(bpp) {
            px.copy_from_slice(&rgba[..bpp]);
        }
    }

    /// Get the RGBA value at a pixel coordinate. Returns None if out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * bpp;
        match self.format {
            PixelFormat::Rgba8 => Some([
                self.data[offset],
                self.data[offset + 1],
                self.data[offset + 2],
                self.data[offset + 3],
            ]),
            PixelFormat::Rgb8 => Some([
                self.data[offset],
                self.data[offset + 1],
                self.data[offset + 2],
                255,
            ]),
        }
    }

    /// Set the RGBA value at a pixel coordinate. No-op if out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let bpp = self.format.bytes_per_pixel();
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * bpp;
        self.data[offset..offset + bpp].copy_from_slice(&rgba[..bpp]);
    }

    /// Source-over blend of one pixel, with the source alpha scaled by `opacity`.
    pub fn blend_pixel(&mut self, x: u32, y: u32, src: [u8; 4], opacity: f32) {
        if x >= self.width || y >= self.height || self.format != PixelFormat::Rgba8 {
            return;
        }
        let sa = ((src[3] as f32) * opacity.clamp(0.0, 1.0)).round() as u32;
        if sa == 0 {
            return;
        }
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let d = &mut self.data[offset..offset + 4];
        blend_over(d, [src[0], src[1], src[2], sa as u8]);
    }

    /// Alpha-composite `src` on top of `self` at position (dx, dy).
    pub fn composite_over(&mut self, src: &FrameBuffer, dx: i32, dy: i32) {
        if self.format != PixelFormat::Rgba8 || src.format != PixelFormat::Rgba8 {
            return;
        }

        let start_y = (-dy).max(0);
        let end_y = (src.height as i32).min(self.height as i32 - dy);
        let start_x = (-dx).max(0);
        let end_x = (src.width as i32).min(self.width as i32 - dx);

        if start_x >= end_x || start_y >= end_y {
            return;
        }

        let src_stride = (src.width * 4) as usize;
        let dst_stride = (self.width * 4) as usize;

        for sy in start_y..end_y {
            let dst_y = dy + sy;
            let src_row_start = (sy as usize * src_stride) + (start_x as usize * 4);
            let dst_row_start = (dst_y as usize * dst_stride) + ((dx + start_x) as usize * 4);
            let len = (end_x - start_x) as usize * 4;

            let src_slice = &src.data[src_row_start..src_row_start + len];
            let dst_slice = &mut self.data[dst_row_start..dst_row_start + len];

            for (s, d) in src_slice.chunks_exact(4).zip(dst_slice.chunks_exact_mut(4)) {
                blend_over(d, [s[0], s[1], s[2], s[3]]);
            }
        }
    }

    /// Draw `src` stretched into the destination rectangle `(x, y, w, h)`,
    /// nearest-neighbour sampled. The rectangle may extend past the surface
    /// edges; the overflow is cropped.
    pub fn draw_scaled(&mut self, src: &FrameBuffer, x: f64, y: f64, w: f64, h: f64) {
        if w <= 0.0 || h <= 0.0 || src.width == 0 || src.height == 0 {
            return;
        }
        let x0 = x.max(0.0).floor() as u32;
        let y0 = y.max(0.0).floor() as u32;
        let x1 = (x + w).min(self.width as f64).ceil().max(0.0) as u32;
        let y1 = (y + h).min(self.height as f64).ceil().max(0.0) as u32;
        let sx_scale = src.width as f64 / w;
        let sy_scale = src.height as f64 / h;

        for dy in y0..y1 {
            let sy = ((dy as f64 + 0.5 - y) * sy_scale).floor();
            if sy < 0.0 || sy >= src.height as f64 {
                continue;
            }
            for dx in x0..x1 {
                let sx = ((dx as f64 + 0.5 - x) * sx_scale).floor();
                if sx < 0.0 || sx >= src.width as f64 {
                    continue;
                }
                if let Some(px) = src.get_pixel(sx as u32, sy as u32) {
                    self.blend_pixel(dx, dy, px, 1.0);
                }
            }
        }
    }

    /// Draw `src` through an affine transform mapping source pixel space to
    /// surface space, nearest-neighbour sampled, with a global opacity.
    pub fn draw_transformed(&mut self, src: &FrameBuffer, transform: &Affine, opacity: f32) {
        if opacity <= 0.0 || src.width == 0 || src.height == 0 {
            return;
        }
        let Some(inverse) = transform.invert() else {
            // Degenerate (e.g. a flip passing through zero width): nothing visible.
            return;
        };

        let (min_x, min_y, max_x, max_y) =
            transform.bounds(src.width as f64, src.height as f64);
        let x0 = min_x.floor().max(0.0) as u32;
        let y0 = min_y.floor().max(0.0) as u32;
        let x1 = max_x.ceil().min(self.width as f64).max(0.0) as u32;
        let y1 = max_y.ceil().min(self.height as f64).max(0.0) as u32;

        for dy in y0..y1 {
            for dx in x0..x1 {
                let (sx, sy) = inverse.apply(dx as f64 + 0.5, dy as f64 + 0.5);
                if sx < 0.0 || sy < 0.0 || sx >= src.width as f64 || sy >= src.height as f64 {
                    continue;
                }
                if let Some(px) = src.get_pixel(sx as u32, sy as u32) {
                    self.blend_pixel(dx, dy, px, opacity);
                }
            }
        }
    }
}

/// Porter-Duff "over" of a straight-alpha source onto a destination pixel.
fn blend_over(d: &mut [u8], s: [u8; 4]) {
    let sa = s[3] as u32;
    if sa == 0 {
        return;
    }
    if sa == 255 {
        d.copy_from_slice(&s);
        return;
    }

    let da = d[3] as u32;
    let inv_sa = 255 - sa;
    let out_a = sa + ((da * inv_sa) / 255);
    if out_a == 0 {
        return;
    }

    for c in 0..3 {
        let v = (s[c] as u32 * sa * 255 + d[c] as u32 * da * inv_sa) / (out_a * 255);
        d[c] = v.min(255) as u8;
    }
    d[3] = out_a as u8;
}
