//! Emoji bitmap preparation and alpha pasting

use crate::{PaintError, Result};
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};

/// Decode image bytes and resize to `width` pixels wide
///
/// Height keeps the aspect ratio, rounded up. Resampling is Lanczos.
pub fn prepare_bitmap(bytes: &[u8], width: u32) -> Result<RgbaImage> {
    let decoded = image::load_from_memory(bytes)?.to_rgba8();
    let (w, h) = decoded.dimensions();
    if w == 0 || h == 0 || width == 0 {
        return Err(PaintError::EmptyBitmap);
    }

    let height = ((h as f64 / w as f64) * width as f64).ceil().max(1.0) as u32;
    if (w, h) == (width, height) {
        return Ok(decoded);
    }
    Ok(image::imageops::resize(&decoded, width, height, FilterType::Lanczos3))
}

/// Prepare a grid of optional assets, line by line and node by node
///
/// Absent assets stay absent; each present one is decoded independently.
pub fn prepare_bitmaps<B: AsRef<[u8]>>(
    assets: &[Vec<Option<B>>],
    width: u32,
) -> Vec<Vec<Option<Result<RgbaImage>>>> {
    assets
        .iter()
        .map(|line| {
            line.iter()
                .map(|asset| asset.as_ref().map(|bytes| prepare_bitmap(bytes.as_ref(), width)))
                .collect()
        })
        .collect()
}

#[inline]
fn mix(src: u8, dst: u8, alpha: u32) -> u8 {
    ((src as u32 * alpha + dst as u32 * (255 - alpha) + 127) / 255) as u8
}

/// Paste `src` with its top-left at (`x`, `y`), using its alpha as the mask
///
/// Every channel, alpha included, is blended as
/// `src * a + dst * (1 - a)`. Pixels outside `dst` are clipped.
pub fn paste_with_alpha(dst: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let (dw, dh) = (dst.width() as i64, dst.height() as i64);
    for (sx, sy, pixel) in src.enumerate_pixels() {
        let tx = x as i64 + sx as i64;
        let ty = y as i64 + sy as i64;
        if tx < 0 || ty < 0 || tx >= dw || ty >= dh {
            continue;
        }
        let alpha = pixel[3] as u32;
        if alpha == 0 {
            continue;
        }
        let target = dst.get_pixel_mut(tx as u32, ty as u32);
        for c in 0..4 {
            target[c] = mix(pixel[c], target[c], alpha);
        }
    }
}

/// Blend a solid colour at one pixel with `coverage` (0-255), compositing over
pub(crate) fn blend_coverage(dst: &mut RgbaImage, x: i64, y: i64, coverage: u8, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= dst.width() as i64 || y >= dst.height() as i64 {
        return;
    }
    let alpha = (coverage as u32 * color[3] as u32 + 127) / 255;
    if alpha == 0 {
        return;
    }
    let target = dst.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        target[c] = mix(color[c], target[c], alpha);
    }
    target[3] = (alpha + (target[3] as u32 * (255 - alpha) + 127) / 255).min(255) as u8;
}
