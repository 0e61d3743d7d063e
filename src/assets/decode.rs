use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{ComposerError, ComposerResult};
use crate::foundation::math::premultiply_rgba8_in_place;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Raster image in premultiplied RGBA8 form, ready for any surface.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap straight-alpha RGBA8 bytes, premultiplying them.
    pub fn from_straight_rgba8(width: u32, height: u32, mut rgba: Vec<u8>) -> ComposerResult<Self> {
        check_len(width, height, rgba.len())?;
        premultiply_rgba8_in_place(&mut rgba);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
        })
    }

    /// Wrap bytes that are already premultiplied.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba: Vec<u8>) -> ComposerResult<Self> {
        check_len(width, height, rgba.len())?;
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
        })
    }

    /// A `width`x`height` image filled with one straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> ComposerResult<Self> {
        let n = (width as usize).saturating_mul(height as usize);
        let bytes = rgba.repeat(n);
        Self::from_straight_rgba8(width, height, bytes)
    }
}

fn check_len(width: u32, height: u32, len: usize) -> ComposerResult<()> {
    if width == 0 || height == 0 {
        return Err(ComposerError::asset_load("image has zero width or height"));
    }
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ComposerError::asset_load("image buffer size overflow"))?;
    if len != expected {
        return Err(ComposerError::asset_load(format!(
            "image buffer has {len} bytes, expected {expected} for {width}x{height}"
        )));
    }
    Ok(())
}

/// Decode PNG/JPEG/WebP/etc. bytes into a premultiplied image.
pub fn decode_image(bytes: &[u8]) -> ComposerResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ComposerError::asset_load(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PreparedImage::from_straight_rgba8(width, height, rgba.into_raw())
}

/// Read and decode an image file.
pub fn load_image_file(path: &Path) -> ComposerResult<PreparedImage> {
    let bytes = std::fs::read(path).map_err(|e| {
        ComposerError::asset_load(format!("failed to read image '{}': {e}", path.display()))
    })?;
    decode_image(&bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
