//! I/O helpers for RGBA buffers and JSON.
//!
//! - `load_rgba_image`: read a PNG/etc. into a 32-bit [`PixelBuffer`], collapsing alpha.
//! - `save_rgba_image`: write any [`PixelBuffer`] as an RGBA PNG.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::PixelBuffer;
use image::{DynamicImage, ImageBuffer, Rgba as ImgRgba};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk as a 1-bit-alpha RGBA buffer.
pub fn load_rgba_image(path: &Path) -> Result<PixelBuffer, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_rgba8();
    let width = img.width() as usize;
    let height = img.height() as usize;
    PixelBuffer::from_rgba8(width, height, img.as_raw())
        .map_err(|e| format!("Failed to decode {}: {e}", path.display()))
}

/// Save a buffer as an RGBA PNG (paletted buffers are expanded first).
pub fn save_rgba_image(buffer: &PixelBuffer, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let data = buffer.to_direct().to_rgba8();
    let image: ImageBuffer<ImgRgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(buffer.width() as u32, buffer.height() as u32, data)
            .ok_or_else(|| "Failed to create image buffer".to_string())?;
    DynamicImage::ImageRgba8(image)
        .save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
