//! Image loading utilities for texture data
//!
//! Decodes image assets into RGBA8 pixel data ready for GPU upload, and
//! synthesizes deterministic fallback patterns so the texture pipeline never
//! fails for a missing asset.

use crate::assets::AssetError;
use std::path::Path;

/// Decoded RGBA8 pixel data ready for GPU upload
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Raw RGBA pixel bytes, row-major
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageData {
    /// Load and decode an image file, converting to RGBA8.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| AssetError::LoadFailed(format!("{}: {e}", path.display())))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::info!("Loaded image {}x{} from {}", width, height, path.display());

        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    /// Deterministic two-color checkerboard, used when the mesh texture asset
    /// is missing. Cell color depends only on the pixel coordinate.
    pub fn checkerboard(width: u32, height: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let color = if (x / cell + y / cell) % 2 == 0 { a } else { b };
                data.extend_from_slice(&color);
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Deterministic vertical gradient, used when the background texture
    /// asset is missing.
    pub fn vertical_gradient(width: u32, height: u32, top: [u8; 4], bottom: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        let denom = (height.max(2) - 1) as f32;
        for y in 0..height {
            let f = y as f32 / denom;
            let mut color = [0u8; 4];
            for c in 0..4 {
                color[c] = (f32::from(top[c]) + (f32::from(bottom[c]) - f32::from(top[c])) * f)
                    .round() as u8;
            }
            for _ in 0..width {
                data.extend_from_slice(&color);
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Size of the pixel data in bytes (`width * height * 4`)
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_alternates_cells() {
        let img = ImageData::checkerboard(64, 64, 32, [0, 255, 255, 255], [255, 0, 0, 255]);
        assert_eq!(img.size_bytes(), 64 * 64 * 4);
        // (0,0) is in the first cell, (32,0) in the second.
        assert_eq!(&img.data[0..4], &[0, 255, 255, 255]);
        let off = 32 * 4;
        assert_eq!(&img.data[off..off + 4], &[255, 0, 0, 255]);
    }

    #[test]
    fn checkerboard_is_deterministic() {
        let a = ImageData::checkerboard(16, 16, 4, [1, 2, 3, 4], [5, 6, 7, 8]);
        let b = ImageData::checkerboard(16, 16, 4, [1, 2, 3, 4], [5, 6, 7, 8]);
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn gradient_endpoints_match() {
        let img = ImageData::vertical_gradient(2, 8, [0, 0, 0, 255], [255, 255, 255, 255]);
        assert_eq!(&img.data[0..4], &[0, 0, 0, 255]);
        let last = img.size_bytes() - 4;
        assert_eq!(&img.data[last..], &[255, 255, 255, 255]);
    }

    #[test]
    fn missing_file_reports_error() {
        assert!(ImageData::from_file("definitely/not/here.png").is_err());
    }
}
