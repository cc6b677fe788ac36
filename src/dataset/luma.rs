//! Luma image helpers backed by the `image` crate.
//!
//! Pixels are held as `f64` in [0, 1]; decoding, rescaling and PNG output go
//! through `image` so every dataset format it understands is accepted.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma};

use crate::error::{Result, SrError};

/// Filter used for both downscaling and the baseline upscale.
const RESAMPLE: FilterType = FilterType::CatmullRom;

/// Single-channel image, row-major, values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct LumaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<f64>,
}

impl LumaImage {
    pub fn new(width: u32, height: u32, pixels: Vec<f64>) -> LumaImage {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        LumaImage { width, height, pixels }
    }

    /// Decodes `path` and converts it to luma. Any failure to read or
    /// decode is reported as a per-file error so a benchmark pass can skip
    /// the file.
    pub fn open(path: &Path) -> Result<LumaImage> {
        let img = image::open(path).map_err(|e| SrError::per_file(path, e))?;
        let gray = img.to_luma8();
        let (width, height) = gray.dimensions();
        let pixels = gray.pixels().map(|p| p.0[0] as f64 / 255.0).collect();
        Ok(LumaImage { width, height, pixels })
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Pixel at (x, y) with coordinates clamped into the image.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> f64 {
        let cx = x.clamp(0, self.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.height as i64 - 1) as u32;
        self.get(cx, cy)
    }

    /// Drops the right/bottom remainder so both sides divide by `scale`.
    pub fn crop_to_multiple(&self, scale: u32) -> LumaImage {
        let width = self.width - self.width % scale;
        let height = self.height - self.height % scale;
        self.crop(0, 0, width, height)
    }

    pub fn crop(&self, x0: u32, y0: u32, width: u32, height: u32) -> LumaImage {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in y0..y0 + height {
            let start = (y * self.width + x0) as usize;
            pixels.extend_from_slice(&self.pixels[start..start + width as usize]);
        }
        LumaImage { width, height, pixels }
    }

    pub fn resize(&self, width: u32, height: u32) -> LumaImage {
        let buf: ImageBuffer<Luma<f32>, Vec<f32>> = ImageBuffer::from_vec(
            self.width,
            self.height,
            self.pixels.iter().map(|&p| p as f32).collect(),
        )
        .unwrap_or_else(|| ImageBuffer::new(self.width, self.height));
        let resized = imageops::resize(&buf, width, height, RESAMPLE);
        LumaImage {
            width,
            height,
            pixels: resized.into_raw().into_iter().map(f64::from).collect(),
        }
    }

    /// Writes the image as an 8-bit grayscale PNG. Unwritable paths are
    /// reported as IO errors, not per-file errors.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let bytes = self
            .pixels
            .iter()
            .map(|&p| (p.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();
        let gray = GrayImage::from_raw(self.width, self.height, bytes)
            .ok_or_else(|| SrError::training("pixel buffer does not match image size"))?;
        gray.save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| match e {
                image::ImageError::IoError(io) => SrError::Io(io),
                other => SrError::Image(other),
            })
    }
}
