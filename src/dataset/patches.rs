use std::path::Path;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, warn};

use crate::dataset::luma::LumaImage;
use crate::dataset::provider::DatasetProvider;
use crate::error::{Result, SrError};

/// One training example: a flattened low-resolution patch and the residual
/// between the high-resolution patch and its plain upscale.
#[derive(Debug, Clone)]
pub struct PatchPair {
    pub input: Vec<f64>,
    pub target: Vec<f64>,
}

/// Draws random training patches from a set of high-resolution images.
pub struct PatchSampler {
    images: Vec<LumaImage>,
    patch_size: u32,
    scale: u32,
    rng: StdRng,
}

impl PatchSampler {
    /// Loads every readable image of `dir`. Unreadable files are skipped with
    /// a warning; images smaller than one high-resolution patch are dropped.
    pub fn load<D: DatasetProvider>(
        provider: &D,
        dir: &Path,
        patch_size: u32,
        scale: u32,
        rng: StdRng,
    ) -> Result<PatchSampler> {
        let mut images = Vec::new();
        for file in provider.list_files(dir)? {
            match LumaImage::open(&file) {
                Ok(img) => images.push(img),
                Err(e) if e.is_per_file() => warn!("skipping training image: {e}"),
                Err(e) => return Err(e),
            }
        }
        debug!(dir = %dir.display(), images = images.len(), "loaded training images");
        PatchSampler::from_images(images, patch_size, scale, rng)
    }

    pub fn from_images(
        images: Vec<LumaImage>,
        patch_size: u32,
        scale: u32,
        rng: StdRng,
    ) -> Result<PatchSampler> {
        let side = patch_size * scale;
        let images: Vec<LumaImage> = images
            .into_iter()
            .filter(|img| img.width >= side && img.height >= side)
            .collect();
        if images.is_empty() {
            return Err(SrError::configuration(format!(
                "no training image is at least {side}x{side} pixels"
            )));
        }
        Ok(PatchSampler { images, patch_size, scale, rng })
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// A random crop, optionally mirrored, degraded by `scale`.
    pub fn sample(&mut self) -> PatchPair {
        let side = self.patch_size * self.scale;
        let img = &self.images[self.rng.gen_range(0..self.images.len())];
        let x = self.rng.gen_range(0..=img.width - side);
        let y = self.rng.gen_range(0..=img.height - side);
        let mut hr = img.crop(x, y, side, side);
        if self.rng.gen_bool(0.5) {
            mirror(&mut hr);
        }

        let lr = hr.resize(self.patch_size, self.patch_size);
        let upscaled = lr.resize(side, side);
        let target = hr.pixels.iter().zip(&upscaled.pixels).map(|(h, u)| h - u).collect();

        PatchPair { input: lr.pixels, target }
    }

    pub fn sample_batch(&mut self, batch_size: usize) -> Vec<PatchPair> {
        (0..batch_size).map(|_| self.sample()).collect()
    }
}

fn mirror(img: &mut LumaImage) {
    let w = img.width as usize;
    for row in img.pixels.chunks_mut(w) {
        row.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn flat(width: u32, height: u32, value: f64) -> LumaImage {
        LumaImage::new(width, height, vec![value; (width * height) as usize])
    }

    #[test]
    fn test_patch_shapes() {
        let rng = StdRng::seed_from_u64(11);
        let mut sampler = PatchSampler::from_images(vec![flat(20, 16, 0.3)], 4, 2, rng).unwrap();
        let batch = sampler.sample_batch(3);
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|p| p.input.len() == 16 && p.target.len() == 64));
    }

    #[test]
    fn test_flat_image_has_zero_residual() {
        let rng = StdRng::seed_from_u64(5);
        let mut sampler = PatchSampler::from_images(vec![flat(8, 8, 0.6)], 4, 2, rng).unwrap();
        let pair = sampler.sample();
        assert!(pair.target.iter().all(|t| t.abs() < 1e-5));
    }

    #[test]
    fn test_too_small_images_are_a_configuration_error() {
        let rng = StdRng::seed_from_u64(0);
        let result = PatchSampler::from_images(vec![flat(5, 5, 0.1)], 4, 2, rng);
        assert!(matches!(result, Err(SrError::Configuration(_))));
    }

    #[test]
    fn test_mirror_reverses_rows() {
        let mut img = LumaImage::new(3, 1, vec![0.1, 0.2, 0.3]);
        mirror(&mut img);
        assert_eq!(img.pixels, vec![0.3, 0.2, 0.1]);
    }
}
