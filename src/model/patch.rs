use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::rngs::StdRng;
use serde_json::json;
use tracing::debug;

use crate::config::ExperimentConfig;
use crate::dataset::luma::LumaImage;
use crate::dataset::patches::{PatchPair, PatchSampler};
use crate::error::{Result, SrError};
use crate::layers::dense::LayerGradients;
use crate::loss::mse::MseLoss;
use crate::metrics::{image_mse, mean, psnr_from_mse, EvaluationResult};
use crate::model::checkpoint::{checkpoint_path, trial_checkpoint_name, Checkpoint};
use crate::model::schedule::LrSchedule;
use crate::model::SuperResolutionModel;
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::optim::sgd::Sgd;

/// The slice of `ExperimentConfig` the patch model needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchModelOptions {
    pub model_name: String,
    pub patch_size: u32,
    pub scale: u32,
    pub hidden_layers: Vec<usize>,
    pub batch_size: usize,
    pub training_images: usize,
    pub initial_lr: f64,
    pub lr_decay: f64,
    pub lr_decay_epoch: usize,
    pub momentum: f64,
    pub max_value: f64,
    pub checkpoint_dir: PathBuf,
}

impl From<&ExperimentConfig> for PatchModelOptions {
    fn from(c: &ExperimentConfig) -> Self {
        PatchModelOptions {
            model_name: c.model_name.clone(),
            patch_size: c.patch_size,
            scale: c.scale,
            hidden_layers: c.hidden_layers.clone(),
            batch_size: c.batch_size,
            training_images: c.training_images,
            initial_lr: c.initial_lr,
            lr_decay: c.lr_decay,
            lr_decay_epoch: c.lr_decay_epoch,
            momentum: c.momentum,
            max_value: c.max_value,
            checkpoint_dir: c.checkpoint_dir.clone(),
        }
    }
}

/// Super-resolver that predicts, for each low-resolution tile, the residual
/// between the high-resolution tile and its CatmullRom upscale.
pub struct PatchSuperResolver {
    options: PatchModelOptions,
    network: Network,
    optimizer: Sgd,
    schedule: LrSchedule,
    sampler: PatchSampler,
    batch: Vec<PatchPair>,
    rng: StdRng,
}

impl PatchSuperResolver {
    pub fn new(options: PatchModelOptions, sampler: PatchSampler, mut rng: StdRng) -> PatchSuperResolver {
        let network = Network::from_spec(Self::spec(&options), &mut rng);
        PatchSuperResolver {
            optimizer: Sgd::new(options.momentum),
            schedule: LrSchedule::new(options.initial_lr, options.lr_decay, options.lr_decay_epoch),
            network,
            sampler,
            batch: Vec::new(),
            rng,
            options,
        }
    }

    fn spec(options: &PatchModelOptions) -> NetworkSpec {
        NetworkSpec::for_patches(options.patch_size, options.scale, &options.hidden_layers)
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Upscales `lr` to `width × height` and adds the predicted residual
    /// tile by tile. Tiles at the right/bottom edge read clamped pixels.
    pub fn reconstruct(&mut self, lr: &LumaImage, width: u32, height: u32) -> LumaImage {
        let p = self.options.patch_size;
        let s = self.options.scale;
        let out_side = (p * s) as usize;
        let mut base = lr.resize(width, height);

        for ty in (0..lr.height).step_by(p as usize) {
            for tx in (0..lr.width).step_by(p as usize) {
                let mut tile = Vec::with_capacity((p * p) as usize);
                for dy in 0..p {
                    for dx in 0..p {
                        tile.push(lr.get_clamped((tx + dx) as i64, (ty + dy) as i64));
                    }
                }
                let residual = self.network.forward(tile);

                for dy in 0..out_side {
                    let y = (ty * s) as usize + dy;
                    if y >= height as usize {
                        break;
                    }
                    for dx in 0..out_side {
                        let x = (tx * s) as usize + dx;
                        if x >= width as usize {
                            break;
                        }
                        base.pixels[y * width as usize + x] += residual[dy * out_side + dx];
                    }
                }
            }
        }

        for v in &mut base.pixels {
            *v = v.clamp(0.0, 1.0);
        }
        base
    }

    /// Degrades the ground truth by `scale`, reconstructs it and scores the
    /// result in `[0, max_value]` with a `scale`-pixel border trimmed.
    fn evaluate_file(&mut self, file: &Path) -> Result<(f64, LumaImage)> {
        let s = self.options.scale;
        let hr = LumaImage::open(file)?.crop_to_multiple(s);
        if hr.width == 0 || hr.height == 0 {
            return Err(SrError::per_file(file, format!("smaller than scale {s}")));
        }

        let lr = hr.resize(hr.width / s, hr.height / s);
        let sr = self.reconstruct(&lr, hr.width, hr.height);
        let unit_mse = image_mse(&sr.pixels, &hr.pixels, hr.width as usize, hr.height as usize, s as usize)
            .ok_or_else(|| SrError::per_file(file, "image is too small to score"))?;

        Ok((unit_mse * self.options.max_value * self.options.max_value, sr))
    }
}

impl SuperResolutionModel for PatchSuperResolver {
    fn initialize_parameters(&mut self) {
        self.network = Network::from_spec(Self::spec(&self.options), &mut self.rng);
        self.optimizer.reset();
        self.schedule.reset(self.options.initial_lr);
        self.batch.clear();
    }

    fn load_checkpoint(&mut self, name: &str) -> Result<()> {
        let path = checkpoint_path(&self.options.checkpoint_dir, name);
        let checkpoint = Checkpoint::load(&path)?;
        if checkpoint.network.spec != Self::spec(&self.options) {
            return Err(SrError::configuration(format!(
                "checkpoint {} was trained with a different architecture",
                path.display()
            )));
        }
        self.network = checkpoint.network;
        self.optimizer.reset();
        Ok(())
    }

    fn build_batch(&mut self) -> Result<()> {
        self.batch = self.sampler.sample_batch(self.options.batch_size);
        Ok(())
    }

    fn train_batch(&mut self) -> Result<f64> {
        if self.batch.is_empty() {
            return Err(SrError::training("train_batch called without a prepared batch"));
        }

        let mut acc: Vec<LayerGradients> = self.network.layers.iter().map(LayerGradients::zeros_like).collect();
        let mut total_loss = 0.0;
        for pair in &self.batch {
            let output = self.network.forward_train(pair.input.clone());
            total_loss += MseLoss::loss(&output, &pair.target);
            let grads = self.network.backward(MseLoss::derivative(&output, &pair.target));
            for (a, g) in acc.iter_mut().zip(&grads) {
                a.accumulate(g);
            }
        }

        let inv_batch = 1.0 / self.batch.len() as f64;
        for a in &mut acc {
            a.scale(inv_batch);
        }
        self.optimizer.step(&mut self.network, &acc, self.schedule.learning_rate);

        let loss = total_loss * inv_batch;
        self.batch.clear();
        if !loss.is_finite() {
            return Err(SrError::training(format!("batch loss diverged: {loss}")));
        }
        Ok(loss)
    }

    fn evaluate(&mut self, files: &[PathBuf]) -> Result<EvaluationResult> {
        if files.is_empty() {
            return Err(SrError::configuration("empty test dataset"));
        }
        let mut mses = Vec::with_capacity(files.len());
        let mut psnrs = Vec::with_capacity(files.len());
        for file in files {
            let (mse, _) = self.evaluate_file(file)?;
            mses.push(mse);
            psnrs.push(psnr_from_mse(mse, self.options.max_value));
        }
        Ok(EvaluationResult {
            mse: mean(&mses).unwrap_or(f64::NAN),
            psnr: mean(&psnrs).unwrap_or(f64::NAN),
        })
    }

    fn evaluate_with_output(&mut self, file: &Path, output_dir: &Path) -> Result<f64> {
        let (mse, sr) = self.evaluate_file(file)?;
        std::fs::create_dir_all(output_dir)?;
        let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
        let out = output_dir.join(format!("{stem}_result.png"));
        sr.save_png(&out)?;
        debug!(file = %file.display(), output = %out.display(), mse, "evaluated");
        Ok(mse)
    }

    fn save_checkpoint(&mut self, trial: usize) -> Result<PathBuf> {
        let name = trial_checkpoint_name(&self.options.model_name, trial);
        let path = checkpoint_path(&self.options.checkpoint_dir, &name);
        let checkpoint = Checkpoint {
            model_name: self.options.model_name.clone(),
            trial: Some(trial),
            learning_rate: self.schedule.learning_rate,
            epochs_completed: self.schedule.epochs(),
            saved_at: Utc::now(),
            network: self.network.clone(),
        };
        checkpoint.save(&path)?;
        Ok(path)
    }

    fn apply_epoch_update(&mut self, mse: f64) -> bool {
        self.schedule.end_epoch(mse)
    }

    fn learning_rate(&self) -> f64 {
        self.schedule.learning_rate
    }

    fn batch_size(&self) -> usize {
        self.options.batch_size
    }

    fn training_image_count(&self) -> usize {
        self.options.training_images
    }

    fn parameter_count(&self) -> usize {
        self.network.parameter_count()
    }

    fn diagnostics(&self) -> serde_json::Value {
        json!({
            "weight_rms": self.network.weight_rms(),
            "training_sources": self.sampler.image_count(),
        })
    }
}
