//! The model capability consumed by the training loop, and the in-crate
//! patch super-resolver that implements it.

pub mod checkpoint;
pub mod patch;
pub mod schedule;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::metrics::EvaluationResult;

pub use checkpoint::Checkpoint;
pub use patch::{PatchModelOptions, PatchSuperResolver};
pub use schedule::LrSchedule;

/// Everything the trial runner needs from a trainable super-resolution
/// model. Step and epoch bookkeeping stays with the caller; the model owns
/// parameters, optimizer state and the learning rate.
pub trait SuperResolutionModel {
    /// Re-initializes all trainable state, including the learning rate.
    fn initialize_parameters(&mut self);

    /// Restores parameters from the checkpoint called `name`.
    /// Fails with `CheckpointNotFound` when it does not exist.
    fn load_checkpoint(&mut self, name: &str) -> Result<()>;

    /// Prepares the next training batch.
    fn build_batch(&mut self) -> Result<()>;

    /// One optimization step on the prepared batch; returns the batch loss.
    fn train_batch(&mut self) -> Result<f64>;

    /// Mean MSE and mean per-image PSNR over `files`.
    fn evaluate(&mut self, files: &[PathBuf]) -> Result<EvaluationResult>;

    /// Evaluates one image and writes its reconstruction into `output_dir`.
    ///
    /// An unreadable input is `PerFileEvaluation`; an unwritable output is
    /// `Io`.
    fn evaluate_with_output(&mut self, file: &Path, output_dir: &Path) -> Result<f64>;

    /// Persists the current parameters tagged with `trial`.
    fn save_checkpoint(&mut self, trial: usize) -> Result<PathBuf>;

    /// Applies the learning-rate policy for a completed epoch whose
    /// validation MSE was `mse`. Returns `true` when the rate changed.
    fn apply_epoch_update(&mut self, mse: f64) -> bool;

    fn learning_rate(&self) -> f64;

    fn batch_size(&self) -> usize;

    /// Images that make up one epoch.
    fn training_image_count(&self) -> usize;

    fn parameter_count(&self) -> usize;

    /// Auxiliary debug data attached to telemetry on update steps.
    fn diagnostics(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}
