//! Image quality metrics.

pub mod psnr;

use serde::{Deserialize, Serialize};

pub use psnr::{image_mse, mean, psnr_from_mse};

/// Outcome of evaluating the model on a set of images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub mse: f64,
    pub psnr: f64,
}

impl EvaluationResult {
    /// PSNR derived from the MSE itself.
    pub fn from_mse(mse: f64, max_value: f64) -> EvaluationResult {
        EvaluationResult { mse, psnr: psnr_from_mse(mse, max_value) }
    }
}
