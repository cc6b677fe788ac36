use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{ExperimentConfig, BENCHMARK_DATASETS};
use crate::dataset::provider::DatasetProvider;
use crate::error::{Result, SrError};
use crate::metrics::{psnr_from_mse, EvaluationResult};
use crate::model::SuperResolutionModel;

/// Result of an evaluation-only pass over one dataset.
///
/// Means are taken over `evaluated` files only; skipped files never count
/// towards the denominator. `result` is `None` when nothing could be
/// evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub dataset: String,
    pub listed: usize,
    pub evaluated: usize,
    pub skipped: Vec<PathBuf>,
    pub result: Option<EvaluationResult>,
}

impl BenchmarkReport {
    pub fn empty(dataset: &str) -> BenchmarkReport {
        BenchmarkReport {
            dataset: dataset.to_string(),
            listed: 0,
            evaluated: 0,
            skipped: Vec::new(),
            result: None,
        }
    }
}

/// Evaluates every image of `dataset`, writing reconstructions to
/// `<output_dir>/<dataset>`.
///
/// Per-file failures are logged and skipped; any other error aborts the
/// pass. An empty dataset is a configuration error.
pub fn evaluate_dataset<M, D>(
    model: &mut M,
    provider: &D,
    config: &ExperimentConfig,
    dataset: &str,
) -> Result<BenchmarkReport>
where
    M: SuperResolutionModel + ?Sized,
    D: DatasetProvider + ?Sized,
{
    let files = provider.list_files(&config.dataset_dir(dataset))?;
    if files.is_empty() {
        return Err(SrError::configuration(format!("empty test dataset: {dataset}")));
    }
    let output_dir = config.output_dir.join(dataset);

    let mut report = BenchmarkReport::empty(dataset);
    report.listed = files.len();
    let mut total_mse = 0.0;
    let mut total_psnr = 0.0;

    for file in &files {
        match model.evaluate_with_output(file, &output_dir) {
            Ok(mse) => {
                total_mse += mse;
                total_psnr += psnr_from_mse(mse, config.max_value);
                report.evaluated += 1;
            }
            Err(e) if e.is_per_file() => {
                warn!("{e}; skipped");
                report.skipped.push(file.clone());
            }
            Err(e) => return Err(e),
        }
    }

    if report.evaluated == 0 {
        warn!("=== [{dataset}] no image could be evaluated ({} skipped) ===", report.skipped.len());
        return Ok(report);
    }

    let n = report.evaluated as f64;
    let result = EvaluationResult { mse: total_mse / n, psnr: total_psnr / n };
    info!("=== [{}] MSE:{:.6}, PSNR:{:.6} ===", dataset, result.mse, result.psnr);
    if !report.skipped.is_empty() {
        info!("    averaged over {} of {} images", report.evaluated, report.listed);
    }
    report.result = Some(result);
    Ok(report)
}

/// Runs `evaluate_dataset` over the fixed benchmark sets, leaving out the
/// trial's own test dataset.
pub fn benchmark_sweep<M, D>(
    model: &mut M,
    provider: &D,
    config: &ExperimentConfig,
) -> Result<Vec<BenchmarkReport>>
where
    M: SuperResolutionModel + ?Sized,
    D: DatasetProvider + ?Sized,
{
    BENCHMARK_DATASETS
        .iter()
        .filter(|&&name| name != config.test_dataset)
        .map(|name| evaluate_dataset(&mut *model, provider, config, name))
        .collect()
}
