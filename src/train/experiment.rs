use chrono::Local;
use tracing::info;

use crate::config::{ExperimentConfig, ARCHIVE_NAME};
use crate::dataset::provider::DatasetProvider;
use crate::error::Result;
use crate::model::SuperResolutionModel;
use crate::telemetry::{archive_logs, TelemetrySink};
use crate::train::state::ExperimentSummary;
use crate::train::trial::run_trial;

/// Runs `config.tests` independent trials in sequence, logs one summary per
/// trial and, for more than one trial, the grand average. The log
/// directory is archived once all trials finished.
pub fn run_experiment<M, D, T>(
    model: &mut M,
    provider: &D,
    telemetry: &mut T,
    config: &ExperimentConfig,
) -> Result<ExperimentSummary>
where
    M: SuperResolutionModel + ?Sized,
    D: DatasetProvider + ?Sized,
    T: TelemetrySink + ?Sized,
{
    config.validate()?;
    info!("Test Data:{} Training Data:{}", config.test_dataset, config.dataset);
    info!("Total parameters: {}", model.parameter_count());

    let mut summary = ExperimentSummary::default();
    for trial in 0..config.tests {
        let result = run_trial(model, provider, telemetry, config, trial)?;
        let mse = result.final_mse;
        let steps = result.steps_line();
        let psnr = summary.add(result, config.max_value);

        info!("Trial({}) {}", trial, Local::now().format("%Y/%m/%d %H:%M:%S"));
        info!("{}", steps);
        info!("MSE:{:.6}, PSNR:{:.6}", mse, psnr);
    }

    if let Some(average) = summary.final_average() {
        info!(
            "=== Final Average [{}] MSE:{:.6}, PSNR:{:.6} ===",
            config.test_dataset, average.mse, average.psnr
        );
    }

    telemetry.flush()?;
    archive_logs(&config.log_dir, ARCHIVE_NAME, &config.model_name)?;
    Ok(summary)
}
