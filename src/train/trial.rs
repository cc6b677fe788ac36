use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::ExperimentConfig;
use crate::dataset::provider::DatasetProvider;
use crate::error::{Result, SrError};
use crate::model::SuperResolutionModel;
use crate::telemetry::{RecordKind, TelemetryRecord, TelemetrySink};
use crate::train::benchmark::{benchmark_sweep, evaluate_dataset};
use crate::train::state::{EpochRecord, TrainingState, TrialResult};

/// Trains `model` from freshly initialized parameters until its learning
/// rate is at or below `config.end_lr`, then saves, tests and optionally
/// benchmarks it.
///
/// The loop is a plain pre-condition loop: a model whose initial rate is
/// already at the floor performs no steps but is still saved and tested.
///
/// # Errors
/// - `DirectoryNotFound` / `Configuration` when the test dataset is missing
///   or empty
/// - `CheckpointNotFound` when `load_model_name` names no checkpoint
/// - anything the model or telemetry sink returns
pub fn run_trial<M, D, T>(
    model: &mut M,
    provider: &D,
    telemetry: &mut T,
    config: &ExperimentConfig,
    trial: usize,
) -> Result<TrialResult>
where
    M: SuperResolutionModel + ?Sized,
    D: DatasetProvider + ?Sized,
    T: TelemetrySink + ?Sized,
{
    let started = Instant::now();

    let test_files = provider.list_files(&config.test_dir())?;
    let key_file = match test_files.first() {
        Some(f) => file_label(f),
        None => return Err(SrError::configuration("empty test dataset")),
    };

    model.initialize_parameters();
    if !config.load_model_name.is_empty() {
        model.load_checkpoint(&config.load_model_name)?;
        info!("Loaded model [{}] for trial {}", config.load_model_name, trial);
    }

    let batch_size = model.batch_size();
    let training_images = model.training_image_count();
    let mut state = TrainingState::new(model.learning_rate());
    let mut history = Vec::new();
    let mut best_saves = 0;

    if state.learning_rate <= config.end_lr {
        warn!(
            "learning rate {} is already at or below end_lr {}; trial {} skips training",
            state.learning_rate, config.end_lr, trial
        );
    }

    while model.learning_rate() > config.end_lr {
        model.build_batch()?;
        let loss = model.train_batch()?;
        state.record_step(batch_size, loss);

        report_status(trial, &state, state.model_updated);
        let diagnostics = state.model_updated.then(|| model.diagnostics());
        telemetry.record(&record(trial, RecordKind::Step, &state, &key_file, diagnostics))?;
        state.model_updated = false;

        if state.at_epoch_boundary(batch_size, training_images) {
            let boundary = state.complete_epoch();
            let evaluation = model.evaluate(&test_files)?;
            state.last_evaluation = Some(evaluation);

            report_status(trial, &state, true);
            telemetry.record(&record(trial, RecordKind::Epoch, &state, &key_file, Some(model.diagnostics())))?;

            // Bookkeeping follows a successful save only.
            let improved = state.is_improvement(evaluation.mse);
            if improved {
                let path = model.save_checkpoint(trial)?;
                state.best_mse = Some(evaluation.mse);
                best_saves += 1;
                debug!("best checkpoint for trial {} at epoch {}: {}", trial, boundary.epoch, path.display());
            }

            let lr_updated = model.apply_epoch_update(evaluation.mse);
            history.push(EpochRecord {
                epoch: boundary.epoch,
                total_steps: boundary.total_steps,
                mse: evaluation.mse,
                psnr: evaluation.psnr,
                learning_rate: state.learning_rate,
                improved,
                lr_updated,
            });
            if lr_updated {
                info!("Learning rate {:.3e} -> {:.3e}", state.learning_rate, model.learning_rate());
            }
            state.learning_rate = model.learning_rate();
            state.model_updated = lr_updated;
            state.reset_window();
        }
    }
    telemetry.flush()?;

    let final_checkpoint = model.save_checkpoint(trial)?;
    info!("Model saved [{}]", final_checkpoint.display());

    let test_report = evaluate_dataset(model, provider, config, &config.test_dataset)?;
    let benchmark_reports = if config.do_benchmark {
        benchmark_sweep(model, provider, config)?
    } else {
        Vec::new()
    };

    let final_mse = match state.last_evaluation {
        Some(evaluation) => evaluation.mse,
        None => model.evaluate(&test_files)?.mse,
    };

    Ok(TrialResult {
        trial,
        final_mse,
        best_mse: state.best_mse,
        epochs: state.epoch,
        total_steps: state.total_steps,
        images_seen: state.images_seen,
        final_learning_rate: model.learning_rate(),
        best_checkpoint_saves: best_saves,
        final_checkpoint,
        epoch_history: history,
        test_report,
        benchmark_reports,
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Status line; info level when `log` is set, debug otherwise.
fn report_status(trial: usize, state: &TrainingState, log: bool) {
    let (mse, psnr) = match state.last_evaluation {
        Some(e) => (format!("{:.6}", e.mse), format!("{:.4}", e.psnr)),
        None => ("n/a".to_string(), "n/a".to_string()),
    };
    let loss = state.last_loss.map_or("n/a".to_string(), |l| format!("{l:.6}"));
    if log {
        info!(
            "Trial:{} Epoch:{} Step:{} LR:{:.3e} Loss:{} MSE:{} PSNR:{}",
            trial, state.epoch, state.total_steps, state.learning_rate, loss, mse, psnr
        );
    } else {
        debug!(
            "Trial:{} Epoch:{} Step:{} LR:{:.3e} Loss:{} MSE:{} PSNR:{}",
            trial, state.epoch, state.total_steps, state.learning_rate, loss, mse, psnr
        );
    }
}

fn record(
    trial: usize,
    kind: RecordKind,
    state: &TrainingState,
    file: &str,
    diagnostics: Option<serde_json::Value>,
) -> TelemetryRecord {
    TelemetryRecord {
        timestamp: Utc::now(),
        trial,
        kind,
        epoch: state.epoch,
        step: state.total_steps,
        learning_rate: state.learning_rate,
        loss: state.last_loss,
        mse: state.last_evaluation.map(|e| e.mse),
        psnr: state.last_evaluation.map(|e| e.psnr),
        file: file.to_string(),
        diagnostics,
    }
}
