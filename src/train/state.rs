use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::metrics::{psnr_from_mse, EvaluationResult};
use crate::train::benchmark::BenchmarkReport;

/// Mutable progress of one trial, owned by the trial runner.
///
/// `window_steps` counts steps since the last epoch boundary and drives the
/// boundary test; `total_steps` and `images_seen` only ever grow.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingState {
    pub learning_rate: f64,
    pub epoch: usize,
    pub window_steps: usize,
    pub total_steps: usize,
    pub images_seen: usize,
    pub best_mse: Option<f64>,
    pub last_evaluation: Option<EvaluationResult>,
    pub last_loss: Option<f64>,
    /// Set at trial start and after each learning-rate change; cleared once
    /// the following step has been reported.
    pub model_updated: bool,
}

/// Snapshot taken when a full pass over the training set completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochBoundary {
    pub epoch: usize,
    pub window_steps: usize,
    pub total_steps: usize,
}

impl TrainingState {
    pub fn new(learning_rate: f64) -> TrainingState {
        TrainingState {
            learning_rate,
            epoch: 0,
            window_steps: 0,
            total_steps: 0,
            images_seen: 0,
            best_mse: None,
            last_evaluation: None,
            last_loss: None,
            model_updated: true,
        }
    }

    pub fn record_step(&mut self, batch_size: usize, loss: f64) {
        self.window_steps += 1;
        self.total_steps += 1;
        self.images_seen += batch_size;
        self.last_loss = Some(loss);
    }

    /// `window_steps * batch_size >= training_images`
    pub fn at_epoch_boundary(&self, batch_size: usize, training_images: usize) -> bool {
        self.window_steps * batch_size >= training_images
    }

    /// Counts the completed epoch.
    pub fn complete_epoch(&mut self) -> EpochBoundary {
        self.epoch += 1;
        EpochBoundary {
            epoch: self.epoch,
            window_steps: self.window_steps,
            total_steps: self.total_steps,
        }
    }

    /// Starts the step window of the next epoch.
    pub fn reset_window(&mut self) {
        self.window_steps = 0;
    }

    /// Strictly lower than the best so far, or the first value seen.
    /// Ties are not improvements.
    pub fn is_improvement(&self, mse: f64) -> bool {
        self.best_mse.map_or(true, |best| mse < best)
    }
}

/// Validation outcome of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub total_steps: usize,
    pub mse: f64,
    pub psnr: f64,
    /// Learning rate the epoch was trained with.
    pub learning_rate: f64,
    /// This epoch set a new best and its checkpoint was saved.
    pub improved: bool,
    /// The epoch update lowered the learning rate.
    pub lr_updated: bool,
}

/// Summary of one completed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial: usize,
    /// MSE of the last epoch boundary (or of a post-loop evaluation when no
    /// epoch completed).
    pub final_mse: f64,
    pub best_mse: Option<f64>,
    pub epochs: usize,
    pub total_steps: usize,
    pub images_seen: usize,
    pub final_learning_rate: f64,
    pub best_checkpoint_saves: usize,
    pub final_checkpoint: PathBuf,
    pub epoch_history: Vec<EpochRecord>,
    pub test_report: BenchmarkReport,
    pub benchmark_reports: Vec<BenchmarkReport>,
    pub elapsed_ms: u64,
}

impl TrialResult {
    pub fn steps_line(&self) -> String {
        format!(
            "Steps:{} Epochs:{} Images:{} LR:{:.3e} ({:.1}s)",
            self.total_steps,
            self.epochs,
            self.images_seen,
            self.final_learning_rate,
            self.elapsed_ms as f64 / 1000.0
        )
    }
}

/// Running totals across trials.
///
/// PSNR is averaged per trial: each trial's MSE is converted to PSNR first
/// and those values are averaged, rather than converting the mean MSE.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub total_mse: f64,
    pub total_psnr: f64,
    pub trials: Vec<TrialResult>,
}

impl ExperimentSummary {
    /// Adds a trial and returns its PSNR.
    pub fn add(&mut self, result: TrialResult, max_value: f64) -> f64 {
        let psnr = psnr_from_mse(result.final_mse, max_value);
        self.total_mse += result.final_mse;
        self.total_psnr += psnr;
        self.trials.push(result);
        psnr
    }

    pub fn trial_count(&self) -> usize {
        self.trials.len()
    }

    pub fn mean(&self) -> Option<EvaluationResult> {
        let n = self.trial_count();
        (n > 0).then(|| EvaluationResult {
            mse: self.total_mse / n as f64,
            psnr: self.total_psnr / n as f64,
        })
    }

    /// The grand average, reported only when more than one trial ran.
    pub fn final_average(&self) -> Option<EvaluationResult> {
        if self.trial_count() > 1 {
            self.mean()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn trial(i: usize, mse: f64) -> TrialResult {
        TrialResult {
            trial: i,
            final_mse: mse,
            best_mse: Some(mse),
            epochs: 1,
            total_steps: 10,
            images_seen: 100,
            final_learning_rate: 1e-5,
            best_checkpoint_saves: 1,
            final_checkpoint: PathBuf::from(format!("models/m_{i}.json")),
            epoch_history: Vec::new(),
            test_report: BenchmarkReport::empty("set5"),
            benchmark_reports: Vec::new(),
            elapsed_ms: 0,
        }
    }

    #[test]
    fn test_epoch_boundary_uses_window_steps() {
        let mut state = TrainingState::new(1e-3);
        for _ in 0..9 {
            state.record_step(10, 0.1);
            assert!(!state.at_epoch_boundary(10, 100));
        }
        state.record_step(10, 0.1);
        assert!(state.at_epoch_boundary(10, 100));

        let boundary = state.complete_epoch();
        assert_eq!(boundary, EpochBoundary { epoch: 1, window_steps: 10, total_steps: 10 });
        state.reset_window();
        assert!(!state.at_epoch_boundary(10, 100));
        assert_eq!(state.total_steps, 10);
        assert_eq!(state.images_seen, 100);
    }

    #[test]
    fn test_ties_are_not_improvements() {
        let mut state = TrainingState::new(1e-3);
        assert!(state.is_improvement(0.5));
        state.best_mse = Some(0.5);
        assert!(!state.is_improvement(0.5));
        assert!(state.is_improvement(0.4999));
    }

    #[test]
    fn test_summary_averages_psnr_per_trial() {
        let mut summary = ExperimentSummary::default();
        for (i, mse) in [0.01, 0.02, 0.03].into_iter().enumerate() {
            summary.add(trial(i, mse), 1.0);
        }

        let avg = summary.final_average().unwrap();
        assert!((avg.mse - 0.02).abs() < 1e-12);

        let per_trial: f64 = [0.01, 0.02, 0.03].iter().map(|&m| psnr_from_mse(m, 1.0)).sum::<f64>() / 3.0;
        assert!((avg.psnr - per_trial).abs() < 1e-12);
        // Differs from the PSNR of the averaged MSE.
        assert!((avg.psnr - psnr_from_mse(0.02, 1.0)).abs() > 0.1);
    }

    #[test]
    fn test_single_trial_has_no_final_average() {
        let mut summary = ExperimentSummary::default();
        summary.add(trial(0, 0.04), 1.0);
        assert_eq!(summary.final_average(), None);
        assert_eq!(summary.mean().unwrap().mse, 0.04);
    }
}
