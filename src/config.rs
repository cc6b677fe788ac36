use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SrError};

/// Benchmark datasets swept after a trial when `do_benchmark` is set.
pub const BENCHMARK_DATASETS: [&str; 3] = ["set5", "set14", "bsd100"];

/// Name under which the log directory is archived at the end of a run.
pub const ARCHIVE_NAME: &str = "archive";

/// Immutable configuration for one experiment, built once and passed by
/// reference to every stage.
///
/// # Fields
/// - `dataset`         : training dataset directory name under `data_dir`
/// - `test_dataset`    : validation / test dataset name under `data_dir`
/// - `tests`           : number of independent trials
/// - `initial_lr`      : learning rate at the start of every trial
/// - `end_lr`          : training stops once the rate is at or below this
/// - `lr_decay`        : multiplier applied when validation MSE plateaus
/// - `lr_decay_epoch`  : epochs without improvement before a decay
/// - `training_images` : patches that make up one epoch
/// - `patch_size`      : side of a low-resolution training patch, in pixels
/// - `scale`           : upscaling factor
/// - `max_value`       : peak pixel value used for MSE and PSNR
/// - `load_model_name` : checkpoint to start every trial from (empty = none)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub data_dir: PathBuf,
    pub dataset: String,
    pub test_dataset: String,
    pub model_name: String,
    pub load_model_name: String,
    pub tests: usize,
    pub initial_lr: f64,
    pub end_lr: f64,
    pub lr_decay: f64,
    pub lr_decay_epoch: usize,
    pub momentum: f64,
    pub batch_size: usize,
    pub training_images: usize,
    pub patch_size: u32,
    pub scale: u32,
    pub hidden_layers: Vec<usize>,
    pub max_value: f64,
    pub do_benchmark: bool,
    pub output_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub log_dir: PathBuf,
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            data_dir: PathBuf::from("data"),
            dataset: "yang91".to_string(),
            test_dataset: "set5".to_string(),
            model_name: "ferrite_sr".to_string(),
            load_model_name: String::new(),
            tests: 1,
            initial_lr: 0.002,
            end_lr: 2e-5,
            lr_decay: 0.5,
            lr_decay_epoch: 9,
            momentum: 0.9,
            batch_size: 20,
            training_images: 2000,
            patch_size: 8,
            scale: 2,
            hidden_layers: vec![96, 64],
            max_value: 255.0,
            do_benchmark: false,
            output_dir: PathBuf::from("output"),
            checkpoint_dir: PathBuf::from("models"),
            log_dir: PathBuf::from("logs"),
            seed: None,
        }
    }
}

impl ExperimentConfig {
    /// Rejects settings the training loop cannot run with.
    ///
    /// `initial_lr <= end_lr` is allowed: the trial then performs no training
    /// steps and only saves and evaluates the initial parameters.
    pub fn validate(&self) -> Result<()> {
        if self.dataset.is_empty() || self.test_dataset.is_empty() {
            return Err(SrError::configuration("dataset names must not be empty"));
        }
        if self.model_name.is_empty() {
            return Err(SrError::configuration("model_name must not be empty"));
        }
        if self.tests == 0 {
            return Err(SrError::configuration("tests must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(SrError::configuration("batch_size must be at least 1"));
        }
        if self.training_images == 0 {
            return Err(SrError::configuration("training_images must be at least 1"));
        }
        if self.patch_size == 0 {
            return Err(SrError::configuration("patch_size must be at least 1"));
        }
        if self.scale < 2 {
            return Err(SrError::configuration("scale must be at least 2"));
        }
        if !(self.end_lr > 0.0) || !self.initial_lr.is_finite() || self.initial_lr <= 0.0 {
            return Err(SrError::configuration(format!(
                "invalid learning rate bounds: initial_lr={} end_lr={}",
                self.initial_lr, self.end_lr
            )));
        }
        if !(self.lr_decay > 0.0 && self.lr_decay < 1.0) {
            return Err(SrError::configuration(format!(
                "lr_decay must be in (0, 1), got {}",
                self.lr_decay
            )));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(SrError::configuration(format!(
                "momentum must be in [0, 1), got {}",
                self.momentum
            )));
        }
        if !(self.max_value > 0.0) {
            return Err(SrError::configuration("max_value must be positive"));
        }
        Ok(())
    }

    /// Directory holding the images of dataset `name`.
    pub fn dataset_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn training_dir(&self) -> PathBuf {
        self.dataset_dir(&self.dataset)
    }

    pub fn test_dir(&self) -> PathBuf {
        self.dataset_dir(&self.test_dataset)
    }

    /// Plain-text log file written by the binary.
    pub fn log_file_name(&self) -> String {
        format!("{}.log", self.model_name)
    }

    /// Serializes the configuration to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads a configuration written by `save_json`; missing fields take
    /// their defaults.
    pub fn load_json(path: &Path) -> Result<ExperimentConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExperimentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let config = ExperimentConfig { batch_size: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(SrError::Configuration(_))));
    }

    #[test]
    fn test_rejects_non_positive_end_lr() {
        let config = ExperimentConfig { end_lr: 0.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(SrError::Configuration(_))));
    }

    #[test]
    fn test_rejects_decay_outside_unit_interval() {
        let config = ExperimentConfig { lr_decay: 1.0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_accepts_initial_lr_below_floor() {
        let config = ExperimentConfig {
            initial_lr: 1e-5,
            end_lr: 1e-4,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_json_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "tests": 3, "do_benchmark": true }"#).unwrap();

        let config = ExperimentConfig::load_json(&path).unwrap();
        assert_eq!(config.tests, 3);
        assert!(config.do_benchmark);
        assert_eq!(config.test_dataset, "set5");
    }
}
