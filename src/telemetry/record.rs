use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which point of the training loop produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Emitted after every optimization step.
    Step,
    /// Emitted after the validation pass at an epoch boundary.
    Epoch,
}

/// One telemetry line.
///
/// `mse` / `psnr` are the latest validation figures and stay `None` until
/// the first epoch has been evaluated. `diagnostics` is only filled on
/// iterations that follow a learning-rate update, to keep the stream small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub trial: usize,
    pub kind: RecordKind,
    /// Completed epochs.
    pub epoch: usize,
    /// Optimization steps since the trial started.
    pub step: usize,
    pub learning_rate: f64,
    pub loss: Option<f64>,
    pub mse: Option<f64>,
    pub psnr: Option<f64>,
    /// Test image the record is keyed on.
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<serde_json::Value>,
}
