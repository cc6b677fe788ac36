pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod model;
pub mod telemetry;
pub mod train;

// Convenience re-exports
pub use config::ExperimentConfig;
pub use dataset::{DatasetProvider, FsDatasetProvider, PatchSampler};
pub use error::{Result, SrError};
pub use metrics::{psnr_from_mse, EvaluationResult};
pub use model::{PatchModelOptions, PatchSuperResolver, SuperResolutionModel};
pub use network::Network;
pub use telemetry::{JsonlTelemetry, TelemetrySink};
pub use train::{run_experiment, run_trial, ExperimentSummary, TrialResult};
