//! The training control loop: trials, evaluation passes and experiments.

pub mod benchmark;
pub mod experiment;
pub mod state;
pub mod trial;

pub use benchmark::{benchmark_sweep, evaluate_dataset, BenchmarkReport};
pub use experiment::run_experiment;
pub use state::{EpochBoundary, EpochRecord, ExperimentSummary, TrainingState, TrialResult};
pub use trial::run_trial;
