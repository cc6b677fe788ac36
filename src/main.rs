//! ferrite-sr CLI: trains the patch super-resolver for a number of trials
//! and reports MSE / PSNR on the test and benchmark datasets.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use ferrite_sr::{
    run_experiment, ExperimentConfig, ExperimentSummary, FsDatasetProvider, JsonlTelemetry,
    PatchModelOptions, PatchSampler, PatchSuperResolver,
};

/// Train and benchmark a single-image super-resolution network.
///
/// Every flag is optional; unset flags keep the value from `--config`, or
/// the built-in default.
#[derive(Parser, Debug)]
#[command(name = "ferrite-sr", version, about, long_about = None)]
struct Cli {
    /// JSON configuration file to start from
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory of all datasets
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Training dataset name
    #[arg(long)]
    dataset: Option<String>,

    /// Test dataset name
    #[arg(long)]
    test_dataset: Option<String>,

    #[arg(long)]
    model_name: Option<String>,

    /// Checkpoint to load before training each trial
    #[arg(long)]
    load_model_name: Option<String>,

    /// Number of independent trials
    #[arg(long)]
    tests: Option<usize>,

    #[arg(long)]
    initial_lr: Option<f64>,

    /// Training stops once the learning rate reaches this value
    #[arg(long)]
    end_lr: Option<f64>,

    #[arg(long)]
    lr_decay: Option<f64>,

    /// Epochs without improvement before the learning rate decays
    #[arg(long)]
    lr_decay_epoch: Option<usize>,

    #[arg(long)]
    momentum: Option<f64>,

    #[arg(long)]
    batch_size: Option<usize>,

    /// Training patches per epoch
    #[arg(long)]
    training_images: Option<usize>,

    /// Low-resolution patch side in pixels
    #[arg(long)]
    patch_size: Option<u32>,

    #[arg(long)]
    scale: Option<u32>,

    /// Hidden layer sizes, comma separated
    #[arg(long, value_delimiter = ',')]
    hidden_layers: Option<Vec<usize>>,

    #[arg(long)]
    max_value: Option<f64>,

    /// Also evaluate on set5, set14 and bsd100 after each trial
    #[arg(long)]
    do_benchmark: bool,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Seed for weight initialization and patch sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn to_config(&self) -> anyhow::Result<ExperimentConfig> {
        let mut c = match &self.config {
            Some(path) => ExperimentConfig::load_json(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => ExperimentConfig::default(),
        };

        macro_rules! overlay {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = &self.$field { c.$field = v.clone(); })*
            };
        }
        overlay!(
            data_dir, dataset, test_dataset, model_name, load_model_name, tests,
            initial_lr, end_lr, lr_decay, lr_decay_epoch, momentum, batch_size,
            training_images, patch_size, scale, hidden_layers, max_value,
            output_dir, checkpoint_dir, log_dir,
        );
        if self.do_benchmark {
            c.do_benchmark = true;
        }
        if self.seed.is_some() {
            c.seed = self.seed;
        }
        Ok(c)
    }
}

fn init_logging(config: &ExperimentConfig, verbose: u8) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("creating log directory {}", config.log_dir.display()))?;

    let filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)));

    let file_appender = tracing_appender::rolling::never(&config.log_dir, config.log_file_name());
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;
    Ok(())
}

fn run(config: &ExperimentConfig) -> anyhow::Result<ExperimentSummary> {
    config.validate()?;
    info!("{}", std::env::args().collect::<Vec<_>>().join(" "));
    config.save_json(&config.log_dir.join("config.json"))?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let sampler = PatchSampler::load(
        &FsDatasetProvider,
        &config.training_dir(),
        config.patch_size,
        config.scale,
        StdRng::from_rng(&mut rng)?,
    )
    .with_context(|| format!("loading training data from {}", config.training_dir().display()))?;
    info!("Training images: {}", sampler.image_count());

    let mut model = PatchSuperResolver::new(
        PatchModelOptions::from(config),
        sampler,
        StdRng::from_rng(&mut rng)?,
    );
    let mut telemetry =
        JsonlTelemetry::create(&config.log_dir.join(format!("{}_telemetry.jsonl", config.model_name)))?;

    let summary = run_experiment(&mut model, &FsDatasetProvider, &mut telemetry, config)?;
    Ok(summary)
}

fn main() -> ExitCode {
    // Unknown arguments make clap print a message and exit with status 2.
    let cli = Cli::parse();

    let config = match cli.to_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&config, cli.verbose) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "ferrite-sr", "--tests", "3", "--hidden-layers", "32,16", "--do-benchmark",
        ])
        .unwrap();
        let config = cli.to_config().unwrap();
        assert_eq!(config.tests, 3);
        assert_eq!(config.hidden_layers, vec![32, 16]);
        assert!(config.do_benchmark);
        assert_eq!(config.test_dataset, ExperimentConfig::default().test_dataset);
    }

    #[test]
    fn test_unknown_argument_is_rejected() {
        assert!(Cli::try_parse_from(["ferrite-sr", "--bogus"]).is_err());
        assert!(Cli::try_parse_from(["ferrite-sr", "stray"]).is_err());
    }
}
