// minicon.rs
// Train the conv + MLP classifier on MNIST and report test accuracy.
// Expected files (relative to --data-dir, default "."):
//   train-images.idx3-ubyte
//   train-labels.idx1-ubyte
//   t10k-images.idx3-ubyte
//   t10k-labels.idx1-ubyte
//
// Usage:
//   minicon <filter_size> <num_filters> <learning_rate> <epochs>
//   minicon --config config/minicon.json

use clap::Parser;
use log::{error, info};
use minicon::config::{load_config, ConfigError, TrainingConfig};
use minicon::error::TrainError;
use minicon::mnist::load_dataset;
use minicon::model::Model;
use minicon::utils::SimpleRng;
use std::process;

#[derive(Debug, Parser)]
#[command(name = "minicon", about = "Conv + MLP MNIST classifier trained by online SGD")]
struct Args {
    /// Side of each square convolution filter
    #[arg(required_unless_present = "config", conflicts_with = "config")]
    filter_size: Option<usize>,

    /// Number of convolution filters
    #[arg(required_unless_present = "config", conflicts_with = "config")]
    num_filters: Option<usize>,

    /// SGD learning rate
    #[arg(required_unless_present = "config", conflicts_with = "config")]
    learning_rate: Option<f64>,

    /// Maximum number of training epochs
    #[arg(required_unless_present = "config", conflicts_with = "config")]
    epochs: Option<usize>,

    /// JSON training configuration (replaces the positional arguments)
    #[arg(long)]
    config: Option<String>,

    /// Seed for parameter initialization
    #[arg(long)]
    seed: Option<u64>,

    /// Directory holding the IDX files
    #[arg(long)]
    data_dir: Option<String>,
}

fn resolve_config(args: &Args) -> Result<TrainingConfig, TrainError> {
    let mut config = match (
        &args.config,
        args.filter_size,
        args.num_filters,
        args.learning_rate,
        args.epochs,
    ) {
        (Some(path), ..) => load_config(path)?,
        (None, Some(filter_size), Some(num_filters), Some(learning_rate), Some(epochs)) => {
            TrainingConfig::new(filter_size, num_filters, learning_rate, epochs)?
        }
        _ => {
            return Err(ConfigError::Invalid(
                "expected <filter_size> <num_filters> <learning_rate> <epochs> or --config".to_string(),
            )
            .into())
        }
    };

    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(dir) = &args.data_dir {
        config = config.with_data_dir(dir);
    }
    Ok(config)
}

fn run(args: Args) -> Result<(), TrainError> {
    let config = resolve_config(&args)?;

    info!("Loading MNIST...");
    let train = load_dataset(&config.train_images, &config.train_labels)?;
    let test = load_dataset(&config.test_images, &config.test_labels)?;
    info!("Train: {} | Test: {}", train.len(), test.len());

    let image_size = train.first().ok_or(TrainError::EmptyDataset)?.image.rows();
    let mut rng = match config.seed {
        Some(seed) => SimpleRng::new(seed),
        None => SimpleRng::from_time(),
    };

    let mut model = Model::new(&config, image_size, &mut rng)?;
    info!(
        "Training: filters={}x{}x{} features={} params={} lr={} epochs={}",
        config.filter_count,
        config.filter_size,
        config.filter_size,
        model.conv().flat_size(),
        model.parameter_count(),
        config.learning_rate,
        config.epochs
    );

    model.train(&train)?;

    info!("Testing...");
    let accuracy = model.evaluate(&test)?;
    info!("Testing Accuracy = {:.2}%", accuracy * 100.0);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        error!("{}", err);
        process::exit(1);
    }
}
