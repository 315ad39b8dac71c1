//! Configuration structures
//!
//! This module holds the validated topology values for both layers and the
//! training run configuration that can be loaded from a JSON file.

use serde::Deserialize;
use std::fs;
use std::io;
use thiserror::Error;

/// Convolution stride.
pub const CONV_STRIDE: usize = 1;
/// Side of the square pooling window.
pub const POOL_WINDOW: usize = 2;
/// Pooling stride.
pub const POOL_STRIDE: usize = 2;

/// Hidden layer 1 width.
pub const HIDDEN1_SIZE: usize = 120;
/// Hidden layer 2 width.
pub const HIDDEN2_SIZE: usize = 80;
/// Number of output classes.
pub const OUTPUT_SIZE: usize = 10;

/// Accuracy (percent) above which training stops after an epoch.
pub const DEFAULT_EARLY_STOP_ACCURACY: f64 = 98.5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

/// Geometry of the convolution + pooling stage.
///
/// Square images and square filters; stride and pooling are fixed.
///
/// # Example
///
/// ```
/// use minicon::config::ConvPoolConfig;
///
/// let cfg = ConvPoolConfig::new(28, 5, 8).unwrap();
/// assert_eq!(cfg.conv_dim(), 24);
/// assert_eq!(cfg.pool_dim(), 12);
/// assert_eq!(cfg.flat_size(), 12 * 12 * 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvPoolConfig {
    pub input_size: usize,
    pub filter_size: usize,
    pub filter_count: usize,
    pub stride: usize,
    pub pool_window: usize,
    pub pool_stride: usize,
}

impl ConvPoolConfig {
    pub fn new(input_size: usize, filter_size: usize, filter_count: usize) -> Result<Self, ConfigError> {
        if input_size == 0 || filter_size == 0 || filter_count == 0 {
            return Err(invalid(
                "input size, filter size and filter count must be positive",
            ));
        }
        if filter_size > input_size {
            return Err(invalid(format!(
                "filter size {} exceeds input size {}",
                filter_size, input_size
            )));
        }

        let cfg = Self {
            input_size,
            filter_size,
            filter_count,
            stride: CONV_STRIDE,
            pool_window: POOL_WINDOW,
            pool_stride: POOL_STRIDE,
        };
        if cfg.conv_dim() < cfg.pool_window {
            return Err(invalid(format!(
                "convolution output {}x{} is smaller than the {}x{} pooling window",
                cfg.conv_dim(),
                cfg.conv_dim(),
                cfg.pool_window,
                cfg.pool_window
            )));
        }
        Ok(cfg)
    }

    /// Side of each convolution output: (input - filter) / stride + 1.
    pub fn conv_dim(&self) -> usize {
        (self.input_size - self.filter_size) / self.stride + 1
    }

    /// Side of each pooled map: (conv - window) / pool_stride + 1, truncating.
    pub fn pool_dim(&self) -> usize {
        (self.conv_dim() - self.pool_window) / self.pool_stride + 1
    }

    /// Length of the concatenated feature vector.
    pub fn flat_size(&self) -> usize {
        self.pool_dim() * self.pool_dim() * self.filter_count
    }
}

/// Layer widths of the fully connected classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub input_size: usize,
    pub hidden1: usize,
    pub hidden2: usize,
    pub outputs: usize,
}

impl ClassifierConfig {
    /// Standard 120 -> 80 -> 10 topology on top of `input_size` features.
    pub fn new(input_size: usize) -> Result<Self, ConfigError> {
        if input_size == 0 {
            return Err(invalid("classifier input size must be positive"));
        }
        Ok(Self {
            input_size,
            hidden1: HIDDEN1_SIZE,
            hidden2: HIDDEN2_SIZE,
            outputs: OUTPUT_SIZE,
        })
    }

    /// Weights plus biases over all three layers.
    pub fn parameter_count(&self) -> usize {
        self.input_size * self.hidden1
            + self.hidden1 * self.hidden2
            + self.hidden2 * self.outputs
            + self.hidden1
            + self.hidden2
            + self.outputs
    }
}

fn default_train_images() -> String {
    "train-images.idx3-ubyte".to_string()
}

fn default_train_labels() -> String {
    "train-labels.idx1-ubyte".to_string()
}

fn default_test_images() -> String {
    "t10k-images.idx3-ubyte".to_string()
}

fn default_test_labels() -> String {
    "t10k-labels.idx1-ubyte".to_string()
}

fn default_early_stop() -> f64 {
    DEFAULT_EARLY_STOP_ACCURACY
}

/// Configuration for a training run.
///
/// # Example
///
/// ```json
/// {
///   "filter_size": 5,
///   "filter_count": 8,
///   "learning_rate": 0.01,
///   "epochs": 3,
///   "seed": 42
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrainingConfig {
    /// Side of each square convolution filter
    pub filter_size: usize,

    /// Number of filters in the bank
    pub filter_count: usize,

    /// SGD step size
    pub learning_rate: f64,

    /// Maximum number of passes over the training set
    pub epochs: usize,

    /// Seed for parameter initialization; time-based when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Stop once an epoch's training accuracy (percent) exceeds this
    #[serde(default = "default_early_stop")]
    pub early_stop_accuracy: f64,

    #[serde(default = "default_train_images")]
    pub train_images: String,

    #[serde(default = "default_train_labels")]
    pub train_labels: String,

    #[serde(default = "default_test_images")]
    pub test_images: String,

    #[serde(default = "default_test_labels")]
    pub test_labels: String,
}

impl TrainingConfig {
    /// Config with the default dataset paths and early-stop threshold.
    pub fn new(
        filter_size: usize,
        filter_count: usize,
        learning_rate: f64,
        epochs: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            filter_size,
            filter_count,
            learning_rate,
            epochs,
            seed: None,
            early_stop_accuracy: DEFAULT_EARLY_STOP_ACCURACY,
            train_images: default_train_images(),
            train_labels: default_train_labels(),
            test_images: default_test_images(),
            test_labels: default_test_labels(),
        };
        validate_config(&config)?;
        Ok(config)
    }

    /// Prefix every dataset path with `dir`.
    pub fn with_data_dir(mut self, dir: &str) -> Self {
        let join = |name: &str| format!("{}/{}", dir.trim_end_matches('/'), name);
        self.train_images = join(&self.train_images);
        self.train_labels = join(&self.train_labels);
        self.test_images = join(&self.test_images);
        self.test_labels = join(&self.test_labels);
        self
    }
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it into a `TrainingConfig` and
/// validates the hyperparameters.
pub fn load_config(path: &str) -> Result<TrainingConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate a JSON configuration string.
pub fn parse_config(json: &str) -> Result<TrainingConfig, ConfigError> {
    let config: TrainingConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &TrainingConfig) -> Result<(), ConfigError> {
    if config.filter_size == 0 {
        return Err(invalid("filter_size must be positive"));
    }

    if config.filter_count == 0 {
        return Err(invalid("filter_count must be positive"));
    }

    if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
        return Err(invalid("learning_rate must be a positive number"));
    }

    if config.epochs == 0 {
        return Err(invalid("epochs must be positive"));
    }

    if !(config.early_stop_accuracy > 0.0 && config.early_stop_accuracy <= 100.0) {
        return Err(invalid("early_stop_accuracy must be in (0, 100]"));
    }

    Ok(())
}
