//! Minimal convolutional MNIST classifier
//!
//! A from-scratch numeric engine: one frozen convolution + max-pooling stage
//! feeding a three-layer perceptron trained by per-example SGD.
//!
//! # Modules
//!
//! - `tensor`: dense 2D `f64` tensor and its linear algebra
//! - `layers`: convolution/pooling stage and the fully connected classifier
//! - `optimizers`: parameter update rules (SGD)
//! - `utils`: seedable RNG and scalar activation functions
//! - `config`: validated topology values and JSON training configuration
//! - `mnist`: IDX dataset reader
//! - `model`: training and evaluation driver
//! - `error`: error types

pub mod config;
pub mod error;
pub mod layers;
pub mod mnist;
pub mod model;
pub mod optimizers;
pub mod tensor;
pub mod utils;

pub use error::{NetError, Result};
pub use tensor::Tensor;
