//! Network layers
//!
//! - `conv_pool`: frozen convolution + max-pooling feature extractor
//! - `classifier`: three-layer perceptron trained by per-example SGD

pub mod classifier;
pub mod conv_pool;

pub use classifier::{FeedForwardClassifier, ForwardPass, Gradients};
pub use conv_pool::{ConvPoolLayer, PoolMode};
