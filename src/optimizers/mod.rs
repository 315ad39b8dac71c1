//! Optimizer abstractions for parameter updates
//!
//! Optimizers define how gradients are turned into parameter changes. The
//! classifier uses plain stochastic gradient descent, applied once per
//! training example.
//!
//! # Example
//!
//! ```
//! use minicon::optimizers::{Optimizer, SGD};
//! use minicon::tensor::Tensor;
//!
//! let mut optimizer = SGD::new(0.1);
//! let mut weights = Tensor::row_vector(vec![1.0, 2.0]);
//! let grads = Tensor::row_vector(vec![1.0, -1.0]);
//! optimizer.update(&mut weights, &grads).unwrap();
//! assert!((weights.as_slice()[0] - 0.9).abs() < 1e-12);
//! ```

pub mod sgd;

pub use sgd::SGD;

use crate::error::Result;
use crate::tensor::Tensor;

/// Core trait for optimizers.
pub trait Optimizer {
    /// Update `parameters` from `gradients` of the same shape.
    ///
    /// Fails with `ShapeMismatch` when the shapes differ; the parameters are
    /// left untouched in that case.
    fn update(&mut self, parameters: &mut Tensor, gradients: &Tensor) -> Result<()>;
}
