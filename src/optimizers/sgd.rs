//! Stochastic Gradient Descent (SGD) optimizer implementation
//!
//! This module provides a vanilla SGD optimizer that performs the basic
//! gradient descent update: `parameter = parameter - learning_rate * gradient`

use crate::error::Result;
use crate::optimizers::Optimizer;
use crate::tensor::Tensor;

/// Stochastic Gradient Descent optimizer.
///
/// Implements the basic gradient descent update rule without momentum or
/// adaptive learning rates:
///
/// `w = w - η * ∇L/∂w`
///
/// where w is the parameter, η (eta) is the learning rate, and ∇L/∂w is the gradient.
#[derive(Debug, Clone)]
pub struct SGD {
    learning_rate: f64,
}

impl SGD {
    /// Creates a new SGD optimizer with the specified learning rate.
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for SGD {
    /// Replaces `parameters` with `parameters - learning_rate * gradients`.
    fn update(&mut self, parameters: &mut Tensor, gradients: &Tensor) -> Result<()> {
        let step = gradients.scalar_multiply(self.learning_rate);
        *parameters = parameters.subtract(&step)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetError;

    #[test]
    fn test_sgd_update() {
        let mut optimizer = SGD::new(0.1);
        let mut params = Tensor::row_vector(vec![1.0, 2.0, 3.0]);
        let grads = Tensor::row_vector(vec![0.1, 0.2, 0.3]);

        optimizer.update(&mut params, &grads).unwrap();

        let p = params.as_slice();
        assert!((p[0] - 0.99).abs() < 1e-12);
        assert!((p[1] - 1.98).abs() < 1e-12);
        assert!((p[2] - 2.97).abs() < 1e-12);
    }

    #[test]
    fn test_sgd_multiple_updates() {
        let mut optimizer = SGD::new(0.01);
        let mut params = Tensor::row_vector(vec![1.0, 1.0]);
        let grads = Tensor::row_vector(vec![1.0, -1.0]);

        optimizer.update(&mut params, &grads).unwrap();
        optimizer.update(&mut params, &grads).unwrap();

        assert!((params.as_slice()[0] - 0.98).abs() < 1e-12);
        assert!((params.as_slice()[1] - 1.02).abs() < 1e-12);
    }

    #[test]
    fn test_sgd_mismatched_shapes() {
        let mut optimizer = SGD::new(0.01);
        let mut params = Tensor::row_vector(vec![1.0, 2.0]);
        let grads = Tensor::row_vector(vec![0.1, 0.2, 0.3]);

        let err = optimizer.update(&mut params, &grads).unwrap_err();
        assert!(matches!(err, NetError::ShapeMismatch { .. }));
        assert_eq!(params.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_sgd_zero_learning_rate() {
        let mut optimizer = SGD::new(0.0);
        let mut params = Tensor::row_vector(vec![1.0, 2.0, 3.0]);
        let original = params.clone();

        optimizer
            .update(&mut params, &Tensor::row_vector(vec![0.1, 0.2, 0.3]))
            .unwrap();

        assert_eq!(params, original);
    }
}
