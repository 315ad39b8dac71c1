//! Scalar activation functions
//!
//! The tensor methods apply these elementwise:
//! - Sigmoid and its derivative (evaluated from the raw input)
//! - ReLU and its derivative (evaluated from the stored activation)

/// Sigmoid activation function.
///
/// Returns the sigmoid of the input: 1 / (1 + exp(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Sigmoid derivative evaluated at the raw (pre-activation) value `x`.
///
/// Returns s * (1 - s) where s = sigmoid(x).
pub fn sigmoid_derivative(x: f64) -> f64 {
    let s = sigmoid(x);
    s * (1.0 - s)
}

/// ReLU: max(0, x).
pub fn relu(x: f64) -> f64 {
    x.max(0.0)
}

/// ReLU derivative of an already activated value: 1 if positive, else 0.
pub fn relu_derivative(activated: f64) -> f64 {
    if activated > 0.0 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_sigmoid_zero() {
        let result = sigmoid(0.0);
        assert!((result - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_sigmoid_positive() {
        let result = sigmoid(2.0);
        assert!(result > 0.5 && result < 1.0);
    }

    #[test]
    fn test_sigmoid_negative() {
        let result = sigmoid(-2.0);
        assert!(result > 0.0 && result < 0.5);
    }

    #[test]
    fn test_sigmoid_derivative_at_zero() {
        assert!((sigmoid_derivative(0.0) - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_sigmoid_derivative_is_symmetric() {
        assert!((sigmoid_derivative(3.0) - sigmoid_derivative(-3.0)).abs() < EPSILON);
    }

    #[test]
    fn test_relu_mixed() {
        let data: Vec<f64> = [-2.0, -1.0, 0.0, 1.0, 2.0].iter().map(|&x| relu(x)).collect();
        assert_eq!(data, vec![0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_relu_derivative_zero_is_inactive() {
        assert_eq!(relu_derivative(0.0), 0.0);
        assert_eq!(relu_derivative(1e-12), 1.0);
    }
}
