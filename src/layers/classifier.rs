//! Fully connected classifier
//!
//! Three dense layers on top of the convolution features:
//! `input -> 120 (ReLU) -> 80 (ReLU) -> 10 (sigmoid)`, trained one example at
//! a time.
//!
//! A forward call returns a [`ForwardPass`] holding every activation the
//! backward call needs. `backward` consumes that value and `ForwardPass` is
//! not `Clone`, so a pass drives at most one `backward` call and there is no
//! cached state to go stale. The lower-level `gradients` only borrows a pass,
//! for inspecting gradients before they are spent.

use crate::config::ClassifierConfig;
use crate::error::{NetError, Result};
use crate::optimizers::{Optimizer, SGD};
use crate::tensor::Tensor;
use crate::utils::SimpleRng;

/// Activations recorded by [`FeedForwardClassifier::forward`].
///
/// Not `Clone`: a pass drives at most one [`FeedForwardClassifier::backward`].
///
/// ```compile_fail
/// use minicon::config::ClassifierConfig;
/// use minicon::layers::FeedForwardClassifier;
/// use minicon::tensor::Tensor;
/// use minicon::utils::SimpleRng;
///
/// let mut net = FeedForwardClassifier::new(ClassifierConfig::new(4).unwrap(), &mut SimpleRng::new(1));
/// let target = Tensor::zeros([1, 10]);
/// let pass = net.forward(&Tensor::row_vector(vec![0.5; 4])).unwrap();
/// net.backward(pass, &target, 0.1).unwrap();
/// net.backward(pass, &target, 0.1).unwrap();
/// ```
///
/// ```compile_fail
/// use minicon::config::ClassifierConfig;
/// use minicon::layers::FeedForwardClassifier;
/// use minicon::tensor::Tensor;
/// use minicon::utils::SimpleRng;
///
/// let net = FeedForwardClassifier::new(ClassifierConfig::new(4).unwrap(), &mut SimpleRng::new(1));
/// let pass = net.forward(&Tensor::row_vector(vec![0.5; 4])).unwrap();
/// let _stale = pass.clone();
/// ```
#[derive(Debug)]
pub struct ForwardPass {
    input: Tensor,
    hidden1: Tensor,
    hidden2: Tensor,
    output: Tensor,
}

impl ForwardPass {
    /// Sigmoid outputs, `1 x outputs`.
    pub fn output(&self) -> &Tensor {
        &self.output
    }

    /// Post-ReLU activations of the first hidden layer.
    pub fn hidden1(&self) -> &Tensor {
        &self.hidden1
    }

    /// Post-ReLU activations of the second hidden layer.
    pub fn hidden2(&self) -> &Tensor {
        &self.hidden2
    }

    pub fn input(&self) -> &Tensor {
        &self.input
    }

    /// Index of the largest output.
    pub fn predicted_class(&self) -> Result<usize> {
        self.output.argmax()
    }
}

/// Parameter gradients for one example, spent by
/// [`FeedForwardClassifier::apply_gradients`].
#[derive(Debug)]
pub struct Gradients {
    pub weights: [Tensor; 3],
    pub biases: [Tensor; 3],
}

/// Three-layer perceptron with per-example SGD updates.
///
/// # Example
///
/// ```
/// use minicon::config::ClassifierConfig;
/// use minicon::layers::FeedForwardClassifier;
/// use minicon::tensor::Tensor;
/// use minicon::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(7);
/// let mut net = FeedForwardClassifier::new(ClassifierConfig::new(16).unwrap(), &mut rng);
///
/// let input = Tensor::row_vector(vec![0.5; 16]);
/// let mut target = Tensor::zeros([1, 10]);
/// target.set(0, 3, 1.0).unwrap();
///
/// let pass = net.forward(&input).unwrap();
/// assert_eq!(pass.output().shape(), [1, 10]);
/// net.backward(pass, &target, 0.01).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FeedForwardClassifier {
    config: ClassifierConfig,
    weights: [Tensor; 3],
    biases: [Tensor; 3],
}

impl FeedForwardClassifier {
    /// Create the network with every weight and bias drawn from `[-1, 1)`.
    ///
    /// Draw order: W1, W2, W3, b1, b2, b3.
    pub fn new(config: ClassifierConfig, rng: &mut SimpleRng) -> Self {
        let widths = [config.input_size, config.hidden1, config.hidden2, config.outputs];

        let weights = [
            Tensor::random_uniform([widths[0], widths[1]], -1.0, 1.0, rng),
            Tensor::random_uniform([widths[1], widths[2]], -1.0, 1.0, rng),
            Tensor::random_uniform([widths[2], widths[3]], -1.0, 1.0, rng),
        ];
        let biases = [
            Tensor::random_uniform([1, widths[1]], -1.0, 1.0, rng),
            Tensor::random_uniform([1, widths[2]], -1.0, 1.0, rng),
            Tensor::random_uniform([1, widths[3]], -1.0, 1.0, rng),
        ];

        Self {
            config,
            weights,
            biases,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// W1, W2, W3.
    pub fn weights(&self) -> &[Tensor; 3] {
        &self.weights
    }

    /// b1, b2, b3.
    pub fn biases(&self) -> &[Tensor; 3] {
        &self.biases
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.iter().chain(&self.biases).map(Tensor::len).sum()
    }

    fn dense(input: &Tensor, weights: &Tensor, bias: &Tensor) -> Result<Tensor> {
        input.matmul(weights)?.add(bias)
    }

    /// Run `input` (`1 x input_size`) through the network.
    pub fn forward(&self, input: &Tensor) -> Result<ForwardPass> {
        let expected = [1, self.config.input_size];
        if input.shape() != expected {
            return Err(NetError::shape_mismatch("classifier forward", input.shape(), expected));
        }

        let mut hidden1 = Self::dense(input, &self.weights[0], &self.biases[0])?;
        hidden1.relu_in_place();

        let mut hidden2 = Self::dense(&hidden1, &self.weights[1], &self.biases[1])?;
        hidden2.relu_in_place();

        let mut output = Self::dense(&hidden2, &self.weights[2], &self.biases[2])?;
        output.sigmoid_in_place()?;

        Ok(ForwardPass {
            input: input.clone(),
            hidden1,
            hidden2,
            output,
        })
    }

    /// Predicted class for `input`, without recording anything for training.
    pub fn predict(&self, input: &Tensor) -> Result<usize> {
        self.forward(input)?.predicted_class()
    }

    /// Backpropagate `target` through the activations of `pass`.
    ///
    /// The output error `output - target` is used directly as the output
    /// layer gradient, without a sigmoid-derivative factor. Hidden layer
    /// errors are masked by `relu_derivative` of the stored post-ReLU values.
    /// Bias gradients equal the layer error (batch size is always 1).
    pub fn gradients(&self, pass: &ForwardPass, target: &Tensor) -> Result<Gradients> {
        if target.shape() != pass.output.shape() {
            return Err(NetError::shape_mismatch("backward target", target.shape(), pass.output.shape()));
        }

        let delta3 = pass.output.subtract(target)?;
        let grad_w3 = pass.hidden2.transpose().matmul(&delta3)?;

        let delta2 = delta3
            .matmul(&self.weights[2].transpose())?
            .elementwise_multiply(&pass.hidden2.relu_derivative())?;
        let grad_w2 = pass.hidden1.transpose().matmul(&delta2)?;

        let delta1 = delta2
            .matmul(&self.weights[1].transpose())?
            .elementwise_multiply(&pass.hidden1.relu_derivative())?;
        let grad_w1 = pass.input.transpose().matmul(&delta1)?;

        Ok(Gradients {
            weights: [grad_w1, grad_w2, grad_w3],
            biases: [delta1, delta2, delta3],
        })
    }

    /// Apply one SGD step: `param -= learning_rate * grad` for all six
    /// parameters.
    pub fn apply_gradients(&mut self, grads: Gradients, learning_rate: f64) -> Result<()> {
        // Validate everything first so a failure leaves the network untouched.
        for (param, grad) in self
            .weights
            .iter()
            .zip(&grads.weights)
            .chain(self.biases.iter().zip(&grads.biases))
        {
            if param.shape() != grad.shape() {
                return Err(NetError::shape_mismatch("apply_gradients", param.shape(), grad.shape()));
            }
        }

        let mut optimizer = SGD::new(learning_rate);
        for (param, grad) in self.weights.iter_mut().zip(&grads.weights) {
            optimizer.update(param, grad)?;
        }
        for (param, grad) in self.biases.iter_mut().zip(&grads.biases) {
            optimizer.update(param, grad)?;
        }
        Ok(())
    }

    /// Compute gradients from `pass` and update every parameter in place.
    ///
    /// All gradients are taken against the weights as they were during the
    /// forward pass; updates happen afterwards.
    pub fn backward(&mut self, pass: ForwardPass, target: &Tensor, learning_rate: f64) -> Result<()> {
        let grads = self.gradients(&pass, target)?;
        self.apply_gradients(grads, learning_rate)
    }
}
