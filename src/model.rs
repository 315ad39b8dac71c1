//! Training and evaluation driver
//!
//! Wires the convolution stage to the classifier and runs online SGD over a
//! labeled dataset: one forward/backward cycle per example, in order.

use crate::config::{ClassifierConfig, ConvPoolConfig, TrainingConfig};
use crate::error::{Result, TrainError};
use crate::layers::{ConvPoolLayer, FeedForwardClassifier};
use crate::mnist::LabeledImage;
use crate::tensor::Tensor;
use crate::utils::SimpleRng;
use log::info;
use std::time::{Duration, Instant};

/// One-hot row vector with a 1 at `label`.
pub fn one_hot(label: usize, classes: usize) -> Result<Tensor> {
    let mut target = Tensor::zeros([1, classes]);
    target.set(0, label, 1.0)?;
    Ok(target)
}

/// Outcome of one training epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// 1-based epoch number
    pub epoch: usize,
    /// Fraction of examples predicted correctly before their update
    pub accuracy: f64,
    pub elapsed: Duration,
}

/// Convolution stage plus classifier, with the training hyperparameters.
#[derive(Debug, Clone)]
pub struct Model {
    conv: ConvPoolLayer,
    classifier: FeedForwardClassifier,
    learning_rate: f64,
    epochs: usize,
    early_stop_accuracy: f64,
}

impl Model {
    /// Build a model for square images of side `image_size`.
    ///
    /// Filters are drawn from `rng` before the classifier parameters.
    pub fn new(
        config: &TrainingConfig,
        image_size: usize,
        rng: &mut SimpleRng,
    ) -> std::result::Result<Self, TrainError> {
        let conv_config = ConvPoolConfig::new(image_size, config.filter_size, config.filter_count)?;
        let conv = ConvPoolLayer::new(conv_config, rng);
        let classifier_config = ClassifierConfig::new(conv.flat_size())?;
        let classifier = FeedForwardClassifier::new(classifier_config, rng);

        Ok(Self {
            conv,
            classifier,
            learning_rate: config.learning_rate,
            epochs: config.epochs,
            early_stop_accuracy: config.early_stop_accuracy,
        })
    }

    pub fn conv(&self) -> &ConvPoolLayer {
        &self.conv
    }

    pub fn classifier(&self) -> &FeedForwardClassifier {
        &self.classifier
    }

    /// Filter weights plus classifier weights and biases.
    pub fn parameter_count(&self) -> usize {
        self.conv.parameter_count() + self.classifier.parameter_count()
    }

    /// Forward, score and update on a single example. Returns whether the
    /// prediction made before the update was correct.
    pub fn train_example(&mut self, example: &LabeledImage) -> Result<bool> {
        let features = self.conv.forward(&example.image)?;
        let pass = self.classifier.forward(&features)?;
        let predicted = pass.predicted_class()?;
        let target = one_hot(example.label, self.classifier.config().outputs)?;
        self.classifier.backward(pass, &target, self.learning_rate)?;
        Ok(predicted == example.label)
    }

    /// Predicted class for one image.
    pub fn predict(&self, image: &Tensor) -> Result<usize> {
        let features = self.conv.forward(image)?;
        self.classifier.predict(&features)
    }

    /// Run up to `epochs` passes over `data`, stopping early once an epoch's
    /// accuracy exceeds the configured threshold.
    pub fn train(&mut self, data: &[LabeledImage]) -> std::result::Result<Vec<EpochReport>, TrainError> {
        if data.is_empty() {
            return Err(TrainError::EmptyDataset);
        }

        let mut reports = Vec::with_capacity(self.epochs);
        for epoch in 1..=self.epochs {
            let start = Instant::now();
            let mut correct = 0usize;

            for example in data {
                if self.train_example(example)? {
                    correct += 1;
                }
            }

            let report = EpochReport {
                epoch,
                accuracy: correct as f64 / data.len() as f64,
                elapsed: start.elapsed(),
            };
            info!(
                "epoch {} | accuracy={:.2}% | time={:.3}s",
                report.epoch,
                report.accuracy * 100.0,
                report.elapsed.as_secs_f64()
            );

            let stop = report.accuracy * 100.0 > self.early_stop_accuracy;
            reports.push(report);
            if stop {
                info!(
                    "training accuracy above {}%, stopping after epoch {}",
                    self.early_stop_accuracy, epoch
                );
                break;
            }
        }
        Ok(reports)
    }

    /// Fraction of `data` classified correctly. Parameters are not changed.
    pub fn evaluate(&self, data: &[LabeledImage]) -> Result<f64> {
        if data.is_empty() {
            return Ok(0.0);
        }

        let start = Instant::now();
        let mut correct = 0usize;
        for example in data {
            if self.predict(&example.image)? == example.label {
                correct += 1;
            }
        }

        let accuracy = correct as f64 / data.len() as f64;
        info!(
            "test accuracy={:.2}% over {} images in {:.3}s",
            accuracy * 100.0,
            data.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(accuracy)
    }
}
