//! Convolution + pooling feature extractor
//!
//! This module provides [`ConvPoolLayer`], which turns a square image into a
//! flat feature vector: every filter is cross-correlated with the image
//! (stride 1, no padding, ReLU fused into the kernel), max-pooled over 2x2
//! windows, flattened, and the per-filter maps are concatenated in filter
//! order.
//!
//! The filter bank is drawn once from `[-1, 1)` and never updated; there is
//! no backward pass for this layer.

use crate::config::ConvPoolConfig;
use crate::error::{NetError, Result};
use crate::tensor::Tensor;
use crate::utils::SimpleRng;
use rayon::prelude::*;
use std::str::FromStr;

/// Pooling reduction applied to each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolMode {
    Max,
    Avg,
}

impl FromStr for PoolMode {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "max" => Ok(PoolMode::Max),
            "avg" => Ok(PoolMode::Avg),
            other => Err(NetError::UnsupportedMode(other.to_string())),
        }
    }
}

/// Frozen random filter bank with convolution and pooling.
///
/// # Example
///
/// ```
/// use minicon::config::ConvPoolConfig;
/// use minicon::layers::ConvPoolLayer;
/// use minicon::tensor::Tensor;
/// use minicon::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let layer = ConvPoolLayer::new(ConvPoolConfig::new(28, 5, 4).unwrap(), &mut rng);
/// let features = layer.forward(&Tensor::zeros([28, 28])).unwrap();
/// assert_eq!(features.shape(), [1, 12 * 12 * 4]);
/// ```
#[derive(Debug, Clone)]
pub struct ConvPoolLayer {
    config: ConvPoolConfig,
    filters: Vec<Tensor>,
}

impl ConvPoolLayer {
    /// Build the layer, drawing each filter uniformly from `[-1, 1)` in
    /// index order.
    pub fn new(config: ConvPoolConfig, rng: &mut SimpleRng) -> Self {
        let shape = [config.filter_size, config.filter_size];
        let filters = (0..config.filter_count)
            .map(|_| Tensor::random_uniform(shape, -1.0, 1.0, rng))
            .collect();
        Self { config, filters }
    }

    /// Build the layer from an explicit filter bank.
    ///
    /// The bank must hold `filter_count` tensors of shape
    /// `filter_size x filter_size`.
    pub fn with_filters(config: ConvPoolConfig, filters: Vec<Tensor>) -> Result<Self> {
        let expected = [config.filter_size, config.filter_size];
        if filters.len() != config.filter_count {
            return Err(NetError::shape_mismatch(
                "with_filters",
                [filters.len(), 1],
                [config.filter_count, 1],
            ));
        }
        if let Some(bad) = filters.iter().find(|f| f.shape() != expected) {
            return Err(NetError::shape_mismatch("with_filters", bad.shape(), expected));
        }
        Ok(Self { config, filters })
    }

    pub fn config(&self) -> &ConvPoolConfig {
        &self.config
    }

    pub fn filters(&self) -> &[Tensor] {
        &self.filters
    }

    /// Length of the vector produced by [`forward`](Self::forward).
    pub fn flat_size(&self) -> usize {
        self.config.flat_size()
    }

    /// Number of (frozen) filter weights.
    pub fn parameter_count(&self) -> usize {
        self.filters.iter().map(Tensor::len).sum()
    }

    /// Valid cross-correlation of `input` with `filter` at the configured
    /// stride. Each output cell is clamped with ReLU before it is stored.
    pub fn convolve(&self, input: &Tensor, filter: &Tensor) -> Result<Tensor> {
        let [in_rows, in_cols] = input.shape();
        let [f_rows, f_cols] = filter.shape();
        if f_rows > in_rows || f_cols > in_cols || f_rows == 0 || f_cols == 0 {
            return Err(NetError::shape_mismatch("convolve", input.shape(), filter.shape()));
        }

        let stride = self.config.stride;
        let out_rows = (in_rows - f_rows) / stride + 1;
        let out_cols = (in_cols - f_cols) / stride + 1;
        let mut out = Vec::with_capacity(out_rows * out_cols);

        for i in 0..out_rows {
            for j in 0..out_cols {
                let mut sum = 0.0;
                for k in 0..f_rows {
                    for l in 0..f_cols {
                        sum += input.at(i * stride + k, j * stride + l) * filter.at(k, l);
                    }
                }
                out.push(sum.max(0.0));
            }
        }

        Tensor::from_vec(out, [out_rows, out_cols])
    }

    /// Non-overlapping window reduction with the configured window and
    /// stride. Trailing rows/columns that do not fill a window are dropped.
    pub fn pool(&self, mode: PoolMode, input: &Tensor) -> Result<Tensor> {
        let window = self.config.pool_window;
        let stride = self.config.pool_stride;
        let [in_rows, in_cols] = input.shape();
        if in_rows < window || in_cols < window {
            return Err(NetError::InvalidOperandShape {
                op: "pool",
                shape: input.shape(),
            });
        }

        let out_rows = (in_rows - window) / stride + 1;
        let out_cols = (in_cols - window) / stride + 1;
        let mut out = Vec::with_capacity(out_rows * out_cols);

        for i in 0..out_rows {
            for j in 0..out_cols {
                let (r0, c0) = (i * stride, j * stride);
                let value = match mode {
                    PoolMode::Max => {
                        let mut best = input.at(r0, c0);
                        for k in r0..r0 + window {
                            for l in c0..c0 + window {
                                let v = input.at(k, l);
                                if v > best {
                                    best = v;
                                }
                            }
                        }
                        best
                    }
                    PoolMode::Avg => {
                        let mut sum = 0.0;
                        for k in r0..r0 + window {
                            for l in c0..c0 + window {
                                sum += input.at(k, l);
                            }
                        }
                        sum / (window * window) as f64
                    }
                };
                out.push(value);
            }
        }

        Tensor::from_vec(out, [out_rows, out_cols])
    }

    /// Convolve and max-pool with every filter, then concatenate the pooled
    /// maps into one `1 x flat_size` row vector.
    ///
    /// Filters are processed in parallel; the output order is always the
    /// filter index order.
    pub fn forward(&self, image: &Tensor) -> Result<Tensor> {
        let expected = [self.config.input_size, self.config.input_size];
        if image.shape() != expected {
            return Err(NetError::shape_mismatch("conv forward", image.shape(), expected));
        }

        let maps = self
            .filters
            .par_iter()
            .map(|filter| {
                let conv = self.convolve(image, filter)?;
                self.pool(PoolMode::Max, &conv)
            })
            .collect::<Result<Vec<Tensor>>>()?;

        Ok(Tensor::concat_flattened(&maps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(input: usize, filter: usize, count: usize) -> ConvPoolLayer {
        let mut rng = SimpleRng::new(42);
        ConvPoolLayer::new(ConvPoolConfig::new(input, filter, count).unwrap(), &mut rng)
    }

    #[test]
    fn test_filters_in_range() {
        let layer = layer(28, 5, 6);
        assert_eq!(layer.filters().len(), 6);
        for f in layer.filters() {
            assert_eq!(f.shape(), [5, 5]);
            assert!(f.as_slice().iter().all(|&w| (-1.0..1.0).contains(&w)));
        }
        assert_eq!(layer.parameter_count(), 6 * 25);
    }

    #[test]
    fn test_deterministic_initialization() {
        let a = layer(28, 3, 4);
        let b = layer(28, 3, 4);
        assert_eq!(a.filters(), b.filters());
    }

    #[test]
    fn test_pool_mode_parse() {
        assert_eq!("max".parse::<PoolMode>().unwrap(), PoolMode::Max);
        assert_eq!("avg".parse::<PoolMode>().unwrap(), PoolMode::Avg);
        assert_eq!(
            "median".parse::<PoolMode>().unwrap_err(),
            NetError::UnsupportedMode("median".to_string())
        );
    }

    #[test]
    fn test_convolve_filter_too_large() {
        let layer = layer(28, 5, 1);
        let input = Tensor::zeros([3, 3]);
        let filter = Tensor::zeros([4, 4]);
        assert!(layer.convolve(&input, &filter).is_err());
    }

    #[test]
    fn test_pool_input_smaller_than_window() {
        let layer = layer(28, 5, 1);
        let err = layer.pool(PoolMode::Max, &Tensor::zeros([1, 4])).unwrap_err();
        assert!(matches!(err, NetError::InvalidOperandShape { .. }));
    }

    #[test]
    fn test_forward_rejects_wrong_image_shape() {
        let layer = layer(28, 5, 2);
        assert!(layer.forward(&Tensor::zeros([27, 28])).is_err());
    }
}
