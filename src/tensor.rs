//! Dense 2D tensor
//!
//! This module provides [`Tensor`], the single numeric container used for
//! images, filters, weights, biases, activations and gradients. Data is a flat
//! `Vec<f64>` in row-major order; the shape is always `[rows, cols]`.
//!
//! Every operation that produces a tensor allocates a fresh store, so results
//! never alias their operands. Only the `*_in_place` methods mutate.

use crate::error::{NetError, Result};
use crate::utils::activations::{relu, relu_derivative, sigmoid, sigmoid_derivative};
use crate::utils::SimpleRng;

/// Shape of a tensor: `[rows, cols]`.
pub type Shape = [usize; 2];

/// Dense row-major matrix of `f64` values.
///
/// Invariant: `data.len() == shape[0] * shape[1]`.
///
/// # Example
///
/// ```
/// use minicon::tensor::Tensor;
///
/// let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], [2, 2]).unwrap();
/// let b = a.matmul(&Tensor::identity(2)).unwrap();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f64>,
    shape: Shape,
}

impl Tensor {
    /// Zero-filled tensor of the given shape.
    pub fn zeros(shape: Shape) -> Self {
        Self {
            data: vec![0.0; shape[0] * shape[1]],
            shape,
        }
    }

    /// Wrap existing row-major data.
    ///
    /// Fails with [`NetError::ShapeMismatch`] if `data.len()` is not the
    /// product of the extents.
    pub fn from_vec(data: Vec<f64>, shape: Shape) -> Result<Self> {
        if data.len() != shape[0] * shape[1] {
            return Err(NetError::shape_mismatch(
                "from_vec",
                [1, data.len()],
                shape,
            ));
        }
        Ok(Self { data, shape })
    }

    /// Single-row tensor holding `data`.
    pub fn row_vector(data: Vec<f64>) -> Self {
        let len = data.len();
        Self {
            data,
            shape: [1, len],
        }
    }

    /// `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut out = Self::zeros([n, n]);
        for i in 0..n {
            out.data[i * n + i] = 1.0;
        }
        out
    }

    /// Uniform random fill in `[min, max)`.
    pub fn random_uniform(shape: Shape, min: f64, max: f64, rng: &mut SimpleRng) -> Self {
        let len = shape[0] * shape[1];
        let data = (0..len).map(|_| rng.gen_range_f64(min, max)).collect();
        Self { data, shape }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major view of the backing store.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    fn check_index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.shape[0] || col >= self.shape[1] {
            return Err(NetError::OutOfRange {
                row,
                col,
                shape: self.shape,
            });
        }
        Ok(row * self.shape[1] + col)
    }

    /// Read the element at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        let idx = self.check_index(row, col)?;
        Ok(self.data[idx])
    }

    /// Overwrite the element at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let idx = self.check_index(row, col)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Unchecked read for kernels that already validated their bounds.
    #[inline]
    pub(crate) fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.shape[1] + col]
    }

    fn zip_with(&self, other: &Tensor, op: &'static str, f: impl Fn(f64, f64) -> f64) -> Result<Tensor> {
        if self.shape != other.shape {
            return Err(NetError::shape_mismatch(op, self.shape, other.shape));
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Tensor {
            data,
            shape: self.shape,
        })
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Tensor {
        Tensor {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape,
        }
    }

    /// Elementwise sum.
    pub fn add(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    /// Elementwise difference `self - other`.
    pub fn subtract(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_with(other, "subtract", |a, b| a - b)
    }

    /// Elementwise (Hadamard) product.
    pub fn elementwise_multiply(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_with(other, "elementwise_multiply", |a, b| a * b)
    }

    /// Multiply every element by `scalar`.
    pub fn scalar_multiply(&self, scalar: f64) -> Tensor {
        self.map(|x| x * scalar)
    }

    /// Divide every element by `divisor` in place.
    pub fn normalize_with(&mut self, divisor: f64) {
        for value in &mut self.data {
            *value /= divisor;
        }
    }

    /// Matrix product `self · other`.
    ///
    /// Uses the i-k-j loop order and skips zero entries of the left operand,
    /// which is common after ReLU. Skipped terms would only add `0 * x`, so
    /// the result matches the plain triple loop for finite inputs.
    pub fn matmul(&self, other: &Tensor) -> Result<Tensor> {
        if self.shape[1] != other.shape[0] {
            return Err(NetError::shape_mismatch("matmul", self.shape, other.shape));
        }
        let (m, k_dim, n) = (self.shape[0], self.shape[1], other.shape[1]);
        let mut out = vec![0.0; m * n];

        for i in 0..m {
            let out_row = &mut out[i * n..(i + 1) * n];
            for k in 0..k_dim {
                let a = self.data[i * k_dim + k];
                if a == 0.0 {
                    continue;
                }
                let b_row = &other.data[k * n..(k + 1) * n];
                for (o, &b) in out_row.iter_mut().zip(b_row) {
                    *o += a * b;
                }
            }
        }

        Ok(Tensor {
            data: out,
            shape: [m, n],
        })
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> Tensor {
        let [rows, cols] = self.shape;
        let mut data = vec![0.0; self.data.len()];
        for i in 0..rows {
            for j in 0..cols {
                data[j * rows + i] = self.data[i * cols + j];
            }
        }
        Tensor {
            data,
            shape: [cols, rows],
        }
    }

    /// Reshape into a `1 x len` row vector, preserving order.
    pub fn flatten(&self) -> Tensor {
        Tensor::row_vector(self.data.clone())
    }

    /// Flatten each tensor in order and join them into one row vector.
    pub fn concat_flattened(tensors: &[Tensor]) -> Tensor {
        let total = tensors.iter().map(Tensor::len).sum();
        let mut data = Vec::with_capacity(total);
        for t in tensors {
            data.extend_from_slice(&t.data);
        }
        Tensor::row_vector(data)
    }

    /// Clamp every element to `max(0, x)`.
    pub fn relu_in_place(&mut self) {
        for value in &mut self.data {
            *value = relu(*value);
        }
    }

    /// 1.0 where the stored value is positive, else 0.0.
    ///
    /// This reads the values currently held, so on a tensor that already went
    /// through [`relu_in_place`](Self::relu_in_place) it reflects the
    /// post-activation data rather than the original sign.
    pub fn relu_derivative(&self) -> Tensor {
        self.map(relu_derivative)
    }

    fn require_row(&self, op: &'static str) -> Result<()> {
        if self.shape[0] != 1 {
            return Err(NetError::InvalidOperandShape {
                op,
                shape: self.shape,
            });
        }
        Ok(())
    }

    /// Logistic function applied elementwise. Requires a single row.
    pub fn sigmoid_in_place(&mut self) -> Result<()> {
        self.require_row("sigmoid")?;
        for value in &mut self.data {
            *value = sigmoid(*value);
        }
        Ok(())
    }

    /// `s * (1 - s)` with `s = sigmoid(value)` for each stored value.
    ///
    /// Unlike [`relu_derivative`](Self::relu_derivative) this treats the stored
    /// values as raw pre-activation inputs.
    pub fn sigmoid_derivative(&self) -> Tensor {
        self.map(sigmoid_derivative)
    }

    /// Index of the largest value in a single-row tensor; ties go to the
    /// lowest index. An empty row has no largest value and is rejected.
    pub fn argmax(&self) -> Result<usize> {
        self.require_row("argmax")?;
        if self.data.is_empty() {
            return Err(NetError::InvalidOperandShape {
                op: "argmax",
                shape: self.shape,
            });
        }
        let mut best = 0;
        for (i, &value) in self.data.iter().enumerate().skip(1) {
            if value > self.data[best] {
                best = i;
            }
        }
        Ok(best)
    }
}
