//! Error types
//!
//! Numeric operations fail fast with [`NetError`]; dataset parsing and the
//! training driver wrap it in their own enums.

use std::io;
use thiserror::Error;

/// Result alias for the numeric core.
pub type Result<T> = std::result::Result<T, NetError>;

/// Failures raised by tensor, layer and optimizer operations.
///
/// Every variant is detected before any output is produced, so a failed
/// operation never leaves a partially written tensor behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetError {
    /// Operand shapes are incompatible for the requested operation.
    #[error("shape mismatch in {op}: {left:?} vs {right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: [usize; 2],
        right: [usize; 2],
    },

    /// Element access outside the declared shape.
    #[error("index ({row}, {col}) out of range for shape {shape:?}")]
    OutOfRange {
        row: usize,
        col: usize,
        shape: [usize; 2],
    },

    /// Operation requires a differently shaped operand (e.g. a single row).
    #[error("{op} cannot operate on shape {shape:?}")]
    InvalidOperandShape { op: &'static str, shape: [usize; 2] },

    /// Unknown pooling mode name.
    #[error("unsupported pooling mode '{0}', use \"max\" or \"avg\"")]
    UnsupportedMode(String),
}

impl NetError {
    pub(crate) fn shape_mismatch(op: &'static str, left: [usize; 2], right: [usize; 2]) -> Self {
        Self::ShapeMismatch { op, left, right }
    }
}

/// Failures while reading IDX image/label files.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("bad magic number {found:#010x}, expected {expected:#010x}")]
    BadMagic { expected: u32, found: u32 },

    #[error("file is truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("{images} images but {labels} labels")]
    CountMismatch { images: usize, labels: usize },

    #[error("label {label} at index {index} is not a digit class")]
    InvalidLabel { index: usize, label: u8 },

    #[error("image dimensions {rows}x{cols} are empty")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error(transparent)]
    Net(#[from] NetError),
}

/// Failures surfaced by the training driver.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Net(#[from] NetError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("dataset is empty")]
    EmptyDataset,
}
