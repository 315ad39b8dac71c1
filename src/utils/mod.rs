//! Shared utilities for the network
//!
//! This module provides the seedable random number generator and the scalar
//! activation functions used by tensor operations.

pub mod activations;
pub mod rng;

pub use rng::SimpleRng;
