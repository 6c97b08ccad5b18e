//! Shared utilities for the layer implementations
//!
//! Random number generation, scalar activation functions and the dense
//! matrix type used for weights and gradients.

pub mod activations;
pub mod matrix;
pub mod rng;

pub use activations::Activation;
pub use matrix::Matrix;
pub use rng::SimpleRng;
