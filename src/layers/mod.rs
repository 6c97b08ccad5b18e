//! Layer abstractions for neural networks
//!
//! This module provides the Layer trait, the dense Sigmoid/Tanh/ReLU layer,
//! the LSTM-style recurrent layer, and the plain-text parameter file format
//! they share.

mod r#trait;
pub mod dense;
pub mod recurrent;
pub mod snapshot;

// Re-export the Layer trait for convenience
pub use dense::DenseLayer;
pub use r#trait::{Layer, Parameter};
pub use recurrent::{OutputMode, RecurrentLayer};
