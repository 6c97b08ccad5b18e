//! Sequential Neural Networks Library
//!
//! A small training engine for feed-forward networks: layers are stacked in
//! a [`model::Sequential`], trained one sample at a time with
//! backpropagation, and their parameters can be saved to and loaded from
//! plain-text files.
//!
//! # Modules
//!
//! - `layers`: Layer trait, dense Sigmoid/Tanh/ReLU layers, recurrent layer, parameter files
//! - `loss`: Loss trait and mean squared error
//! - `optimizers`: Optimizer trait and SGD
//! - `model`: Sequential model and training loop
//! - `utils`: Shared utilities (RNG, activation functions, matrix)
//! - `config`: Training configuration structures
//! - `architecture`: Architecture configuration and layer building
//! - `error`: Error type shared by every module

pub mod architecture;
pub mod config;
pub mod error;
pub mod layers;
pub mod loss;
pub mod model;
pub mod optimizers;
pub mod utils;

pub use error::{NetworkError, Result};
pub use model::{Sequential, TrainingHistory};
