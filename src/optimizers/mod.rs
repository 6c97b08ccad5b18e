//! Optimizer abstractions for neural network parameter updates
//!
//! Optimizers define how to use the gradients a layer stored during its
//! backward pass to update that layer's parameters. The basic gradient
//! descent update is `param = param - learning_rate * gradient`.
//!
//! # Available Optimizers
//!
//! - SGD: Vanilla stochastic gradient descent
//!
//! # Example
//!
//! ```
//! use sequential_nn::layers::{DenseLayer, Layer};
//! use sequential_nn::optimizers::{Optimizer, SGD};
//! use sequential_nn::utils::SimpleRng;
//!
//! let mut layer = DenseLayer::sigmoid(2, 1, &mut SimpleRng::new(1));
//! let mut optimizer = SGD::new(0.5);
//!
//! layer.forward(&[1.0, 0.0]).unwrap();
//! layer.backward(&[0.2]).unwrap();
//! optimizer.step(&mut layer);
//! ```

pub mod sgd;

pub use sgd::SGD;

use crate::layers::Layer;

/// Core trait for neural network optimizers.
///
/// The model calls [`Optimizer::step`] once per layer, right after that
/// layer's backward pass. Layers never update themselves, so each
/// gradient is applied exactly once.
pub trait Optimizer {
    /// Update parameters using gradients.
    ///
    /// # Panics
    ///
    /// Implementations may panic if parameters and gradients have different lengths.
    fn update(&mut self, parameters: &mut [f64], gradients: &[f64]);

    /// Apply the update rule to every trainable tensor of `layer`.
    fn step(&mut self, layer: &mut dyn Layer) {
        for param in layer.parameters() {
            self.update(param.values, param.grads);
        }
    }

    /// Reset optimizer state.
    ///
    /// For stateless optimizers like vanilla SGD, this is a no-op.
    fn reset(&mut self);

    /// Get the learning rate for this optimizer.
    fn learning_rate(&self) -> f64;

    /// Set the learning rate for this optimizer.
    fn set_learning_rate(&mut self, lr: f64);

    fn name(&self) -> &'static str;
}
