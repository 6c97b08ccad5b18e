//! Loss functions
//!
//! A loss turns a prediction and its target into a scalar and the gradient
//! that seeds backpropagation. Both come back from one call, so there is
//! no hidden state to keep in sync between computing the loss and its
//! gradient.

pub mod mse;

pub use mse::MSE;

use crate::error::Result;

/// Scalar loss plus ∂loss/∂prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct LossOutput {
    pub value: f64,
    pub gradient: Vec<f64>,
}

/// Core trait for loss functions.
pub trait Loss {
    /// Compute the loss and its gradient with respect to `prediction`.
    ///
    /// # Errors
    ///
    /// [`crate::NetworkError::ShapeMismatch`] if the two vectors differ in length.
    fn compute(&self, prediction: &[f64], target: &[f64]) -> Result<LossOutput>;

    /// Only the scalar loss.
    fn value(&self, prediction: &[f64], target: &[f64]) -> Result<f64> {
        self.compute(prediction, target).map(|out| out.value)
    }

    fn name(&self) -> &'static str;
}
