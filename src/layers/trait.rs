//! Layer trait definition for neural network layers
//!
//! This module defines the core Layer trait that all layer types must implement.
//! The trait provides a common interface for forward propagation, backward
//! propagation, parameter access for optimizers, and parameter persistence.

use crate::error::{NetworkError, Result};
use crate::layers::snapshot;
use crate::utils::Matrix;
use std::io::{BufRead, Read, Write};
use std::path::Path;

const STREAM_ORIGIN: &str = "<stream>";

/// One trainable tensor paired with the gradient from the latest backward pass.
///
/// Optimizers receive these from [`Layer::parameters`] and update `values`
/// in place.
pub struct Parameter<'a> {
    /// Stable name within the layer ("weights", "biases", ...)
    pub name: &'static str,
    pub values: &'a mut [f64],
    pub grads: &'a [f64],
}

/// Core trait for neural network layers.
///
/// Every layer kind (dense Sigmoid/Tanh/ReLU, recurrent) implements this trait
/// so a model can hold them as `Box<dyn Layer>` and drive them uniformly.
///
/// # Call order
///
/// `forward` caches whatever `backward` needs (last input, pre-activations,
/// outputs). `backward` consumes that cache, so every backward call must be
/// preceded by its own forward call; otherwise it fails with
/// [`NetworkError::BackwardBeforeForward`].
///
/// `backward` never touches the weights. It stores weight and bias gradients
/// and returns the gradient for the previous layer, computed from the
/// unmodified weights. Applying the update is the optimizer's job.
///
/// # Example
///
/// ```ignore
/// let output = layer.forward(&input)?;
/// let grad_input = layer.backward(&grad_output)?;
/// optimizer.step(&mut layer);
/// ```
pub trait Layer {
    /// Forward propagation through the layer.
    ///
    /// # Errors
    ///
    /// [`NetworkError::ShapeMismatch`] if `input.len() != self.input_size()`.
    fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>>;

    /// Backward propagation through the layer.
    ///
    /// `output_gradient` is ∂loss/∂output for this layer (length
    /// `output_size`). Stores the weight and bias gradients and returns
    /// ∂loss/∂input (length `input_size`).
    ///
    /// # Errors
    ///
    /// - [`NetworkError::BackwardBeforeForward`] if no forward pass is cached
    /// - [`NetworkError::ShapeMismatch`] if the gradient has the wrong length
    fn backward(&mut self, output_gradient: &[f64]) -> Result<Vec<f64>>;

    /// Primary weight matrix.
    ///
    /// For dense layers this is `output_size × input_size`. A
    /// [`crate::layers::RecurrentLayer`] returns its packed gate matrix,
    /// `4·hidden × (features + hidden)`, whose shape is unrelated to
    /// `output_size`/`input_size`; its projection has separate accessors.
    fn weights(&self) -> &Matrix;

    /// Replace the primary weights; the shape must match the current one.
    fn set_weights(&mut self, weights: Matrix) -> Result<()>;

    /// Biases belonging to the primary weight matrix.
    fn biases(&self) -> &[f64];

    /// Replace the primary biases; the length must match the current one.
    fn set_biases(&mut self, biases: Vec<f64>) -> Result<()>;

    /// Gradient of the primary weights from the latest backward pass.
    fn weight_grads(&self) -> &Matrix;

    /// Gradient of the primary biases from the latest backward pass.
    fn bias_grads(&self) -> &[f64];

    /// Expected length of the forward input.
    fn input_size(&self) -> usize;

    /// Length of the forward output.
    fn output_size(&self) -> usize;

    /// Total count of trainable scalars.
    fn parameter_count(&self) -> usize;

    /// Human-readable layer kind used in logs and errors.
    fn name(&self) -> String;

    /// All trainable tensors with their gradients.
    fn parameters(&mut self) -> Vec<Parameter<'_>>;

    /// Weight/bias blocks in the order they are written to a parameter file.
    fn param_blocks(&self) -> Vec<(&Matrix, &[f64])>;

    /// Install freshly loaded blocks; shapes were already checked against
    /// [`Layer::param_blocks`].
    fn set_param_blocks(&mut self, blocks: Vec<(Matrix, Vec<f64>)>) -> Result<()>;

    /// File used by [`Layer::save_params`] and [`Layer::download_params`].
    fn param_file(&self) -> Option<&Path>;

    /// Write the parameters to the layer's configured file.
    fn save_params(&self) -> Result<()> {
        let path = self
            .param_file()
            .ok_or_else(|| NetworkError::ParamFileMissing { layer: self.name() })?;
        self.save_params_to(path)
    }

    /// Read the parameters back from the layer's configured file.
    ///
    /// On any error the current parameters are left untouched.
    fn download_params(&mut self) -> Result<()> {
        let path = self
            .param_file()
            .ok_or_else(|| NetworkError::ParamFileMissing { layer: self.name() })?
            .to_path_buf();
        self.load_params_from(&path)
    }

    /// Write the parameters to an explicit path.
    fn save_params_to(&self, path: &Path) -> Result<()> {
        snapshot::save(path, &self.param_blocks())?;
        tracing::debug!(layer = %self.name(), path = %path.display(), "saved parameters");
        Ok(())
    }

    /// Read the parameters from an explicit path.
    ///
    /// On any error the current parameters are left untouched.
    fn load_params_from(&mut self, path: &Path) -> Result<()> {
        let blocks = snapshot::load(path, &snapshot::shapes_of(&self.param_blocks()))?;
        self.set_param_blocks(blocks)?;
        tracing::debug!(layer = %self.name(), path = %path.display(), "loaded parameters");
        Ok(())
    }

    /// Write the parameters to any writer in the parameter file format.
    fn write_params(&self, out: &mut dyn Write) -> Result<()> {
        snapshot::write_blocks(out, &self.param_blocks())
            .map_err(|e| NetworkError::io(STREAM_ORIGIN, e))
    }

    /// Read parameters in the parameter file format from any reader.
    ///
    /// On any error the current parameters are left untouched.
    fn read_params(&mut self, input: &mut dyn BufRead) -> Result<()> {
        let mut text = String::new();
        input
            .read_to_string(&mut text)
            .map_err(|e| NetworkError::io(STREAM_ORIGIN, e))?;
        let blocks = snapshot::parse_blocks(
            &text,
            Path::new(STREAM_ORIGIN),
            &snapshot::shapes_of(&self.param_blocks()),
        )?;
        self.set_param_blocks(blocks)
    }
}

