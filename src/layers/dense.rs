//! Dense (fully connected) layer implementation
//!
//! This module provides a DenseLayer that performs the transformation
//! `output = activation(W · input + b)` with a sigmoid, tanh or ReLU
//! nonlinearity.

use crate::error::{check_len, NetworkError, Result};
use crate::layers::{Layer, Parameter};
use crate::utils::{Activation, Matrix, SimpleRng};
use std::path::{Path, PathBuf};

/// Bias value every fresh dense layer starts from.
pub const INITIAL_BIAS: f64 = 0.1;

/// Values cached by `forward` for the matching `backward` call.
#[derive(Debug, Clone)]
struct ForwardCache {
    input: Vec<f64>,
    z: Vec<f64>,
    output: Vec<f64>,
}

/// Dense (fully connected) layer with weights, biases and an activation.
///
/// Computes, for each output neuron `i`:
/// `z_i = b_i + Σ_j W[i][j] · x_j` and `y_i = activation(z_i)`.
///
/// # Fields
///
/// * `weights` - `output_size × input_size`; row `i` feeds neuron `i`
/// * `biases` - one per output neuron
/// * `weight_grads`, `bias_grads` - gradients from the latest backward pass
/// * `cache` - input, pre-activations and outputs of the latest forward pass
///
/// # Example
///
/// ```
/// use sequential_nn::layers::{DenseLayer, Layer};
/// use sequential_nn::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let mut layer = DenseLayer::sigmoid(2, 4, &mut rng);
/// let output = layer.forward(&[0.0, 1.0]).unwrap();
/// assert_eq!(output.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct DenseLayer {
    activation: Activation,
    input_size: usize,
    output_size: usize,
    weights: Matrix,
    biases: Vec<f64>,
    weight_grads: Matrix,
    bias_grads: Vec<f64>,
    cache: Option<ForwardCache>,
    param_file: Option<PathBuf>,
}

impl DenseLayer {
    /// Create a layer with randomly initialized weights.
    ///
    /// Sigmoid and tanh use Xavier/Glorot uniform initialization with
    /// `limit = sqrt(6 / (input_size + output_size))`; ReLU uses He uniform
    /// with `limit = sqrt(6 / input_size)`. Biases start at [`INITIAL_BIAS`].
    pub fn new(
        activation: Activation,
        input_size: usize,
        output_size: usize,
        rng: &mut SimpleRng,
    ) -> Self {
        let limit = match activation {
            Activation::Sigmoid | Activation::Tanh => {
                (6.0 / (input_size + output_size) as f64).sqrt()
            }
            Activation::Relu => (6.0 / input_size as f64).sqrt(),
        };
        Self {
            activation,
            input_size,
            output_size,
            weights: Matrix::from_fn(output_size, input_size, |_, _| {
                rng.gen_range(-limit, limit)
            }),
            biases: vec![INITIAL_BIAS; output_size],
            weight_grads: Matrix::zeros(output_size, input_size),
            bias_grads: vec![0.0; output_size],
            cache: None,
            param_file: None,
        }
    }

    /// Sigmoid layer.
    pub fn sigmoid(input_size: usize, output_size: usize, rng: &mut SimpleRng) -> Self {
        Self::new(Activation::Sigmoid, input_size, output_size, rng)
    }

    /// Tanh layer.
    pub fn tanh(input_size: usize, output_size: usize, rng: &mut SimpleRng) -> Self {
        Self::new(Activation::Tanh, input_size, output_size, rng)
    }

    /// ReLU layer.
    pub fn relu(input_size: usize, output_size: usize, rng: &mut SimpleRng) -> Self {
        Self::new(Activation::Relu, input_size, output_size, rng)
    }

    /// Build a layer from explicit parameters; the shape is taken from `weights`.
    pub fn from_parameters(activation: Activation, weights: Matrix, biases: Vec<f64>) -> Result<Self> {
        check_len("dense biases", weights.rows(), biases.len())?;
        let (output_size, input_size) = (weights.rows(), weights.cols());
        Ok(Self {
            activation,
            input_size,
            output_size,
            weights,
            biases,
            weight_grads: Matrix::zeros(output_size, input_size),
            bias_grads: vec![0.0; output_size],
            cache: None,
            param_file: None,
        })
    }

    /// Attach the file used by `save_params`/`download_params`.
    pub fn with_param_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.param_file = Some(path.into());
        self
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Whether a forward pass is cached and waiting for its backward call.
    pub fn has_forward_cache(&self) -> bool {
        self.cache.is_some()
    }
}

impl Layer for DenseLayer {
    fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_size {
            return Err(NetworkError::shape(
                format!("{} input", self.name()),
                self.input_size,
                input.len(),
            ));
        }

        let mut z = self.weights.mul_vec(input);
        for (zi, b) in z.iter_mut().zip(&self.biases) {
            *zi += b;
        }
        let output: Vec<f64> = z.iter().map(|&zi| self.activation.apply(zi)).collect();

        self.cache = Some(ForwardCache {
            input: input.to_vec(),
            z,
            output: output.clone(),
        });
        Ok(output)
    }

    fn backward(&mut self, output_gradient: &[f64]) -> Result<Vec<f64>> {
        if output_gradient.len() != self.output_size {
            return Err(NetworkError::shape(
                format!("{} output gradient", self.name()),
                self.output_size,
                output_gradient.len(),
            ));
        }
        let cache = self
            .cache
            .take()
            .ok_or_else(|| NetworkError::BackwardBeforeForward { layer: self.name() })?;

        // dL/dz_i = dL/dy_i · activation'(z_i)
        let z_grad: Vec<f64> = output_gradient
            .iter()
            .zip(cache.z.iter().zip(&cache.output))
            .map(|(&g, (&z, &y))| g * self.activation.derivative(z, y))
            .collect();

        self.weight_grads.fill_zero();
        self.weight_grads.add_outer(&z_grad, &cache.input);
        self.bias_grads.copy_from_slice(&z_grad);

        Ok(self.weights.transpose_mul_vec(&z_grad))
    }

    fn weights(&self) -> &Matrix {
        &self.weights
    }

    fn set_weights(&mut self, weights: Matrix) -> Result<()> {
        self.weights.check_shape("dense weights", &weights)?;
        self.weights = weights;
        Ok(())
    }

    fn biases(&self) -> &[f64] {
        &self.biases
    }

    fn set_biases(&mut self, biases: Vec<f64>) -> Result<()> {
        check_len("dense biases", self.output_size, biases.len())?;
        self.biases = biases;
        Ok(())
    }

    fn weight_grads(&self) -> &Matrix {
        &self.weight_grads
    }

    fn bias_grads(&self) -> &[f64] {
        &self.bias_grads
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.output_size
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    fn name(&self) -> String {
        format!("{}({} -> {})", self.activation, self.input_size, self.output_size)
    }

    fn parameters(&mut self) -> Vec<Parameter<'_>> {
        vec![
            Parameter {
                name: "weights",
                values: self.weights.as_mut_slice(),
                grads: self.weight_grads.as_slice(),
            },
            Parameter {
                name: "biases",
                values: &mut self.biases,
                grads: &self.bias_grads,
            },
        ]
    }

    fn param_blocks(&self) -> Vec<(&Matrix, &[f64])> {
        vec![(&self.weights, &self.biases)]
    }

    fn set_param_blocks(&mut self, blocks: Vec<(Matrix, Vec<f64>)>) -> Result<()> {
        let mut blocks = blocks.into_iter();
        let (weights, biases) = blocks
            .next()
            .ok_or_else(|| NetworkError::shape("dense parameter blocks", 1, 0))?;
        self.weights.check_shape("dense weights", &weights)?;
        check_len("dense biases", self.output_size, biases.len())?;
        self.weights = weights;
        self.biases = biases;
        Ok(())
    }

    fn param_file(&self) -> Option<&Path> {
        self.param_file.as_deref()
    }
}
