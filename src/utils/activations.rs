//! Activation functions for neural networks
//!
//! Sigmoid and tanh derivatives are expressed in terms of the activation
//! output `y`, so a layer evaluates them from its cached forward output.
//! The ReLU derivative needs the pre-activation `z` instead.

use std::fmt;

/// Sigmoid activation function.
///
/// Returns the sigmoid of the input: 1 / (1 + exp(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Sigmoid derivative assuming y = sigmoid(z).
///
/// Returns the derivative: y * (1 - y)
pub fn sigmoid_derivative(y: f64) -> f64 {
    y * (1.0 - y)
}

/// Hyperbolic tangent.
pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

/// Tanh derivative assuming y = tanh(z).
pub fn tanh_derivative(y: f64) -> f64 {
    1.0 - y * y
}

/// ReLU: max(0, x).
pub fn relu(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        0.0
    }
}

/// ReLU derivative from the pre-activation; 0 at z = 0.
pub fn relu_derivative(z: f64) -> f64 {
    if z > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Nonlinearity applied by a dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
}

impl Activation {
    /// Apply the activation to a pre-activation value.
    pub fn apply(self, z: f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid(z),
            Activation::Tanh => tanh(z),
            Activation::Relu => relu(z),
        }
    }

    /// Derivative d(output)/dz, given both the cached pre-activation `z`
    /// and the cached output `y` of the same neuron.
    pub fn derivative(self, z: f64, y: f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid_derivative(y),
            Activation::Tanh => tanh_derivative(y),
            Activation::Relu => relu_derivative(z),
        }
    }

    /// Parse the lowercase names used in architecture files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "sigmoid" => Some(Activation::Sigmoid),
            "tanh" => Some(Activation::Tanh),
            "relu" => Some(Activation::Relu),
            _ => None,
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activation::Sigmoid => "Sigmoid",
            Activation::Tanh => "Tanh",
            Activation::Relu => "ReLU",
        };
        f.write_str(name)
    }
}
