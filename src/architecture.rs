//! Architecture configuration structures
//!
//! This module provides configuration structures for defining neural network architectures
//! via JSON configuration files. This enables architecture experimentation without code changes.

use crate::error::{NetworkError, Result};
use crate::layers::{DenseLayer, Layer, OutputMode, RecurrentLayer};
use crate::utils::activations::Activation;
use crate::utils::rng::SimpleRng;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for a single layer in the neural network.
///
/// Defines the layer type and its parameters. Different layer types require different fields:
///
/// - **sigmoid / tanh / relu** (dense): Requires `input_size` and `output_size`
/// - **recurrent**: Requires `input_size` (features per step), `hidden_size`,
///   `output_size` (outputs per step) and `sequence_length`, with optional
///   `output_mode` ("every_step" by default, or "last_step")
///
/// Every layer accepts an optional `param_file` used by save/download.
///
/// # Examples
///
/// ```json
/// {
///   "layer_type": "sigmoid",
///   "input_size": 2,
///   "output_size": 4,
///   "param_file": "weights/hidden.txt"
/// }
/// ```
///
/// ```json
/// {
///   "layer_type": "recurrent",
///   "input_size": 1,
///   "hidden_size": 8,
///   "output_size": 1,
///   "sequence_length": 5,
///   "output_mode": "last_step"
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerConfig {
    /// Type of layer: "sigmoid", "tanh", "relu" or "recurrent"
    pub layer_type: String,

    /// Input size of a dense layer, or features per step of a recurrent layer
    pub input_size: Option<usize>,
    /// Output size of a dense layer, or outputs per step of a recurrent layer
    pub output_size: Option<usize>,

    // Recurrent layer parameters
    /// Hidden state size for a recurrent layer
    pub hidden_size: Option<usize>,
    /// Number of steps in one input sequence
    pub sequence_length: Option<usize>,
    /// "every_step" (default) or "last_step"
    pub output_mode: Option<String>,

    /// Parameter file for save/download
    pub param_file: Option<PathBuf>,
}

/// Configuration for the entire neural network architecture.
///
/// Contains a sequence of layer configurations that define the network structure.
/// Layers are applied in the order they appear in the configuration.
///
/// # Example
///
/// ```json
/// {
///   "layers": [
///     { "layer_type": "relu", "input_size": 2, "output_size": 4 },
///     { "layer_type": "sigmoid", "input_size": 4, "output_size": 1 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureConfig {
    /// Sequence of layer configurations defining the network structure
    pub layers: Vec<LayerConfig>,
}

/// Loads an architecture configuration from a JSON file.
///
/// Reads the file at `path`, deserializes its JSON contents into an
/// `ArchitectureConfig` and validates it.
///
/// # Examples
///
/// ```no_run
/// use sequential_nn::architecture::load_architecture;
///
/// let arch = load_architecture("config/architectures/xor_relu.json").unwrap();
/// assert!(!arch.layers.is_empty());
/// ```
pub fn load_architecture(path: impl AsRef<Path>) -> Result<ArchitectureConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| NetworkError::io(path, e))?;
    let config: ArchitectureConfig = serde_json::from_str(&contents)?;
    validate_architecture(&config)?;
    Ok(config)
}

fn invalid(message: String) -> NetworkError {
    NetworkError::InvalidConfig(message)
}

fn required(value: Option<usize>, index: usize, kind: &str, field: &str) -> Result<usize> {
    match value {
        None => Err(invalid(format!(
            "Layer {}: {} layer requires '{}'",
            index, kind, field
        ))),
        Some(0) => Err(invalid(format!(
            "Layer {}: {} must be greater than 0",
            index, field
        ))),
        Some(v) => Ok(v),
    }
}

fn parse_output_mode(layer: &LayerConfig, index: usize) -> Result<OutputMode> {
    match layer.output_mode.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("every_step") => Ok(OutputMode::EverySequenceStep),
        Some("last_step") => Ok(OutputMode::LastStep),
        Some(other) => Err(invalid(format!(
            "Layer {}: Invalid output_mode '{}'. Must be one of: every_step, last_step",
            index, other
        ))),
    }
}

/// Flattened `(input_size, output_size)` a layer presents to its neighbours.
fn layer_io_sizes(layer: &LayerConfig, index: usize) -> Result<(usize, usize)> {
    let layer_type = layer.layer_type.to_lowercase();

    match layer_type.as_str() {
        "sigmoid" | "tanh" | "relu" => Ok((
            required(layer.input_size, index, "Dense", "input_size")?,
            required(layer.output_size, index, "Dense", "output_size")?,
        )),
        "recurrent" => {
            let features = required(layer.input_size, index, "Recurrent", "input_size")?;
            required(layer.hidden_size, index, "Recurrent", "hidden_size")?;
            let step_output = required(layer.output_size, index, "Recurrent", "output_size")?;
            let steps = required(layer.sequence_length, index, "Recurrent", "sequence_length")?;
            let output = match parse_output_mode(layer, index)? {
                OutputMode::EverySequenceStep => steps * step_output,
                OutputMode::LastStep => step_output,
            };
            Ok((steps * features, output))
        }
        _ => Err(invalid(format!(
            "Layer {}: Invalid layer type '{}'. Must be one of: sigmoid, tanh, relu, recurrent",
            index, layer.layer_type
        ))),
    }
}

/// Validates an architecture configuration.
///
/// Checks that:
/// - Architecture has at least one layer
/// - Each layer has the required fields for its type, all positive
/// - Layer connections are valid (output size of layer i matches input size of layer i+1)
///
/// # Errors
///
/// [`NetworkError::InvalidConfig`] with a descriptive message.
pub fn validate_architecture(config: &ArchitectureConfig) -> Result<()> {
    if config.layers.is_empty() {
        return Err(invalid(
            "Architecture must have at least one layer".to_string(),
        ));
    }

    let sizes = config
        .layers
        .iter()
        .enumerate()
        .map(|(i, layer)| layer_io_sizes(layer, i))
        .collect::<Result<Vec<_>>>()?;

    for (i, pair) in sizes.windows(2).enumerate() {
        let current_output = pair[0].1;
        let next_input = pair[1].0;
        if current_output != next_input {
            return Err(invalid(format!(
                "Layer connection mismatch: Layer {} output size ({}) does not match Layer {} input size ({})",
                i, current_output, i + 1, next_input
            )));
        }
    }

    Ok(())
}

/// Builds the layers described by an architecture configuration.
///
/// Each layer is initialized from the shared `rng`, in configuration order,
/// so a fixed seed always produces the same network.
///
/// # Errors
///
/// [`NetworkError::InvalidConfig`] if the configuration does not validate.
///
/// # Examples
///
/// ```
/// use sequential_nn::architecture::{build_layers, ArchitectureConfig, LayerConfig};
/// use sequential_nn::utils::SimpleRng;
///
/// let config = ArchitectureConfig {
///     layers: vec![LayerConfig {
///         layer_type: "sigmoid".to_string(),
///         input_size: Some(2),
///         output_size: Some(1),
///         ..Default::default()
///     }],
/// };
/// let layers = build_layers(&config, &mut SimpleRng::new(42)).unwrap();
/// assert_eq!(layers.len(), 1);
/// ```
pub fn build_layers(config: &ArchitectureConfig, rng: &mut SimpleRng) -> Result<Vec<Box<dyn Layer>>> {
    validate_architecture(config)?;

    let mut layers: Vec<Box<dyn Layer>> = Vec::with_capacity(config.layers.len());
    for (i, layer_config) in config.layers.iter().enumerate() {
        let layer = build_layer(layer_config, i, rng)?;
        tracing::debug!(index = i, layer = %layer.name(), "built layer");
        layers.push(layer);
    }
    Ok(layers)
}

fn build_layer(config: &LayerConfig, index: usize, rng: &mut SimpleRng) -> Result<Box<dyn Layer>> {
    let layer_type = config.layer_type.to_lowercase();

    if layer_type == "recurrent" {
        let mut layer = RecurrentLayer::new(
            required(config.input_size, index, "Recurrent", "input_size")?,
            required(config.hidden_size, index, "Recurrent", "hidden_size")?,
            required(config.output_size, index, "Recurrent", "output_size")?,
            required(config.sequence_length, index, "Recurrent", "sequence_length")?,
            rng,
        )?
        .with_output_mode(parse_output_mode(config, index)?);
        if let Some(ref path) = config.param_file {
            layer = layer.with_param_file(path);
        }
        return Ok(Box::new(layer));
    }

    let activation = Activation::from_name(&layer_type).ok_or_else(|| {
        invalid(format!(
            "Layer {}: Invalid layer type '{}'",
            index, config.layer_type
        ))
    })?;
    let mut layer = DenseLayer::new(
        activation,
        required(config.input_size, index, "Dense", "input_size")?,
        required(config.output_size, index, "Dense", "output_size")?,
        rng,
    );
    if let Some(ref path) = config.param_file {
        layer = layer.with_param_file(path);
    }
    Ok(Box::new(layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense(kind: &str, input: usize, output: usize) -> LayerConfig {
        LayerConfig {
            layer_type: kind.to_string(),
            input_size: Some(input),
            output_size: Some(output),
            ..Default::default()
        }
    }

    #[test]
    fn test_dense_sizes() {
        assert_eq!(layer_io_sizes(&dense("relu", 3, 5), 0).unwrap(), (3, 5));
    }

    #[test]
    fn test_recurrent_sizes_follow_output_mode() {
        let mut layer = LayerConfig {
            layer_type: "recurrent".to_string(),
            input_size: Some(2),
            hidden_size: Some(4),
            output_size: Some(3),
            sequence_length: Some(5),
            ..Default::default()
        };
        assert_eq!(layer_io_sizes(&layer, 0).unwrap(), (10, 15));

        layer.output_mode = Some("last_step".to_string());
        assert_eq!(layer_io_sizes(&layer, 0).unwrap(), (10, 3));

        layer.output_mode = Some("sideways".to_string());
        assert!(layer_io_sizes(&layer, 0).is_err());
    }

    #[test]
    fn test_missing_field_names_layer_and_field() {
        let mut layer = dense("tanh", 2, 2);
        layer.output_size = None;
        let err = layer_io_sizes(&layer, 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Layer 3: Dense layer requires 'output_size'"
        );
    }

    #[test]
    fn test_connection_mismatch() {
        let config = ArchitectureConfig {
            layers: vec![dense("relu", 2, 4), dense("sigmoid", 3, 1)],
        };
        let err = validate_architecture(&config).unwrap_err();
        assert!(err.to_string().contains("Layer connection mismatch"));
    }

    #[test]
    fn test_build_keeps_order_and_kinds() {
        let config = ArchitectureConfig {
            layers: vec![dense("relu", 2, 4), dense("sigmoid", 4, 1)],
        };
        let layers = build_layers(&config, &mut SimpleRng::new(1)).unwrap();
        assert_eq!(layers[0].name(), "ReLU(2 -> 4)");
        assert_eq!(layers[1].name(), "Sigmoid(4 -> 1)");
    }
}
