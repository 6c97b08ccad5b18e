//! Tests for architecture configuration and model building
//!
//! This file tests:
//! - Loading architecture files
//! - Validation of layer fields and connections
//! - Building layers and whole models from configuration

use sequential_nn::architecture::{
    build_layers, load_architecture, validate_architecture, ArchitectureConfig, LayerConfig,
};
use sequential_nn::config::TrainingConfig;
use sequential_nn::layers::Layer;
use sequential_nn::model::Sequential;
use sequential_nn::utils::SimpleRng;
use sequential_nn::NetworkError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp_architecture(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp architecture");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp architecture");
    file
}

fn dense(kind: &str, input: usize, output: usize) -> LayerConfig {
    LayerConfig {
        layer_type: kind.to_string(),
        input_size: Some(input),
        output_size: Some(output),
        ..Default::default()
    }
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_repository_architectures() {
    let sigmoid = load_architecture("config/architectures/xor_sigmoid.json").unwrap();
    assert_eq!(sigmoid.layers.len(), 2);
    assert_eq!(sigmoid.layers[0].layer_type, "sigmoid");

    let relu = load_architecture("config/architectures/xor_relu.json").unwrap();
    assert_eq!(relu.layers[0].layer_type, "relu");

    let sequence = load_architecture("config/architectures/sequence_classifier.json").unwrap();
    assert_eq!(sequence.layers[0].hidden_size, Some(6));
    assert_eq!(sequence.layers[0].output_mode.as_deref(), Some("last_step"));
}

#[test]
fn test_param_file_is_parsed() {
    let temp = write_temp_architecture(
        r#"{"layers": [{"layer_type": "tanh", "input_size": 2, "output_size": 1, "param_file": "w/out.txt"}]}"#,
    );
    let config = load_architecture(temp.path()).unwrap();
    assert_eq!(
        config.layers[0].param_file.as_deref(),
        Some(std::path::Path::new("w/out.txt"))
    );
}

#[test]
fn test_empty_architecture_rejected() {
    let temp = write_temp_architecture(r#"{"layers": []}"#);
    let err = load_architecture(temp.path()).unwrap_err();
    assert!(err.to_string().contains("at least one layer"));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_unknown_layer_type() {
    let config = ArchitectureConfig {
        layers: vec![dense("softmax", 2, 2)],
    };
    let err = validate_architecture(&config).unwrap_err();
    assert!(matches!(err, NetworkError::InvalidConfig(ref msg) if msg.contains("softmax")));
}

#[test]
fn test_zero_size_rejected() {
    let config = ArchitectureConfig {
        layers: vec![dense("relu", 0, 2)],
    };
    assert!(validate_architecture(&config).is_err());
}

#[test]
fn test_recurrent_requires_sequence_length() {
    let config = ArchitectureConfig {
        layers: vec![LayerConfig {
            layer_type: "recurrent".to_string(),
            input_size: Some(1),
            hidden_size: Some(4),
            output_size: Some(1),
            ..Default::default()
        }],
    };
    let err = validate_architecture(&config).unwrap_err();
    assert!(err.to_string().contains("sequence_length"));
}

#[test]
fn test_recurrent_connection_uses_flattened_sizes() {
    let recurrent = LayerConfig {
        layer_type: "recurrent".to_string(),
        input_size: Some(2),
        hidden_size: Some(4),
        output_size: Some(3),
        sequence_length: Some(5),
        ..Default::default()
    };
    // Every-step output is 5 × 3 = 15 values.
    let ok = ArchitectureConfig {
        layers: vec![recurrent.clone(), dense("sigmoid", 15, 1)],
    };
    assert!(validate_architecture(&ok).is_ok());

    let bad = ArchitectureConfig {
        layers: vec![recurrent, dense("sigmoid", 3, 1)],
    };
    assert!(validate_architecture(&bad).is_err());
}

#[test]
fn test_layer_type_is_case_insensitive() {
    let config = ArchitectureConfig {
        layers: vec![dense("ReLU", 2, 3), dense("Sigmoid", 3, 1)],
    };
    assert!(validate_architecture(&config).is_ok());
}

// ============================================================================
// Building
// ============================================================================

#[test]
fn test_build_layers_sizes() {
    let config = load_architecture("config/architectures/sequence_classifier.json").unwrap();
    let layers = build_layers(&config, &mut SimpleRng::new(1)).unwrap();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].input_size(), 4);
    assert_eq!(layers[0].output_size(), 3);
    assert_eq!(layers[1].input_size(), 3);
    assert_eq!(layers[1].output_size(), 1);
}

#[test]
fn test_build_is_deterministic() {
    let config = load_architecture("config/architectures/xor_relu.json").unwrap();
    let a = build_layers(&config, &mut SimpleRng::new(9)).unwrap();
    let b = build_layers(&config, &mut SimpleRng::new(9)).unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.weights(), y.weights());
        assert_eq!(x.biases(), y.biases());
    }
}

#[test]
fn test_model_from_config_trains_xor() {
    let architecture = load_architecture("config/architectures/xor_sigmoid.json").unwrap();
    let training = TrainingConfig::new(0.5, 1000);
    let mut model = Sequential::from_config(&architecture, &training, &mut SimpleRng::new(42)).unwrap();

    assert_eq!(model.len(), 2);
    assert_eq!(model.epochs(), 1000);
    assert_eq!(model.learning_rate(), 0.5);

    let inputs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let targets = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
    let history = model.train(&inputs, &targets).unwrap();
    assert!(history.final_loss().unwrap() < 0.05);
}

#[test]
fn test_model_from_config_rejects_bad_training() {
    let architecture = load_architecture("config/architectures/xor_sigmoid.json").unwrap();
    let training = TrainingConfig::new(0.5, 0);
    assert!(Sequential::from_config(&architecture, &training, &mut SimpleRng::new(1)).is_err());
}

#[test]
fn test_model_from_config_uses_configured_seed() {
    let architecture = load_architecture("config/architectures/xor_relu.json").unwrap();
    let mut training = TrainingConfig::new(0.1, 10);
    training.seed = Some(42);

    let a = Sequential::from_config(&architecture, &training, &mut SimpleRng::new(1)).unwrap();
    let b = Sequential::from_config(&architecture, &training, &mut SimpleRng::new(2)).unwrap();
    let direct = build_layers(&architecture, &mut SimpleRng::new(42)).unwrap();
    for ((x, y), z) in a.layers().iter().zip(b.layers()).zip(&direct) {
        assert_eq!(x.weights(), y.weights());
        assert_eq!(x.weights(), z.weights());
    }
}

#[test]
fn test_model_from_config_without_seed_uses_caller_rng() {
    let architecture = load_architecture("config/architectures/xor_relu.json").unwrap();
    let training = TrainingConfig::new(0.1, 10);

    let a = Sequential::from_config(&architecture, &training, &mut SimpleRng::new(1)).unwrap();
    let b = Sequential::from_config(&architecture, &training, &mut SimpleRng::new(2)).unwrap();
    assert_ne!(a.layers()[0].weights(), b.layers()[0].weights());
}
