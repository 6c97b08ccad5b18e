//! Tests for parameter files
//!
//! This file tests:
//! - Save/download round trips for dense and recurrent layers
//! - The on-disk layout
//! - Rejection of malformed or mismatched files without partial loads
//! - Model-level save/load to configured files and to a directory

use sequential_nn::layers::{DenseLayer, Layer, OutputMode, RecurrentLayer};
use sequential_nn::loss::MSE;
use sequential_nn::model::Sequential;
use sequential_nn::optimizers::{Optimizer, SGD};
use sequential_nn::utils::SimpleRng;
use sequential_nn::NetworkError;
use std::fs;
use std::io::Cursor;
use tempfile::tempdir;

fn params(layer: &dyn Layer) -> Vec<(Vec<f64>, Vec<f64>)> {
    layer
        .param_blocks()
        .into_iter()
        .map(|(w, b)| (w.as_slice().to_vec(), b.to_vec()))
        .collect()
}

// ============================================================================
// Single layers
// ============================================================================

mod layer_tests {
    use super::*;

    #[test]
    fn test_dense_round_trip_is_bitwise() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dense.txt");

        let source = DenseLayer::tanh(3, 4, &mut SimpleRng::new(1)).with_param_file(&path);
        source.save_params().unwrap();

        let mut restored = DenseLayer::tanh(3, 4, &mut SimpleRng::new(2)).with_param_file(&path);
        assert_ne!(params(&restored), params(&source));
        restored.download_params().unwrap();
        assert_eq!(params(&restored), params(&source));
    }

    #[test]
    fn test_file_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.txt");
        let layer = DenseLayer::sigmoid(3, 2, &mut SimpleRng::new(4));
        layer.save_params_to(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2 + 2 + 1);
        assert_eq!(lines[0], "3");
        assert_eq!(lines[1], "2");
        assert_eq!(lines[2].split_whitespace().count(), 3);
        assert_eq!(lines[3].split_whitespace().count(), 3);
        assert_eq!(lines[4], "0.1 0.1");
    }

    #[test]
    fn test_recurrent_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recurrent.txt");
        let mut source = RecurrentLayer::new(2, 3, 1, 4, &mut SimpleRng::new(5))
            .unwrap()
            .with_output_mode(OutputMode::LastStep)
            .with_param_file(&path);

        // Move away from the initial values first.
        source.forward(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]).unwrap();
        source.backward(&[1.0]).unwrap();
        SGD::new(0.3).step(&mut source);
        source.save_params().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // Gate block: 2 + 12 + 1 lines, projection block: 2 + 1 + 1 lines.
        assert_eq!(lines.len(), 15 + 4);
        assert_eq!(lines[0], "5");
        assert_eq!(lines[1], "12");
        assert_eq!(lines[15], "3");
        assert_eq!(lines[16], "1");

        let mut restored = RecurrentLayer::new(2, 3, 1, 4, &mut SimpleRng::new(6))
            .unwrap()
            .with_output_mode(OutputMode::LastStep)
            .with_param_file(&path);
        restored.download_params().unwrap();
        assert_eq!(params(&restored), params(&source));

        let input = [0.3, -0.1, 0.0, 0.9, -0.5, 0.2, 0.4, 0.4];
        assert_eq!(
            restored.forward(&input).unwrap(),
            source.forward(&input).unwrap()
        );
    }

    #[test]
    fn test_stream_round_trip() {
        let source = DenseLayer::relu(2, 2, &mut SimpleRng::new(10));
        let mut buffer: Vec<u8> = Vec::new();
        source.write_params(&mut buffer).unwrap();

        let mut restored = DenseLayer::relu(2, 2, &mut SimpleRng::new(11));
        restored.read_params(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(params(&restored), params(&source));
    }

    #[test]
    fn test_short_weight_row_is_rejected_without_partial_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        // Second weight row holds one value instead of two.
        fs::write(&path, "2\n2\n9 9\n9\n9 9\n").unwrap();

        let mut layer = DenseLayer::sigmoid(2, 2, &mut SimpleRng::new(3)).with_param_file(&path);
        let before = params(&layer);
        let err = layer.download_params().unwrap_err();
        match err {
            NetworkError::LoadSizeMismatch {
                what,
                expected,
                actual,
                ..
            } => {
                assert_eq!(what, "weight row 1");
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(params(&layer), before);
    }

    #[test]
    fn test_wrong_bias_count_is_rejected() {
        let mut layer = DenseLayer::sigmoid(2, 1, &mut SimpleRng::new(3));
        let before = params(&layer);
        let err = layer
            .read_params(&mut Cursor::new("2\n1\n0.5 0.5\n0.1 0.2\n"))
            .unwrap_err();
        assert!(matches!(err, NetworkError::LoadSizeMismatch { ref what, .. } if what == "bias count"));
        assert_eq!(params(&layer), before);
    }

    #[test]
    fn test_header_must_match_layer() {
        let source = DenseLayer::sigmoid(3, 2, &mut SimpleRng::new(1));
        let mut buffer: Vec<u8> = Vec::new();
        source.write_params(&mut buffer).unwrap();

        let mut other = DenseLayer::sigmoid(2, 2, &mut SimpleRng::new(1));
        let err = other.read_params(&mut Cursor::new(buffer)).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::LoadSizeMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let mut layer = DenseLayer::sigmoid(2, 1, &mut SimpleRng::new(3))
            .with_param_file(dir.path().join("missing.txt"));
        assert!(matches!(
            layer.download_params(),
            Err(NetworkError::Io { .. })
        ));
    }

    #[test]
    fn test_no_param_file_configured() {
        let mut layer = DenseLayer::sigmoid(2, 1, &mut SimpleRng::new(3));
        assert!(matches!(
            layer.save_params(),
            Err(NetworkError::ParamFileMissing { .. })
        ));
        assert!(matches!(
            layer.download_params(),
            Err(NetworkError::ParamFileMissing { .. })
        ));
    }
}

// ============================================================================
// Whole models
// ============================================================================

mod model_tests {
    use super::*;

    fn model(seed: u64) -> Sequential {
        let mut rng = SimpleRng::new(seed);
        let mut model = Sequential::new(Box::new(MSE), Box::new(SGD::new(0.1)));
        model
            .add_layer(Box::new(DenseLayer::relu(2, 3, &mut rng)))
            .unwrap();
        model
            .add_layer(Box::new(DenseLayer::sigmoid(3, 1, &mut rng)))
            .unwrap();
        model
    }

    fn all_params(model: &Sequential) -> Vec<Vec<(Vec<f64>, Vec<f64>)>> {
        model.layers().iter().map(|layer| params(&**layer)).collect()
    }

    #[test]
    fn test_dir_round_trip() {
        let dir = tempdir().unwrap();
        let source = model(1);
        source.save_params_to_dir(dir.path().join("weights")).unwrap();
        assert!(dir.path().join("weights/layer_0.txt").exists());
        assert!(dir.path().join("weights/layer_1.txt").exists());

        let mut restored = model(2);
        restored.load_params_from_dir(dir.path().join("weights")).unwrap();
        assert_eq!(all_params(&restored), all_params(&source));
    }

    #[test]
    fn test_dir_load_is_all_or_nothing() {
        let dir = tempdir().unwrap();
        model(1).save_params_to_dir(dir.path()).unwrap();
        fs::write(dir.path().join("layer_1.txt"), "3\n1\n1 2 3\n").unwrap();

        let mut target = model(2);
        let before = all_params(&target);
        assert!(target.load_params_from_dir(dir.path()).is_err());
        assert_eq!(all_params(&target), before);
    }

    #[test]
    fn test_configured_files() {
        let dir = tempdir().unwrap();
        let build = |seed: u64| {
            let mut rng = SimpleRng::new(seed);
            let mut model = Sequential::new(Box::new(MSE), Box::new(SGD::new(0.1)));
            model
                .add_layer(Box::new(
                    DenseLayer::tanh(2, 2, &mut rng).with_param_file(dir.path().join("a.txt")),
                ))
                .unwrap();
            model
                .add_layer(Box::new(
                    DenseLayer::tanh(2, 1, &mut rng).with_param_file(dir.path().join("b.txt")),
                ))
                .unwrap();
            model
        };

        let source = build(7);
        source.save_params().unwrap();
        let mut restored = build(8);
        restored.download_params().unwrap();
        assert_eq!(all_params(&restored), all_params(&source));
    }

    #[test]
    fn test_download_requires_every_file() {
        let mut target = model(1);
        assert!(matches!(
            target.download_params(),
            Err(NetworkError::ParamFileMissing { .. })
        ));
    }
}
