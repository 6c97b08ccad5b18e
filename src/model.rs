//! Sequential model
//!
//! A [`Sequential`] owns an ordered list of layers plus one loss and one
//! optimizer. Prediction folds `forward` over the layers; a training step
//! then folds `backward` over them in reverse, stepping the optimizer on
//! each layer right after its backward call.

use crate::architecture::{build_layers, ArchitectureConfig};
use crate::config::TrainingConfig;
use crate::error::{NetworkError, Result};
use crate::layers::{snapshot, Layer};
use crate::loss::{Loss, MSE};
use crate::optimizers::{Optimizer, SGD};
use crate::utils::SimpleRng;
use std::fs;
use std::path::{Path, PathBuf};

/// Epoch count used when none is configured.
pub const DEFAULT_EPOCHS: usize = 1000;

/// Average loss of every epoch run by [`Sequential::train`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingHistory {
    pub epoch_losses: Vec<f64>,
}

impl TrainingHistory {
    /// Loss of the last epoch, if any ran.
    pub fn final_loss(&self) -> Option<f64> {
        self.epoch_losses.last().copied()
    }

    pub fn len(&self) -> usize {
        self.epoch_losses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epoch_losses.is_empty()
    }
}

/// Feed-forward stack of layers trained one sample at a time.
///
/// # Example
///
/// ```
/// use sequential_nn::layers::DenseLayer;
/// use sequential_nn::loss::MSE;
/// use sequential_nn::model::Sequential;
/// use sequential_nn::optimizers::SGD;
/// use sequential_nn::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let mut model = Sequential::new(Box::new(MSE), Box::new(SGD::new(0.5))).with_epochs(10);
/// model.add_layer(Box::new(DenseLayer::sigmoid(2, 4, &mut rng))).unwrap();
/// model.add_layer(Box::new(DenseLayer::sigmoid(4, 1, &mut rng))).unwrap();
///
/// let inputs = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
/// let targets = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
/// let history = model.train(&inputs, &targets).unwrap();
/// assert_eq!(history.len(), 10);
/// ```
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
    loss: Box<dyn Loss>,
    optimizer: Box<dyn Optimizer>,
    epochs: usize,
    report_interval: Option<usize>,
}

impl Sequential {
    pub fn new(loss: Box<dyn Loss>, optimizer: Box<dyn Optimizer>) -> Self {
        Self {
            layers: Vec::new(),
            loss,
            optimizer,
            epochs: DEFAULT_EPOCHS,
            report_interval: None,
        }
    }

    /// Number of epochs run by [`Sequential::train`].
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Log the average loss every `interval` epochs. Without it, training
    /// reports ten times over the run.
    pub fn with_report_interval(mut self, interval: usize) -> Self {
        self.report_interval = Some(interval);
        self
    }

    /// Build the layers described by `architecture` and wire them to MSE
    /// and SGD with the hyperparameters from `training`.
    ///
    /// Layers draw their initial weights from a fresh generator seeded
    /// with `training.seed` when it is set, and from `rng` otherwise.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidConfig`] if either configuration is invalid.
    pub fn from_config(
        architecture: &ArchitectureConfig,
        training: &TrainingConfig,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        training.validate()?;
        let mut seeded;
        let rng = match training.seed {
            Some(seed) => {
                seeded = SimpleRng::new(seed);
                &mut seeded
            }
            None => rng,
        };

        let mut model = Sequential::new(Box::new(MSE), Box::new(SGD::new(training.learning_rate)))
            .with_epochs(training.epochs);
        if let Some(interval) = training.report_interval {
            model = model.with_report_interval(interval);
        }
        for layer in build_layers(architecture, rng)? {
            model.add_layer(layer)?;
        }

        tracing::debug!(
            layers = model.len(),
            loss = model.loss.name(),
            optimizer = model.optimizer.name(),
            learning_rate = training.learning_rate,
            epochs = training.epochs,
            "built model from config"
        );
        Ok(model)
    }

    /// Append a layer.
    ///
    /// # Errors
    ///
    /// [`NetworkError::ShapeMismatch`] if its input size differs from the
    /// output size of the current last layer.
    pub fn add_layer(&mut self, layer: Box<dyn Layer>) -> Result<()> {
        if let Some(last) = self.layers.last() {
            if last.output_size() != layer.input_size() {
                return Err(NetworkError::shape(
                    format!("layer {} input", self.layers.len()),
                    last.output_size(),
                    layer.input_size(),
                ));
            }
        }
        tracing::debug!(index = self.layers.len(), layer = %layer.name(), "added layer");
        self.layers.push(layer);
        Ok(())
    }

    /// Run `input` through every layer in order.
    ///
    /// Weights and gradients are left alone; only the forward caches change.
    pub fn predict(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        let mut activation = input.to_vec();
        for layer in self.layers.iter_mut() {
            activation = layer.forward(&activation)?;
        }
        Ok(activation)
    }

    /// One full training step on a single sample; returns its loss.
    ///
    /// Input and target are checked before anything is updated, so a
    /// failing step leaves every parameter as it was.
    pub fn train_sample(&mut self, input: &[f64], target: &[f64]) -> Result<f64> {
        self.ensure_layers()?;
        let prediction = self.predict(input)?;
        let loss = self.loss.compute(&prediction, target)?;

        let mut gradient = loss.gradient;
        for layer in self.layers.iter_mut().rev() {
            gradient = layer.backward(&gradient)?;
            self.optimizer.step(&mut **layer);
        }

        tracing::trace!(loss = loss.value, "trained sample");
        Ok(loss.value)
    }

    /// Train once on every sample, in order; returns the average loss.
    ///
    /// The whole dataset is shape-checked first, so an error never leaves
    /// the model half way through an epoch.
    pub fn train_epoch(&mut self, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<f64> {
        self.check_dataset(inputs, targets)?;

        let mut total = 0.0;
        for (input, target) in inputs.iter().zip(targets) {
            total += self.train_sample(input, target)?;
        }
        Ok(total / inputs.len() as f64)
    }

    /// Run the configured number of epochs.
    pub fn train(&mut self, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<TrainingHistory> {
        self.check_dataset(inputs, targets)?;

        let interval = self
            .report_interval
            .filter(|&n| n > 0)
            .unwrap_or_else(|| (self.epochs / 10).max(1));
        let mut history = TrainingHistory {
            epoch_losses: Vec::with_capacity(self.epochs),
        };

        for epoch in 1..=self.epochs {
            let loss = self.train_epoch(inputs, targets)?;
            if epoch % interval == 0 {
                tracing::info!("Epoch {}: average loss = {:.6}", epoch, loss);
            }
            history.epoch_losses.push(loss);
        }

        Ok(history)
    }

    /// Average loss over a dataset without updating anything.
    pub fn evaluate(&mut self, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<f64> {
        self.check_dataset(inputs, targets)?;

        let mut total = 0.0;
        for (input, target) in inputs.iter().zip(targets) {
            let prediction = self.predict(input)?;
            total += self.loss.value(&prediction, target)?;
        }
        Ok(total / inputs.len() as f64)
    }

    /// Save every layer to its own configured parameter file.
    pub fn save_params(&self) -> Result<()> {
        for layer in &self.layers {
            layer.save_params()?;
        }
        Ok(())
    }

    /// Load every layer from its own configured parameter file.
    ///
    /// All files are read and checked before any layer changes.
    pub fn download_params(&mut self) -> Result<()> {
        let paths = self
            .layers
            .iter()
            .map(|layer| {
                layer
                    .param_file()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| NetworkError::ParamFileMissing { layer: layer.name() })
            })
            .collect::<Result<Vec<_>>>()?;
        self.load_all(&paths)
    }

    /// Save layer `i` to `dir/layer_<i>.txt`, creating `dir` if needed.
    pub fn save_params_to_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| NetworkError::io(dir, e))?;
        for (i, layer) in self.layers.iter().enumerate() {
            layer.save_params_to(&layer_file(dir, i))?;
        }
        Ok(())
    }

    /// Load every layer from files written by [`Sequential::save_params_to_dir`].
    ///
    /// All files are read and checked before any layer changes.
    pub fn load_params_from_dir(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let paths: Vec<PathBuf> = (0..self.layers.len()).map(|i| layer_file(dir, i)).collect();
        self.load_all(&paths)
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&dyn Layer> {
        self.layers.get(index).map(|layer| &**layer)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Box<dyn Layer>> {
        self.layers.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    pub fn set_learning_rate(&mut self, lr: f64) {
        self.optimizer.set_learning_rate(lr);
    }

    /// Expected input length, if any layer was added.
    pub fn input_size(&self) -> Option<usize> {
        self.layers.first().map(|layer| layer.input_size())
    }

    /// Output length, if any layer was added.
    pub fn output_size(&self) -> Option<usize> {
        self.layers.last().map(|layer| layer.output_size())
    }

    fn ensure_layers(&self) -> Result<()> {
        if self.layers.is_empty() {
            Err(NetworkError::InvalidConfig("model has no layers".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_dataset(&self, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<()> {
        self.ensure_layers()?;
        if inputs.is_empty() {
            return Err(NetworkError::EmptyDataset);
        }
        if inputs.len() != targets.len() {
            return Err(NetworkError::shape(
                "dataset targets",
                inputs.len(),
                targets.len(),
            ));
        }

        let input_size = self.layers[0].input_size();
        let output_size = self.layers[self.layers.len() - 1].output_size();
        for (i, (input, target)) in inputs.iter().zip(targets).enumerate() {
            if input.len() != input_size {
                return Err(NetworkError::shape(
                    format!("sample {} input", i),
                    input_size,
                    input.len(),
                ));
            }
            if target.len() != output_size {
                return Err(NetworkError::shape(
                    format!("sample {} target", i),
                    output_size,
                    target.len(),
                ));
            }
        }
        Ok(())
    }

    fn load_all(&mut self, paths: &[PathBuf]) -> Result<()> {
        let staged = self
            .layers
            .iter()
            .zip(paths)
            .map(|(layer, path)| snapshot::load(path, &snapshot::shapes_of(&layer.param_blocks())))
            .collect::<Result<Vec<_>>>()?;

        for ((layer, blocks), path) in self.layers.iter_mut().zip(staged).zip(paths) {
            layer.set_param_blocks(blocks)?;
            tracing::debug!(layer = %layer.name(), path = %path.display(), "loaded parameters");
        }
        Ok(())
    }
}

fn layer_file(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("layer_{}.txt", index))
}
