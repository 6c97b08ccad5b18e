//! Configuration structures for training
//!
//! This module provides the training hyperparameters that can be supplied
//! as a JSON file instead of being hard-coded in a demo.

use crate::error::{NetworkError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Loss functions accepted in a training configuration.
pub const SUPPORTED_LOSSES: &[&str] = &["mse"];

/// Optimizers accepted in a training configuration.
pub const SUPPORTED_OPTIMIZERS: &[&str] = &["sgd"];

/// Configuration for training.
///
/// Only `learning_rate` and `epochs` are required. Optional fields fall
/// back to the defaults of [`crate::model::Sequential`].
///
/// # Example
///
/// ```json
/// {
///   "learning_rate": 0.5,
///   "epochs": 1000,
///   "report_interval": 100,
///   "seed": 42,
///   "loss": "mse",
///   "optimizer": "sgd"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrainingConfig {
    /// Step size for gradient descent (must be positive)
    pub learning_rate: f64,

    /// Number of passes over the dataset
    pub epochs: usize,

    /// Log the average loss every `report_interval` epochs
    pub report_interval: Option<usize>,

    /// Seed for weight initialization
    pub seed: Option<u64>,

    /// Loss function name: "mse"
    pub loss: Option<String>,

    /// Optimizer name: "sgd"
    pub optimizer: Option<String>,
}

impl TrainingConfig {
    /// Build a configuration in code; the optional fields stay unset.
    pub fn new(learning_rate: f64, epochs: usize) -> Self {
        Self {
            learning_rate,
            epochs,
            report_interval: None,
            seed: None,
            loss: None,
            optimizer: None,
        }
    }

    /// Check value ranges and names.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidConfig`] describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(NetworkError::InvalidConfig(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }

        if self.epochs == 0 {
            return Err(NetworkError::InvalidConfig(
                "epochs must be greater than 0".to_string(),
            ));
        }

        if self.report_interval == Some(0) {
            return Err(NetworkError::InvalidConfig(
                "report_interval must be greater than 0".to_string(),
            ));
        }

        if let Some(ref loss) = self.loss {
            check_name("loss", loss, SUPPORTED_LOSSES)?;
        }
        if let Some(ref optimizer) = self.optimizer {
            check_name("optimizer", optimizer, SUPPORTED_OPTIMIZERS)?;
        }

        Ok(())
    }
}

fn check_name(field: &str, value: &str, valid: &[&str]) -> Result<()> {
    if valid.contains(&value.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(NetworkError::InvalidConfig(format!(
            "Invalid {} '{}'. Must be one of: {}",
            field,
            value,
            valid.join(", ")
        )))
    }
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it into a `TrainingConfig` and
/// validates it.
///
/// # Examples
///
/// ```no_run
/// use sequential_nn::config::load_config;
///
/// let cfg = load_config("config/xor_training.json").unwrap();
/// assert!(cfg.learning_rate > 0.0);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TrainingConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| NetworkError::io(path, e))?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}
