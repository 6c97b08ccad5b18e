//! Mean squared error.

use crate::error::{NetworkError, Result};
use crate::loss::{Loss, LossOutput};

/// Mean squared error: `(1/N) Σ (p_k - t_k)²`, gradient `2 (p_k - t_k) / N`.
///
/// # Example
///
/// ```
/// use sequential_nn::loss::{Loss, MSE};
///
/// let out = MSE.compute(&[0.0, 1.0], &[0.0, 0.0]).unwrap();
/// assert_eq!(out.value, 0.5);
/// assert_eq!(out.gradient, vec![0.0, 1.0]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MSE;

impl MSE {
    pub fn new() -> Self {
        MSE
    }
}

impl Loss for MSE {
    fn compute(&self, prediction: &[f64], target: &[f64]) -> Result<LossOutput> {
        if prediction.len() != target.len() {
            return Err(NetworkError::shape(
                "loss target",
                prediction.len(),
                target.len(),
            ));
        }
        if prediction.is_empty() {
            return Ok(LossOutput {
                value: 0.0,
                gradient: Vec::new(),
            });
        }

        let n = prediction.len() as f64;
        let mut value = 0.0;
        let gradient = prediction
            .iter()
            .zip(target)
            .map(|(p, t)| {
                let error = p - t;
                value += error * error;
                2.0 * error / n
            })
            .collect();

        Ok(LossOutput {
            value: value / n,
            gradient,
        })
    }

    fn name(&self) -> &'static str {
        "mse"
    }
}
