//! LSTM-style recurrent layer over a fixed-length sequence.
//!
//! The layer sees its whole sequence as one flattened input vector of
//! `sequence_length × features` values and runs the classic gated cell over
//! it, step by step:
//!
//! ```text
//! v_t = [x_t, h_{t-1}]
//! f_t = σ(W_f v_t + b_f)      forget gate
//! i_t = σ(W_i v_t + b_i)      input gate
//! g_t = tanh(W_g v_t + b_g)   candidate
//! o_t = σ(W_o v_t + b_o)      output gate
//! c_t = f_t ⊙ c_{t-1} + i_t ⊙ g_t
//! h_t = o_t ⊙ tanh(c_t)
//! y_t = P h_t + p             linear projection
//! ```
//!
//! `h_0` and `c_0` are zero for every forward call. Backward runs
//! backpropagation through time over exactly this window and sums the
//! gradients of all steps before returning.

use crate::error::{check_len, NetworkError, Result};
use crate::layers::{Layer, Parameter};
use crate::utils::activations::{sigmoid, sigmoid_derivative, tanh, tanh_derivative};
use crate::utils::{Matrix, SimpleRng};
use std::path::{Path, PathBuf};

/// Which projected steps make up the layer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// `y_1 … y_T` concatenated (`sequence_length × step_output` values).
    #[default]
    EverySequenceStep,
    /// Only `y_T` (`step_output` values).
    LastStep,
}

/// Gate activations and states of one time step.
#[derive(Debug, Clone)]
struct StepCache {
    concat: Vec<f64>,
    forget: Vec<f64>,
    input: Vec<f64>,
    candidate: Vec<f64>,
    output: Vec<f64>,
    cell_prev: Vec<f64>,
    cell: Vec<f64>,
    cell_tanh: Vec<f64>,
    hidden: Vec<f64>,
}

/// Recurrent layer with forget/input/candidate/output gates.
///
/// The four gate matrices are packed into one `4·hidden × (features + hidden)`
/// matrix in the order forget, input, candidate, output; that matrix and
/// its biases are what [`Layer::weights`] and [`Layer::biases`] expose. The
/// per-step projection is reachable through [`RecurrentLayer::projection_weights`].
#[derive(Debug, Clone)]
pub struct RecurrentLayer {
    features: usize,
    hidden_size: usize,
    step_output: usize,
    sequence_length: usize,
    mode: OutputMode,
    gate_weights: Matrix,
    gate_biases: Vec<f64>,
    projection_weights: Matrix,
    projection_biases: Vec<f64>,
    gate_weight_grads: Matrix,
    gate_bias_grads: Vec<f64>,
    projection_weight_grads: Matrix,
    projection_bias_grads: Vec<f64>,
    cache: Option<Vec<StepCache>>,
    param_file: Option<PathBuf>,
}

impl RecurrentLayer {
    /// Create a recurrent layer.
    ///
    /// Gate weights are uniform in `±sqrt(1 / hidden_size)`, the forget
    /// gate bias starts at 1.0 and the other gate biases at 0. The
    /// projection uses Xavier uniform weights and zero biases.
    ///
    /// # Arguments
    ///
    /// * `features` - values per sequence step
    /// * `hidden_size` - width of the hidden and cell state
    /// * `step_output` - projected values per step
    /// * `sequence_length` - fixed number of steps per input
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidConfig`] if any dimension is zero.
    pub fn new(
        features: usize,
        hidden_size: usize,
        step_output: usize,
        sequence_length: usize,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        for (field, value) in [
            ("features", features),
            ("hidden_size", hidden_size),
            ("step_output", step_output),
            ("sequence_length", sequence_length),
        ] {
            if value == 0 {
                return Err(NetworkError::InvalidConfig(format!(
                    "Recurrent layer: {} must be greater than 0",
                    field
                )));
            }
        }

        let gate_limit = (1.0 / hidden_size as f64).sqrt();
        let gate_rows = 4 * hidden_size;
        let gate_cols = features + hidden_size;
        let gate_weights = Matrix::from_fn(gate_rows, gate_cols, |_, _| {
            rng.gen_range(-gate_limit, gate_limit)
        });
        let mut gate_biases = vec![0.0; gate_rows];
        gate_biases[..hidden_size].fill(1.0);

        let projection_limit = (6.0 / (hidden_size + step_output) as f64).sqrt();
        let projection_weights = Matrix::from_fn(step_output, hidden_size, |_, _| {
            rng.gen_range(-projection_limit, projection_limit)
        });

        Ok(Self {
            features,
            hidden_size,
            step_output,
            sequence_length,
            mode: OutputMode::default(),
            gate_weights,
            gate_biases,
            projection_weights,
            projection_biases: vec![0.0; step_output],
            gate_weight_grads: Matrix::zeros(gate_rows, gate_cols),
            gate_bias_grads: vec![0.0; gate_rows],
            projection_weight_grads: Matrix::zeros(step_output, hidden_size),
            projection_bias_grads: vec![0.0; step_output],
            cache: None,
            param_file: None,
        })
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Attach the file used by `save_params`/`download_params`.
    pub fn with_param_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.param_file = Some(path.into());
        self
    }

    pub fn features(&self) -> usize {
        self.features
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn step_output_size(&self) -> usize {
        self.step_output
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn output_mode(&self) -> OutputMode {
        self.mode
    }

    pub fn projection_weights(&self) -> &Matrix {
        &self.projection_weights
    }

    pub fn projection_biases(&self) -> &[f64] {
        &self.projection_biases
    }

    pub fn projection_weight_grads(&self) -> &Matrix {
        &self.projection_weight_grads
    }

    pub fn projection_bias_grads(&self) -> &[f64] {
        &self.projection_bias_grads
    }

    /// Replace the projection; shapes must match the current ones.
    pub fn set_projection(&mut self, weights: Matrix, biases: Vec<f64>) -> Result<()> {
        self.projection_weights
            .check_shape("projection weights", &weights)?;
        check_len("projection biases", self.step_output, biases.len())?;
        self.projection_weights = weights;
        self.projection_biases = biases;
        Ok(())
    }

    /// Whether a forward pass is cached and waiting for its backward call.
    pub fn has_forward_cache(&self) -> bool {
        self.cache.is_some()
    }

    fn emits_output(&self, step: usize) -> bool {
        match self.mode {
            OutputMode::EverySequenceStep => true,
            OutputMode::LastStep => step + 1 == self.sequence_length,
        }
    }

    /// Slice of `output_gradient` belonging to `step`, if that step emitted output.
    fn step_gradient<'g>(&self, output_gradient: &'g [f64], step: usize) -> Option<&'g [f64]> {
        match self.mode {
            OutputMode::EverySequenceStep => {
                Some(&output_gradient[step * self.step_output..(step + 1) * self.step_output])
            }
            OutputMode::LastStep if step + 1 == self.sequence_length => Some(output_gradient),
            OutputMode::LastStep => None,
        }
    }

    fn step_forward(&self, x: &[f64], hidden: &[f64], cell: &[f64]) -> StepCache {
        let h = self.hidden_size;
        let mut concat = Vec::with_capacity(self.features + h);
        concat.extend_from_slice(x);
        concat.extend_from_slice(hidden);

        let mut pre = self.gate_weights.mul_vec(&concat);
        for (a, b) in pre.iter_mut().zip(&self.gate_biases) {
            *a += b;
        }

        let forget: Vec<f64> = pre[..h].iter().map(|&a| sigmoid(a)).collect();
        let input: Vec<f64> = pre[h..2 * h].iter().map(|&a| sigmoid(a)).collect();
        let candidate: Vec<f64> = pre[2 * h..3 * h].iter().map(|&a| tanh(a)).collect();
        let output: Vec<f64> = pre[3 * h..].iter().map(|&a| sigmoid(a)).collect();

        let cell_new: Vec<f64> = (0..h)
            .map(|k| forget[k] * cell[k] + input[k] * candidate[k])
            .collect();
        let cell_tanh: Vec<f64> = cell_new.iter().map(|&c| tanh(c)).collect();
        let hidden_new: Vec<f64> = (0..h).map(|k| output[k] * cell_tanh[k]).collect();

        StepCache {
            concat,
            forget,
            input,
            candidate,
            output,
            cell_prev: cell.to_vec(),
            cell: cell_new,
            cell_tanh,
            hidden: hidden_new,
        }
    }

    fn zero_grads(&mut self) {
        self.gate_weight_grads.fill_zero();
        self.gate_bias_grads.fill(0.0);
        self.projection_weight_grads.fill_zero();
        self.projection_bias_grads.fill(0.0);
    }
}

impl Layer for RecurrentLayer {
    fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_size() {
            return Err(NetworkError::shape(
                format!("{} input", self.name()),
                self.input_size(),
                input.len(),
            ));
        }

        let mut hidden = vec![0.0; self.hidden_size];
        let mut cell = vec![0.0; self.hidden_size];
        let mut steps = Vec::with_capacity(self.sequence_length);
        let mut outputs = Vec::with_capacity(self.output_size());

        for t in 0..self.sequence_length {
            let x = &input[t * self.features..(t + 1) * self.features];
            let step = self.step_forward(x, &hidden, &cell);

            if self.emits_output(t) {
                let mut y = self.projection_weights.mul_vec(&step.hidden);
                for (yi, b) in y.iter_mut().zip(&self.projection_biases) {
                    *yi += b;
                }
                outputs.extend(y);
            }

            cell.clone_from(&step.cell);
            hidden.clone_from(&step.hidden);
            steps.push(step);
        }

        self.cache = Some(steps);
        Ok(outputs)
    }

    fn backward(&mut self, output_gradient: &[f64]) -> Result<Vec<f64>> {
        if output_gradient.len() != self.output_size() {
            return Err(NetworkError::shape(
                format!("{} output gradient", self.name()),
                self.output_size(),
                output_gradient.len(),
            ));
        }
        let steps = self
            .cache
            .take()
            .ok_or_else(|| NetworkError::BackwardBeforeForward { layer: self.name() })?;

        self.zero_grads();
        let h = self.hidden_size;
        let f = self.features;
        let mut input_gradient = vec![0.0; self.input_size()];
        let mut dh_next = vec![0.0; h];
        let mut dc_next = vec![0.0; h];
        let mut d_pre = vec![0.0; 4 * h];

        for (t, step) in steps.iter().enumerate().rev() {
            let mut dh = dh_next.clone();
            if let Some(dy) = self.step_gradient(output_gradient, t) {
                self.projection_weight_grads.add_outer(dy, &step.hidden);
                for (g, d) in self.projection_bias_grads.iter_mut().zip(dy) {
                    *g += d;
                }
                for (acc, d) in dh.iter_mut().zip(self.projection_weights.transpose_mul_vec(dy)) {
                    *acc += d;
                }
            }

            for k in 0..h {
                let dc = dh[k] * step.output[k] * tanh_derivative(step.cell_tanh[k]) + dc_next[k];
                d_pre[k] = dc * step.cell_prev[k] * sigmoid_derivative(step.forget[k]);
                d_pre[h + k] = dc * step.candidate[k] * sigmoid_derivative(step.input[k]);
                d_pre[2 * h + k] = dc * step.input[k] * tanh_derivative(step.candidate[k]);
                d_pre[3 * h + k] = dh[k] * step.cell_tanh[k] * sigmoid_derivative(step.output[k]);
                dc_next[k] = dc * step.forget[k];
            }

            self.gate_weight_grads.add_outer(&d_pre, &step.concat);
            for (g, d) in self.gate_bias_grads.iter_mut().zip(&d_pre) {
                *g += d;
            }

            let d_concat = self.gate_weights.transpose_mul_vec(&d_pre);
            input_gradient[t * f..(t + 1) * f].copy_from_slice(&d_concat[..f]);
            dh_next.copy_from_slice(&d_concat[f..]);
        }

        Ok(input_gradient)
    }

    fn weights(&self) -> &Matrix {
        &self.gate_weights
    }

    fn set_weights(&mut self, weights: Matrix) -> Result<()> {
        self.gate_weights.check_shape("gate weights", &weights)?;
        self.gate_weights = weights;
        Ok(())
    }

    fn biases(&self) -> &[f64] {
        &self.gate_biases
    }

    fn set_biases(&mut self, biases: Vec<f64>) -> Result<()> {
        check_len("gate biases", 4 * self.hidden_size, biases.len())?;
        self.gate_biases = biases;
        Ok(())
    }

    fn weight_grads(&self) -> &Matrix {
        &self.gate_weight_grads
    }

    fn bias_grads(&self) -> &[f64] {
        &self.gate_bias_grads
    }

    fn input_size(&self) -> usize {
        self.sequence_length * self.features
    }

    fn output_size(&self) -> usize {
        match self.mode {
            OutputMode::EverySequenceStep => self.sequence_length * self.step_output,
            OutputMode::LastStep => self.step_output,
        }
    }

    fn parameter_count(&self) -> usize {
        self.gate_weights.len()
            + self.gate_biases.len()
            + self.projection_weights.len()
            + self.projection_biases.len()
    }

    fn name(&self) -> String {
        format!(
            "Recurrent({}x{} -> {}, hidden {})",
            self.sequence_length, self.features, self.step_output, self.hidden_size
        )
    }

    fn parameters(&mut self) -> Vec<Parameter<'_>> {
        vec![
            Parameter {
                name: "gate_weights",
                values: self.gate_weights.as_mut_slice(),
                grads: self.gate_weight_grads.as_slice(),
            },
            Parameter {
                name: "gate_biases",
                values: &mut self.gate_biases,
                grads: &self.gate_bias_grads,
            },
            Parameter {
                name: "projection_weights",
                values: self.projection_weights.as_mut_slice(),
                grads: self.projection_weight_grads.as_slice(),
            },
            Parameter {
                name: "projection_biases",
                values: &mut self.projection_biases,
                grads: &self.projection_bias_grads,
            },
        ]
    }

    fn param_blocks(&self) -> Vec<(&Matrix, &[f64])> {
        vec![
            (&self.gate_weights, &self.gate_biases),
            (&self.projection_weights, &self.projection_biases),
        ]
    }

    fn set_param_blocks(&mut self, blocks: Vec<(Matrix, Vec<f64>)>) -> Result<()> {
        let [(gate_w, gate_b), (proj_w, proj_b)]: [(Matrix, Vec<f64>); 2] = blocks
            .try_into()
            .map_err(|b: Vec<_>| NetworkError::shape("recurrent parameter blocks", 2, b.len()))?;
        self.gate_weights.check_shape("gate weights", &gate_w)?;
        check_len("gate biases", 4 * self.hidden_size, gate_b.len())?;
        self.projection_weights
            .check_shape("projection weights", &proj_w)?;
        check_len("projection biases", self.step_output, proj_b.len())?;

        self.gate_weights = gate_w;
        self.gate_biases = gate_b;
        self.projection_weights = proj_w;
        self.projection_biases = proj_b;
        Ok(())
    }

    fn param_file(&self) -> Option<&Path> {
        self.param_file.as_deref()
    }
}
