//! Row-major dense matrix used for layer weights and their gradients.

use crate::error::{check_len, NetworkError, Result};

/// `rows × cols` matrix stored as one flat row-major buffer.
///
/// For a layer, row `i` holds the incoming weights of output neuron `i`,
/// so `get(i, j)` is the contribution of input `j` to neuron `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// All-zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Fill row by row from `f(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Wrap a flat row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        check_len("matrix buffer", rows * cols, data.len())?;
        Ok(Self { rows, cols, data })
    }

    /// Build from nested rows; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * cols);
        for row in rows {
            if row.len() != cols {
                return Err(NetworkError::shape("matrix row", cols, row.len()));
            }
            data.extend(row);
        }
        Ok(Self {
            rows: n_rows,
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Copy out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows).map(|i| self.row(i).to_vec()).collect()
    }

    /// Set every element to zero, keeping the shape.
    pub fn fill_zero(&mut self) {
        self.data.iter_mut().for_each(|v| *v = 0.0);
    }

    /// `self · vector`, where `vector.len() == cols`.
    pub fn mul_vec(&self, vector: &[f64]) -> Vec<f64> {
        debug_assert_eq!(vector.len(), self.cols);
        (0..self.rows)
            .map(|i| {
                self.row(i)
                    .iter()
                    .zip(vector)
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
            })
            .collect()
    }

    /// `selfᵀ · vector`, where `vector.len() == rows`.
    pub fn transpose_mul_vec(&self, vector: &[f64]) -> Vec<f64> {
        debug_assert_eq!(vector.len(), self.rows);
        let mut out = vec![0.0; self.cols];
        for (i, &scale) in vector.iter().enumerate() {
            for (acc, w) in out.iter_mut().zip(self.row(i)) {
                *acc += scale * w;
            }
        }
        out
    }

    /// Accumulate the outer product `left ⊗ right` into `self`.
    pub fn add_outer(&mut self, left: &[f64], right: &[f64]) {
        debug_assert_eq!(left.len(), self.rows);
        debug_assert_eq!(right.len(), self.cols);
        for (i, &l) in left.iter().enumerate() {
            for (cell, r) in self.row_mut(i).iter_mut().zip(right) {
                *cell += l * r;
            }
        }
    }

    fn same_shape(&self, other: &Matrix) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    /// Check that `other` has exactly this shape.
    pub(crate) fn check_shape(&self, context: &str, other: &Matrix) -> Result<()> {
        if self.same_shape(other) {
            return Ok(());
        }
        if self.rows != other.rows {
            Err(NetworkError::shape(
                format!("{context} rows"),
                self.rows,
                other.rows,
            ))
        } else {
            Err(NetworkError::shape(
                format!("{context} columns"),
                self.cols,
                other.cols,
            ))
        }
    }
}
