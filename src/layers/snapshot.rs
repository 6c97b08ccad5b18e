//! Plain-text parameter files.
//!
//! One block per weight matrix:
//!
//! ```text
//! <input_size>
//! <output_size>
//! <output_size lines of input_size space-separated weights>
//! <output_size space-separated biases>
//! ```
//!
//! Dense layers write one block. The recurrent layer writes its gate block
//! followed by its projection block. Values use Rust's shortest round-trip
//! float formatting, so save/load reproduces them bit for bit.

use crate::error::{NetworkError, Result};
use crate::utils::Matrix;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Serialize blocks into any writer.
pub fn write_blocks<W: Write + ?Sized>(out: &mut W, blocks: &[(&Matrix, &[f64])]) -> std::io::Result<()> {
    for (weights, biases) in blocks {
        writeln!(out, "{}", weights.cols())?;
        writeln!(out, "{}", weights.rows())?;
        for i in 0..weights.rows() {
            writeln!(out, "{}", join(weights.row(i)))?;
        }
        writeln!(out, "{}", join(biases))?;
    }
    Ok(())
}

/// Write blocks to `path`, replacing any existing file.
pub fn save(path: &Path, blocks: &[(&Matrix, &[f64])]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| NetworkError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| NetworkError::io(path, e))?;
    let mut out = BufWriter::new(file);
    write_blocks(&mut out, blocks)
        .and_then(|()| out.flush())
        .map_err(|e| NetworkError::io(path, e))
}

/// Read blocks from `path`; `shapes` lists the expected
/// `(input_size, output_size)` of each block.
pub fn load(path: &Path, shapes: &[(usize, usize)]) -> Result<Vec<(Matrix, Vec<f64>)>> {
    let text = fs::read_to_string(path).map_err(|e| NetworkError::io(path, e))?;
    parse_blocks(&text, path, shapes)
}

/// Parse blocks from text. `origin` only labels errors.
///
/// Nothing is returned unless every block parses and matches its expected
/// shape, so callers never see a partial load.
pub fn parse_blocks(
    text: &str,
    origin: &Path,
    shapes: &[(usize, usize)],
) -> Result<Vec<(Matrix, Vec<f64>)>> {
    let mut reader = LineReader {
        lines: text.lines().enumerate(),
        origin: origin.to_path_buf(),
    };
    let mut blocks = Vec::with_capacity(shapes.len());

    for &(input_size, output_size) in shapes {
        let declared_input = reader.read_usize("input_size")?;
        reader.expect_size("input_size", input_size, declared_input)?;
        let declared_output = reader.read_usize("output_size")?;
        reader.expect_size("output_size", output_size, declared_output)?;

        let mut data = Vec::with_capacity(input_size * output_size);
        for i in 0..output_size {
            let row = reader.read_values(&format!("weight row {i}"))?;
            reader.expect_size(&format!("weight row {i}"), input_size, row.len())?;
            data.extend(row);
        }
        let biases = reader.read_values("biases")?;
        reader.expect_size("bias count", output_size, biases.len())?;

        blocks.push((Matrix::from_vec(output_size, input_size, data)?, biases));
    }

    if let Some((index, line)) = reader.lines.find(|(_, line)| !line.trim().is_empty()) {
        return Err(NetworkError::Parse {
            path: reader.origin,
            line: index + 1,
            message: format!("unexpected trailing data '{}'", line.trim()),
        });
    }

    Ok(blocks)
}

/// `(input_size, output_size)` of each block, as `load` expects them.
pub fn shapes_of(blocks: &[(&Matrix, &[f64])]) -> Vec<(usize, usize)> {
    blocks
        .iter()
        .map(|(weights, _)| (weights.cols(), weights.rows()))
        .collect()
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

struct LineReader<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    origin: PathBuf,
}

impl<'a> LineReader<'a> {
    fn next_line(&mut self, what: &str) -> Result<(usize, &'a str)> {
        match self.lines.next() {
            Some((index, line)) => Ok((index + 1, line)),
            None => Err(NetworkError::Parse {
                path: self.origin.clone(),
                line: 0,
                message: format!("unexpected end of file, expected {what}"),
            }),
        }
    }

    fn read_usize(&mut self, what: &str) -> Result<usize> {
        let (line_no, line) = self.next_line(what)?;
        line.trim().parse().map_err(|_| NetworkError::Parse {
            path: self.origin.clone(),
            line: line_no,
            message: format!("invalid {what} '{}'", line.trim()),
        })
    }

    fn read_values(&mut self, what: &str) -> Result<Vec<f64>> {
        let (line_no, line) = self.next_line(what)?;
        line.split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| NetworkError::Parse {
                    path: self.origin.clone(),
                    line: line_no,
                    message: format!("invalid number '{token}' in {what}"),
                })
            })
            .collect()
    }

    fn expect_size(&self, what: &str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(NetworkError::LoadSizeMismatch {
                path: self.origin.clone(),
                what: what.to_string(),
                expected,
                actual,
            })
        }
    }
}
