//! Table storage
//!
//! Every file the pipeline touches is a flat numeric table:
//! - Raw trajectories (`<split>/<id>.txt`), read-only inputs
//! - Derived tables (`<split>/{input,output}_<id>.txt`), written by Stage A
//! - Concatenated tables (`{input,output}_<split>_concatenated.txt`), written by Stage B
//!
//! [`Table`] is a dense row-major `f64` matrix. Row identity is positional
//! only; stacking never reorders or deduplicates rows.

mod columnar;
mod text;

pub use columnar::{read_parquet, write_parquet};
pub use text::{format_value, load_table, parse_table, save_table, write_table};

use crate::{Error, Result};

/// Dense row-major numeric table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    values: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Table {
    /// Create a table from row-major values
    ///
    /// # Errors
    /// Returns [`Error::Shape`] if `values.len() != rows * cols`
    pub fn new(values: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if values.len() != rows * cols {
            return Err(Error::Shape(format!(
                "{} values cannot form a {rows}x{cols} table",
                values.len()
            )));
        }
        Ok(Self { values, rows, cols })
    }

    /// Create a table from rows of equal length
    ///
    /// # Errors
    /// Returns [`Error::Shape`] if rows differ in length
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut values = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(Error::Shape(format!(
                    "row {i} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            values,
            rows: rows.len(),
            cols,
        })
    }

    /// Number of rows
    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[must_use]
    pub const fn num_columns(&self) -> usize {
        self.cols
    }

    /// True if the table has no rows
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Row `i`
    ///
    /// # Panics
    /// Panics if `i >= num_rows()`
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterate over rows in order
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        // chunks_exact(0) panics; a zero-column table has no addressable rows
        let chunk = self.cols.max(1);
        let take = if self.cols == 0 { 0 } else { self.rows };
        self.values.chunks_exact(chunk).take(take)
    }

    /// Copy rows `start..end` restricted to the first `cols` columns
    ///
    /// # Errors
    /// Returns [`Error::Shape`] if the window exceeds the table
    pub fn window(&self, start: usize, end: usize, cols: usize) -> Result<Self> {
        if start > end || end > self.rows || cols > self.cols {
            return Err(Error::Shape(format!(
                "window rows {start}..{end} cols 0..{cols} exceeds {}x{} table",
                self.rows, self.cols
            )));
        }
        let mut values = Vec::with_capacity((end - start) * cols);
        for i in start..end {
            values.extend_from_slice(&self.row(i)[..cols]);
        }
        Ok(Self {
            values,
            rows: end - start,
            cols,
        })
    }

    /// Append all rows of `other` (row-wise stacking)
    ///
    /// An empty table adopts the column count of the first non-empty table
    /// appended to it.
    ///
    /// # Errors
    /// Returns [`Error::Shape`] if column counts differ
    pub fn append(&mut self, other: &Self) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            self.cols = other.cols;
        } else if self.cols != other.cols {
            return Err(Error::Shape(format!(
                "column mismatch: expected {}, got {}",
                self.cols, other.cols
            )));
        }
        self.values.extend_from_slice(&other.values);
        self.rows += other.rows;
        Ok(())
    }

    /// Apply `f` to every value in place
    pub fn map_in_place(&mut self, f: impl Fn(f64) -> f64) {
        for v in &mut self.values {
            *v = f(*v);
        }
    }
}
