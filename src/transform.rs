//! Per-record feature transform
//!
//! For a raw trajectory `R` (`k >= 2` rows, at least [`FEATURE_COLUMNS`] columns):
//!
//! ```text
//! input[i]  = R[i, 0..4] / scaler                      i in 0..k-1
//! output[i] = (R[i+1, 0..4] - R[i, 0..4]) / scaler     i in 0..k-1
//! ```
//!
//! Row `i` of both tables describes the same transition, so the two tables
//! always have `k - 1` rows. Extra raw columns (the generator's step
//! count) are dropped.

use crate::storage::Table;
use crate::{Error, Result};

/// Leading raw columns kept: `x y vx vy`
pub const FEATURE_COLUMNS: usize = 4;

/// Derived `(input, output)` tables of one record
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedPair {
    /// Scaled states
    pub input: Table,
    /// Scaled state deltas
    pub output: Table,
}

fn check_shape(raw: &Table) -> Result<()> {
    if raw.num_columns() < FEATURE_COLUMNS {
        return Err(Error::Shape(format!(
            "raw table has {} columns, need at least {FEATURE_COLUMNS}",
            raw.num_columns()
        )));
    }
    if raw.num_rows() < 2 {
        return Err(Error::Shape(format!(
            "raw table has {} rows, need at least 2 to form a transition",
            raw.num_rows()
        )));
    }
    Ok(())
}

/// All rows but the last, first four columns, divided by `scaler`
///
/// # Errors
/// Returns [`Error::Shape`] for fewer than 2 rows or 4 columns
pub fn process_input(raw: &Table, scaler: f64) -> Result<Table> {
    check_shape(raw)?;
    let mut input = raw.window(0, raw.num_rows() - 1, FEATURE_COLUMNS)?;
    input.map_in_place(|v| v / scaler);
    Ok(input)
}

/// Consecutive-row differences of the first four columns, divided by `scaler`
///
/// # Errors
/// Returns [`Error::Shape`] for fewer than 2 rows or 4 columns
pub fn process_output(raw: &Table, scaler: f64) -> Result<Table> {
    check_shape(raw)?;
    let transitions = raw.num_rows() - 1;
    let mut values = Vec::with_capacity(transitions * FEATURE_COLUMNS);
    for i in 0..transitions {
        let current = &raw.row(i)[..FEATURE_COLUMNS];
        let next = &raw.row(i + 1)[..FEATURE_COLUMNS];
        values.extend(next.iter().zip(current).map(|(n, c)| (n - c) / scaler));
    }
    Table::new(values, transitions, FEATURE_COLUMNS)
}

/// Both derived tables of one raw record
///
/// # Errors
/// Returns [`Error::Shape`] for fewer than 2 rows or 4 columns
pub fn derive_pair(raw: &Table, scaler: f64) -> Result<DerivedPair> {
    Ok(DerivedPair {
        input: process_input(raw, scaler)?,
        output: process_output(raw, scaler)?,
    })
}
