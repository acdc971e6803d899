//! Stage A: raw trajectories to derived input/output tables

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use super::worker_pool;
use crate::config::{PipelineConfig, Split, TableKind};
use crate::layout::DataLayout;
use crate::storage::{load_table, save_table};
use crate::transform::derive_pair;
use crate::Result;

/// Outcome of a completed Stage A run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSummary {
    /// Records processed per split
    pub records: usize,
    /// Splits processed
    pub splits: Vec<Split>,
    /// Derived rows written, summed over all splits and records
    pub derived_rows: usize,
    /// Wall-clock time
    pub elapsed: Duration,
}

/// Load `<split>/<id>.txt`, derive both tables, and overwrite
/// `<split>/input_<id>.txt` and `<split>/output_<id>.txt`
///
/// Returns the number of derived rows per table.
///
/// # Errors
/// Returns [`Error::DataAccess`](crate::Error::DataAccess) if the raw file is
/// missing or malformed and [`Error::Shape`](crate::Error::Shape) if it is
/// too small to transform
pub fn produce_derived_tables(
    layout: &DataLayout,
    split: Split,
    id: usize,
    scaler: f64,
) -> Result<usize> {
    let raw = load_table(layout.raw_path(split, id))?;
    let pair = derive_pair(&raw, scaler)?;
    save_table(&pair.input, layout.derived_path(split, TableKind::Input, id))?;
    save_table(&pair.output, layout.derived_path(split, TableKind::Output, id))?;
    debug!(%split, id, rows = pair.input.num_rows(), "derived record");
    Ok(pair.input.num_rows())
}

/// Run Stage A over every id in `0..num_orbit` for every configured split
///
/// Each id is one pool task that handles all splits in order. The first
/// failure aborts the remaining work; files already written stay on disk
/// and are simply overwritten by a rerun.
///
/// # Errors
/// Returns the first task error, or [`Error::ThreadPool`](crate::Error::ThreadPool)
pub fn run_transform_stage(config: &PipelineConfig) -> Result<TransformSummary> {
    let start = Instant::now();
    let layout = DataLayout::new(config.data_root());
    let pool = worker_pool("transform", config.num_threads())?;

    info!(
        records = config.num_orbit(),
        splits = ?config.splits(),
        workers = config.num_threads(),
        root = %layout.root().display(),
        "Stage A: deriving input/output tables"
    );

    let derived_rows = pool.install(|| {
        (0..config.num_orbit())
            .into_par_iter()
            .map(|id| {
                config.splits().iter().try_fold(0usize, |rows, &split| -> Result<usize> {
                    Ok(rows + produce_derived_tables(&layout, split, id, config.scaler())?)
                })
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))
    })?;

    let summary = TransformSummary {
        records: config.num_orbit(),
        splits: config.splits().to_vec(),
        derived_rows,
        elapsed: start.elapsed(),
    };
    info!(
        derived_rows,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "Stage A complete"
    );
    Ok(summary)
}
