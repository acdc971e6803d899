//! Stage B: stack per-record derived tables into one file per `(split, kind)`

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{error, info};

use super::worker_pool;
use crate::config::{PipelineConfig, Split, TableKind};
use crate::layout::DataLayout;
use crate::storage::{load_table, save_table, write_parquet, Table};
use crate::{Error, Result};

/// Records loaded concurrently before being appended in id order
pub const LOAD_CHUNK: usize = 1024;

/// Outcome of a completed Stage B run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatSummary {
    /// `(split, kind, rows)` per written file, in split-then-kind order
    pub tables: Vec<(Split, TableKind, usize)>,
    /// Wall-clock time
    pub elapsed: Duration,
}

/// Stack `<split>/<kind>_<id>.txt` for ids `0..num_orbit` and write
/// `<kind>_<split>_concatenated.txt` (plus a Parquet copy if requested)
///
/// Files are read in parallel, [`LOAD_CHUNK`] at a time, and stacked
/// strictly in ascending id order: record 0's rows first, then record 1's,
/// and so on. Each chunk is released once appended.
///
/// # Errors
/// Returns the load error of the lowest failing id, [`Error::Shape`] naming
/// the first record whose column count disagrees, or any write error
pub fn concatenate_split(
    layout: &DataLayout,
    split: Split,
    kind: TableKind,
    num_orbit: usize,
    parquet: bool,
) -> Result<usize> {
    let mut stacked = Table::default();
    for start in (0..num_orbit).step_by(LOAD_CHUNK) {
        let end = (start + LOAD_CHUNK).min(num_orbit);
        let chunk: Vec<Result<Table>> = (start..end)
            .into_par_iter()
            .map(|id| load_table(layout.derived_path(split, kind, id)))
            .collect();
        for (id, table) in (start..end).zip(chunk) {
            stacked.append(&table?).map_err(|e| match e {
                Error::Shape(reason) => Error::Shape(format!("record {id}: {reason}")),
                other => other,
            })?;
        }
    }

    save_table(&stacked, layout.concatenated_path(kind, split))?;
    if parquet {
        write_parquet(&stacked, layout.parquet_path(kind, split))?;
    }

    info!(%split, %kind, rows = stacked.num_rows(), "concatenated");
    Ok(stacked.num_rows())
}

/// Run Stage B for every configured split and kind
///
/// Combinations run concurrently and independently. A failing combination
/// does not stop the others; all failures are returned together as
/// [`Error::Concatenation`].
///
/// # Errors
/// Returns [`Error::Concatenation`] listing each failed combination, or
/// [`Error::ThreadPool`]
pub fn run_concat_stage(config: &PipelineConfig) -> Result<ConcatSummary> {
    let start = Instant::now();
    let layout = DataLayout::new(config.data_root());
    let pool = worker_pool("concat", config.num_threads())?;

    let combinations: Vec<(Split, TableKind)> = config
        .splits()
        .iter()
        .flat_map(|&split| config.kinds().iter().map(move |&kind| (split, kind)))
        .collect();

    info!(
        combinations = combinations.len(),
        records = config.num_orbit(),
        workers = config.num_threads(),
        root = %layout.root().display(),
        "Stage B: concatenating derived tables"
    );

    let results: Vec<_> = pool.install(|| {
        combinations
            .par_iter()
            .map(|&(split, kind)| {
                let rows = concatenate_split(
                    &layout,
                    split,
                    kind,
                    config.num_orbit(),
                    config.write_parquet(),
                );
                (split, kind, rows)
            })
            .collect()
    });

    let mut tables = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (split, kind, result) in results {
        match result {
            Ok(rows) => tables.push((split, kind, rows)),
            Err(e) => {
                error!(%split, %kind, error = %e, "concatenation failed");
                failures.push((format!("{kind}_{split}"), e));
            }
        }
    }
    if !failures.is_empty() {
        return Err(Error::Concatenation { failures });
    }

    let summary = ConcatSummary {
        tables,
        elapsed: start.elapsed(),
    };
    info!(
        files = summary.tables.len(),
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "Stage B complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_derived(layout: &DataLayout, split: Split, kind: TableKind, id: usize, rows: usize) {
        std::fs::create_dir_all(layout.split_dir(split)).unwrap();
        #[allow(clippy::cast_precision_loss)]
        let table = Table::from_rows(
            &(0..rows)
                .map(|r| [id as f64, r as f64, 0.5, -0.5])
                .collect::<Vec<_>>(),
        )
        .unwrap();
        save_table(&table, layout.derived_path(split, kind, id)).unwrap();
    }

    #[test]
    fn test_concatenate_split_keeps_id_order() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_derived(&layout, Split::Train, TableKind::Input, 0, 2);
        write_derived(&layout, Split::Train, TableKind::Input, 1, 3);

        let rows = concatenate_split(&layout, Split::Train, TableKind::Input, 2, false).unwrap();
        assert_eq!(rows, 5);

        let stacked = load_table(layout.concatenated_path(TableKind::Input, Split::Train)).unwrap();
        let ids: Vec<f64> = stacked.rows().map(|row| row[0]).collect();
        let steps: Vec<f64> = stacked.rows().map(|row| row[1]).collect();
        assert_eq!(ids, vec![0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(steps, vec![0.0, 1.0, 0.0, 1.0, 2.0]);
        assert!(!layout.parquet_path(TableKind::Input, Split::Train).exists());
    }

    #[test]
    fn test_concatenate_split_writes_parquet_copy() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_derived(&layout, Split::Test, TableKind::Output, 0, 4);

        concatenate_split(&layout, Split::Test, TableKind::Output, 1, true).unwrap();

        let parquet_path = layout.parquet_path(TableKind::Output, Split::Test);
        let parquet = crate::storage::read_parquet(parquet_path).unwrap();
        let text = load_table(layout.concatenated_path(TableKind::Output, Split::Test)).unwrap();
        assert_eq!(parquet, text);
    }

    #[test]
    fn test_concatenate_split_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_derived(&layout, Split::Train, TableKind::Output, 0, 2);

        let err =
            concatenate_split(&layout, Split::Train, TableKind::Output, 2, false).unwrap_err();
        assert!(matches!(err, Error::DataAccess { .. }));
        assert!(!layout.concatenated_path(TableKind::Output, Split::Train).exists());
    }

    #[test]
    fn test_concatenate_split_reports_lowest_missing_id() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        for id in [0, 2, 4] {
            write_derived(&layout, Split::Test, TableKind::Output, id, 1);
        }

        for _ in 0..10 {
            let err = concatenate_split(&layout, Split::Test, TableKind::Output, 5, false)
                .unwrap_err();
            assert!(err.to_string().contains("output_1.txt"), "{err}");
        }
    }

    #[test]
    fn test_concatenate_split_crosses_chunk_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let num_orbit = LOAD_CHUNK + 2;
        for id in 0..num_orbit {
            write_derived(&layout, Split::Validation, TableKind::Input, id, 1);
        }

        let rows =
            concatenate_split(&layout, Split::Validation, TableKind::Input, num_orbit, false)
                .unwrap();
        assert_eq!(rows, num_orbit);

        let stacked =
            load_table(layout.concatenated_path(TableKind::Input, Split::Validation)).unwrap();
        #[allow(clippy::cast_precision_loss)]
        let expected: Vec<f64> = (0..num_orbit).map(|id| id as f64).collect();
        let ids: Vec<f64> = stacked.rows().map(|row| row[0]).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_concatenate_split_column_mismatch_names_record() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_derived(&layout, Split::Train, TableKind::Input, 0, 2);
        save_table(
            &Table::from_rows(&[[1.0, 2.0, 3.0]]).unwrap(),
            layout.derived_path(Split::Train, TableKind::Input, 1),
        )
        .unwrap();

        let err = concatenate_split(&layout, Split::Train, TableKind::Input, 2, false).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, Error::Shape(_)));
        assert!(message.contains("record 1: column mismatch"), "{message}");
        assert_eq!(message.matches("Shape error").count(), 1);
    }

    #[test]
    fn test_stage_restricted_to_configured_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let config = PipelineConfig::builder()
            .data_root(dir.path())
            .num_orbit(1)
            .num_threads(1)
            .splits(vec![Split::Train])
            .kinds(vec![TableKind::Output])
            .build()
            .unwrap();
        write_derived(&layout, Split::Train, TableKind::Output, 0, 3);

        let summary = run_concat_stage(&config).unwrap();
        assert_eq!(summary.tables, vec![(Split::Train, TableKind::Output, 3)]);
        assert!(!layout.concatenated_path(TableKind::Input, Split::Train).exists());
    }

    #[test]
    fn test_stage_collects_every_failure() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let config = PipelineConfig::builder()
            .data_root(dir.path())
            .num_orbit(1)
            .num_threads(2)
            .splits(vec![Split::Train, Split::Validation])
            .build()
            .unwrap();
        // Only train/input exists; the other three combinations fail
        write_derived(&layout, Split::Train, TableKind::Input, 0, 2);

        let err = run_concat_stage(&config).unwrap_err();
        match &err {
            Error::Concatenation { failures } => {
                let mut names: Vec<_> = failures.iter().map(|(name, _)| name.as_str()).collect();
                names.sort_unstable();
                assert_eq!(names, vec!["input_validation", "output_train", "output_validation"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("3 concatenation job(s) failed"));
        assert!(layout.concatenated_path(TableKind::Input, Split::Train).exists());
    }
}
