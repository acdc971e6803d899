//! # orbit-prep: Orbit Trajectory Feature Pipeline
//!
//! **Version**: 0.1.0
//!
//! orbit-prep turns large collections of simulated two-body trajectories
//! into normalized input/output training tables.
//!
//! ## Stages
//!
//! - **Stage 0** ([`simulate`]): integrate seeded orbits into raw records
//!   `<root>/<split>/<id>.txt`
//! - **Stage A** ([`pipeline::run_transform_stage`]): per record, derive
//!   `input_<id>.txt` (scaled states) and `output_<id>.txt` (scaled deltas)
//! - **Stage B** ([`pipeline::run_concat_stage`]): per split and kind, stack
//!   all derived tables in id order into `<kind>_<split>_concatenated.txt`
//!
//! Stages run as separate invocations; each is a fan-out over independent
//! tasks on a fixed-size `rayon` pool. Reruns overwrite every output, so a
//! failed run is fixed by running it again.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use orbit_prep::config::PipelineConfig;
//! use orbit_prep::pipeline::{run_concat_stage, run_transform_stage};
//!
//! let config = PipelineConfig::builder()
//!     .data_root("./data")
//!     .num_orbit(1024)
//!     .build()?;
//!
//! run_transform_stage(&config)?;
//! let summary = run_concat_stage(&config)?;
//! for (split, kind, rows) in &summary.tables {
//!     println!("{kind}_{split}: {rows} rows");
//! }
//! # Ok::<(), orbit_prep::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod simulate;
pub mod storage;
pub mod transform;

pub use config::{PipelineConfig, Split, TableKind};
pub use error::{Error, Result};
pub use storage::Table;
