//! Stage 0: raw trajectory generation
//!
//! Draws bound initial states from a seeded RNG per split, integrates each
//! orbit for `samples_per_file` samples and writes one raw record per orbit:
//! `samples_per_file + 1` rows of `x y vx vy steps`, the first row being the
//! initial state with 0 steps. Records are what Stage A consumes.

mod hermite;

pub use hermite::{advance, OrbitState, ETA, MAX_STEPS_PER_SAMPLE};

use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::info;

use crate::config::{PipelineConfig, Split};
use crate::layout::DataLayout;
use crate::pipeline::worker_pool;
use crate::storage::{save_table, Table};
use crate::{Error, Result};

/// Position radius is drawn from `[POSITION_OFFSET, POSITION_OFFSET + 1)`
pub const POSITION_OFFSET: f64 = 0.5;

/// Velocity radius is drawn from `[VELOCITY_OFFSET, VELOCITY_OFFSET + 1)`
pub const VELOCITY_OFFSET: f64 = 0.7;

/// Reject draws with `r_pos * r_vel^2` above this (unbound or near escape)
pub const BINDING_LIMIT: f64 = 2.1;

/// Draw `count` initial states, rejecting weakly bound ones
#[must_use]
pub fn sample_initial_states<R: Rng>(rng: &mut R, count: usize) -> Vec<OrbitState> {
    let mut states = Vec::with_capacity(count);
    while states.len() < count {
        let position_radius = rng.gen::<f64>() + POSITION_OFFSET;
        let velocity_radius = rng.gen::<f64>() + VELOCITY_OFFSET;
        let position_angle = rng.gen::<f64>() * TAU;
        let velocity_angle = rng.gen::<f64>() * TAU;
        if position_radius * velocity_radius * velocity_radius > BINDING_LIMIT {
            continue;
        }
        states.push(OrbitState {
            position: [
                position_radius * position_angle.cos(),
                position_radius * position_angle.sin(),
            ],
            velocity: [
                velocity_radius * velocity_angle.cos(),
                velocity_radius * velocity_angle.sin(),
            ],
        });
    }
    states
}

/// Integrate one orbit into a raw record table
///
/// # Errors
/// Returns [`Error::Integration`] if the orbit diverges
pub fn trajectory(
    initial: OrbitState,
    mass: f64,
    sample_step: f64,
    samples: usize,
) -> Result<Table> {
    let mut state = initial;
    let mut values = Vec::with_capacity((samples + 1) * 5);
    values.extend(state.to_row());
    values.push(0.0);
    for _ in 0..samples {
        let steps = advance(&mut state, mass, sample_step)?;
        values.extend(state.to_row());
        #[allow(clippy::cast_precision_loss)]
        values.push(steps as f64);
    }
    Table::new(values, samples + 1, 5)
}

/// Outcome of a completed generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    /// Records written per split
    pub records: usize,
    /// Splits generated
    pub splits: Vec<Split>,
    /// Wall-clock time
    pub elapsed: Duration,
}

/// Generate one split: initial-state table plus one raw record per orbit
///
/// # Errors
/// Returns the first integration or write error
pub fn generate_split(config: &PipelineConfig, layout: &DataLayout, split: Split) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(split.seed());
    let states = sample_initial_states(&mut rng, config.num_orbit());

    std::fs::create_dir_all(layout.split_dir(split)).map_err(|e| {
        Error::data_access(layout.split_dir(split), format!("cannot create directory: {e}"))
    })?;
    let initial_rows: Vec<[f64; 4]> = states.iter().map(OrbitState::to_row).collect();
    save_table(&Table::from_rows(&initial_rows)?, layout.initial_state_path(split))?;

    states.par_iter().enumerate().try_for_each(|(id, &state)| {
        let record = trajectory(
            state,
            config.mass(),
            config.sample_step(),
            config.samples_per_file(),
        )
        .map_err(|e| match e {
            Error::Integration(reason) => Error::Integration(format!("{split}/{id}: {reason}")),
            other => other,
        })?;
        save_table(&record, layout.raw_path(split, id))
    })?;

    info!(%split, records = states.len(), "generated split");
    Ok(())
}

/// Run generation for every configured split
///
/// # Errors
/// Returns the first error from any split
pub fn run_generate_stage(config: &PipelineConfig) -> Result<GenerateSummary> {
    let start = Instant::now();
    let layout = DataLayout::new(config.data_root());
    let pool = worker_pool("generate", config.num_threads())?;

    info!(
        records = config.num_orbit(),
        samples = config.samples_per_file(),
        workers = config.num_threads(),
        root = %layout.root().display(),
        "Stage 0: generating trajectories"
    );

    pool.install(|| {
        config
            .splits()
            .iter()
            .try_for_each(|&split| generate_split(config, &layout, split))
    })?;

    let summary = GenerateSummary {
        records: config.num_orbit(),
        splits: config.splits().to_vec(),
        elapsed: start.elapsed(),
    };
    info!(elapsed_secs = summary.elapsed.as_secs_f64(), "Stage 0 complete");
    Ok(summary)
}
