//! 4th-order Hermite predictor-corrector for the planar Kepler problem
//!
//! The body orbits a fixed central mass `m` at the origin:
//!
//! ```text
//! a = -m r / |r|^3
//! j = -m (v / |r|^3 - 3 (r.v) r / |r|^5)
//! ```
//!
//! Step size adapts as `dt = ETA * |a| / |j|` and is clipped so that each
//! call to [`advance`] ends exactly `sample_step` later.

use crate::{Error, Result};

/// Accuracy parameter of the adaptive step
pub const ETA: f64 = 0.001;

/// Substeps allowed per sample before giving up on a plunging orbit
pub const MAX_STEPS_PER_SAMPLE: u64 = 50_000_000;

type Vec2 = [f64; 2];

fn dot(a: Vec2, b: Vec2) -> f64 {
    a[0].mul_add(b[0], a[1] * b[1])
}

fn norm(a: Vec2) -> f64 {
    dot(a, a).sqrt()
}

/// Position and velocity of the orbiting body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    /// `(x, y)`
    pub position: Vec2,
    /// `(vx, vy)`
    pub velocity: Vec2,
}

impl OrbitState {
    /// `[x, y, vx, vy]`
    #[must_use]
    pub const fn to_row(&self) -> [f64; 4] {
        [
            self.position[0],
            self.position[1],
            self.velocity[0],
            self.velocity[1],
        ]
    }

    /// Acceleration and jerk at this state
    #[must_use]
    pub fn derivatives(&self, mass: f64) -> (Vec2, Vec2) {
        let r = self.position;
        let v = self.velocity;
        let inv_r = 1.0 / norm(r);
        let inv_r3 = mass * inv_r * inv_r * inv_r;
        let rv = 3.0 * dot(r, v) * inv_r * inv_r;
        let acc = [-inv_r3 * r[0], -inv_r3 * r[1]];
        let jerk = [(rv * r[0] - v[0]) * inv_r3, (rv * r[1] - v[1]) * inv_r3];
        (acc, jerk)
    }

    fn step(&mut self, mass: f64, acc0: Vec2, jerk0: Vec2, dt: f64) {
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let start = *self;

        // predictor: Taylor expansion to jerk
        for k in 0..2 {
            self.position[k] = start.position[k]
                + start.velocity[k] * dt
                + acc0[k] * dt2 / 2.0
                + jerk0[k] * dt3 / 6.0;
            self.velocity[k] = start.velocity[k] + acc0[k] * dt + jerk0[k] * dt2 / 2.0;
        }

        // corrector: snap and crackle from the Hermite interpolant
        let (acc1, jerk1) = self.derivatives(mass);
        for k in 0..2 {
            let snap = -6.0 * (acc0[k] - acc1[k]) - dt * (4.0 * jerk0[k] + 2.0 * jerk1[k]);
            let crackle = 12.0 * (acc0[k] - acc1[k]) + 6.0 * dt * (jerk0[k] + jerk1[k]);
            self.position[k] += (snap / 24.0 + crackle / 120.0) * dt2;
            self.velocity[k] += (snap / 6.0 + crackle / 24.0) * dt;
        }
    }
}

/// Integrate forward by exactly `sample_step`, returning the substep count
///
/// # Errors
/// Returns [`Error::Integration`] if the state becomes non-finite or the
/// orbit needs more than [`MAX_STEPS_PER_SAMPLE`] substeps
pub fn advance(state: &mut OrbitState, mass: f64, sample_step: f64) -> Result<u64> {
    let mut time = 0.0;
    let mut steps = 0;
    loop {
        steps += 1;
        if steps > MAX_STEPS_PER_SAMPLE {
            return Err(Error::Integration(format!(
                "no progress after {MAX_STEPS_PER_SAMPLE} substeps at {:?}",
                state.position
            )));
        }

        let (acc, jerk) = state.derivatives(mass);
        let dt = ETA * norm(acc) / norm(jerk);
        let remaining = sample_step - time;
        // a NaN step also ends the sample; divergence is caught below
        #[allow(clippy::neg_cmp_op_on_partial_ord)]
        let last = !(dt < remaining);
        let dt = if last { remaining } else { dt };

        state.step(mass, acc, jerk, dt);
        if !state.to_row().iter().all(|v| v.is_finite()) {
            return Err(Error::Integration(format!(
                "state diverged after {steps} substeps"
            )));
        }
        if last {
            return Ok(steps);
        }
        time += dt;
    }
}
