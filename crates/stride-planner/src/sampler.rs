//! Reconstruction of time-sampled robot states from a variable tree.
//!
//! Sample times are `0, dt, 2 dt, ...` while they stay clear of the horizon
//! end by more than [`TIME_TOLERANCE`], followed by exactly one sample at the
//! horizon end. A horizon of 1.0 s sampled at 0.3 s therefore yields
//! `0, 0.3, 0.6, 0.9, 1.0`.

use nalgebra::Vector3;
use rayon::prelude::*;
use stride_core::angular::angular_state;
use stride_core::error::{ConfigError, ConsistencyError, Result};
use stride_core::time::{durations_agree, TIME_TOLERANCE};
use stride_core::types::{RobotStateCartesian, StateLin3d};
use stride_nlp::Problem;
use stride_vars::{names, Composite, ContactSchedule};
use tracing::debug;

// ---------------------------------------------------------------------------
// SampleTimes
// ---------------------------------------------------------------------------

/// Finite, restartable sequence of sample times over a horizon.
#[derive(Clone, Debug)]
pub struct SampleTimes {
    dt: f64,
    total: f64,
    k: usize,
    done: bool,
}

impl SampleTimes {
    /// Sample `[0, total]` every `dt` seconds. `dt` must be positive.
    pub fn new(total: f64, dt: f64) -> Result<Self, ConfigError> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "dt".into(),
                message: format!("sampling step {dt} must be positive and finite"),
            });
        }
        if !(total >= 0.0) || !total.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "total_duration".into(),
                message: format!("horizon {total} must be non-negative and finite"),
            });
        }
        Ok(Self {
            dt,
            total,
            k: 0,
            done: false,
        })
    }

    /// Start over from `t = 0`.
    pub fn restart(&mut self) {
        self.k = 0;
        self.done = false;
    }
}

impl Iterator for SampleTimes {
    type Item = f64;

    #[allow(clippy::cast_precision_loss)]
    fn next(&mut self) -> Option<f64> {
        if self.done {
            return None;
        }
        let t = self.k as f64 * self.dt;
        if t < self.total - TIME_TOLERANCE {
            self.k += 1;
            Some(t)
        } else {
            self.done = true;
            Some(self.total)
        }
    }
}

// ---------------------------------------------------------------------------
// Trajectory reconstruction
// ---------------------------------------------------------------------------

/// Number of end-effectors with a schedule in `vars`.
pub fn ee_count(vars: &Composite) -> usize {
    (0..)
        .take_while(|&ee| vars.contains(&names::ee_schedule(ee)))
        .count()
}

/// Horizon of `vars`, read from end-effector 0's schedule.
///
/// Every schedule and both base trajectories must agree on it.
pub fn horizon(vars: &Composite) -> Result<f64> {
    let total = vars
        .get::<ContactSchedule>(&names::ee_schedule(0))?
        .total_duration();

    let mut others: Vec<(String, f64)> = Vec::new();
    for ee in 1..ee_count(vars) {
        let id = names::ee_schedule(ee);
        let got = vars.get::<ContactSchedule>(&id)?.total_duration();
        others.push((id, got));
    }
    for id in [names::BASE_LINEAR, names::BASE_ANGULAR] {
        others.push((id.to_owned(), vars.spline(id)?.total_duration()));
    }

    for (id, got) in others {
        if !durations_agree(total, got) {
            return Err(ConsistencyError::TotalDurationMismatch {
                id,
                expected: total,
                got,
            }
            .into());
        }
    }
    Ok(total)
}

/// Robot state at time `t`.
pub fn state_at(vars: &Composite, ee_count: usize, t: f64) -> Result<RobotStateCartesian> {
    let mut state = RobotStateCartesian::new(ee_count);
    state.t_global = t;

    state.base.lin = StateLin3d::try_from(&vars.spline(names::BASE_LINEAR)?.point_at(t)?)?;
    let euler = StateLin3d::try_from(&vars.spline(names::BASE_ANGULAR)?.point_at(t)?)?;
    state.base.ang = angular_state(&euler);

    for ee in 0..ee_count {
        state.ee_contact[ee] = vars
            .get::<ContactSchedule>(&names::ee_schedule(ee))?
            .is_in_contact(t)?;

        let xy = vars.spline(&names::ee_motion_xy(ee))?.point_at(t)?;
        let z = vars.spline(&names::ee_motion_z(ee))?.point_at(t)?;
        state.ee_motion[ee] = StateLin3d::from_xy_z(&xy, &z)?;

        let f = vars.spline(&names::ee_force(ee))?.point_at(t)?.p;
        if f.len() != 3 {
            return Err(ConsistencyError::DimensionMismatch {
                expected: 3,
                got: f.len(),
            }
            .into());
        }
        state.ee_forces[ee] = Vector3::new(f[0], f[1], f[2]);
    }
    Ok(state)
}

/// Sample one variable tree every `dt` seconds over its horizon.
pub fn build_trajectory(vars: &Composite, dt: f64) -> Result<Vec<RobotStateCartesian>> {
    let total = horizon(vars)?;
    let n_ee = ee_count(vars);
    SampleTimes::new(total, dt)?
        .map(|t| state_at(vars, n_ee, t))
        .collect()
}

/// One trajectory per recorded iterate of `problem`, in iterate order.
///
/// Iterates are processed in parallel, each on its own copy of the tree.
pub fn trajectories(problem: &Problem, dt: f64) -> Result<Vec<Vec<RobotStateCartesian>>> {
    debug!(iterates = problem.iterate_count(), dt, "sampling trajectories");
    (0..problem.iterate_count())
        .into_par_iter()
        .map(|i| {
            let vars = problem.variables_at(i)?;
            build_trajectory(&vars, dt)
        })
        .collect()
}
