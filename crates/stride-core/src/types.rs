//! Cartesian state types shared by the variable sets, the sampler and callers.

use nalgebra::{DVector, UnitQuaternion, Vector3};

use crate::error::ConsistencyError;

/// Index of the x axis.
pub const X: usize = 0;
/// Index of the y axis.
pub const Y: usize = 1;
/// Index of the z axis.
pub const Z: usize = 2;

/// Number of Cartesian dimensions.
pub const DIM_3D: usize = 3;

/// Which value of a spline node is addressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Derivative {
    /// Position (or force value).
    Pos,
    /// First time derivative.
    Vel,
}

// ---------------------------------------------------------------------------
// StateLinXd
// ---------------------------------------------------------------------------

/// Position, velocity and acceleration of an n-dimensional quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct StateLinXd {
    pub p: DVector<f64>,
    pub v: DVector<f64>,
    pub a: DVector<f64>,
}

impl StateLinXd {
    /// All-zero state of dimension `n_dim`.
    pub fn zeros(n_dim: usize) -> Self {
        Self {
            p: DVector::zeros(n_dim),
            v: DVector::zeros(n_dim),
            a: DVector::zeros(n_dim),
        }
    }

    /// Spatial dimension.
    pub fn dim(&self) -> usize {
        self.p.len()
    }
}

// ---------------------------------------------------------------------------
// StateLin3d
// ---------------------------------------------------------------------------

/// Position, velocity and acceleration in 3D.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct StateLin3d {
    pub p: Vector3<f64>,
    pub v: Vector3<f64>,
    pub a: Vector3<f64>,
}

impl StateLin3d {
    /// State at rest at position `p`.
    pub fn at_rest(p: Vector3<f64>) -> Self {
        Self {
            p,
            ..Self::default()
        }
    }

    /// Assemble a 3D state from a 2D horizontal state and a 1D vertical one.
    pub fn from_xy_z(xy: &StateLinXd, z: &StateLinXd) -> Result<Self, ConsistencyError> {
        if xy.dim() != 2 {
            return Err(ConsistencyError::DimensionMismatch {
                expected: 2,
                got: xy.dim(),
            });
        }
        if z.dim() != 1 {
            return Err(ConsistencyError::DimensionMismatch {
                expected: 1,
                got: z.dim(),
            });
        }
        Ok(Self {
            p: Vector3::new(xy.p[0], xy.p[1], z.p[0]),
            v: Vector3::new(xy.v[0], xy.v[1], z.v[0]),
            a: Vector3::new(xy.a[0], xy.a[1], z.a[0]),
        })
    }
}

impl TryFrom<&StateLinXd> for StateLin3d {
    type Error = ConsistencyError;

    fn try_from(state: &StateLinXd) -> Result<Self, Self::Error> {
        if state.dim() != DIM_3D {
            return Err(ConsistencyError::DimensionMismatch {
                expected: DIM_3D,
                got: state.dim(),
            });
        }
        Ok(Self {
            p: Vector3::new(state.p[X], state.p[Y], state.p[Z]),
            v: Vector3::new(state.v[X], state.v[Y], state.v[Z]),
            a: Vector3::new(state.a[X], state.a[Y], state.a[Z]),
        })
    }
}

// ---------------------------------------------------------------------------
// Base states
// ---------------------------------------------------------------------------

/// Base pose as optimized: linear state and Euler-angle state (roll, pitch, yaw).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct BaseState {
    pub lin: StateLin3d,
    pub ang: StateLin3d,
}

/// Orientation with world-frame angular velocity and acceleration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateAng3d {
    pub q: UnitQuaternion<f64>,
    pub w: Vector3<f64>,
    pub wd: Vector3<f64>,
}

impl Default for StateAng3d {
    fn default() -> Self {
        Self {
            q: UnitQuaternion::identity(),
            w: Vector3::zeros(),
            wd: Vector3::zeros(),
        }
    }
}

/// Base pose as consumed downstream.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct BaseStateCartesian {
    pub lin: StateLin3d,
    pub ang: StateAng3d,
}

// ---------------------------------------------------------------------------
// RobotStateCartesian
// ---------------------------------------------------------------------------

/// Snapshot of the whole robot at one instant.
///
/// End-effector vectors are indexed by end-effector id.
#[derive(Clone, Debug, PartialEq)]
pub struct RobotStateCartesian {
    pub base: BaseStateCartesian,
    pub ee_motion: Vec<StateLin3d>,
    pub ee_forces: Vec<Vector3<f64>>,
    pub ee_contact: Vec<bool>,
    /// Time since the start of the horizon in seconds.
    pub t_global: f64,
}

impl RobotStateCartesian {
    /// Zeroed state for `ee_count` end-effectors.
    pub fn new(ee_count: usize) -> Self {
        Self {
            base: BaseStateCartesian::default(),
            ee_motion: vec![StateLin3d::default(); ee_count],
            ee_forces: vec![Vector3::zeros(); ee_count],
            ee_contact: vec![false; ee_count],
            t_global: 0.0,
        }
    }

    /// Number of end-effectors.
    pub fn ee_count(&self) -> usize {
        self.ee_motion.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_3d_from_xd() {
        let mut xd = StateLinXd::zeros(3);
        xd.p = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        xd.v[Z] = -1.0;
        let s = StateLin3d::try_from(&xd).unwrap();
        assert_eq!(s.p, Vector3::new(1.0, 2.0, 3.0));
        assert!((s.v.z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn state_3d_from_xd_wrong_dim() {
        let xd = StateLinXd::zeros(2);
        let err = StateLin3d::try_from(&xd).unwrap_err();
        assert_eq!(
            err,
            ConsistencyError::DimensionMismatch {
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn state_3d_from_xy_and_z() {
        let mut xy = StateLinXd::zeros(2);
        xy.p = DVector::from_vec(vec![0.3, 0.2]);
        let mut z = StateLinXd::zeros(1);
        z.p[0] = 0.1;
        z.v[0] = 0.5;
        let s = StateLin3d::from_xy_z(&xy, &z).unwrap();
        assert_eq!(s.p, Vector3::new(0.3, 0.2, 0.1));
        assert!((s.v.z - 0.5).abs() < 1e-12);
    }

    #[test]
    fn robot_state_sizes() {
        let s = RobotStateCartesian::new(4);
        assert_eq!(s.ee_count(), 4);
        assert_eq!(s.ee_forces.len(), 4);
        assert!(s.ee_contact.iter().all(|c| !c));
        assert_eq!(s.base.ang.q, UnitQuaternion::identity());
    }
}
