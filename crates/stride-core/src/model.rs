//! Robot models: the kinematic/dynamic facts the problem assembly consumes.

use nalgebra::Vector3;

/// Standard gravity in m/s^2.
pub const GRAVITY: f64 = 9.81;

/// What the problem assembly needs to know about a robot.
pub trait RobotModel: Send + Sync {
    /// Number of end-effectors (feet).
    fn ee_count(&self) -> usize;

    /// Nominal foot positions in the base frame, indexed by end-effector.
    fn nominal_stance_in_base(&self) -> Vec<Vector3<f64>>;

    /// Maximum magnitude of each force component on one end-effector (N).
    fn force_limit(&self) -> f64;

    /// Vertical force per foot when all feet share the body weight (N).
    fn standing_z_force(&self) -> f64;

    /// Human-readable name for this model.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// MonopedModel
// ---------------------------------------------------------------------------

/// Single-legged hopper.
#[derive(Clone, Debug)]
pub struct MonopedModel {
    nominal_stance: Vector3<f64>,
    mass: f64,
    force_limit: f64,
}

impl MonopedModel {
    pub const fn new(nominal_stance: Vector3<f64>, mass: f64, force_limit: f64) -> Self {
        Self {
            nominal_stance,
            mass,
            force_limit,
        }
    }

    pub const fn mass(&self) -> f64 {
        self.mass
    }
}

impl Default for MonopedModel {
    fn default() -> Self {
        Self::new(Vector3::new(0.0, 0.0, -0.58), 20.0, 10_000.0)
    }
}

impl RobotModel for MonopedModel {
    fn ee_count(&self) -> usize {
        1
    }

    fn nominal_stance_in_base(&self) -> Vec<Vector3<f64>> {
        vec![self.nominal_stance]
    }

    fn force_limit(&self) -> f64 {
        self.force_limit
    }

    fn standing_z_force(&self) -> f64 {
        self.mass * GRAVITY
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "monoped"
    }
}

// ---------------------------------------------------------------------------
// QuadrupedModel
// ---------------------------------------------------------------------------

/// Four-legged robot with feet ordered LF, RF, LH, RH.
#[derive(Clone, Debug)]
pub struct QuadrupedModel {
    /// Half the distance between front and hind feet (m).
    pub half_length: f64,
    /// Half the distance between left and right feet (m).
    pub half_width: f64,
    /// Nominal standing height of the base above the feet (m).
    pub height: f64,
    pub mass: f64,
    pub force_limit: f64,
}

impl Default for QuadrupedModel {
    fn default() -> Self {
        Self {
            half_length: 0.34,
            half_width: 0.19,
            height: 0.46,
            mass: 30.0,
            force_limit: 2000.0,
        }
    }
}

impl RobotModel for QuadrupedModel {
    fn ee_count(&self) -> usize {
        4
    }

    fn nominal_stance_in_base(&self) -> Vec<Vector3<f64>> {
        let (x, y, z) = (self.half_length, self.half_width, -self.height);
        vec![
            Vector3::new(x, y, z),
            Vector3::new(x, -y, z),
            Vector3::new(-x, y, z),
            Vector3::new(-x, -y, z),
        ]
    }

    fn force_limit(&self) -> f64 {
        self.force_limit
    }

    #[allow(clippy::cast_precision_loss)]
    fn standing_z_force(&self) -> f64 {
        self.mass * GRAVITY / self.ee_count() as f64
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "quadruped"
    }
}
