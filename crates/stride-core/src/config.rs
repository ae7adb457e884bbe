use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Z;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_order_coeff_polys() -> usize {
    4
}
const fn default_duration_base_polynomial() -> f64 {
    0.2
}
const fn default_min_phase_duration() -> f64 {
    0.1
}
const fn default_max_phase_duration() -> f64 {
    1.0
}
const fn default_force_polys_per_stance_phase() -> usize {
    3
}
const fn default_motion_polys_xy() -> usize {
    1
}
const fn default_motion_polys_z() -> usize {
    2
}
fn default_angular_final_dims() -> Vec<usize> {
    vec![Z]
}
const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// How the base linear and angular trajectories are parameterized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseRepresentation {
    /// One continuous cubic Hermite node spline over the whole horizon.
    CubicHermite,
    /// Independent coefficient polynomials over fixed sub-durations.
    PolyCoeff,
}

impl FromStr for BaseRepresentation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cubic_hermite" => Ok(Self::CubicHermite),
            "poly_coeff" => Ok(Self::PolyCoeff),
            other => Err(ConfigError::UnsupportedBaseRepresentation(other.into())),
        }
    }
}

impl fmt::Display for BaseRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CubicHermite => f.write_str("cubic_hermite"),
            Self::PolyCoeff => f.write_str("poly_coeff"),
        }
    }
}

/// NLP solver backend selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NlpSolver {
    /// Records the initial guess as the only iterate.
    InitialGuess,
    Ipopt,
    Snopt,
}

impl FromStr for NlpSolver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial_guess" => Ok(Self::InitialGuess),
            "ipopt" => Ok(Self::Ipopt),
            "snopt" => Ok(Self::Snopt),
            other => Err(ConfigError::UnsupportedSolver(other.into())),
        }
    }
}

impl fmt::Display for NlpSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitialGuess => f.write_str("initial_guess"),
            Self::Ipopt => f.write_str("ipopt"),
            Self::Snopt => f.write_str("snopt"),
        }
    }
}

/// Named constraint sets the cost/constraint factory may be asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintName {
    /// Sum of each end-effector's phase durations equals the horizon.
    TotalTime,
    Dynamic,
    Terrain,
    RangeOfMotion,
    Swing,
    Force,
    /// Inter-segment continuity of the coefficient base representation.
    SplineContinuity,
}

impl fmt::Display for ConstraintName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TotalTime => "total_time",
            Self::Dynamic => "dynamic",
            Self::Terrain => "terrain",
            Self::RangeOfMotion => "range_of_motion",
            Self::Swing => "swing",
            Self::Force => "force",
            Self::SplineContinuity => "spline_continuity",
        };
        f.write_str(name)
    }
}

/// Named cost terms the cost/constraint factory may be asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostName {
    /// Weighted squared end-effector force node values.
    ForceRegularization,
    BaseAcceleration,
    ComRegularization,
}

impl fmt::Display for CostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ForceRegularization => "force_regularization",
            Self::BaseAcceleration => "base_acceleration",
            Self::ComRegularization => "com_regularization",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// ContactTiming / CostWeight
// ---------------------------------------------------------------------------

/// Nominal phase sequence of one end-effector. Phases alternate between
/// contact and swing, starting with `first_in_contact`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactTiming {
    #[serde(default = "default_true")]
    pub first_in_contact: bool,
    pub durations: Vec<f64>,
}

impl ContactTiming {
    /// Timing with a single stance phase of `duration` seconds.
    pub fn stance(duration: f64) -> Self {
        Self {
            first_in_contact: true,
            durations: vec![duration],
        }
    }

    /// Sum of all phase durations.
    pub fn total_duration(&self) -> f64 {
        self.durations.iter().sum()
    }
}

/// One weighted entry of the active cost set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostWeight {
    pub name: CostName,
    pub weight: f64,
}

// ---------------------------------------------------------------------------
// OptimizationParameters
// ---------------------------------------------------------------------------

/// Everything needed to assemble one motion-optimization problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationParameters {
    pub base_representation: BaseRepresentation,

    pub solver: NlpSolver,

    /// Order of the coefficient polynomials (`poly_coeff` only).
    #[serde(default = "default_order_coeff_polys")]
    pub order_coeff_polys: usize,

    /// Length of one base polynomial in seconds. The last one takes the remainder.
    #[serde(default = "default_duration_base_polynomial")]
    pub duration_base_polynomial: f64,

    /// Nominal phase sequence, one entry per end-effector.
    pub contact_timings: Vec<ContactTiming>,

    #[serde(default = "default_min_phase_duration")]
    pub min_phase_duration: f64,

    #[serde(default = "default_max_phase_duration")]
    pub max_phase_duration: f64,

    /// Whether phase durations are decision variables.
    #[serde(default)]
    pub optimize_timings: bool,

    #[serde(default = "default_force_polys_per_stance_phase")]
    pub force_polys_per_stance_phase: usize,

    #[serde(default = "default_motion_polys_xy")]
    pub motion_polys_per_swing_phase_xy: usize,

    #[serde(default = "default_motion_polys_z")]
    pub motion_polys_per_swing_phase_z: usize,

    /// Angular axes (0 = roll, 1 = pitch, 2 = yaw) whose final value is pinned.
    #[serde(default = "default_angular_final_dims")]
    pub angular_final_dims: Vec<usize>,

    #[serde(default)]
    pub constraints: Vec<ConstraintName>,

    #[serde(default)]
    pub costs: Vec<CostWeight>,
}

impl Default for OptimizationParameters {
    /// Quadruped trot: diagonal pairs swing one after the other over one second.
    fn default() -> Self {
        let pair_a = ContactTiming {
            first_in_contact: true,
            durations: vec![0.2, 0.3, 0.5],
        };
        let pair_b = ContactTiming {
            first_in_contact: true,
            durations: vec![0.5, 0.3, 0.2],
        };
        Self {
            base_representation: BaseRepresentation::CubicHermite,
            solver: NlpSolver::InitialGuess,
            order_coeff_polys: default_order_coeff_polys(),
            duration_base_polynomial: default_duration_base_polynomial(),
            contact_timings: vec![pair_a.clone(), pair_b.clone(), pair_b, pair_a],
            min_phase_duration: default_min_phase_duration(),
            max_phase_duration: default_max_phase_duration(),
            optimize_timings: false,
            force_polys_per_stance_phase: default_force_polys_per_stance_phase(),
            motion_polys_per_swing_phase_xy: default_motion_polys_xy(),
            motion_polys_per_swing_phase_z: default_motion_polys_z(),
            angular_final_dims: default_angular_final_dims(),
            constraints: vec![ConstraintName::TotalTime],
            costs: Vec::new(),
        }
    }
}

impl OptimizationParameters {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order_coeff_polys == 0 {
            return Err(invalid("order_coeff_polys", "must be >= 1"));
        }
        if !(self.duration_base_polynomial > 0.0) {
            return Err(invalid("duration_base_polynomial", "must be > 0"));
        }
        if !(self.min_phase_duration > 0.0) {
            return Err(invalid("min_phase_duration", "must be > 0"));
        }
        if self.max_phase_duration < self.min_phase_duration {
            return Err(invalid(
                "max_phase_duration",
                "must be >= min_phase_duration",
            ));
        }
        if self.force_polys_per_stance_phase == 0
            || self.motion_polys_per_swing_phase_xy == 0
            || self.motion_polys_per_swing_phase_z == 0
        {
            return Err(invalid("polys_per_phase", "every count must be >= 1"));
        }
        if let Some(dim) = self.angular_final_dims.iter().find(|&&d| d > Z) {
            return Err(invalid(
                "angular_final_dims",
                &format!("axis {dim} is not one of 0, 1, 2"),
            ));
        }
        if self.contact_timings.is_empty() {
            return Err(ConfigError::MissingContactTiming(0));
        }
        for (ee, timing) in self.contact_timings.iter().enumerate() {
            if timing.durations.is_empty() {
                return Err(ConfigError::MissingContactTiming(ee));
            }
        }
        for cost in &self.costs {
            if !cost.weight.is_finite() || cost.weight < 0.0 {
                return Err(invalid(
                    "costs",
                    &format!("weight of {} must be finite and >= 0", cost.name),
                ));
            }
        }
        Ok(())
    }

    /// Horizon length taken from the first end-effector's nominal timing.
    pub fn total_duration(&self) -> f64 {
        self.contact_timings
            .first()
            .map_or(0.0, ContactTiming::total_duration)
    }

    /// Split the horizon into base polynomial durations.
    ///
    /// Each piece lasts `duration_base_polynomial` seconds; the last one takes
    /// whatever remains.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn base_poly_durations(&self) -> Vec<f64> {
        let total = self.total_duration();
        let dt = self.duration_base_polynomial;
        let full = (total / dt + 1e-10).floor() as usize;
        let mut durations = vec![dt; full];
        let remainder = total - dt * full as f64;
        if remainder > 1e-10 {
            durations.push(remainder);
        }
        if durations.is_empty() {
            durations.push(total);
        }
        durations
    }

    /// Cost weight configured for `name`, if any.
    pub fn cost_weight(&self, name: CostName) -> Option<f64> {
        self.costs.iter().find(|c| c.name == name).map(|c| c.weight)
    }

    /// Parse and validate from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let params: Self = toml::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}
