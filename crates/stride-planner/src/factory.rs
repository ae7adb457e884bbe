//! Cost and constraint generation for an assembled variable tree.
//!
//! The facade asks a [`CostConstraintFactory`] for every configured
//! constraint and cost name. The factory sees the tree once, at build time,
//! and returns sets that look their variables up by identifier on every
//! evaluation, so they stay valid for any copy of the tree.

use nalgebra::{DVector, Vector3};
use stride_core::config::{ConstraintName, CostName, OptimizationParameters};
use stride_core::error::{ConfigError, ConsistencyError, Result};
use stride_core::model::RobotModel;
use stride_core::terrain::HeightMap;
use stride_core::types::BaseState;
use stride_nlp::{ConstraintSet, CostTerm};
use stride_vars::{
    names, Bounds, CoeffSpline, Composite, ContactSchedule, PhaseNodes, PolynomialVars,
    VariableSet,
};

/// Everything a factory may read besides the tree itself.
pub struct FactoryContext<'a> {
    pub params: &'a OptimizationParameters,
    pub model: &'a dyn RobotModel,
    pub terrain: &'a dyn HeightMap,
    pub initial_base: &'a BaseState,
    pub final_base: &'a BaseState,
    /// World-frame initial foot positions.
    pub initial_ee: &'a [Vector3<f64>],
}

impl FactoryContext<'_> {
    /// Shared horizon of every trajectory in the tree.
    pub fn horizon(&self) -> f64 {
        self.params.base_poly_durations().iter().sum()
    }
}

pub trait CostConstraintFactory: Send + Sync {
    fn constraint(
        &self,
        name: ConstraintName,
        vars: &Composite,
        ctx: &FactoryContext<'_>,
    ) -> Result<Box<dyn ConstraintSet>>;

    fn cost(
        &self,
        name: CostName,
        vars: &Composite,
        ctx: &FactoryContext<'_>,
    ) -> Result<Box<dyn CostTerm>>;
}

/// Factory for the constraints and costs this crate implements.
///
/// Every other name is rejected with a configuration error.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFactory;

impl CostConstraintFactory for DefaultFactory {
    fn constraint(
        &self,
        name: ConstraintName,
        vars: &Composite,
        ctx: &FactoryContext<'_>,
    ) -> Result<Box<dyn ConstraintSet>> {
        match name {
            ConstraintName::TotalTime => Ok(Box::new(TotalTimeConstraint::new(
                vars,
                ctx.model.ee_count(),
                ctx.horizon(),
            )?)),
            other => Err(ConfigError::UnsupportedConstraint(other.to_string()).into()),
        }
    }

    fn cost(
        &self,
        name: CostName,
        vars: &Composite,
        ctx: &FactoryContext<'_>,
    ) -> Result<Box<dyn CostTerm>> {
        match name {
            CostName::ForceRegularization => Ok(Box::new(ForceRegularization::new(
                vars,
                ctx.model.ee_count(),
            )?)),
            other => Err(ConfigError::UnsupportedCost(other.to_string()).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// TotalTimeConstraint
// ---------------------------------------------------------------------------

/// Each end-effector's phase durations sum to the horizon.
pub struct TotalTimeConstraint {
    schedule_ids: Vec<String>,
    horizon: f64,
}

impl TotalTimeConstraint {
    pub fn new(vars: &Composite, ee_count: usize, horizon: f64) -> Result<Self> {
        let schedule_ids: Vec<String> = (0..ee_count).map(names::ee_schedule).collect();
        for id in &schedule_ids {
            vars.get::<ContactSchedule>(id)?;
        }
        Ok(Self {
            schedule_ids,
            horizon,
        })
    }
}

impl ConstraintSet for TotalTimeConstraint {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "total_time"
    }

    fn rows(&self) -> usize {
        self.schedule_ids.len()
    }

    fn values(&self, vars: &Composite) -> Result<DVector<f64>> {
        let mut g = DVector::zeros(self.rows());
        for (row, id) in self.schedule_ids.iter().enumerate() {
            g[row] = vars.get::<ContactSchedule>(id)?.total_duration();
        }
        Ok(g)
    }

    fn bounds(&self) -> Vec<Bounds> {
        vec![Bounds::fixed(self.horizon); self.rows()]
    }
}

// ---------------------------------------------------------------------------
// TerminalStateConstraint
// ---------------------------------------------------------------------------

/// Final state of a coefficient base trajectory: velocity on every axis,
/// then position along the spline's `final_pos_dims`.
///
/// Node splines pin these through their last node's bounds; coefficient
/// segments have no such variables, so the end of the last segment is
/// evaluated instead.
pub struct TerminalStateConstraint {
    spline_id: String,
    last_segment: String,
    duration: f64,
    pos_dims: Vec<usize>,
    targets: Vec<f64>,
}

impl TerminalStateConstraint {
    pub fn new(vars: &Composite, spline_id: &str) -> Result<Self> {
        let spline = vars.get::<CoeffSpline>(spline_id)?;
        let (Some(last_segment), Some(&duration)) = (
            spline.segment_ids().last(),
            spline.segment_durations().last(),
        ) else {
            return Err(ConsistencyError::PhaseCountMismatch {
                id: spline_id.to_owned(),
                expected: 1,
                got: 0,
            }
            .into());
        };
        vars.get::<PolynomialVars>(last_segment)?;

        let terminal = spline.terminal();
        let pos_dims = terminal.final_pos_dims.clone();
        let targets = terminal
            .target
            .v
            .iter()
            .copied()
            .chain(pos_dims.iter().map(|&d| terminal.target.p[d]))
            .collect();
        Ok(Self {
            spline_id: spline_id.to_owned(),
            last_segment: last_segment.clone(),
            duration,
            pos_dims,
            targets,
        })
    }

    pub fn spline_id(&self) -> &str {
        &self.spline_id
    }
}

impl ConstraintSet for TerminalStateConstraint {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "terminal_state"
    }

    fn rows(&self) -> usize {
        self.targets.len()
    }

    fn values(&self, vars: &Composite) -> Result<DVector<f64>> {
        let end = vars
            .get::<PolynomialVars>(&self.last_segment)?
            .poly()
            .point_at(self.duration);
        let n_vel = end.v.len();
        let mut g = DVector::zeros(self.rows());
        g.rows_mut(0, n_vel).copy_from(&end.v);
        for (row, &dim) in self.pos_dims.iter().enumerate() {
            g[n_vel + row] = end.p[dim];
        }
        Ok(g)
    }

    fn bounds(&self) -> Vec<Bounds> {
        self.targets.iter().map(|&t| Bounds::fixed(t)).collect()
    }
}

// ---------------------------------------------------------------------------
// ForceRegularization
// ---------------------------------------------------------------------------

/// Sum of squared force node values over all end-effectors.
pub struct ForceRegularization {
    force_ids: Vec<String>,
}

impl ForceRegularization {
    pub fn new(vars: &Composite, ee_count: usize) -> Result<Self> {
        let force_ids: Vec<String> = (0..ee_count).map(names::ee_force).collect();
        for id in &force_ids {
            vars.get::<PhaseNodes>(id)?;
        }
        Ok(Self { force_ids })
    }
}

impl CostTerm for ForceRegularization {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "force_regularization"
    }

    fn cost(&self, vars: &Composite) -> Result<f64> {
        let mut total = 0.0;
        for id in &self.force_ids {
            total += vars.get::<PhaseNodes>(id)?.values().norm_squared();
        }
        Ok(total)
    }
}
