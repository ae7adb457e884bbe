//! Motion optimizer facade: problem assembly, solving and sampling.
//!
//! ```text
//! contact schedules ──► phase node sets (observers) ──┐
//! base trajectory (hermite | coefficients) ───────────┼─► Composite ─► factory ─► Problem
//!                                                     │                              │
//!                           trajectories ◄── sampler ◄─┴──── iterates ◄── backend ◄───┘
//! ```
//!
//! Configuration is checked when the optimizer is created and the solver
//! selection is resolved before any variable is built, so a bad selection
//! never leaves half-assembled state behind.

use std::sync::Arc;

use nalgebra::{DVector, Vector3};
use stride_core::config::{BaseRepresentation, OptimizationParameters};
use stride_core::error::{ConfigError, ConsistencyError, Result};
use stride_core::model::RobotModel;
use stride_core::terrain::{FlatGround, HeightMap};
use stride_core::time::durations_agree;
use stride_core::types::{BaseState, Derivative, RobotStateCartesian, StateLin3d, X, Y};
use stride_nlp::{ConstraintComposite, CostComposite, Problem, SolveReport, SolverBackend, SolverRegistry};
use stride_vars::{base, names, Composite, ContactSchedule, PhaseNodes, VariableSet};
use tracing::{debug, info};

use crate::factory::{
    CostConstraintFactory, DefaultFactory, FactoryContext, TerminalStateConstraint,
};
use crate::sampler;

/// A solved problem together with how the solve went.
pub struct Solution {
    pub problem: Problem,
    pub report: SolveReport,
}

pub struct MotionOptimizer {
    params: OptimizationParameters,
    model: Arc<dyn RobotModel>,
    terrain: Arc<dyn HeightMap>,
    factory: Box<dyn CostConstraintFactory>,
    solvers: SolverRegistry,
    initial_base: BaseState,
    final_base: BaseState,
    initial_ee: Vec<Vector3<f64>>,
}

impl MotionOptimizer {
    /// Optimizer for `model` on flat ground at height zero.
    ///
    /// The robot starts standing at the origin with its feet on the ground
    /// and, unless told otherwise, ends where it started.
    pub fn new(params: OptimizationParameters, model: Arc<dyn RobotModel>) -> Result<Self> {
        params.validate()?;
        if params.contact_timings.len() < model.ee_count() {
            return Err(ConfigError::MissingContactTiming(params.contact_timings.len()).into());
        }

        let nominal = model.nominal_stance_in_base();
        let mut initial_base = BaseState::default();
        initial_base.lin.p = Vector3::new(0.0, 0.0, nominal.first().map_or(0.0, |p| -p.z));

        let mut optimizer = Self {
            params,
            model,
            terrain: Arc::new(FlatGround::default()),
            factory: Box::new(DefaultFactory),
            solvers: SolverRegistry::default(),
            initial_base,
            final_base: initial_base,
            initial_ee: Vec::new(),
        };
        optimizer.update_initial_ee();
        Ok(optimizer)
    }

    #[must_use]
    pub fn with_terrain(mut self, terrain: Arc<dyn HeightMap>) -> Self {
        self.terrain = terrain;
        self.update_initial_ee();
        self
    }

    #[must_use]
    pub fn with_factory(mut self, factory: Box<dyn CostConstraintFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Make `backend` serve its [`NlpSolver`](stride_core::config::NlpSolver) selection.
    pub fn register_solver(&mut self, backend: Box<dyn SolverBackend>) {
        self.solvers.register(backend);
    }

    /// Set the start pose. Initial foot positions follow it.
    pub fn set_initial_base(&mut self, base: BaseState) {
        self.initial_base = base;
        self.update_initial_ee();
    }

    pub fn set_final_base(&mut self, base: BaseState) {
        self.final_base = base;
    }

    pub fn params(&self) -> &OptimizationParameters {
        &self.params
    }

    pub fn model(&self) -> &dyn RobotModel {
        self.model.as_ref()
    }

    pub fn initial_base(&self) -> &BaseState {
        &self.initial_base
    }

    pub fn final_base(&self) -> &BaseState {
        &self.final_base
    }

    /// World-frame initial foot positions.
    pub fn initial_ee(&self) -> &[Vector3<f64>] {
        &self.initial_ee
    }

    /// Nominal stance under `base`, with heights taken from the terrain.
    fn feet_under(&self, base: &BaseState) -> Vec<Vector3<f64>> {
        self.model
            .nominal_stance_in_base()
            .iter()
            .map(|nominal| {
                let mut p = base.lin.p + nominal;
                p.z = self.terrain.height(p.x, p.y);
                p
            })
            .collect()
    }

    fn update_initial_ee(&mut self) {
        self.initial_ee = self.feet_under(&self.initial_base);
    }

    // -----------------------------------------------------------------------
    // Assembly
    // -----------------------------------------------------------------------

    /// Assemble the variable tree.
    ///
    /// Order: base trajectory, one contact schedule per end-effector, the
    /// motion node sets of every end-effector, then their force node sets.
    pub fn build_variables(&self) -> Result<Composite> {
        let params = &self.params;
        let mut vars = Composite::new(names::NLP_VARIABLES);

        let base_durations = params.base_poly_durations();
        let horizon: f64 = base_durations.iter().sum();
        self.add_base(&mut vars, &base_durations)?;

        let ee_count = self.model.ee_count();
        let mut schedules = Vec::with_capacity(ee_count);
        for ee in 0..ee_count {
            let schedule = ContactSchedule::new(
                ee,
                &params.contact_timings[ee],
                params.min_phase_duration,
                params.max_phase_duration,
            )?;
            if !durations_agree(schedule.total_duration(), horizon) {
                return Err(ConsistencyError::TotalDurationMismatch {
                    id: names::ee_schedule(ee),
                    expected: horizon,
                    got: schedule.total_duration(),
                }
                .into());
            }
            schedules.push((
                schedule.contact_sequence(),
                schedule.phase_durations().to_vec(),
            ));
            if params.optimize_timings {
                vars.add_component(schedule)?;
            } else {
                vars.add_informational(schedule)?;
            }
        }

        let final_ee = self.feet_under(&self.final_base);
        for (ee, (sequence, durations)) in schedules.iter().enumerate() {
            let start = self.initial_ee[ee];
            let end = final_ee[ee];

            let mut xy = PhaseNodes::motion(
                2,
                sequence,
                names::ee_motion_xy(ee),
                params.motion_polys_per_swing_phase_xy,
            );
            xy.initialize_variables(
                &DVector::from_vec(vec![start.x, start.y]),
                &DVector::from_vec(vec![end.x, end.y]),
                durations,
            )?;
            xy.add_start_bound(Derivative::Pos, &[X, Y], &[start.x, start.y])?;
            vars.add_component(xy)?;
            vars.register_observer(&names::ee_schedule(ee), &names::ee_motion_xy(ee))?;

            let mut z = PhaseNodes::motion(
                1,
                sequence,
                names::ee_motion_z(ee),
                params.motion_polys_per_swing_phase_z,
            );
            z.initialize_variables(
                &DVector::from_element(1, start.z),
                &DVector::from_element(1, end.z),
                durations,
            )?;
            vars.add_component(z)?;
            vars.register_observer(&names::ee_schedule(ee), &names::ee_motion_z(ee))?;
        }

        let standing = DVector::from_vec(vec![0.0, 0.0, self.model.standing_z_force()]);
        for (ee, (sequence, durations)) in schedules.iter().enumerate() {
            let mut force = PhaseNodes::force(
                3,
                sequence,
                names::ee_force(ee),
                params.force_polys_per_stance_phase,
                self.model.force_limit(),
            )?;
            force.initialize_variables(&standing, &standing, durations)?;
            vars.add_component(force)?;
            vars.register_observer(&names::ee_schedule(ee), &names::ee_force(ee))?;
        }

        debug!(
            variables = vars.rows(),
            components = vars.ids().len(),
            "variables built"
        );
        Ok(vars)
    }

    fn add_base(&self, vars: &mut Composite, durations: &[f64]) -> Result<()> {
        let params = &self.params;
        let linear = (names::BASE_LINEAR, &self.initial_base.lin, &self.final_base.lin, &[X, Y][..]);
        let angular = (
            names::BASE_ANGULAR,
            &self.initial_base.ang,
            &self.final_base.ang,
            &params.angular_final_dims[..],
        );
        for (id, initial, target, final_pos_dims) in [linear, angular] {
            match params.base_representation {
                BaseRepresentation::CubicHermite => {
                    base::add_node_spline(vars, id, initial, target, durations, final_pos_dims)?;
                }
                BaseRepresentation::PolyCoeff => {
                    base::add_coeff_spline(
                        vars,
                        id,
                        params.order_coeff_polys,
                        initial,
                        target,
                        durations,
                        final_pos_dims,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Ask the factory for every configured constraint and cost.
    fn build_cost_constraints(
        &self,
        vars: &Composite,
    ) -> Result<(ConstraintComposite, CostComposite)> {
        let ctx = FactoryContext {
            params: &self.params,
            model: self.model.as_ref(),
            terrain: self.terrain.as_ref(),
            initial_base: &self.initial_base,
            final_base: &self.final_base,
            initial_ee: &self.initial_ee,
        };

        let mut constraints = ConstraintComposite::new("constraints");
        for &name in &self.params.constraints {
            constraints.add(self.factory.constraint(name, vars, &ctx)?);
        }
        if self.params.base_representation == BaseRepresentation::PolyCoeff {
            for id in [names::BASE_LINEAR, names::BASE_ANGULAR] {
                constraints.add(Box::new(TerminalStateConstraint::new(vars, id)?));
            }
            debug!("pinned coefficient base final state");
        }
        let mut costs = CostComposite::new("costs");
        for weight in &self.params.costs {
            costs.add(self.factory.cost(weight.name, vars, &ctx)?, weight.weight);
        }
        Ok((constraints, costs))
    }

    /// Resolve the solver, then assemble variables, constraints and costs.
    pub fn build_problem(&self) -> Result<Problem> {
        self.solvers.resolve(self.params.solver)?;

        let vars = self.build_variables()?;
        let (constraints, costs) = self.build_cost_constraints(&vars)?;
        let mut problem = Problem::new(vars);
        problem.set_constraints(constraints);
        problem.set_costs(costs);
        problem.log_summary();
        Ok(problem)
    }

    /// Build and solve with the configured backend.
    pub fn solve(&self) -> Result<Solution> {
        let mut problem = self.build_problem()?;
        let report = self.solvers.solve(self.params.solver, &mut problem)?;
        info!(
            iterations = report.iterations,
            elapsed_ms = report.solve_time.as_secs_f64() * 1e3,
            "motion optimization finished"
        );
        Ok(Solution { problem, report })
    }

    /// One sampled trajectory per recorded iterate of `problem`.
    pub fn trajectories(
        &self,
        problem: &Problem,
        dt: f64,
    ) -> Result<Vec<Vec<RobotStateCartesian>>> {
        sampler::trajectories(problem, dt)
    }
}

/// Base at rest at `p` with zero orientation.
pub fn base_at(p: Vector3<f64>) -> BaseState {
    BaseState {
        lin: StateLin3d::at_rest(p),
        ang: StateLin3d::default(),
    }
}

#[cfg(test)]
mod tests {
    use stride_core::config::{ContactTiming, NlpSolver};
    use stride_core::model::{MonopedModel, QuadrupedModel};
    use stride_core::StrideError;

    use super::*;

    fn monoped_params() -> OptimizationParameters {
        OptimizationParameters {
            contact_timings: vec![ContactTiming::stance(1.0)],
            ..OptimizationParameters::default()
        }
    }

    #[test]
    fn default_start_puts_feet_on_ground() {
        let opt = MotionOptimizer::new(monoped_params(), Arc::new(MonopedModel::default())).unwrap();
        assert!((opt.initial_base().lin.p.z - 0.58).abs() < 1e-12);
        assert_eq!(opt.initial_ee()[0].z, 0.0);
        assert_eq!(opt.final_base(), opt.initial_base());
    }

    #[test]
    fn terrain_sets_foot_height() {
        let opt = MotionOptimizer::new(monoped_params(), Arc::new(MonopedModel::default()))
            .unwrap()
            .with_terrain(Arc::new(FlatGround::new(0.1)));
        assert!((opt.initial_ee()[0].z - 0.1).abs() < 1e-12);
    }

    #[test]
    fn missing_timing_rejected() {
        let err = MotionOptimizer::new(monoped_params(), Arc::new(QuadrupedModel::default()))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            StrideError::Config(ConfigError::MissingContactTiming(1))
        ));
    }

    #[test]
    fn unsupported_solver_fails_before_building() {
        let params = OptimizationParameters {
            solver: NlpSolver::Ipopt,
            ..monoped_params()
        };
        let opt = MotionOptimizer::new(params, Arc::new(MonopedModel::default())).unwrap();
        assert!(matches!(
            opt.build_problem(),
            Err(StrideError::Config(ConfigError::UnsupportedSolver(_)))
        ));
    }

    #[test]
    fn mismatched_timing_rejected() {
        let params = OptimizationParameters {
            contact_timings: vec![ContactTiming::stance(1.0), ContactTiming::stance(0.8)],
            ..OptimizationParameters::default()
        };
        let model = MonopedModel::default();
        struct TwoLegs(MonopedModel);
        impl RobotModel for TwoLegs {
            fn ee_count(&self) -> usize {
                2
            }
            fn nominal_stance_in_base(&self) -> Vec<Vector3<f64>> {
                vec![self.0.nominal_stance_in_base()[0]; 2]
            }
            fn force_limit(&self) -> f64 {
                self.0.force_limit()
            }
            fn standing_z_force(&self) -> f64 {
                self.0.standing_z_force() / 2.0
            }
            fn name(&self) -> &str {
                "two legs"
            }
        }
        let opt = MotionOptimizer::new(params, Arc::new(TwoLegs(model))).unwrap();
        assert!(matches!(
            opt.build_variables(),
            Err(StrideError::Consistency(ConsistencyError::TotalDurationMismatch { .. }))
        ));
    }

    #[test]
    fn schedules_informational_unless_timings_optimized() {
        let opt = MotionOptimizer::new(monoped_params(), Arc::new(MonopedModel::default())).unwrap();
        let vars = opt.build_variables().unwrap();
        assert!(vars
            .informational_components()
            .iter()
            .any(|c| c.id() == names::ee_schedule(0)));

        let params = OptimizationParameters {
            optimize_timings: true,
            ..monoped_params()
        };
        let opt = MotionOptimizer::new(params, Arc::new(MonopedModel::default())).unwrap();
        let timed = opt.build_variables().unwrap();
        assert_eq!(timed.rows(), vars.rows() + 1);
    }
}
