//! Integration test: assemble, solve and sample whole motion problems.
//!
//! Covers a monoped standing through one stance phase while its base moves
//! one meter forward, a trotting quadruped with optimized phase durations,
//! and the configuration failures that must stop assembly early.

use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra::Vector3;
use stride_core::config::{BaseRepresentation, ConstraintName, NlpSolver, OptimizationParameters};
use stride_core::error::{ConfigError, SolverError};
use stride_core::model::{QuadrupedModel, RobotModel};
use stride_core::StrideError;
use stride_planner::sampler;
use stride_planner::MotionOptimizer;
use stride_test_utils::{
    deterministic_vec, monoped_model, monoped_params, quadruped_params, walk_base, FailingBackend,
    ScriptedBackend,
};
use stride_vars::{names, ContactSchedule, PhaseNodes, VariableSet};

fn monoped_walk(params: OptimizationParameters) -> MotionOptimizer {
    let mut opt = MotionOptimizer::new(params, Arc::new(monoped_model())).unwrap();
    opt.set_initial_base(walk_base(0.0, 0.5));
    opt.set_final_base(walk_base(1.0, 0.5));
    opt
}

// ---------------------------------------------------------------------------
// Monoped
// ---------------------------------------------------------------------------

#[test]
fn monoped_stands_while_base_moves() {
    let opt = monoped_walk(monoped_params());
    assert_eq!(opt.initial_ee()[0], Vector3::new(0.3, 0.2, 0.0));

    let solution = opt.solve().unwrap();
    assert_eq!(solution.report.iterations, 1);

    let trajectories = opt.trajectories(&solution.problem, 0.5).unwrap();
    assert_eq!(trajectories.len(), 1);
    let states = &trajectories[0];
    assert_eq!(states.len(), 3);

    for (state, t) in states.iter().zip([0.0, 0.5, 1.0]) {
        assert_relative_eq!(state.t_global, t);
        assert!(state.ee_contact[0]);
        assert_relative_eq!(state.ee_motion[0].p.x, 0.3, epsilon = 1e-9);
        assert_relative_eq!(state.ee_motion[0].p.y, 0.2, epsilon = 1e-9);
        assert_relative_eq!(state.ee_motion[0].p.z, 0.0, epsilon = 1e-9);
        assert_relative_eq!(state.base.lin.p.z, 0.5, epsilon = 1e-9);
        assert_relative_eq!(state.ee_forces[0].z, 20.0 * 9.81, epsilon = 1e-9);
    }
    assert_relative_eq!(states[0].base.lin.p.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(states[2].base.lin.p.x, 1.0, epsilon = 1e-9);
}

#[test]
fn off_grid_step_adds_final_sample() {
    let opt = monoped_walk(monoped_params());
    let solution = opt.solve().unwrap();
    let states = &opt.trajectories(&solution.problem, 0.3).unwrap()[0];
    assert_eq!(states.len(), 5);
    assert_relative_eq!(states[3].t_global, 0.9, epsilon = 1e-9);
    assert_relative_eq!(states[4].t_global, 1.0);
}

#[test]
fn base_starts_at_initial_state() {
    for representation in [BaseRepresentation::CubicHermite, BaseRepresentation::PolyCoeff] {
        let params = OptimizationParameters {
            base_representation: representation,
            ..monoped_params()
        };
        let vars = monoped_walk(params).build_variables().unwrap();
        let start = vars.spline(names::BASE_LINEAR).unwrap().point_at(0.0).unwrap();
        assert_relative_eq!(start.p[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(start.p[2], 0.5, epsilon = 1e-12);
        assert_relative_eq!(start.v.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(sampler::horizon(&vars).unwrap(), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn coefficient_base_is_sampled() {
    let params = OptimizationParameters {
        base_representation: BaseRepresentation::PolyCoeff,
        ..monoped_params()
    };
    let opt = monoped_walk(params);
    let vars = opt.build_variables().unwrap();
    // Five base segments per axis group, each an order-4 polynomial in 3-D.
    assert!(vars.contains(&names::segment(names::BASE_LINEAR, 4)));
    assert!(!vars.contains(&names::segment(names::BASE_LINEAR, 5)));

    let solution = opt.solve().unwrap();
    let states = &opt.trajectories(&solution.problem, 0.1).unwrap()[0];
    assert_eq!(states.len(), 11);
    assert_relative_eq!(states[0].base.lin.p.z, 0.5, epsilon = 1e-12);
}

#[test]
fn coefficient_base_reaches_final_state() {
    let params = OptimizationParameters {
        base_representation: BaseRepresentation::PolyCoeff,
        ..monoped_params()
    };
    let opt = monoped_walk(params);
    let solution = opt.solve().unwrap();
    assert!(solution.report.max_violation < 1e-9);

    let states = &opt.trajectories(&solution.problem, 0.1).unwrap()[0];
    let last = states.last().unwrap();
    assert_relative_eq!(last.t_global, 1.0);
    assert_relative_eq!(last.base.lin.v.norm(), 0.0, epsilon = 1e-9);
    assert_relative_eq!(last.base.lin.p.x, 1.0, epsilon = 1e-9);
    assert_relative_eq!(last.base.lin.p.y, 0.0, epsilon = 1e-9);

    // Linear and angular final states are both constrained.
    let sets = solution.problem.constraints().names();
    assert_eq!(sets.iter().filter(|&&n| n == "terminal_state").count(), 2);
}

#[test]
fn coefficient_base_final_velocity_is_enforced() {
    let params = OptimizationParameters {
        base_representation: BaseRepresentation::PolyCoeff,
        ..monoped_params()
    };
    let mut problem = monoped_walk(params).build_problem().unwrap();
    assert!(problem.max_violation().unwrap() < 1e-9);

    // A last segment still moving at the mean rate violates the final state.
    let last = names::segment(names::BASE_LINEAR, 4);
    let offset: usize = problem
        .variables()
        .decision_components()
        .iter()
        .take_while(|c| c.id() != last)
        .map(VariableSet::rows)
        .sum();
    // Quadratic and cubic coefficients, three dimensions each.
    let mut x = problem.current_values();
    x.rows_mut(offset + 2 * 3, 2 * 3).fill(0.0);
    problem.set_variables(&x).unwrap();
    assert_relative_eq!(problem.max_violation().unwrap(), 1.0, epsilon = 1e-9);
}

#[test]
fn perturbed_tree_scatters_back() {
    for (params, model) in [
        (monoped_params(), Arc::new(monoped_model()) as Arc<dyn RobotModel>),
        (quadruped_params(), Arc::new(QuadrupedModel::default()) as Arc<dyn RobotModel>),
    ] {
        let mut vars = MotionOptimizer::new(params, model)
            .unwrap()
            .build_variables()
            .unwrap();
        let x = vars.flatten() + deterministic_vec(vars.rows(), 11) * 0.01;
        vars.scatter(&x).unwrap();
        assert_eq!(vars.flatten(), x);

        // Optimized foot timings reach the nodes that depend on them.
        let durations = vars
            .get::<ContactSchedule>(&names::ee_schedule(0))
            .unwrap()
            .phase_durations()
            .to_vec();
        let force = vars.get::<PhaseNodes>(&names::ee_force(0)).unwrap();
        assert_eq!(force.phase_durations(), &durations[..]);
    }
}

#[test]
fn every_iterate_is_sampled() {
    let params = OptimizationParameters {
        solver: NlpSolver::Ipopt,
        ..monoped_params()
    };
    let mut opt = monoped_walk(params);
    let n = opt.build_variables().unwrap().rows();
    opt.register_solver(Box::new(ScriptedBackend::repeating(NlpSolver::Ipopt, 3, n)));

    let solution = opt.solve().unwrap();
    assert_eq!(solution.problem.iterate_count(), 3);
    let trajectories = opt.trajectories(&solution.problem, 0.25).unwrap();
    assert_eq!(trajectories.len(), 3);
    assert!(trajectories.iter().all(|states| states.len() == 5));
    assert_eq!(trajectories[0], trajectories[2]);
}

#[test]
fn shipped_configs_build() {
    let monoped =
        OptimizationParameters::from_toml_str(include_str!("../../../configs/monoped.toml")).unwrap();
    assert_eq!(monoped.contact_timings.len(), 1);
    let opt = monoped_walk(monoped);
    assert_eq!(opt.build_problem().unwrap().costs().len(), 1);

    let trot = OptimizationParameters::from_toml_str(include_str!(
        "../../../configs/quadruped_trot.toml"
    ))
    .unwrap();
    assert_eq!(trot.base_representation, BaseRepresentation::PolyCoeff);
    let opt = MotionOptimizer::new(trot, Arc::new(QuadrupedModel::default())).unwrap();
    let solution = opt.solve().unwrap();
    assert_eq!(opt.trajectories(&solution.problem, 0.05).unwrap()[0].len(), 21);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn unsupported_solver_rejected_before_assembly() {
    let params = OptimizationParameters {
        solver: NlpSolver::Snopt,
        ..monoped_params()
    };
    let err = monoped_walk(params).build_problem().err().unwrap();
    assert!(matches!(
        err,
        StrideError::Config(ConfigError::UnsupportedSolver(ref name)) if name == "snopt"
    ));
}

#[test]
fn unsupported_constraint_rejected() {
    let params = OptimizationParameters {
        constraints: vec![ConstraintName::Dynamic],
        ..monoped_params()
    };
    assert!(matches!(
        monoped_walk(params).build_problem(),
        Err(StrideError::Config(ConfigError::UnsupportedConstraint(_)))
    ));
}

#[test]
fn unsupported_representation_in_config() {
    let toml = r#"
        base_representation = "bezier"
        solver = "initial_guess"

        [[contact_timings]]
        durations = [1.0]
    "#;
    assert!(OptimizationParameters::from_toml_str(toml).is_err());
    assert!(matches!(
        "bezier".parse::<BaseRepresentation>(),
        Err(ConfigError::UnsupportedBaseRepresentation(_))
    ));
}

#[test]
fn solver_failure_propagates() {
    let params = OptimizationParameters {
        solver: NlpSolver::Ipopt,
        ..monoped_params()
    };
    let mut opt = monoped_walk(params);
    opt.register_solver(Box::new(FailingBackend::new(NlpSolver::Ipopt)));
    assert!(matches!(
        opt.solve(),
        Err(StrideError::Solver(SolverError::Infeasible { .. }))
    ));
}

// ---------------------------------------------------------------------------
// Quadruped
// ---------------------------------------------------------------------------

#[test]
fn quadruped_trot_assembles_and_samples() {
    let opt = MotionOptimizer::new(quadruped_params(), Arc::new(QuadrupedModel::default())).unwrap();
    let vars = opt.build_variables().unwrap();
    assert_eq!(sampler::ee_count(&vars), 4);
    assert_relative_eq!(sampler::horizon(&vars).unwrap(), 1.0, epsilon = 1e-9);

    let solution = opt.solve().unwrap();
    let states = &opt.trajectories(&solution.problem, 0.1).unwrap()[0];
    assert_eq!(states.len(), 11);

    // Front-left swings during [0.2, 0.5], front-right during [0.5, 0.8].
    let state = sampler::state_at(solution.problem.variables(), 4, 0.35).unwrap();
    assert_eq!(state.ee_contact, vec![false, true, true, false]);
    let state = sampler::state_at(solution.problem.variables(), 4, 0.65).unwrap();
    assert_eq!(state.ee_contact, vec![true, false, false, true]);

    // Force nodes hold still through a swing phase.
    let vars = solution.problem.variables();
    let early = sampler::state_at(vars, 4, 0.25).unwrap();
    let late = sampler::state_at(vars, 4, 0.45).unwrap();
    assert_relative_eq!(early.ee_forces[0], late.ee_forces[0], epsilon = 1e-12);
    assert!(late.ee_forces[1].z > 0.0);
}

#[test]
fn rescheduling_moves_dependent_nodes() {
    let opt = MotionOptimizer::new(quadruped_params(), Arc::new(QuadrupedModel::default())).unwrap();
    let mut vars = opt.build_variables().unwrap();

    let schedule = names::ee_schedule(0);
    vars.set_phase_durations(&schedule, &[0.3, 0.2, 0.5]).unwrap();
    for id in [names::ee_motion_xy(0), names::ee_motion_z(0), names::ee_force(0)] {
        let nodes = vars.get::<PhaseNodes>(&id).unwrap();
        assert_eq!(nodes.phase_durations(), &[0.3, 0.2, 0.5]);
        assert_relative_eq!(nodes.total_duration(), 1.0, epsilon = 1e-12);
    }
    // Other end-effectors keep their timing.
    let other = vars.get::<PhaseNodes>(&names::ee_force(1)).unwrap();
    assert_eq!(other.phase_durations(), &[0.5, 0.3, 0.2]);
}

#[test]
fn optimized_timings_are_decision_variables() {
    let fixed = OptimizationParameters {
        optimize_timings: false,
        ..quadruped_params()
    };
    let model = Arc::new(QuadrupedModel::default());
    let with_timings = MotionOptimizer::new(quadruped_params(), model.clone())
        .unwrap()
        .build_variables()
        .unwrap();
    let without = MotionOptimizer::new(fixed, model)
        .unwrap()
        .build_variables()
        .unwrap();
    // Three phases per foot.
    assert_eq!(with_timings.rows(), without.rows() + 4 * 3);
}
