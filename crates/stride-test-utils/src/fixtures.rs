//! Ready-made robots and configurations.

use nalgebra::Vector3;
use stride_core::config::{ContactTiming, CostName, CostWeight, OptimizationParameters};
use stride_core::model::MonopedModel;
use stride_core::types::{BaseState, StateLin3d};

/// Monoped whose foot sits at `(0.3, 0.2, 0)` in the base frame.
pub fn monoped_model() -> MonopedModel {
    MonopedModel::new(Vector3::new(0.3, 0.2, 0.0), 20.0, 10_000.0)
}

/// One stance phase of one second, hermite base, initial-guess solver.
pub fn monoped_params() -> OptimizationParameters {
    OptimizationParameters {
        contact_timings: vec![ContactTiming::stance(1.0)],
        max_phase_duration: 2.0,
        costs: vec![CostWeight {
            name: CostName::ForceRegularization,
            weight: 1e-3,
        }],
        ..OptimizationParameters::default()
    }
}

/// Quadruped trot with every phase duration a decision variable.
pub fn quadruped_params() -> OptimizationParameters {
    OptimizationParameters {
        optimize_timings: true,
        ..OptimizationParameters::default()
    }
}

/// Base at rest at `(x, 0, z)`.
pub fn walk_base(x: f64, z: f64) -> BaseState {
    BaseState {
        lin: StateLin3d::at_rest(Vector3::new(x, 0.0, z)),
        ang: StateLin3d::default(),
    }
}

#[cfg(test)]
mod tests {
    use stride_core::model::RobotModel;

    use super::*;

    #[test]
    fn fixtures_validate() {
        assert!(monoped_params().validate().is_ok());
        assert!(quadruped_params().validate().is_ok());
        assert_eq!(monoped_model().ee_count(), 1);
    }
}
