//! Motion optimizer facade for legged robots.
//!
//! [`MotionOptimizer`] turns configuration, a robot model and initial/final
//! base states into an assembled [`Problem`](stride_nlp::Problem), hands it to
//! the selected solver backend and samples every recorded iterate into
//! time-indexed robot states.

pub mod facade;
pub mod factory;
pub mod sampler;

pub use facade::{base_at, MotionOptimizer, Solution};
pub use factory::{
    CostConstraintFactory, DefaultFactory, FactoryContext, ForceRegularization,
    TerminalStateConstraint, TotalTimeConstraint,
};
pub use sampler::{build_trajectory, state_at, SampleTimes};

pub mod prelude {
    pub use crate::{base_at, MotionOptimizer, SampleTimes, Solution};
    pub use stride_core::prelude::*;
    pub use stride_nlp::{Problem, SolveReport, SolverBackend};
}
