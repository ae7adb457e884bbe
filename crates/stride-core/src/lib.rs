// stride-core: errors, configuration, state types and robot/terrain interfaces for stride.

pub mod angular;
pub mod config;
pub mod error;
pub mod model;
pub mod terrain;
pub mod time;
pub mod types;

pub use error::{Result, StrideError};

pub mod prelude {
    pub use crate::config::{
        BaseRepresentation, ConstraintName, ContactTiming, CostName, CostWeight, NlpSolver,
        OptimizationParameters,
    };
    pub use crate::error::{
        BoundsError, ComponentError, ConfigError, ConsistencyError, RangeError, Result,
        SolverError, StrideError,
    };
    pub use crate::model::{MonopedModel, QuadrupedModel, RobotModel};
    pub use crate::terrain::{FlatGround, HeightMap};
    pub use crate::types::{
        BaseState, BaseStateCartesian, Derivative, RobotStateCartesian, StateAng3d, StateLin3d,
        StateLinXd, DIM_3D, X, Y, Z,
    };
}
