// stride-vars: the optimization-variable tree and everything stored in it.
//
// Contact schedules, phase-based end-effector node sets and the two base
// trajectory representations are all components of one `Composite`, which
// flattens them into (and scatters them from) the solver's decision vector.

pub mod base;
pub mod bounds;
pub mod coeff_spline;
pub mod component;
pub mod composite;
pub mod names;
pub mod nodes;
pub mod phase_nodes;
pub mod polynomial;
pub mod schedule;
pub mod spline;

pub use bounds::{Bounds, NO_BOUND};
pub use coeff_spline::{CoeffSpline, CoeffSplineView, TerminalConditions};
pub use component::{Component, ComponentKind, VariableSet};
pub use composite::Composite;
pub use nodes::{Node, NodeValueInfo, NodeValues};
pub use phase_nodes::{PhaseNodes, PhaseNodesKind};
pub use polynomial::{Polynomial, PolynomialVars};
pub use schedule::ContactSchedule;
pub use spline::SplineRef;
