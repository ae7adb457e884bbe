//! Uniform time-indexed access to every trajectory stored in a tree.

use stride_core::error::Result;
use stride_core::types::StateLinXd;

use crate::coeff_spline::CoeffSplineView;
use crate::nodes::NodeValues;
use crate::phase_nodes::PhaseNodes;

/// Borrowed trajectory resolved from a [`Composite`](crate::Composite).
#[derive(Clone, Debug)]
pub enum SplineRef<'a> {
    Nodes(&'a NodeValues),
    PhaseNodes(&'a PhaseNodes),
    Coeff(CoeffSplineView<'a>),
}

impl SplineRef<'_> {
    pub fn point_at(&self, t: f64) -> Result<StateLinXd> {
        match self {
            Self::Nodes(s) => s.point_at(t),
            Self::PhaseNodes(s) => s.point_at(t),
            Self::Coeff(s) => s.point_at(t),
        }
    }

    pub fn total_duration(&self) -> f64 {
        match self {
            Self::Nodes(s) => s.total_duration(),
            Self::PhaseNodes(s) => s.total_duration(),
            Self::Coeff(s) => s.total_duration(),
        }
    }
}
