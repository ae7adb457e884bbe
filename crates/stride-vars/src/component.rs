//! Capability-tagged components stored in a [`Composite`].
//!
//! Every child of the tree is a [`Component`]. Typed access goes through
//! [`ComponentKind`], which fails with [`ComponentError::TypeMismatch`] when an
//! identifier refers to a component of another kind.

use nalgebra::DVector;
use stride_core::error::Result;

use crate::bounds::Bounds;
use crate::coeff_spline::CoeffSpline;
use crate::composite::Composite;
use crate::nodes::NodeValues;
use crate::phase_nodes::PhaseNodes;
use crate::polynomial::PolynomialVars;
use crate::schedule::ContactSchedule;

/// Something that can be flattened into, and scattered from, a decision vector.
pub trait VariableSet {
    /// Identifier, unique within a tree.
    fn id(&self) -> &str;

    /// Number of decision variables.
    fn rows(&self) -> usize;

    /// Current values in decision-vector order.
    fn values(&self) -> DVector<f64>;

    /// Overwrite all values. `x.len()` must equal [`rows`](Self::rows).
    fn set_values(&mut self, x: &DVector<f64>) -> Result<()>;

    /// One bound per decision variable.
    fn bounds(&self) -> Vec<Bounds>;
}

/// A child of the variable tree.
#[derive(Clone, Debug)]
pub enum Component {
    Schedule(ContactSchedule),
    /// Free node spline (base trajectory, cubic Hermite representation).
    Nodes(NodeValues),
    /// Phase-based end-effector motion or force nodes.
    PhaseNodes(PhaseNodes),
    /// One coefficient polynomial segment.
    Polynomial(PolynomialVars),
    /// Segment index over coefficient polynomials stored elsewhere in the tree.
    CoeffSpline(CoeffSpline),
    /// Nested subtree.
    Group(Composite),
}

impl Component {
    /// Human-readable kind, used in errors and summaries.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Schedule(_) => ContactSchedule::KIND,
            Self::Nodes(_) => NodeValues::KIND,
            Self::PhaseNodes(_) => PhaseNodes::KIND,
            Self::Polynomial(_) => PolynomialVars::KIND,
            Self::CoeffSpline(_) => CoeffSpline::KIND,
            Self::Group(_) => Composite::KIND,
        }
    }

    fn as_set(&self) -> &dyn VariableSet {
        match self {
            Self::Schedule(c) => c,
            Self::Nodes(c) => c,
            Self::PhaseNodes(c) => c,
            Self::Polynomial(c) => c,
            Self::CoeffSpline(c) => c,
            Self::Group(c) => c,
        }
    }

    fn as_set_mut(&mut self) -> &mut dyn VariableSet {
        match self {
            Self::Schedule(c) => c,
            Self::Nodes(c) => c,
            Self::PhaseNodes(c) => c,
            Self::Polynomial(c) => c,
            Self::CoeffSpline(c) => c,
            Self::Group(c) => c,
        }
    }
}

impl VariableSet for Component {
    fn id(&self) -> &str {
        self.as_set().id()
    }

    fn rows(&self) -> usize {
        self.as_set().rows()
    }

    fn values(&self) -> DVector<f64> {
        self.as_set().values()
    }

    fn set_values(&mut self, x: &DVector<f64>) -> Result<()> {
        self.as_set_mut().set_values(x)
    }

    fn bounds(&self) -> Vec<Bounds> {
        self.as_set().bounds()
    }
}

/// Typed view of a [`Component`] variant.
pub trait ComponentKind: Sized {
    /// Kind name reported in type-mismatch errors.
    const KIND: &'static str;

    fn from_component(component: &Component) -> Option<&Self>;

    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;
}

macro_rules! component_kind {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl ComponentKind for $ty {
            const KIND: &'static str = $kind;

            fn from_component(component: &Component) -> Option<&Self> {
                match component {
                    Component::$variant(c) => Some(c),
                    _ => None,
                }
            }

            fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                match component {
                    Component::$variant(c) => Some(c),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Component {
            fn from(c: $ty) -> Self {
                Component::$variant(c)
            }
        }
    };
}

component_kind!(ContactSchedule, Schedule, "contact schedule");
component_kind!(NodeValues, Nodes, "node spline");
component_kind!(PhaseNodes, PhaseNodes, "phase nodes");
component_kind!(PolynomialVars, Polynomial, "polynomial");
component_kind!(CoeffSpline, CoeffSpline, "coefficient spline");
component_kind!(Composite, Group, "composite");
