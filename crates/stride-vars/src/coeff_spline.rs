//! Segmented coefficient-polynomial base trajectory.
//!
//! The decision variables live in one [`PolynomialVars`] per segment, stored
//! as separate components of the tree. A [`CoeffSpline`] is the informational
//! index over them: segment identifiers, fixed segment durations and the
//! boundary conditions that continuity constraints are built from. Continuity
//! between segments is not structural here.

use nalgebra::DVector;
use stride_core::error::{ConsistencyError, Result};
use stride_core::time;
use stride_core::types::{StateLin3d, StateLinXd};

use crate::bounds::Bounds;
use crate::component::VariableSet;
use crate::polynomial::PolynomialVars;

/// Start and end state of a base trajectory.
#[derive(Clone, Debug, PartialEq)]
pub struct TerminalConditions {
    pub initial: StateLin3d,
    pub target: StateLin3d,
    /// Axes whose final position is prescribed.
    pub final_pos_dims: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CoeffSpline {
    id: String,
    segment_ids: Vec<String>,
    durations: Vec<f64>,
    terminal: TerminalConditions,
}

impl CoeffSpline {
    pub fn new(
        id: impl Into<String>,
        segment_ids: Vec<String>,
        durations: Vec<f64>,
        terminal: TerminalConditions,
    ) -> Result<Self> {
        let id = id.into();
        if segment_ids.len() != durations.len() || durations.is_empty() {
            return Err(ConsistencyError::PhaseCountMismatch {
                id,
                expected: durations.len().max(1),
                got: segment_ids.len(),
            }
            .into());
        }
        Ok(Self {
            id,
            segment_ids,
            durations,
            terminal,
        })
    }

    pub fn segment_ids(&self) -> &[String] {
        &self.segment_ids
    }

    pub fn segment_durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn total_duration(&self) -> f64 {
        self.durations.iter().sum()
    }

    pub fn terminal(&self) -> &TerminalConditions {
        &self.terminal
    }
}

/// Segment polynomials are separate components; this holds no variables.
impl VariableSet for CoeffSpline {
    fn id(&self) -> &str {
        &self.id
    }

    fn rows(&self) -> usize {
        0
    }

    fn values(&self) -> DVector<f64> {
        DVector::zeros(0)
    }

    fn set_values(&mut self, x: &DVector<f64>) -> Result<()> {
        if x.is_empty() {
            Ok(())
        } else {
            Err(ConsistencyError::VectorLength {
                expected: 0,
                got: x.len(),
            }
            .into())
        }
    }

    fn bounds(&self) -> Vec<Bounds> {
        Vec::new()
    }
}

/// A coefficient spline resolved against the segments in its tree.
#[derive(Clone, Debug)]
pub struct CoeffSplineView<'a> {
    spline: &'a CoeffSpline,
    segments: Vec<&'a PolynomialVars>,
}

impl<'a> CoeffSplineView<'a> {
    pub(crate) fn new(spline: &'a CoeffSpline, segments: Vec<&'a PolynomialVars>) -> Self {
        Self { spline, segments }
    }

    pub fn spline(&self) -> &CoeffSpline {
        self.spline
    }

    pub fn total_duration(&self) -> f64 {
        self.spline.total_duration()
    }

    /// Evaluate the segment active at global time `t` in its local time.
    pub fn point_at(&self, t: f64) -> Result<StateLinXd> {
        let (segment, local) = time::locate(&self.spline.durations, t)?;
        Ok(self.segments[segment].poly().point_at(local))
    }
}
