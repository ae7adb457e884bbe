//! End-effector motion and force node sets whose nodes sit on phase
//! boundaries of a contact schedule.

use nalgebra::DVector;
use stride_core::error::{BoundsError, ConsistencyError, Result};
use stride_core::types::{Derivative, StateLinXd};
use tracing::debug;

use crate::bounds::Bounds;
use crate::component::VariableSet;
use crate::nodes::{Node, NodeValues};

/// What a phase node set parameterizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseNodesKind {
    /// Foot position, held constant while in contact.
    Motion,
    /// Contact force, held constant while in swing.
    Force,
}

#[derive(Clone, Debug)]
pub struct PhaseNodes {
    kind: PhaseNodesKind,
    contact_sequence: Vec<bool>,
    /// Polynomials spanning each phase.
    polys_per_phase: Vec<usize>,
    spline: NodeValues,
    force_limit: Option<f64>,
    /// Phase durations last applied, empty before the first.
    last_phase_durations: Vec<f64>,
}

impl PhaseNodes {
    /// Foot-motion nodes: one constant polynomial per contact phase and
    /// `polys_per_swing` free polynomials per swing phase.
    pub fn motion(
        n_dim: usize,
        contact_sequence: &[bool],
        id: impl Into<String>,
        polys_per_swing: usize,
    ) -> Self {
        Self::build(
            PhaseNodesKind::Motion,
            n_dim,
            contact_sequence,
            id.into(),
            polys_per_swing.max(1),
            None,
        )
    }

    /// Force nodes: `polys_per_stance` free polynomials per contact phase and
    /// one constant polynomial per swing phase. Every value is bounded by
    /// `±max_force`.
    pub fn force(
        n_dim: usize,
        contact_sequence: &[bool],
        id: impl Into<String>,
        polys_per_stance: usize,
        max_force: f64,
    ) -> Result<Self> {
        let bound = Bounds::new(-max_force, max_force)?;
        let mut nodes = Self::build(
            PhaseNodesKind::Force,
            n_dim,
            contact_sequence,
            id.into(),
            polys_per_stance.max(1),
            Some(max_force),
        );
        nodes.spline.bound_all(Derivative::Pos, bound);
        Ok(nodes)
    }

    fn build(
        kind: PhaseNodesKind,
        n_dim: usize,
        contact_sequence: &[bool],
        id: String,
        polys_when_free: usize,
        force_limit: Option<f64>,
    ) -> Self {
        let held_in_contact = kind == PhaseNodesKind::Motion;
        let mut polys_per_phase = Vec::with_capacity(contact_sequence.len());
        let mut constant_polys = Vec::new();
        for &in_contact in contact_sequence {
            if in_contact == held_in_contact {
                polys_per_phase.push(1);
                constant_polys.push(true);
            } else {
                polys_per_phase.push(polys_when_free);
                constant_polys.extend(std::iter::repeat_n(false, polys_when_free));
            }
        }

        Self {
            kind,
            contact_sequence: contact_sequence.to_vec(),
            polys_per_phase,
            spline: NodeValues::with_constant_polys(n_dim, &constant_polys, id),
            force_limit,
            last_phase_durations: Vec::new(),
        }
    }

    pub fn kind(&self) -> PhaseNodesKind {
        self.kind
    }

    pub fn contact_sequence(&self) -> &[bool] {
        &self.contact_sequence
    }

    pub fn phase_count(&self) -> usize {
        self.contact_sequence.len()
    }

    /// Underlying node spline.
    pub fn spline(&self) -> &NodeValues {
        &self.spline
    }

    pub fn nodes(&self) -> &[Node] {
        self.spline.nodes()
    }

    pub fn node_count(&self) -> usize {
        self.spline.node_count()
    }

    pub fn node_times(&self) -> Vec<f64> {
        self.spline.node_times()
    }

    /// Phase durations last received.
    pub fn phase_durations(&self) -> &[f64] {
        &self.last_phase_durations
    }

    pub fn total_duration(&self) -> f64 {
        self.spline.total_duration()
    }

    /// Seed nodes between `start` and `end` over the given phase durations.
    pub fn initialize_variables(
        &mut self,
        start: &DVector<f64>,
        end: &DVector<f64>,
        phase_durations: &[f64],
    ) -> Result<()> {
        if let Some(limit) = self.force_limit {
            for value in start.iter().chain(end.iter()) {
                if value.abs() > limit {
                    return Err(BoundsError::ForceLimit {
                        id: self.spline.id().to_owned(),
                        value: *value,
                        limit,
                    }
                    .into());
                }
            }
        }
        let poly_durations = self.poly_durations(phase_durations)?;
        self.spline
            .initialize_variables(start, end, &poly_durations)?;
        self.last_phase_durations = phase_durations.to_vec();
        Ok(())
    }

    pub fn add_start_bound(&mut self, deriv: Derivative, dims: &[usize], values: &[f64]) -> Result<()> {
        self.spline.add_start_bound(deriv, dims, values)
    }

    pub fn add_final_bound(&mut self, deriv: Derivative, dims: &[usize], values: &[f64]) -> Result<()> {
        self.spline.add_final_bound(deriv, dims, values)
    }

    /// Value (and derivatives) at global time `t`.
    pub fn point_at(&self, t: f64) -> Result<StateLinXd> {
        self.spline.point_at(t)
    }

    /// Re-place the nodes in time after the owning schedule changed.
    ///
    /// Returns whether anything moved. The node count is never changed.
    pub(crate) fn on_durations_changed(&mut self, phase_durations: &[f64]) -> Result<bool> {
        if self.last_phase_durations == phase_durations {
            return Ok(false);
        }
        let poly_durations = self.poly_durations(phase_durations)?;
        self.spline.set_poly_durations(&poly_durations)?;
        self.last_phase_durations = phase_durations.to_vec();
        debug!(id = self.spline.id(), ?phase_durations, "phase nodes re-timed");
        Ok(true)
    }

    /// Split every phase evenly among its polynomials.
    #[allow(clippy::cast_precision_loss)]
    fn poly_durations(&self, phase_durations: &[f64]) -> Result<Vec<f64>> {
        if phase_durations.len() != self.polys_per_phase.len() {
            return Err(ConsistencyError::PhaseCountMismatch {
                id: self.spline.id().to_owned(),
                expected: self.polys_per_phase.len(),
                got: phase_durations.len(),
            }
            .into());
        }
        Ok(phase_durations
            .iter()
            .zip(&self.polys_per_phase)
            .flat_map(|(&d, &n)| std::iter::repeat_n(d / n as f64, n))
            .collect())
    }
}

impl VariableSet for PhaseNodes {
    fn id(&self) -> &str {
        self.spline.id()
    }

    fn rows(&self) -> usize {
        self.spline.rows()
    }

    fn values(&self) -> DVector<f64> {
        self.spline.values()
    }

    fn set_values(&mut self, x: &DVector<f64>) -> Result<()> {
        self.spline.set_values(x)
    }

    fn bounds(&self) -> Vec<Bounds> {
        self.spline.bounds()
    }
}

#[cfg(test)]
mod tests {
    use stride_core::StrideError;

    use super::*;
    use crate::bounds::NO_BOUND;

    fn v(values: &[f64]) -> DVector<f64> {
        DVector::from_row_slice(values)
    }

    #[test]
    fn motion_structure_follows_contact_sequence() {
        let nodes = PhaseNodes::motion(2, &[true, false, true], "ee_motion_xy_0", 2);
        // stance, two swing polys, stance
        assert_eq!(nodes.node_count(), 5);
        // shared stance positions at both ends, swing boundary positions
        // and the free mid-swing node
        assert_eq!(nodes.rows(), 2 * 2 + 2 * 2);
        assert_eq!(nodes.kind(), PhaseNodesKind::Motion);
    }

    #[test]
    fn force_structure_and_bounds() {
        let nodes = PhaseNodes::force(3, &[true, false], "ee_force_0", 3, 100.0).unwrap();
        assert_eq!(nodes.node_count(), 5);
        let b = nodes.bounds();
        let pos = nodes.spline().index(0, Derivative::Pos, 2).unwrap();
        let vel = nodes.spline().index(1, Derivative::Vel, 2).unwrap();
        assert_eq!(b[pos], Bounds::symmetric(100.0));
        assert_eq!(b[vel], NO_BOUND);
    }

    #[test]
    fn negative_force_limit_rejected() {
        assert!(PhaseNodes::force(3, &[true], "f", 1, -1.0).is_err());
    }

    #[test]
    fn initial_force_over_limit_rejected() {
        let mut nodes = PhaseNodes::force(3, &[true], "f", 2, 100.0).unwrap();
        let f = v(&[0.0, 0.0, 150.0]);
        let err = nodes.initialize_variables(&f, &f, &[1.0]).unwrap_err();
        assert!(matches!(err, StrideError::Bounds(BoundsError::ForceLimit { .. })));
    }

    #[test]
    fn single_stance_holds_start_value() {
        let mut nodes = PhaseNodes::motion(2, &[true], "xy", 1);
        nodes
            .initialize_variables(&v(&[0.3, 0.2]), &v(&[1.3, 0.2]), &[1.0])
            .unwrap();
        nodes.add_start_bound(Derivative::Pos, &[0, 1], &[0.3, 0.2]).unwrap();
        for t in [0.0, 0.5, 1.0] {
            assert!((nodes.point_at(t).unwrap().p - v(&[0.3, 0.2])).norm() < 1e-12);
        }
    }

    #[test]
    fn rescaling_preserves_node_count() {
        let mut nodes = PhaseNodes::motion(1, &[true, false, true], "z", 2);
        nodes
            .initialize_variables(&v(&[0.0]), &v(&[0.0]), &[0.4, 0.2, 0.4])
            .unwrap();
        let before = nodes.node_times();
        assert!(nodes.on_durations_changed(&[0.8, 0.4, 0.8]).unwrap());
        let after = nodes.node_times();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            assert!((2.0 * b - a).abs() < 1e-12);
        }
        assert!(!nodes.on_durations_changed(&[0.8, 0.4, 0.8]).unwrap());
    }

    #[test]
    fn wrong_phase_count_rejected() {
        let mut nodes = PhaseNodes::motion(1, &[true, false], "z", 1);
        assert!(nodes.on_durations_changed(&[1.0]).is_err());
        assert!(nodes
            .initialize_variables(&v(&[0.0]), &v(&[0.0]), &[0.5, 0.2, 0.3])
            .is_err());
    }
}
