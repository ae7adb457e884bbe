//! Node splines: piecewise cubic Hermite curves defined by node values.
//!
//! Each node holds a position (or force value) and its first derivative. The
//! curve between consecutive nodes is the cubic Hermite polynomial through
//! them, so continuity of value and derivative is structural.
//!
//! Node values map onto decision variables through an index map. Usually
//! every node value is its own variable; polynomials marked *constant* (a
//! stance phase of a foot, a swing phase of a force) instead share one set of
//! position variables between their two nodes and keep both derivatives at a
//! fixed zero that never enters the decision vector.

use std::collections::HashMap;

use nalgebra::DVector;
use stride_core::error::{BoundsError, ConsistencyError, Result};
use stride_core::time;
use stride_core::types::{Derivative, StateLinXd};

use crate::bounds::{Bounds, NO_BOUND};
use crate::component::VariableSet;
use crate::polynomial::hermite_point;

/// Address of one scalar node value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeValueInfo {
    pub node: usize,
    pub deriv: Derivative,
    pub dim: usize,
}

impl NodeValueInfo {
    pub const fn new(node: usize, deriv: Derivative, dim: usize) -> Self {
        Self { node, deriv, dim }
    }
}

/// Value and first derivative at a polynomial boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub p: DVector<f64>,
    pub v: DVector<f64>,
}

impl Node {
    fn zeros(n_dim: usize) -> Self {
        Self {
            p: DVector::zeros(n_dim),
            v: DVector::zeros(n_dim),
        }
    }

    pub fn at(&self, deriv: Derivative) -> &DVector<f64> {
        match deriv {
            Derivative::Pos => &self.p,
            Derivative::Vel => &self.v,
        }
    }

    fn at_mut(&mut self, deriv: Derivative) -> &mut DVector<f64> {
        match deriv {
            Derivative::Pos => &mut self.p,
            Derivative::Vel => &mut self.v,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NodeValues {
    id: String,
    n_dim: usize,
    nodes: Vec<Node>,
    durations: Vec<f64>,
    /// Node values written by each decision variable.
    index_map: Vec<Vec<NodeValueInfo>>,
    lookup: HashMap<NodeValueInfo, usize>,
    bounds: Vec<Bounds>,
}

impl NodeValues {
    /// Spline of `n_polys` polynomials whose node values are all free.
    ///
    /// Every polynomial lasts one second until durations are assigned.
    pub fn new(n_dim: usize, n_polys: usize, id: impl Into<String>) -> Self {
        Self::with_constant_polys(n_dim, &vec![false; n_polys.max(1)], id)
    }

    /// Spline whose polynomials flagged in `constant_polys` hold their value.
    pub(crate) fn with_constant_polys(
        n_dim: usize,
        constant_polys: &[bool],
        id: impl Into<String>,
    ) -> Self {
        let free = [false];
        let constant_polys = if constant_polys.is_empty() {
            &free[..]
        } else {
            constant_polys
        };
        let n_nodes = constant_polys.len() + 1;

        let mut spline = Self {
            id: id.into(),
            n_dim,
            nodes: vec![Node::zeros(n_dim); n_nodes],
            durations: vec![1.0; n_nodes - 1],
            index_map: Vec::new(),
            lookup: HashMap::new(),
            bounds: Vec::new(),
        };

        for node in 0..n_nodes {
            let after_constant = node > 0 && constant_polys[node - 1];
            let before_constant = node < constant_polys.len() && constant_polys[node];

            for dim in 0..n_dim {
                let shared = if after_constant {
                    spline.index(node - 1, Derivative::Pos, dim)
                } else {
                    None
                };
                spline.assign(NodeValueInfo::new(node, Derivative::Pos, dim), shared);
            }
            if !(after_constant || before_constant) {
                for dim in 0..n_dim {
                    spline.assign(NodeValueInfo::new(node, Derivative::Vel, dim), None);
                }
            }
        }
        spline.bounds = vec![NO_BOUND; spline.index_map.len()];
        spline
    }

    /// Map `info` onto variable `shared`, or onto a new variable.
    fn assign(&mut self, info: NodeValueInfo, shared: Option<usize>) {
        let idx = shared.unwrap_or_else(|| {
            self.index_map.push(Vec::new());
            self.index_map.len() - 1
        });
        self.index_map[idx].push(info);
        self.lookup.insert(info, idx);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn n_dim(&self) -> usize {
        self.n_dim
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn poly_count(&self) -> usize {
        self.durations.len()
    }

    pub fn poly_durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn total_duration(&self) -> f64 {
        self.durations.iter().sum()
    }

    /// Global time of every node, starting at zero.
    pub fn node_times(&self) -> Vec<f64> {
        let mut t = 0.0;
        let mut times = Vec::with_capacity(self.nodes.len());
        times.push(t);
        for d in &self.durations {
            t += d;
            times.push(t);
        }
        times
    }

    /// Decision-variable index of a node value, `None` if it is held fixed.
    pub fn index(&self, node: usize, deriv: Derivative, dim: usize) -> Option<usize> {
        self.lookup
            .get(&NodeValueInfo::new(node, deriv, dim))
            .copied()
    }

    /// Node values written by decision variable `idx`.
    pub fn infos(&self, idx: usize) -> &[NodeValueInfo] {
        &self.index_map[idx]
    }

    /// Re-place the nodes in time. The node count never changes.
    pub fn set_poly_durations(&mut self, durations: &[f64]) -> Result<()> {
        if durations.len() != self.durations.len() {
            return Err(ConsistencyError::PhaseCountMismatch {
                id: self.id.clone(),
                expected: self.durations.len(),
                got: durations.len(),
            }
            .into());
        }
        self.durations.copy_from_slice(durations);
        Ok(())
    }

    /// Seed the nodes on the straight line from `start` to `end`.
    ///
    /// Node values are interpolated by node time over the total duration and
    /// derivatives are set to the average rate; values held constant keep the
    /// value at the start of their polynomial and a zero derivative.
    pub fn initialize_variables(
        &mut self,
        start: &DVector<f64>,
        end: &DVector<f64>,
        poly_durations: &[f64],
    ) -> Result<()> {
        for v in [start, end] {
            if v.len() != self.n_dim {
                return Err(ConsistencyError::DimensionMismatch {
                    expected: self.n_dim,
                    got: v.len(),
                }
                .into());
            }
        }
        self.set_poly_durations(poly_durations)?;

        let total = self.total_duration();
        let delta = end - start;
        let rate = if total > 0.0 {
            &delta / total
        } else {
            DVector::zeros(self.n_dim)
        };
        let linear: Vec<Node> = self
            .node_times()
            .iter()
            .map(|&t| Node {
                p: start + &delta * if total > 0.0 { t / total } else { 0.0 },
                v: rate.clone(),
            })
            .collect();

        self.nodes = vec![Node::zeros(self.n_dim); self.nodes.len()];
        for idx in 0..self.index_map.len() {
            let first = self.index_map[idx][0];
            let value = linear[first.node].at(first.deriv)[first.dim];
            self.write(idx, value);
        }
        self.check_initial_guess()
    }

    /// Pin `dims` of the first node's `deriv` to `values[dim]`.
    pub fn add_start_bound(&mut self, deriv: Derivative, dims: &[usize], values: &[f64]) -> Result<()> {
        self.add_bound(0, deriv, dims, values)
    }

    /// Pin `dims` of the last node's `deriv` to `values[dim]`.
    pub fn add_final_bound(&mut self, deriv: Derivative, dims: &[usize], values: &[f64]) -> Result<()> {
        self.add_bound(self.nodes.len() - 1, deriv, dims, values)
    }

    /// Pin node values through their variable bounds and set them.
    ///
    /// A value that is held fixed (no decision variable) can only be pinned
    /// to the value it already has.
    pub fn add_bound(
        &mut self,
        node: usize,
        deriv: Derivative,
        dims: &[usize],
        values: &[f64],
    ) -> Result<()> {
        for &dim in dims {
            if dim >= self.n_dim || dim >= values.len() {
                return Err(ConsistencyError::DimensionMismatch {
                    expected: self.n_dim.min(values.len()),
                    got: dim + 1,
                }
                .into());
            }
            let value = values[dim];
            if let Some(idx) = self.index(node, deriv, dim) {
                self.bounds[idx] = Bounds::fixed(value);
                self.write(idx, value);
            } else if (self.nodes[node].at(deriv)[dim] - value).abs() > 0.0 {
                return Err(BoundsError::FixedValue {
                    id: self.id.clone(),
                    node,
                    value,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Apply `bound` to every decision variable holding a `deriv` value.
    pub fn bound_all(&mut self, deriv: Derivative, bound: Bounds) {
        for (idx, infos) in self.index_map.iter().enumerate() {
            if infos[0].deriv == deriv {
                self.bounds[idx] = bound;
            }
        }
    }

    /// Fail if any current value lies outside its bound.
    pub fn check_initial_guess(&self) -> Result<()> {
        for (index, b) in self.bounds.iter().enumerate() {
            let value = self.read(index);
            if !b.contains(value) {
                return Err(BoundsError::InitialGuess {
                    id: self.id.clone(),
                    index,
                    value,
                    lower: b.lower,
                    upper: b.upper,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Value, derivative and second derivative at time `t`.
    ///
    /// Times outside the horizon fail per [`stride_core::time::check_time`].
    pub fn point_at(&self, t: f64) -> Result<StateLinXd> {
        let (poly, local) = time::locate(&self.durations, t)?;
        let (n0, n1) = (&self.nodes[poly], &self.nodes[poly + 1]);
        Ok(hermite_point(
            &n0.p,
            &n0.v,
            &n1.p,
            &n1.v,
            self.durations[poly],
            local,
        ))
    }

    fn read(&self, idx: usize) -> f64 {
        let info = self.index_map[idx][0];
        self.nodes[info.node].at(info.deriv)[info.dim]
    }

    fn write(&mut self, idx: usize, value: f64) {
        for info in &self.index_map[idx] {
            self.nodes[info.node].at_mut(info.deriv)[info.dim] = value;
        }
    }
}

impl VariableSet for NodeValues {
    fn id(&self) -> &str {
        &self.id
    }

    fn rows(&self) -> usize {
        self.index_map.len()
    }

    fn values(&self) -> DVector<f64> {
        DVector::from_fn(self.rows(), |idx, _| self.read(idx))
    }

    fn set_values(&mut self, x: &DVector<f64>) -> Result<()> {
        if x.len() != self.rows() {
            return Err(ConsistencyError::VectorLength {
                expected: self.rows(),
                got: x.len(),
            }
            .into());
        }
        for (idx, &value) in x.iter().enumerate() {
            self.write(idx, value);
        }
        Ok(())
    }

    fn bounds(&self) -> Vec<Bounds> {
        self.bounds.clone()
    }
}
