//! Base (body) trajectory construction for both representations.
//!
//! Either representation spans the given segment durations and receives the
//! same boundary treatment: start position and velocity pinned, final
//! velocity pinned, final position pinned only along `final_pos_dims`.

use nalgebra::{DVector, Vector3};
use stride_core::error::Result;
use stride_core::types::{Derivative, StateLin3d, DIM_3D, X, Y, Z};

use crate::coeff_spline::{CoeffSpline, TerminalConditions};
use crate::component::VariableSet;
use crate::composite::Composite;
use crate::names;
use crate::nodes::NodeValues;
use crate::polynomial::{Polynomial, PolynomialVars};

const ALL_DIMS: [usize; DIM_3D] = [X, Y, Z];

fn dvec(v: &Vector3<f64>) -> DVector<f64> {
    DVector::from_column_slice(v.as_slice())
}

/// One continuous node spline over all `durations`.
pub fn node_spline(
    id: &str,
    initial: &StateLin3d,
    target: &StateLin3d,
    durations: &[f64],
    final_pos_dims: &[usize],
) -> Result<NodeValues> {
    let mut spline = NodeValues::new(DIM_3D, durations.len(), id);
    spline.initialize_variables(&dvec(&initial.p), &dvec(&target.p), durations)?;

    spline.add_start_bound(Derivative::Pos, &ALL_DIMS, initial.p.as_slice())?;
    spline.add_start_bound(Derivative::Vel, &ALL_DIMS, initial.v.as_slice())?;
    spline.add_final_bound(Derivative::Vel, &ALL_DIMS, target.v.as_slice())?;
    spline.add_final_bound(Derivative::Pos, final_pos_dims, target.p.as_slice())?;
    Ok(spline)
}

/// Independent coefficient polynomials of `order`, one per duration, and the
/// spline that indexes them.
///
/// Every segment starts on the straight line from `initial` to `target` with
/// the average velocity. The first segment's constant and linear
/// coefficients are pinned to the initial position and velocity. From order
/// three on, the last segment bends so it ends exactly at the target position
/// and velocity. The final conditions are published on the spline for the
/// terminal-state constraint.
pub fn coeff_spline(
    id: &str,
    order: usize,
    initial: &StateLin3d,
    target: &StateLin3d,
    durations: &[f64],
    final_pos_dims: &[usize],
) -> Result<(Vec<PolynomialVars>, CoeffSpline)> {
    let total: f64 = durations.iter().sum();
    let delta = target.p - initial.p;
    let rate = if total > 0.0 { delta / total } else { Vector3::zeros() };

    let mut segments = Vec::with_capacity(durations.len());
    let mut t_start = 0.0;
    for (i, d) in durations.iter().enumerate() {
        let mut vars = PolynomialVars::new(names::segment(id, i), Polynomial::new(order, DIM_3D));
        let frac = if total > 0.0 { t_start / total } else { 0.0 };
        if i == 0 {
            vars.fix_coefficient(0, &dvec(&initial.p))?;
            if order >= 1 {
                vars.fix_coefficient(1, &dvec(&initial.v))?;
            }
        } else {
            vars.set_coefficient(0, &dvec(&(initial.p + delta * frac)))?;
            if order >= 1 {
                vars.set_coefficient(1, &dvec(&rate))?;
            }
        }
        if i + 1 == durations.len() && order >= 3 && *d > 0.0 {
            reach_target(&mut vars, target, *d)?;
        }
        segments.push(vars);
        t_start += d;
    }

    let segment_ids = segments
        .iter()
        .map(|s| s.id().to_owned())
        .collect();
    let spline = CoeffSpline::new(
        id,
        segment_ids,
        durations.to_vec(),
        TerminalConditions {
            initial: *initial,
            target: *target,
            final_pos_dims: final_pos_dims.to_vec(),
        },
    )?;
    Ok((segments, spline))
}

/// Set the quadratic and cubic coefficients so the segment, keeping its
/// constant and linear ones, ends at `target` after `duration`.
fn reach_target(vars: &mut PolynomialVars, target: &StateLin3d, duration: f64) -> Result<()> {
    let poly = vars.poly();
    let c0 = poly.coeff(0).clone();
    let c1 = poly.coeff(1).clone();
    let dp = dvec(&target.p) - c0 - &c1 * duration;
    let dv = dvec(&target.v) - c1;
    let c2 = (&dp * 3.0 - &dv * duration) / duration.powi(2);
    let c3 = (dv * duration - dp * 2.0) / duration.powi(3);
    vars.set_coefficient(2, &c2)?;
    vars.set_coefficient(3, &c3)
}

/// Add a node-spline base trajectory to `tree`.
pub fn add_node_spline(
    tree: &mut Composite,
    id: &str,
    initial: &StateLin3d,
    target: &StateLin3d,
    durations: &[f64],
    final_pos_dims: &[usize],
) -> Result<()> {
    tree.add_component(node_spline(id, initial, target, durations, final_pos_dims)?)
}

/// Add the segments of a coefficient base trajectory as decision components
/// and its index as an informational one.
pub fn add_coeff_spline(
    tree: &mut Composite,
    id: &str,
    order: usize,
    initial: &StateLin3d,
    target: &StateLin3d,
    durations: &[f64],
    final_pos_dims: &[usize],
) -> Result<()> {
    let (segments, spline) = coeff_spline(id, order, initial, target, durations, final_pos_dims)?;
    for segment in segments {
        tree.add_component(segment)?;
    }
    tree.add_informational(spline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;

    fn start() -> StateLin3d {
        StateLin3d::at_rest(Vector3::new(0.0, 0.0, 0.5))
    }

    fn goal() -> StateLin3d {
        StateLin3d::at_rest(Vector3::new(1.0, 0.0, 0.5))
    }

    #[test]
    fn node_spline_pins_boundaries() {
        let spline = node_spline("base_lin", &start(), &goal(), &[0.5, 0.5], &[X, Y]).unwrap();
        let b = spline.bounds();
        let last = spline.node_count() - 1;
        for dim in ALL_DIMS {
            let p0 = spline.index(0, Derivative::Pos, dim).unwrap();
            let v_end = spline.index(last, Derivative::Vel, dim).unwrap();
            assert!(b[p0].is_fixed());
            assert_eq!(b[v_end], Bounds::fixed(0.0));
        }
        let z_end = spline.index(last, Derivative::Pos, Z).unwrap();
        assert!(!b[z_end].is_fixed());

        let s0 = spline.point_at(0.0).unwrap();
        assert_eq!(s0.p, dvec(&start().p));
        let s_end = spline.point_at(1.0).unwrap();
        assert!((s_end.p[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn node_spline_keeps_constant_height() {
        let spline = node_spline("base_lin", &start(), &goal(), &[0.4, 0.4, 0.2], &[X, Y]).unwrap();
        for t in [0.0, 0.3, 0.55, 1.0] {
            assert!((spline.point_at(t).unwrap().p[Z] - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn coeff_segments_named_and_pinned() {
        let (segments, spline) =
            coeff_spline("base_ang", 4, &start(), &goal(), &[0.5, 0.5], &[Z]).unwrap();
        assert_eq!(spline.segment_ids(), &["base_ang_0", "base_ang_1"]);
        assert_eq!(segments[0].rows(), 15);

        let b = segments[0].bounds();
        assert_eq!(b[2], Bounds::fixed(0.5));
        assert_eq!(b[3], Bounds::fixed(0.0));
        assert!(!segments[1].bounds()[0].is_fixed());

        // Second segment starts halfway along the line with the mean rate.
        let second = segments[1].poly();
        assert!((second.coeff(0)[0] - 0.5).abs() < 1e-12);
        assert!((second.coeff(1)[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn last_coeff_segment_ends_on_target() {
        let moving = StateLin3d {
            v: Vector3::new(0.2, -0.1, 0.0),
            ..goal()
        };
        for durations in [&[1.0][..], &[0.4, 0.4, 0.2][..]] {
            let (segments, _) =
                coeff_spline("base_lin", 4, &start(), &moving, durations, &[X, Y]).unwrap();
            let last = segments.last().unwrap();
            let end = last.poly().point_at(*durations.last().unwrap());
            for dim in ALL_DIMS {
                assert!((end.p[dim] - moving.p[dim]).abs() < 1e-9);
                assert!((end.v[dim] - moving.v[dim]).abs() < 1e-9);
            }
        }
        // Pinned start of a single segment is kept.
        let (segments, _) = coeff_spline("base_lin", 4, &start(), &goal(), &[1.0], &[X, Y]).unwrap();
        let s0 = segments[0].poly().point_at(0.0);
        assert_eq!(s0.p, dvec(&start().p));
        assert_eq!(s0.v, dvec(&start().v));
    }

    #[test]
    fn add_coeff_spline_registers_segments_and_index() {
        let mut tree = Composite::new(names::NLP_VARIABLES);
        add_coeff_spline(&mut tree, names::BASE_LINEAR, 3, &start(), &goal(), &[0.6, 0.4], &[X, Y])
            .unwrap();
        assert_eq!(tree.decision_components().len(), 2);
        assert_eq!(tree.informational_components().len(), 1);
        assert_eq!(tree.rows(), 2 * 4 * 3);

        let s = tree.spline(names::BASE_LINEAR).unwrap();
        assert!((s.total_duration() - 1.0).abs() < 1e-12);
        assert_eq!(s.point_at(0.0).unwrap().p, dvec(&start().p));
    }
}
