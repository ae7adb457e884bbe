//! Identifiers of the components the motion optimizer puts in its tree.

/// Base linear (position) trajectory.
pub const BASE_LINEAR: &str = "base_lin";
/// Base angular (Euler angle) trajectory.
pub const BASE_ANGULAR: &str = "base_ang";
/// Root of the assembled variable tree.
pub const NLP_VARIABLES: &str = "nlp_variables";

pub fn ee_schedule(ee: usize) -> String {
    format!("ee_schedule_{ee}")
}

pub fn ee_motion_xy(ee: usize) -> String {
    format!("ee_motion_xy_{ee}")
}

pub fn ee_motion_z(ee: usize) -> String {
    format!("ee_motion_z_{ee}")
}

pub fn ee_force(ee: usize) -> String {
    format!("ee_force_{ee}")
}

/// Identifier of segment `index` of a coefficient spline.
pub fn segment(spline_id: &str, index: usize) -> String {
    format!("{spline_id}_{index}")
}
