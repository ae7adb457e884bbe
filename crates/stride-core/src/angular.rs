//! Conversion from the optimized Euler-angle representation to the angular
//! state consumed downstream.
//!
//! The base orientation is optimized as ZYX Euler angles `Θ = [roll, pitch, yaw]`
//! with `R = R_z(yaw) R_y(pitch) R_x(roll)`. World angular velocity and
//! acceleration follow from the Euler rates:
//!
//! ```text
//! ω  = M(Θ) Θ̇
//! ω̇ = M(Θ) Θ̈ + Ṁ(Θ, Θ̇) Θ̇
//! ```

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use crate::types::{StateAng3d, StateLin3d};

/// Matrix `M(Θ)` mapping ZYX Euler rates to world-frame angular velocity.
pub fn euler_rates_to_angular_velocity(euler: &Vector3<f64>) -> Matrix3<f64> {
    let (pitch, yaw) = (euler.y, euler.z);
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();

    Matrix3::new(
        cy * cp, -sy, 0.0, //
        sy * cp, cy, 0.0, //
        -sp, 0.0, 1.0,
    )
}

/// Time derivative `Ṁ(Θ, Θ̇)` of [`euler_rates_to_angular_velocity`].
pub fn euler_rates_to_angular_velocity_derivative(
    euler: &Vector3<f64>,
    euler_rates: &Vector3<f64>,
) -> Matrix3<f64> {
    let (pitch, yaw) = (euler.y, euler.z);
    let (pitch_d, yaw_d) = (euler_rates.y, euler_rates.z);
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();

    Matrix3::new(
        -sy * yaw_d * cp - cy * sp * pitch_d, -cy * yaw_d, 0.0, //
        cy * yaw_d * cp - sy * sp * pitch_d, -sy * yaw_d, 0.0, //
        -cp * pitch_d, 0.0, 0.0,
    )
}

/// Convert an Euler-angle state into orientation, angular velocity and
/// angular acceleration in world frame.
pub fn angular_state(euler: &StateLin3d) -> StateAng3d {
    let q = UnitQuaternion::from_euler_angles(euler.p.x, euler.p.y, euler.p.z);
    let m = euler_rates_to_angular_velocity(&euler.p);
    let m_dot = euler_rates_to_angular_velocity_derivative(&euler.p, &euler.v);

    StateAng3d {
        q,
        w: m * euler.v,
        wd: m * euler.a + m_dot * euler.v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_angles_give_identity() {
        let mut euler = StateLin3d::default();
        euler.v = Vector3::new(0.1, -0.2, 0.3);
        let ang = angular_state(&euler);
        assert!(ang.q.angle() < 1e-12);
        // M(0) is the identity: rates equal angular velocity.
        assert!((ang.w - euler.v).norm() < 1e-12);
    }

    #[test]
    fn pure_yaw_matches_quaternion() {
        let euler = StateLin3d::at_rest(Vector3::new(0.0, 0.0, 0.7));
        let ang = angular_state(&euler);
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.7);
        assert!(ang.q.angle_to(&expected) < 1e-12);
        assert!(ang.w.norm() < 1e-12);
    }

    #[test]
    fn yaw_rate_is_world_z_rotation() {
        let mut euler = StateLin3d::at_rest(Vector3::new(0.2, -0.1, 1.0));
        euler.v = Vector3::new(0.0, 0.0, 0.5);
        let ang = angular_state(&euler);
        assert!((ang.w - Vector3::new(0.0, 0.0, 0.5)).norm() < 1e-12);
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let euler = Vector3::new(0.1, 0.3, -0.4);
        let rates = Vector3::new(0.2, -0.5, 0.7);
        let h = 1e-6;
        let m0 = euler_rates_to_angular_velocity(&euler);
        let m1 = euler_rates_to_angular_velocity(&(euler + rates * h));
        let fd = (m1 - m0) / h;
        let analytic = euler_rates_to_angular_velocity_derivative(&euler, &rates);
        assert!((fd - analytic).norm() < 1e-5);
    }
}
