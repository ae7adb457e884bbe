//! Terrain height reference.
//!
//! Only the height lookup used for initial foot placement lives here; surface
//! geometry belongs to whoever implements [`HeightMap`].

/// Terrain height as a function of horizontal position.
pub trait HeightMap: Send + Sync {
    /// Ground height at `(x, y)` in meters.
    fn height(&self, x: f64, y: f64) -> f64;
}

/// Flat ground at a constant height.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlatGround {
    pub height: f64,
}

impl FlatGround {
    pub const fn new(height: f64) -> Self {
        Self { height }
    }
}

impl HeightMap for FlatGround {
    fn height(&self, _x: f64, _y: f64) -> f64 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_ground_defaults_to_zero() {
        let ground = FlatGround::default();
        assert!(ground.height(1.0, -3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn raised_flat_ground() {
        let ground = FlatGround::new(0.2);
        assert!((ground.height(0.0, 0.0) - 0.2).abs() < f64::EPSILON);
    }
}
