//! Pairwise force law and the handful of vector helpers the integrator uses.
//!
//! Simulation state is kept in `f64` (`DVec2`); rendering converts to
//! screen integers separately.

use bevy::math::DVec2;

/// Euclidean distance between two points.
pub fn distance(a: DVec2, b: DVec2) -> f64 {
    (a - b).length()
}

/// Magnitude formula applied before clamping.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ForceProfile {
    /// `G * m1 * m2 / d`
    #[default]
    InverseDistance,
    /// `G * m1 * m2 * ln(5d) / d`, pushes apart below d = 0.2.
    LogRepulsive,
    /// `sin(5d) * G * m1 * m2 / d`
    Undulating,
}

impl ForceProfile {
    fn magnitude(self, g: f64, dist: f64, m1: f64, m2: f64) -> f64 {
        let base = g * m1 * m2 / dist;
        match self {
            ForceProfile::InverseDistance => base,
            ForceProfile::LogRepulsive => base * (dist * 5.0).ln(),
            ForceProfile::Undulating => base * (dist * 5.0).sin(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ForceLaw {
    pub g: f64,
    pub max_force: f64,
    pub profile: ForceProfile,
}

impl Default for ForceLaw {
    fn default() -> Self {
        Self {
            g: 0.01,
            max_force: 100.0,
            profile: ForceProfile::default(),
        }
    }
}

impl ForceLaw {
    pub fn new(g: f64, max_force: f64, profile: ForceProfile) -> Self {
        Self {
            g,
            max_force,
            profile,
        }
    }

    /// Force exerted on a body of mass `m1` by one of mass `m2`.
    ///
    /// `direction` points from the acted-upon body toward the other one, so a
    /// positive magnitude pulls the two together. Coincident bodies
    /// (`dist == 0`) exert nothing on each other.
    pub fn attraction(&self, dist: f64, m1: f64, m2: f64, direction: DVec2) -> DVec2 {
        if dist == 0.0 {
            return DVec2::ZERO;
        }

        let limit = self.max_force.abs();
        let magnitude = self.profile.magnitude(self.g, dist, m1, m2).clamp(-limit, limit);

        direction.normalize_or_zero() * magnitude
    }
}
