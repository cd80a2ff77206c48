use std::f32::consts::{PI, TAU};

use glam::Vec3;

const SUNLIGHT: Vec3 = Vec3::new(0.9, 0.87, 0.8);
const MOONLIGHT: Vec3 = Vec3::new(0.4, 0.4, 0.4);
const SKY_BASE: Vec3 = Vec3::new(0.12, 0.19, 0.23);

/// Ten-minute day/night cycle driving the directional light and sky color.
///
/// Progress zero is noon. The celestial ray starts pointing straight down
/// and sweeps a full turn about z per period; through the middle half of
/// the cycle the moon takes over, offset by half a turn so it also arcs
/// overhead.
pub struct DayCycle {
    elapsed: f32,
    period: f32,
}

impl Default for DayCycle {
    fn default() -> Self {
        Self::new(600.0)
    }
}

impl DayCycle {
    pub fn new(period: f32) -> Self {
        assert!(period > 0.0, "day period must be positive");
        Self {
            elapsed: 0.0,
            period,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    /// Fraction of the current day, in [0, 1). Zero is noon.
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.period).rem_euclid(1.0)
    }

    pub fn is_day(&self) -> bool {
        let p = self.progress();
        !(p > 0.25 && p <= 0.75)
    }

    /// Unit direction the active light travels, pointing into the scene.
    pub fn light_direction(&self) -> Vec3 {
        let offset = if self.is_day() { 0.0 } else { PI };
        let angle = self.progress() * TAU + offset;
        // (0, -1, 0) rotated about z by the day angle.
        Vec3::new(angle.sin(), -angle.cos(), 0.0)
    }

    pub fn light_color(&self) -> Vec3 {
        if self.is_day() { SUNLIGHT } else { MOONLIGHT }
    }

    /// Clear color: base sky scaled by a triangle wave that peaks at noon
    /// and bottoms out at midnight.
    pub fn sky_color(&self) -> Vec3 {
        let coefficient = 2.0 + ((self.progress() * 2.0).rem_euclid(2.0) - 1.0).abs() * 4.0;
        (SKY_BASE * coefficient).min(Vec3::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(progress: f32) -> DayCycle {
        let mut cycle = DayCycle::new(100.0);
        cycle.advance(progress * 100.0);
        cycle
    }

    #[test]
    fn noon_sun_points_straight_down() {
        let cycle = DayCycle::default();
        assert_eq!(cycle.progress(), 0.0);
        assert!(cycle.is_day());
        assert!(
            cycle
                .light_direction()
                .abs_diff_eq(Vec3::new(0.0, -1.0, 0.0), 1e-6)
        );
        assert_eq!(cycle.light_color(), SUNLIGHT);
    }

    #[test]
    fn dusk_hands_the_sky_to_the_moon() {
        assert!(at(0.25).is_day());
        let night = at(0.26);
        assert!(!night.is_day());
        assert_eq!(night.light_color(), MOONLIGHT);
    }

    #[test]
    fn midnight_moon_hangs_overhead() {
        let cycle = at(0.5);
        assert!(!cycle.is_day());
        assert!(
            cycle
                .light_direction()
                .abs_diff_eq(Vec3::new(0.0, -1.0, 0.0), 1e-5)
        );
    }

    #[test]
    fn cycle_wraps_past_one_period() {
        let mut cycle = DayCycle::new(10.0);
        cycle.advance(12.0);
        assert!((cycle.progress() - 0.2).abs() < 1e-5);
        assert!(cycle.is_day());
    }

    #[test]
    fn light_never_shines_from_below() {
        for step in 0..40 {
            let cycle = at(step as f32 / 40.0);
            let ray = cycle.light_direction();
            assert!((ray.length() - 1.0).abs() < 1e-5);
            assert!(ray.y <= 1e-5, "upward ray at step {step}");
        }
    }

    #[test]
    fn sky_peaks_at_noon_and_dims_at_midnight() {
        let noon = at(0.0).sky_color();
        let midnight = at(0.5).sky_color();
        assert!(noon.x > midnight.x);
        assert!(noon.max_element() <= 1.0);
        assert!((midnight - SKY_BASE * 2.0).length() < 1e-5);
    }
}
