use glam::{Mat4, Vec3};

/// Axis-aligned collision box on the ground plane.
///
/// Geometry is projected onto x/z; y is ignored on purpose. Collision in
/// this world is two-dimensional, what matters is whether footprints
/// overlap, not heights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitBox2d {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl HitBox2d {
    pub fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        assert!(
            min_x <= max_x && min_z <= max_z,
            "hit box extents must satisfy min <= max"
        );
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
        }
    }

    /// Build a box around model-space points transformed by `world`.
    /// At least one point is required.
    pub fn from_points(world: &Mat4, points: &[Vec3]) -> Self {
        assert!(!points.is_empty(), "hit box needs at least one point");
        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        let mut min_z = f32::MAX;
        let mut max_z = f32::MIN;
        for point in points {
            let p = world.transform_point3(*point);
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_z = min_z.min(p.z);
            max_z = max_z.max(p.z);
        }
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
        }
    }

    /// Overlap test, inclusive on both axes: boxes that touch exactly at an
    /// edge or corner count as colliding.
    pub fn intersects(&self, other: &HitBox2d) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_z <= other.max_z
            && other.min_z <= self.max_z
    }
}
