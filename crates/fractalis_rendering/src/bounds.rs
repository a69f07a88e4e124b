//! Axis-aligned draw bounds.

use fractalis_shared::Vec3;

/// Axis-aligned bounding box stored as center and size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aabb {
    /// Box center.
    pub center: Vec3,
    /// Full edge lengths.
    pub size: Vec3,
}

impl Aabb {
    /// Box of `size` centered on `center`.
    #[must_use]
    pub const fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    /// Cube with edge `edge` centered on `center`.
    #[must_use]
    pub const fn cube(center: Vec3, edge: f32) -> Self {
        Self::new(center, Vec3::splat(edge))
    }

    /// Minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.center - self.size * 0.5
    }

    /// Maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.center + self.size * 0.5
    }

    /// Whether `point` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        let (min, max) = (self.min(), self.max());
        (min.x..=max.x).contains(&point.x)
            && (min.y..=max.y).contains(&point.y)
            && (min.z..=max.z).contains(&point.z)
    }
}
