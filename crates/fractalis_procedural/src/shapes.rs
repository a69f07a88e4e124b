//! Shape catalog for the visualization scaffold.
//!
//! Every shape maps `(u, v)` in `[-1, 1]` to a point and unit normal on a
//! surface of roughly unit size. The shape is chosen once per configuration
//! and evaluated through [`Shape::sampler`], one table lookup.

use std::f32::consts::PI;

use fractalis_core::ConfigError;
use fractalis_shared::Vec3;
use serde::{Deserialize, Serialize};

/// Point and normal on a shape.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShapeSample {
    /// Local-space position.
    pub position: Vec3,
    /// Local-space unit normal.
    pub normal: Vec3,
}

/// Signature shared by every shape.
pub type ShapeFn = fn(f32, f32) -> ShapeSample;

const SHAPES: [ShapeFn; Shape::COUNT] = [plane, sphere, torus];

/// Identifier of a catalog shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// Unit square in the XZ plane.
    #[default]
    Plane,
    /// Sphere of radius 0.5.
    Sphere,
    /// Ring torus, major radius 0.375, minor 0.125.
    Torus,
}

impl Shape {
    /// Number of catalog entries.
    pub const COUNT: usize = 3;

    /// Every entry in index order.
    pub const ALL: [Self; Self::COUNT] = [Self::Plane, Self::Sphere, Self::Torus];

    /// Catalog index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Looks up an entry by index.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownShape`] for indices past the catalog.
    pub fn from_index(index: u32) -> Result<Self, ConfigError> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or(ConfigError::UnknownShape(index))
    }

    /// The sampling function for this shape.
    #[must_use]
    pub const fn sampler(self) -> ShapeFn {
        SHAPES[self as usize]
    }

    /// Samples the shape at `(u, v)`.
    #[inline]
    #[must_use]
    pub fn sample(self, u: f32, v: f32) -> ShapeSample {
        (self.sampler())(u, v)
    }
}

fn plane(u: f32, v: f32) -> ShapeSample {
    ShapeSample {
        position: Vec3::new(0.5 * u, 0.0, 0.5 * v),
        normal: Vec3::Y,
    }
}

fn sphere(u: f32, v: f32) -> ShapeSample {
    let (sin_lon, cos_lon) = (PI * u).sin_cos();
    let (sin_lat, cos_lat) = (0.5 * PI * v).sin_cos();
    let normal = Vec3::new(sin_lon * cos_lat, sin_lat, cos_lon * cos_lat);
    ShapeSample { position: normal * 0.5, normal }
}

fn torus(u: f32, v: f32) -> ShapeSample {
    const R1: f32 = 0.375;
    const R2: f32 = 0.125;
    let (sin_u, cos_u) = (PI * u).sin_cos();
    let (sin_v, cos_v) = (PI * v).sin_cos();
    let s = R1 + R2 * cos_v;
    ShapeSample {
        position: Vec3::new(s * sin_u, R2 * sin_v, s * cos_u),
        normal: Vec3::new(sin_u * cos_v, sin_v, cos_u * cos_v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1.0e-5;

    #[test]
    fn test_plane_corners() {
        let s = Shape::Plane.sample(-1.0, 1.0);
        assert_eq!(s.position, Vec3::new(-0.5, 0.0, 0.5));
        assert_eq!(s.normal, Vec3::Y);
    }

    #[test]
    fn test_sphere_radius_and_normal() {
        for &(u, v) in &[(0.0, 0.0), (0.3, 0.7), (-0.8, -0.2), (1.0, 1.0)] {
            let s = Shape::Sphere.sample(u, v);
            assert!((s.position.length() - 0.5).abs() < EPS);
            assert!((s.normal.length() - 1.0).abs() < EPS);
            assert!(s.position.normalize_or_zero().distance(s.normal) < 1.0e-4);
        }
    }

    #[test]
    fn test_torus_normal_points_away_from_ring() {
        for &(u, v) in &[(0.0, 0.0), (0.5, 0.5), (-0.25, -0.9)] {
            let s = Shape::Torus.sample(u, v);
            let (sin_u, cos_u) = (PI * u).sin_cos();
            let ring = Vec3::new(0.375 * sin_u, 0.0, 0.375 * cos_u);
            assert!(((s.position - ring).length() - 0.125).abs() < EPS);
            assert!((s.position - ring).normalize_or_zero().distance(s.normal) < 1.0e-4);
        }
    }

    #[test]
    fn test_unknown_shape() {
        assert_eq!(Shape::from_index(2), Ok(Shape::Torus));
        assert_eq!(Shape::from_index(3), Err(ConfigError::UnknownShape(3)));
    }
}
