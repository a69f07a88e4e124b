//! # Function Library
//!
//! The fixed catalog of surfaces the grapher can draw. Each entry maps
//! `(u, v, t)` with `u, v` in `[-1, 1]` and time `t` in seconds to a point.
//! The compute kernels implement the same formulas; these CPU versions
//! back the worker-thread realization and the tests.
//!
//! ```text
//!   index  name        shape
//!   0      Wave        y = sin(pi (u + v + t))
//!   1      MultiWave   three summed sines
//!   2      Ripple      damped radial wave
//!   3      Sphere      twisted, pulsing sphere
//!   4      Torus       twisted, pulsing torus
//! ```

use std::f32::consts::PI;

use fractalis_core::ConfigError;
use fractalis_shared::{smoothstep, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Signature shared by every catalog entry.
pub type SurfaceFn = fn(f32, f32, f32) -> Vec3;

/// Catalog entries in index order.
const FUNCTIONS: [SurfaceFn; FunctionName::COUNT] = [wave, multi_wave, ripple, sphere, torus];

/// Identifier of a catalog function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionName {
    /// Diagonal sine wave.
    #[default]
    Wave,
    /// Sum of three sine waves.
    MultiWave,
    /// Radial ripple.
    Ripple,
    /// Deformed sphere.
    Sphere,
    /// Deformed torus.
    Torus,
}

impl FunctionName {
    /// Number of catalog entries.
    pub const COUNT: usize = 5;

    /// Every entry in index order.
    pub const ALL: [Self; Self::COUNT] =
        [Self::Wave, Self::MultiWave, Self::Ripple, Self::Sphere, Self::Torus];

    /// Catalog index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Looks up an entry by index.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownFunction`] for indices past the catalog.
    pub fn from_index(index: u32) -> Result<Self, ConfigError> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or(ConfigError::UnknownFunction(index))
    }

    /// Next entry, wrapping from the last to the first.
    #[must_use]
    pub const fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::COUNT]
    }

    /// Uniformly random entry other than `self`.
    pub fn random_other_than<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let offset = rng.gen_range(1..Self::COUNT);
        Self::ALL[(self as usize + offset) % Self::COUNT]
    }

    /// The evaluation function for this entry.
    #[must_use]
    pub const fn surface(self) -> SurfaceFn {
        FUNCTIONS[self as usize]
    }

    /// Evaluates this entry at `(u, v)` and time `t`.
    #[inline]
    #[must_use]
    pub fn evaluate(self, u: f32, v: f32, t: f32) -> Vec3 {
        (self.surface())(u, v, t)
    }
}

/// Crossfade of two catalog entries.
///
/// `progress` is linear; [`morph`] smooths it. A steady state is a blend
/// of an entry with itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FunctionBlend {
    /// Source function.
    pub from: FunctionName,
    /// Target function.
    pub to: FunctionName,
    /// Linear blend factor in `[0, 1]`.
    pub progress: f32,
}

impl FunctionBlend {
    /// A single function, no crossfade.
    #[must_use]
    pub const fn steady(function: FunctionName) -> Self {
        Self { from: function, to: function, progress: 0.0 }
    }

    /// Whether two different functions are being mixed.
    #[must_use]
    pub fn is_blending(&self) -> bool {
        self.from != self.to
    }

    /// Evaluates the blend at `(u, v)` and time `t`.
    #[inline]
    #[must_use]
    pub fn evaluate(&self, u: f32, v: f32, t: f32) -> Vec3 {
        if self.is_blending() {
            morph(u, v, t, self.from, self.to, self.progress)
        } else {
            self.from.evaluate(u, v, t)
        }
    }
}

/// Blends two entries with raw, unsmoothed `progress`.
#[must_use]
pub fn morph(u: f32, v: f32, t: f32, from: FunctionName, to: FunctionName, progress: f32) -> Vec3 {
    from.evaluate(u, v, t).lerp(to.evaluate(u, v, t), smoothstep(0.0, 1.0, progress))
}

fn wave(u: f32, v: f32, t: f32) -> Vec3 {
    Vec3::new(u, (PI * (u + v + t)).sin(), v)
}

fn multi_wave(u: f32, v: f32, t: f32) -> Vec3 {
    let mut y = (PI * (u + 0.5 * t)).sin();
    y += 0.5 * (2.0 * PI * (v + t)).sin();
    y += (PI * (u + v + 0.25 * t)).sin();
    Vec3::new(u, y * (1.0 / 2.5), v)
}

fn ripple(u: f32, v: f32, t: f32) -> Vec3 {
    let d = (u * u + v * v).sqrt();
    let y = (PI * (4.0 * d - t)).sin() / (1.0 + 10.0 * d);
    Vec3::new(u, y, v)
}

fn sphere(u: f32, v: f32, t: f32) -> Vec3 {
    let r = 0.9 + 0.1 * (PI * (6.0 * u + 4.0 * v + t)).sin();
    let s = r * (0.5 * PI * v).cos();
    Vec3::new(s * (PI * u).sin(), r * (0.5 * PI * v).sin(), s * (PI * u).cos())
}

fn torus(u: f32, v: f32, t: f32) -> Vec3 {
    let r1 = 0.7 + 0.1 * (PI * (6.0 * u + 0.5 * t)).sin();
    let r2 = 0.15 + 0.05 * (PI * (8.0 * u + 4.0 * v + 2.0 * t)).sin();
    let s = r1 + r2 * (PI * v).cos();
    Vec3::new(s * (PI * u).sin(), r2 * (PI * v).sin(), s * (PI * u).cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_next_wraps() {
        assert_eq!(FunctionName::Wave.next(), FunctionName::MultiWave);
        assert_eq!(FunctionName::Torus.next(), FunctionName::Wave);
    }

    #[test]
    fn test_random_never_repeats() {
        let mut rng = StdRng::seed_from_u64(7);
        for current in FunctionName::ALL {
            for _ in 0..200 {
                assert_ne!(current.random_other_than(&mut rng), current);
            }
        }
    }

    #[test]
    fn test_random_reaches_every_other_entry() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; FunctionName::COUNT];
        for _ in 0..500 {
            seen[FunctionName::Ripple.random_other_than(&mut rng).index() as usize] = true;
        }
        assert_eq!(seen, [true, true, false, true, true]);
    }

    #[test]
    fn test_index_round_trip() {
        for function in FunctionName::ALL {
            assert_eq!(FunctionName::from_index(function.index()), Ok(function));
        }
        assert_eq!(FunctionName::from_index(5), Err(ConfigError::UnknownFunction(5)));
    }

    #[test]
    fn test_wave_at_origin() {
        let p = FunctionName::Wave.evaluate(0.0, 0.0, 0.0);
        assert_eq!(p.x, 0.0);
        assert!(p.y.abs() < 1.0e-6);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn test_ripple_is_radial() {
        let a = FunctionName::Ripple.evaluate(0.3, 0.4, 1.0);
        let b = FunctionName::Ripple.evaluate(0.4, -0.3, 1.0);
        assert!((a.y - b.y).abs() < 1.0e-6);
    }

    #[test]
    fn test_sphere_radius_bounds() {
        for &(u, v) in &[(0.0, 0.0), (0.5, -0.5), (-1.0, 0.9), (0.25, 0.75)] {
            let r = FunctionName::Sphere.evaluate(u, v, 0.3).length();
            assert!((0.8 - 1.0e-5..=1.0 + 1.0e-5).contains(&r), "radius {r}");
        }
    }

    #[test]
    fn test_morph_endpoints() {
        let (u, v, t) = (0.2, -0.6, 1.5);
        let from = FunctionName::Wave.evaluate(u, v, t);
        let to = FunctionName::Torus.evaluate(u, v, t);
        assert_eq!(morph(u, v, t, FunctionName::Wave, FunctionName::Torus, 0.0), from);
        let end = morph(u, v, t, FunctionName::Wave, FunctionName::Torus, 1.0);
        assert!(end.distance(to) < 1.0e-6);
    }

    #[test]
    fn test_blend_smooths_progress() {
        let (u, v, t) = (-0.4, 0.1, 0.7);
        let blend = FunctionBlend { from: FunctionName::Sphere, to: FunctionName::Torus, progress: 0.25 };
        let expected = FunctionName::Sphere
            .evaluate(u, v, t)
            .lerp(FunctionName::Torus.evaluate(u, v, t), smoothstep(0.0, 1.0, 0.25));
        assert!(blend.evaluate(u, v, t).distance(expected) < 1.0e-6);
        assert_eq!(blend.evaluate(u, v, t), morph(u, v, t, blend.from, blend.to, 0.25));
    }

    #[test]
    fn test_steady_blend_ignores_progress() {
        let blend = FunctionBlend { progress: 0.7, ..FunctionBlend::steady(FunctionName::Ripple) };
        assert!(!blend.is_blending());
        assert_eq!(blend.evaluate(0.1, 0.2, 0.3), FunctionName::Ripple.evaluate(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_names_parse() {
        #[derive(Deserialize)]
        struct Doc {
            function: FunctionName,
        }
        let doc: Doc = toml::from_str("function = \"MultiWave\"").unwrap();
        assert_eq!(doc.function, FunctionName::MultiWave);
        assert!(toml::from_str::<Doc>("function = \"Spiral\"").is_err());
    }
}
