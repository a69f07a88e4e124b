//! Colors and gradients for per-level tinting.

use fractalis_shared::Vec4;
use serde::{Deserialize, Serialize};

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red component (0-1).
    pub r: f32,
    /// Green component (0-1).
    pub g: f32,
    /// Blue component (0-1).
    pub b: f32,
    /// Alpha component (0-1).
    #[serde(default = "opaque")]
    pub a: f32,
}

const fn opaque() -> f32 {
    1.0
}

impl Color {
    /// Solid black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Solid white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    /// Creates a color from RGBA values (0-1).
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from RGB values (0-1) with full alpha.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Linearly interpolates between two colors.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::rgba(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    /// Shader-facing vector form.
    #[must_use]
    pub const fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Color stop on a gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientKey {
    /// Position in `[0, 1]`.
    pub time: f32,
    /// Color at `time`.
    pub color: Color,
}

/// Piecewise-linear color ramp over `[0, 1]`.
///
/// Keys are kept sorted by time. Inputs before the first key or after the
/// last clamp to that key's color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<GradientKey>", into = "Vec<GradientKey>")]
pub struct Gradient {
    keys: Vec<GradientKey>,
}

impl Gradient {
    /// Builds a gradient from unordered keys.
    #[must_use]
    pub fn new(mut keys: Vec<GradientKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Two-stop gradient from `start` at 0 to `end` at 1.
    #[must_use]
    pub fn linear(start: Color, end: Color) -> Self {
        Self::new(vec![
            GradientKey { time: 0.0, color: start },
            GradientKey { time: 1.0, color: end },
        ])
    }

    /// Color at `t`. An empty gradient is white.
    #[must_use]
    pub fn evaluate(&self, t: f32) -> Color {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return Color::WHITE;
        };
        if t <= first.time {
            return first.color;
        }
        if t >= last.time {
            return last.color;
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time {
                let span = b.time - a.time;
                let local = if span > 0.0 { (t - a.time) / span } else { 1.0 };
                return a.color.lerp(b.color, local);
            }
        }
        last.color
    }

    /// Stops in time order.
    #[must_use]
    pub fn keys(&self) -> &[GradientKey] {
        &self.keys
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Self::linear(Color::WHITE, Color::WHITE)
    }
}

impl From<Vec<GradientKey>> for Gradient {
    fn from(keys: Vec<GradientKey>) -> Self {
        Self::new(keys)
    }
}

impl From<Gradient> for Vec<GradientKey> {
    fn from(gradient: Gradient) -> Self {
        gradient.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_midpoint() {
        let gradient = Gradient::linear(Color::BLACK, Color::WHITE);
        assert_eq!(gradient.evaluate(0.5), Color::rgb(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_clamps_outside_keys() {
        let gradient = Gradient::new(vec![
            GradientKey { time: 0.75, color: Color::WHITE },
            GradientKey { time: 0.25, color: Color::BLACK },
        ]);
        assert_eq!(gradient.evaluate(0.0), Color::BLACK);
        assert_eq!(gradient.evaluate(1.0), Color::WHITE);
        assert_eq!(gradient.evaluate(0.5), Color::rgb(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_empty_is_white() {
        assert_eq!(Gradient::new(Vec::new()).evaluate(0.3), Color::WHITE);
    }

    #[test]
    fn test_toml_keys() {
        #[derive(Deserialize)]
        struct Doc {
            gradient: Gradient,
        }
        let doc: Doc = toml::from_str(
            "gradient = [{ time = 1.0, color = { r = 1.0, g = 0.0, b = 0.0 } }, \
             { time = 0.0, color = { r = 0.0, g = 0.0, b = 1.0 } }]",
        )
        .unwrap();
        assert_eq!(doc.gradient.keys()[0].time, 0.0);
        assert_eq!(doc.gradient.evaluate(1.0), Color::rgb(1.0, 0.0, 0.0));
    }
}
