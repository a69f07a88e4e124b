//! # Settings File
//!
//! One TOML file configures a whole run. A missing renderer section
//! disables that renderer; a present but empty section enables it with
//! defaults.
//!
//! ```toml
//! [run]
//! frames = 300
//! orbit_radius = 2.0
//!
//! [fractal]
//! depth = 6
//!
//! [graph]
//! resolution = 100
//! [graph.transition]
//! mode = "Random"
//! ```

use std::path::{Path, PathBuf};

use fractalis_core::{check_duration, check_range, ConfigError};
use fractalis_rendering::{FractalConfig, GraphConfig, VisualizationConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frame_loop::OrbitTransform;

/// Errors raised while loading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or names an unknown variant.
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// A section parsed but holds an out-of-range value.
    #[error("[{section}] {source}")]
    Invalid {
        /// Offending section.
        section: &'static str,
        /// What was wrong.
        #[source]
        source: ConfigError,
    },
}

/// How long to run and how the host transform moves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Frames to simulate.
    pub frames: u64,
    /// Fixed time step in seconds.
    pub delta_time: f32,
    /// Radius of the host orbit around the origin. `0` keeps it still.
    pub orbit_radius: f32,
    /// Orbit angular speed in radians per second.
    pub orbit_speed: f32,
    /// Uniform host scale.
    pub scale: f32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            frames: 600,
            delta_time: 1.0 / 60.0,
            orbit_radius: 0.0,
            orbit_speed: 0.5,
            scale: 1.0,
        }
    }
}

impl RunSettings {
    /// Validates the time step and host motion.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_duration("delta_time", self.delta_time)?;
        check_range("orbit_radius", self.orbit_radius, 0.0, 1000.0)?;
        check_range("orbit_speed", self.orbit_speed, -100.0, 100.0)?;
        check_range("scale", self.scale, 0.001, 1000.0)
    }

    /// Host transform provider described by these settings.
    #[must_use]
    pub const fn orbit(&self) -> OrbitTransform {
        OrbitTransform {
            radius: self.orbit_radius,
            speed: self.orbit_speed,
            scale: self.scale,
        }
    }
}

fn invalid(section: &'static str) -> impl FnOnce(ConfigError) -> SettingsError {
    move |source| SettingsError::Invalid { section, source }
}

/// A complete run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Timing and host motion.
    pub run: RunSettings,
    /// Fractal renderer, if enabled.
    pub fractal: Option<FractalConfig>,
    /// Function grapher, if enabled.
    pub graph: Option<GraphConfig>,
    /// Shape visualization, if enabled.
    pub visualization: Option<VisualizationConfig>,
}

impl Settings {
    /// Every renderer enabled with its defaults.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            run: RunSettings::default(),
            fractal: Some(FractalConfig::default()),
            graph: Some(GraphConfig::default()),
            visualization: Some(VisualizationConfig::default()),
        }
    }

    /// Parses and validates settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] for malformed text and
    /// [`SettingsError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates a settings file.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_toml_str`]; unreadable files give
    /// [`SettingsError::Io`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            fractal = settings.fractal.is_some(),
            graph = settings.graph.is_some(),
            visualization = settings.visualization.is_some(),
            "settings loaded"
        );
        Ok(settings)
    }

    /// Validates every present section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid section.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.run.validate().map_err(invalid("run"))?;
        if let Some(fractal) = &self.fractal {
            fractal.validate().map_err(invalid("fractal"))?;
        }
        if let Some(graph) = &self.graph {
            graph.validate().map_err(invalid("graph"))?;
        }
        if let Some(visualization) = &self.visualization {
            visualization.validate().map_err(invalid("visualization"))?;
        }
        Ok(())
    }

    /// Whether no renderer is enabled.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fractal.is_none() && self.graph.is_none() && self.visualization.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractalis_procedural::{FunctionName, Shape, TransitionMode};
    use fractalis_rendering::Evaluation;

    #[test]
    fn test_missing_sections_are_disabled() {
        let settings = Settings::from_toml_str("[run]\nframes = 10\n").unwrap();
        assert_eq!(settings.run.frames, 10);
        assert!(settings.is_empty());
    }

    #[test]
    fn test_empty_section_uses_defaults() {
        let settings = Settings::from_toml_str("[fractal]\n").unwrap();
        assert_eq!(settings.fractal, Some(FractalConfig::default()));
        assert!(settings.graph.is_none());
    }

    #[test]
    fn test_full_file() {
        let text = r#"
            [run]
            frames = 120
            delta_time = 0.02
            orbit_radius = 3.0

            [fractal]
            depth = 6
            seed = 7

            [graph]
            resolution = 100
            evaluation = "Cpu"
            [graph.transition]
            function = "Torus"
            mode = "Random"
            function_duration = 2.0

            [visualization]
            shape = "Sphere"
            displacement = -0.25
        "#;
        let settings = Settings::from_toml_str(text).unwrap();
        assert_eq!(settings.run.frames, 120);
        assert_eq!(settings.fractal.as_ref().map(|f| f.depth), Some(6));

        let graph = settings.graph.unwrap();
        assert_eq!(graph.evaluation, Evaluation::Cpu);
        assert_eq!(graph.transition.function, FunctionName::Torus);
        assert_eq!(graph.transition.mode, TransitionMode::Random);

        let visualization = settings.visualization.unwrap();
        assert_eq!(visualization.shape, Shape::Sphere);
        assert!((visualization.displacement + 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unknown_variant_is_parse_error() {
        let err = Settings::from_toml_str("[visualization]\nshape = \"Cube\"\n").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_out_of_range_names_section() {
        let err = Settings::from_toml_str("[fractal]\ndepth = 12\n").unwrap_err();
        match err {
            SettingsError::Invalid { section, source } => {
                assert_eq!(section, "fractal");
                assert!(matches!(source, ConfigError::DepthOutOfRange { depth: 12, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_delta_time_rejected() {
        let err = Settings::from_toml_str("[run]\ndelta_time = -0.1\n").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { section: "run", .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load("/nonexistent/fractalis.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn test_demo_is_valid() {
        assert!(Settings::demo().validate().is_ok());
    }
}
