//! # Configuration Error Types
//!
//! Every error a configuration can produce. These are raised while a
//! subsystem is being (re)initialized, never from the per-frame path.

use thiserror::Error;

/// Errors detected while validating a configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Hierarchy depth outside the supported range.
    #[error("depth {depth} outside supported range {min}..={max}")]
    DepthOutOfRange {
        /// The requested depth.
        depth: usize,
        /// Smallest supported depth.
        min: usize,
        /// Largest supported depth.
        max: usize,
    },

    /// Grid resolution outside the supported range.
    #[error("resolution {resolution} outside supported range {min}..={max}")]
    ResolutionOutOfRange {
        /// The requested resolution.
        resolution: u32,
        /// Smallest supported resolution.
        min: u32,
        /// Largest supported resolution.
        max: u32,
    },

    /// A duration that is negative, NaN or infinite.
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidDuration {
        /// Which duration.
        name: &'static str,
        /// The offending value.
        value: f32,
    },

    /// A bounded numeric option outside its range.
    #[error("{name} = {value} outside supported range {min}..={max}")]
    ValueOutOfRange {
        /// Which option.
        name: &'static str,
        /// The offending value.
        value: f32,
        /// Lower bound (inclusive).
        min: f32,
        /// Upper bound (inclusive).
        max: f32,
    },

    /// Function identifier not in the catalog.
    #[error("unknown function index {0}")]
    UnknownFunction(u32),

    /// Shape identifier not in the catalog.
    #[error("unknown shape index {0}")]
    UnknownShape(u32),

    /// Leaf styling asked for more trailing levels than exist.
    #[error("leaf policy covers {leaf_levels} levels but the hierarchy has {depth}")]
    LeafLevelsExceedDepth {
        /// Requested trailing leaf levels.
        leaf_levels: usize,
        /// Hierarchy depth.
        depth: usize,
    },

    /// A level array whose length is not `5^level`.
    #[error("level {level} holds {actual} parts, expected {expected}")]
    MalformedLevel {
        /// Level index.
        level: usize,
        /// Required length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Work batches must contain at least one item.
    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    /// The dedicated worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

/// Checks that a duration is finite and non-negative.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDuration`] otherwise.
pub fn check_duration(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDuration { name, value })
    }
}

/// Checks that `value` lies in `min..=max`.
///
/// # Errors
///
/// Returns [`ConfigError::ValueOutOfRange`] otherwise, including for NaN.
pub fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValueOutOfRange { name, value, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_checks() {
        assert!(check_duration("functionDuration", 0.0).is_ok());
        assert!(check_duration("functionDuration", -1.0).is_err());
        assert!(check_duration("functionDuration", f32::NAN).is_err());
        assert!(check_duration("functionDuration", f32::INFINITY).is_err());
    }

    #[test]
    fn test_range_rejects_nan() {
        assert!(check_range("instanceScale", f32::NAN, 0.1, 10.0).is_err());
        assert!(check_range("instanceScale", 2.0, 0.1, 10.0).is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::DepthOutOfRange { depth: 9, min: 3, max: 8 };
        assert_eq!(err.to_string(), "depth 9 outside supported range 3..=8");
    }
}
