//! Hierarchy configuration.

use fractalis_shared::{MAX_DEPTH, MIN_DEPTH};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Shape and scheduling of a fractal hierarchy.
///
/// Changing any field requires tearing the hierarchy down and building a
/// new one; there is no in-place resize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Number of levels, including the root level.
    pub depth: usize,
    /// Dedicated worker threads. `0` uses the global rayon pool.
    pub worker_threads: usize,
    /// Minimum items handed to one worker at a time.
    pub batch_size: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            depth: 4,
            worker_threads: 0,
            batch_size: 5,
        }
    }
}

impl HierarchyConfig {
    /// Creates a config with the given depth and default scheduling.
    #[must_use]
    pub fn with_depth(depth: usize) -> Self {
        Self { depth, ..Self::default() }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the depth is outside `MIN_DEPTH..=MAX_DEPTH` or
    /// the batch size is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&self.depth) {
            return Err(ConfigError::DepthOutOfRange {
                depth: self.depth,
                min: MIN_DEPTH,
                max: MAX_DEPTH,
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }
}

/// Which trailing levels draw with the leaf mesh and colors.
///
/// Decided from the level index alone: level `l` of a `depth`-level
/// hierarchy is a leaf when `l + trailing_levels >= depth`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafPolicy {
    /// Number of deepest levels styled as leaves.
    pub trailing_levels: usize,
}

impl Default for LeafPolicy {
    fn default() -> Self {
        Self { trailing_levels: 1 }
    }
}

impl LeafPolicy {
    /// No leaf styling.
    pub const NONE: Self = Self { trailing_levels: 0 };

    /// Whether `level` uses leaf styling.
    #[must_use]
    pub const fn is_leaf(&self, level: usize, depth: usize) -> bool {
        level + self.trailing_levels >= depth
    }

    /// Checks the policy against a hierarchy depth.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LeafLevelsExceedDepth`] if more levels are
    /// requested than exist.
    pub fn validate(&self, depth: usize) -> Result<(), ConfigError> {
        if self.trailing_levels > depth {
            return Err(ConfigError::LeafLevelsExceedDepth {
                leaf_levels: self.trailing_levels,
                depth,
            });
        }
        Ok(())
    }
}
