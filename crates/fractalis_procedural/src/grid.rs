//! Uniform parameter grid.
//!
//! Cell `(x, z)` of a `resolution x resolution` grid maps to
//! `(-1 + step/2 + step * x, -1 + step/2 + step * z)` with
//! `step = 2 / resolution`. The mapping is a pure function of the index,
//! so cells can be evaluated in any order.

use fractalis_core::ConfigError;
use fractalis_shared::{CELLS_PER_PACK, MAX_RESOLUTION, MIN_RESOLUTION};
use fractalis_shared::constants::KERNEL_GROUP_SIZE;

/// Validated grid resolution and its derived step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridMapping {
    /// Cells per axis.
    resolution: u32,
    /// Domain width of one cell.
    step: f32,
}

impl GridMapping {
    /// Creates the mapping for `resolution` cells per axis.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ResolutionOutOfRange`] outside
    /// `MIN_RESOLUTION..=MAX_RESOLUTION`.
    pub fn new(resolution: u32) -> Result<Self, ConfigError> {
        if !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&resolution) {
            return Err(ConfigError::ResolutionOutOfRange {
                resolution,
                min: MIN_RESOLUTION,
                max: MAX_RESOLUTION,
            });
        }
        Ok(Self {
            resolution,
            step: 2.0 / resolution as f32,
        })
    }

    /// Cells per axis.
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Domain width of one cell.
    #[must_use]
    pub const fn step(&self) -> f32 {
        self.step
    }

    /// Total cells (`resolution^2`).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let r = self.resolution as usize;
        r * r
    }

    /// Number of 4-wide packs needed to hold every cell.
    #[must_use]
    pub fn packed_len(&self) -> usize {
        self.cell_count().div_ceil(CELLS_PER_PACK)
    }

    /// Domain coordinate of cell `index` along one axis.
    #[inline]
    #[must_use]
    pub fn coordinate(&self, index: u32) -> f32 {
        -1.0 + self.step * 0.5 + self.step * index as f32
    }

    /// Domain coordinates `(u, v)` of flat cell index `cell`.
    ///
    /// Cells run along X first: `x = cell % resolution`, `z = cell / resolution`.
    #[inline]
    #[must_use]
    pub fn cell_coordinates(&self, cell: usize) -> (f32, f32) {
        let r = self.resolution as usize;
        let (x, z) = (cell % r, cell / r);
        (self.coordinate(x as u32), self.coordinate(z as u32))
    }

    /// Compute workgroups per axis for an 8x8 kernel.
    #[must_use]
    pub fn thread_groups(&self) -> u32 {
        self.resolution.div_ceil(KERNEL_GROUP_SIZE)
    }
}
