//! # Fractal Hierarchy
//!
//! A fixed-branching tree stored level by level in flat arrays:
//!
//! ```text
//!   level 0:  [R]                                   1 part
//!   level 1:  [u r l f b]                           5 parts
//!   level 2:  [u r l f b][u r l f b] ... x5        25 parts
//!   ...
//!   parent(i) = i / 5        slot(i) = i % 5
//! ```
//!
//! Each frame the root is driven by the host transform, then the scheduler
//! cascades world transforms down one level at a time.

mod kernel;
mod level;
mod part;
mod scheduler;

pub use kernel::{child_index, parent_index, propagate};
pub use level::Level;
pub use part::FractalPart;
pub use scheduler::{HierarchyScheduler, WorkerPool};

use fractalis_shared::constants::SPIN_SPEED;
use fractalis_shared::{Float3x4, Quaternion, Transform};

use crate::config::HierarchyConfig;
use crate::error::ConfigError;

/// All levels of one fractal plus the scheduler that advances them.
///
/// Created by [`FractalHierarchy::initialize`]; dropping it releases every
/// native array. Propagation blocks until all workers joined, so no worker
/// can outlive the arrays it writes.
#[derive(Debug)]
pub struct FractalHierarchy {
    /// Levels 0..depth.
    levels: Vec<Level>,
    /// Fan-out scheduler.
    scheduler: HierarchyScheduler,
    /// Frames advanced so far.
    frame: u64,
}

impl FractalHierarchy {
    /// Validates `config` and allocates every level.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the config is invalid; nothing is
    /// allocated in that case.
    pub fn initialize(config: &HierarchyConfig) -> Result<Self, ConfigError> {
        let scheduler = HierarchyScheduler::new(config)?;
        let levels: Vec<Level> = (0..config.depth).map(Level::new).collect();
        for level in &levels {
            level.validate()?;
        }

        tracing::info!(
            depth = config.depth,
            parts = levels.iter().map(Level::len).sum::<usize>(),
            workers = scheduler.pool().thread_count(),
            "fractal hierarchy initialized"
        );

        Ok(Self { levels, scheduler, frame: 0 })
    }

    /// Number of levels.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// All levels, root first.
    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Level `index`, if it exists.
    #[must_use]
    pub fn level(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    /// The root part.
    #[must_use]
    pub fn root(&self) -> &FractalPart {
        &self.levels[0].parts[0]
    }

    /// Total parts over all levels.
    #[must_use]
    pub fn total_parts(&self) -> usize {
        self.levels.iter().map(Level::len).sum()
    }

    /// Frames advanced since initialization.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Advances one frame of `delta_time` seconds at the standard spin speed.
    pub fn advance(&mut self, host: &Transform, delta_time: f32) {
        self.advance_with_spin(host, SPIN_SPEED * delta_time);
    }

    /// Advances one frame with an explicit spin delta in radians.
    ///
    /// Updates the root from `host`, then propagates levels `1..depth`
    /// using the host's uniform scale as the base scale.
    pub fn advance_with_spin(&mut self, host: &Transform, spin_delta: f32) {
        let object_scale = host.uniform_scale();
        self.update_root(host, spin_delta, object_scale);
        self.scheduler.advance(&mut self.levels, spin_delta, object_scale);
        self.frame += 1;
    }

    /// Drives the root from the host transform instead of a parent part.
    fn update_root(&mut self, host: &Transform, spin_delta: f32, object_scale: f32) {
        let root_level = &mut self.levels[0];
        let root = &mut root_level.parts[0];
        root.add_spin(spin_delta);
        root.world_rotation =
            host.rotation * (root.local_rotation * Quaternion::from_rotation_y(root.spin_angle));
        root.world_position = host.position;
        root_level.matrices[0] = Float3x4::from_rotation_translation_scale(
            root.world_rotation,
            root.world_position,
            object_scale,
        );
    }
}
