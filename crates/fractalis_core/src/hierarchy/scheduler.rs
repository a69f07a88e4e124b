//! # Hierarchy Scheduler
//!
//! Runs the propagation kernel across levels as a chain of fork/join steps:
//!
//! ```text
//!   level 1 ──fork──► [items 0..5]      ──join──┐
//!                                               ▼ barrier
//!   level 2 ──fork──► [items 0..25]     ──join──┐
//!                                               ▼ barrier
//!   level 3 ──fork──► [items 0..125]    ──join──► upload
//! ```
//!
//! Within a level every item is independent. Level `L` reads level `L-1`
//! through a shared borrow while its own arrays are borrowed mutably, so
//! the borrow checker rules out reading a level before its batch finished.

use rayon::prelude::*;

use super::kernel::{parent_index, propagate};
use super::level::Level;
use crate::config::HierarchyConfig;
use crate::error::ConfigError;
use fractalis_shared::constants::LEVEL_SCALE_FACTOR;

/// Thread pool used for data-parallel fan-out.
#[derive(Debug)]
pub enum WorkerPool {
    /// The process-wide rayon pool.
    Global,
    /// A pool owned by this subsystem.
    Dedicated(rayon::ThreadPool),
}

impl WorkerPool {
    /// Creates a pool with `threads` workers, or the global pool for `0`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WorkerPool`] if the threads cannot be spawned.
    pub fn new(threads: usize) -> Result<Self, ConfigError> {
        if threads == 0 {
            return Ok(Self::Global);
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("fractalis-worker-{i}"))
            .build()
            .map(Self::Dedicated)
            .map_err(|e| ConfigError::WorkerPool(e.to_string()))
    }

    /// Runs `op` inside this pool and blocks until it returns.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match self {
            Self::Global => op(),
            Self::Dedicated(pool) => pool.install(op),
        }
    }

    /// Number of worker threads available.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        match self {
            Self::Global => rayon::current_num_threads(),
            Self::Dedicated(pool) => pool.current_num_threads(),
        }
    }
}

/// Drives propagation over levels `1..depth`.
#[derive(Debug)]
pub struct HierarchyScheduler {
    /// Where level batches run.
    pool: WorkerPool,
    /// Minimum items per worker task.
    batch_size: usize,
}

impl HierarchyScheduler {
    /// Creates a scheduler from a validated config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the pool cannot be built.
    pub fn new(config: &HierarchyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            pool: WorkerPool::new(config.worker_threads)?,
            batch_size: config.batch_size,
        })
    }

    /// Worker pool in use.
    #[must_use]
    pub const fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Propagates every level below the root.
    ///
    /// Level 0 must already hold this frame's root state. Level `L` uses
    /// scale `base_scale * 0.5^L`. Returns once every level is written.
    pub fn advance(&self, levels: &mut [Level], spin_delta: f32, base_scale: f32) {
        let mut scale = base_scale;
        for index in 1..levels.len() {
            scale *= LEVEL_SCALE_FACTOR;
            let (done, pending) = levels.split_at_mut(index);
            let parents = &done[index - 1];
            let level = &mut pending[0];
            self.propagate_level(parents, level, spin_delta, scale);
        }
    }

    /// One fork/join step: all items of `level`, then return.
    fn propagate_level(&self, parents: &Level, level: &mut Level, spin_delta: f32, scale: f32) {
        let batch_size = self.batch_size;
        let parent_parts = parents.parts();
        let Level { parts, matrices, .. } = &mut *level;

        self.pool.install(|| {
            parts
                .par_iter_mut()
                .zip(matrices.par_iter_mut())
                .enumerate()
                .with_min_len(batch_size)
                .for_each(|(i, (part, matrix))| {
                    let parent = &parent_parts[parent_index(i)];
                    let (updated, packed) = propagate(parent, part, spin_delta, scale);
                    *part = updated;
                    *matrix = packed;
                });
        });

        tracing::trace!(level = level.index(), items = level.len(), scale, "level propagated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::FractalPart;
    use fractalis_shared::Vec3;

    fn levels(depth: usize) -> Vec<Level> {
        (0..depth).map(Level::new).collect()
    }

    #[test]
    fn test_global_pool() {
        let pool = WorkerPool::new(0).unwrap();
        assert!(matches!(pool, WorkerPool::Global));
        assert!(pool.thread_count() >= 1);
    }

    #[test]
    fn test_dedicated_pool() {
        let pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.thread_count(), 2);
        assert_eq!(pool.install(|| 21 * 2), 42);
    }

    #[test]
    fn test_level_scales_halve() {
        let scheduler = HierarchyScheduler::new(&HierarchyConfig::default()).unwrap();
        let mut levels = levels(4);
        scheduler.advance(&mut levels, 0.0, 1.0);

        for (index, level) in levels.iter().enumerate().skip(1) {
            let expected = 0.5_f32.powi(index as i32);
            let (_, _, scale) = level.matrices()[0].to_trs();
            assert!((scale.x - expected).abs() < 1.0e-6);
        }
    }

    #[test]
    fn test_children_follow_parent() {
        let scheduler = HierarchyScheduler::new(&HierarchyConfig::default()).unwrap();
        let mut levels = levels(3);
        levels[0].parts[0].world_position = Vec3::new(10.0, 0.0, 0.0);
        scheduler.advance(&mut levels, 0.0, 1.0);

        // First child of the root sits straight above it: 1.5 * 0.5
        let up_child: &FractalPart = &levels[1].parts()[0];
        assert!(up_child.world_position.distance(Vec3::new(10.0, 0.75, 0.0)) < 1.0e-5);
    }

    #[test]
    fn test_dedicated_matches_global() {
        let global = HierarchyScheduler::new(&HierarchyConfig::default()).unwrap();
        let dedicated = HierarchyScheduler::new(&HierarchyConfig {
            worker_threads: 3,
            batch_size: 1,
            ..HierarchyConfig::default()
        })
        .unwrap();

        let mut a = levels(5);
        let mut b = levels(5);
        for _ in 0..3 {
            global.advance(&mut a, 0.1, 2.0);
            dedicated.advance(&mut b, 0.1, 2.0);
        }
        for (la, lb) in a.iter().zip(&b) {
            assert_eq!(la.matrices(), lb.matrices());
        }
    }
}
