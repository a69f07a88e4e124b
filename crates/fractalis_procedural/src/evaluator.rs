//! # Surface Evaluator
//!
//! Evaluates a shape or function over the whole grid on worker threads and
//! writes the results four cells per [`Float3x4`]:
//!
//! ```text
//!   cells:   0  1  2  3 | 4  5  6  7 | 8 ...
//!   packs:   [  pack 0  ] [  pack 1  ] [ ...
//!            c0 c1 c2 c3
//! ```
//!
//! Packs are independent, so the grid is split across the pool with no
//! ordering between them. A trailing pack past the last cell repeats the
//! last cell.

use fractalis_core::{ConfigError, WorkerPool};
use fractalis_shared::{Float3x4, Transform, Vec3, CELLS_PER_PACK};
use rayon::prelude::*;

use crate::functions::FunctionBlend;
use crate::grid::GridMapping;
use crate::shapes::{Shape, ShapeSample};

/// Minimum packs per worker task.
const MIN_PACKS_PER_TASK: usize = 64;

/// Grid evaluator bound to one resolution and worker pool.
#[derive(Debug)]
pub struct SurfaceEvaluator {
    grid: GridMapping,
    pool: WorkerPool,
}

impl SurfaceEvaluator {
    /// Creates an evaluator for `resolution` cells per axis.
    ///
    /// `worker_threads == 0` uses the global pool.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported resolution or if the pool
    /// cannot be built.
    pub fn new(resolution: u32, worker_threads: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            grid: GridMapping::new(resolution)?,
            pool: WorkerPool::new(worker_threads)?,
        })
    }

    /// Grid being evaluated.
    #[must_use]
    pub const fn grid(&self) -> &GridMapping {
        &self.grid
    }

    /// Packs needed for one output array.
    #[must_use]
    pub fn packed_len(&self) -> usize {
        self.grid.packed_len()
    }

    /// Samples `shape` everywhere and maps the results to world space.
    ///
    /// Positions go through the full TRS transform; normals through its
    /// inverse-transpose and are renormalized. Blocks until every pack is
    /// written. Both slices should be [`Self::packed_len`] long.
    pub fn evaluate_shape(
        &self,
        shape: Shape,
        transform: &Transform,
        positions: &mut [Float3x4],
        normals: &mut [Float3x4],
    ) {
        debug_assert_eq!(positions.len(), self.packed_len());
        debug_assert_eq!(normals.len(), self.packed_len());
        let grid = &self.grid;
        let sampler = shape.sampler();
        let matrix = transform.to_matrix();
        self.pool.install(|| {
            positions
                .par_iter_mut()
                .zip(normals.par_iter_mut())
                .enumerate()
                .with_min_len(MIN_PACKS_PER_TASK)
                .for_each(|(pack, (position, normal))| {
                    let samples = gather(grid, pack, |u, v| sampler(u, v));
                    *position = Float3x4::from_columns(
                        samples.map(|s: ShapeSample| matrix.transform_point(s.position)),
                    );
                    *normal = Float3x4::from_columns(
                        samples.map(|s: ShapeSample| transform.transform_normal(s.normal)),
                    );
                });
        });
    }

    /// Evaluates a (possibly blended) function at `time` inside this pool.
    pub fn evaluate_function(&self, blend: &FunctionBlend, time: f32, positions: &mut [Float3x4]) {
        self.pool
            .install(|| evaluate_function_grid(&self.grid, blend, time, positions));
    }
}

/// Evaluates `blend` over `grid` on the current rayon pool.
///
/// Positions are in function space (`[-1, 1]` domain); the caller's
/// instance scale and object transform apply at draw time.
pub fn evaluate_function_grid(
    grid: &GridMapping,
    blend: &FunctionBlend,
    time: f32,
    positions: &mut [Float3x4],
) {
    debug_assert_eq!(positions.len(), grid.packed_len());
    positions
        .par_iter_mut()
        .enumerate()
        .with_min_len(MIN_PACKS_PER_TASK)
        .for_each(|(pack, position)| {
            *position = Float3x4::from_columns(gather(grid, pack, |u, v| blend.evaluate(u, v, time)));
        });
}

/// Evaluates `f` for the four cells of `pack`.
#[inline]
fn gather<T: Copy + Default>(
    grid: &GridMapping,
    pack: usize,
    mut f: impl FnMut(f32, f32) -> T,
) -> [T; CELLS_PER_PACK] {
    let last = grid.cell_count() - 1;
    let base = pack * CELLS_PER_PACK;
    let mut out = [T::default(); CELLS_PER_PACK];
    for (lane, slot) in out.iter_mut().enumerate() {
        let (u, v) = grid.cell_coordinates((base + lane).min(last));
        *slot = f(u, v);
    }
    out
}

/// Unpacks cell `cell` from a packed array.
///
/// # Panics
///
/// Panics if `cell / 4` is out of bounds.
#[must_use]
pub fn unpack_cell(packed: &[Float3x4], cell: usize) -> Vec3 {
    packed[cell / CELLS_PER_PACK].column(cell % CELLS_PER_PACK)
}
