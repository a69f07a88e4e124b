//! # Function Grapher
//!
//! Draws `resolution^2` points on an animated function surface. Positions
//! come from one of two places:
//!
//! ```text
//!   Evaluation::Gpu   kernel[to + from * 5] ──writes──► positions buffer
//!   Evaluation::Cpu   worker pool ──► native packs ──upload──► positions buffer
//! ```
//!
//! Either way the draw reads `_Positions` and `_Step` from the same
//! parameter block, and bounds are a cube of edge `2 + 2 / resolution`
//! at the origin.

use fractalis_procedural::{GridMapping, SurfaceEvaluator, TransitionController};
use fractalis_shared::constants::names;
use fractalis_shared::{Float3x4, Vec3};

use crate::backend::{BufferAllocator, BufferHandle, BufferUsage, KernelId, RenderBackend};
use crate::bounds::Aabb;
use crate::config::{Evaluation, GraphConfig};
use crate::error::{BackendError, RenderError};
use crate::indirect::{DrawCall, DrawIndexedIndirectArgs};
use crate::parameters::{ParameterBlock, ParameterValue};
use crate::staging::StagingBuffer;
use crate::stats::RenderStats;

/// Where positions are produced.
#[derive(Debug)]
enum PositionSource {
    /// Written by compute kernels, one `float3` per point.
    Gpu(StagingBuffer<[f32; 3]>),
    /// Written by worker threads, four points per pack.
    Cpu {
        buffer: StagingBuffer<Float3x4>,
        native: Vec<Float3x4>,
        evaluator: SurfaceEvaluator,
    },
}

impl PositionSource {
    fn handle(&self) -> BufferHandle {
        match self {
            Self::Gpu(buffer) => buffer.handle(),
            Self::Cpu { buffer, .. } => buffer.handle(),
        }
    }
}

/// An initialized grapher.
#[derive(Debug)]
pub struct GpuGraph {
    config: GraphConfig,
    grid: GridMapping,
    controller: TransitionController,
    positions: PositionSource,
    args: StagingBuffer<DrawIndexedIndirectArgs>,
    parameters: ParameterBlock,
}

impl GpuGraph {
    /// Validates `config` and allocates the positions buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Config`] before allocating anything if the
    /// config is invalid.
    pub fn initialize<A: BufferAllocator + ?Sized>(
        config: &GraphConfig,
        allocator: &mut A,
    ) -> Result<Self, RenderError> {
        config.validate()?;
        let grid = GridMapping::new(config.resolution)?;
        let controller = TransitionController::new(&config.transition)?;

        let positions = match config.evaluation {
            Evaluation::Gpu => PositionSource::Gpu(StagingBuffer::create(
                allocator,
                "graph positions",
                BufferUsage::Storage,
                grid.cell_count(),
            )?),
            Evaluation::Cpu => {
                let evaluator = SurfaceEvaluator::new(config.resolution, config.worker_threads)?;
                let packs = evaluator.packed_len();
                PositionSource::Cpu {
                    buffer: StagingBuffer::create(allocator, "graph positions", BufferUsage::Storage, packs)?,
                    native: vec![Float3x4::default(); packs],
                    evaluator,
                }
            }
        };

        let args = match create_args(allocator, config, &grid) {
            Ok(args) => args,
            Err(e) => {
                release_positions(allocator, positions);
                return Err(e.into());
            }
        };

        let mut parameters = ParameterBlock::new();
        parameters
            .set_buffer(names::POSITIONS, positions.handle())
            .set_float(names::STEP, grid.step());

        tracing::info!(
            resolution = config.resolution,
            evaluation = ?config.evaluation,
            function = ?config.transition.function,
            mode = ?config.transition.mode,
            "graph initialized"
        );

        Ok(Self {
            config: config.clone(),
            grid,
            controller,
            positions,
            args,
            parameters,
        })
    }

    /// Advances the transition clock, produces positions and draws.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub fn update<B: RenderBackend + ?Sized>(
        &mut self,
        delta_time: f32,
        backend: &mut B,
    ) -> Result<RenderStats, RenderError> {
        self.controller.tick(delta_time);
        let time = self.controller.time();
        let mut stats = RenderStats { recomputed: true, ..RenderStats::default() };

        match &mut self.positions {
            PositionSource::Gpu(buffer) => {
                backend.set_parameter(names::RESOLUTION, ParameterValue::Int(self.grid.resolution()));
                backend.set_parameter(names::STEP, ParameterValue::Float(self.grid.step()));
                backend.set_parameter(names::TIME, ParameterValue::Float(time));
                if let Some(progress) = self.controller.progress() {
                    backend.set_parameter(names::TRANSITION_PROGRESS, ParameterValue::Float(progress));
                }
                let kernel = KernelId(self.controller.kernel_index());
                let groups = self.grid.thread_groups();
                backend.bind_buffer(kernel, names::POSITIONS, buffer.handle());
                backend.dispatch(kernel, [groups, groups, 1])?;
                stats.dispatches += 1;
            }
            PositionSource::Cpu { buffer, native, evaluator } => {
                evaluator.evaluate_function(&self.controller.blend(), time, native);
                buffer.upload(backend, native)?;
                stats.record_upload(buffer.byte_len());
            }
        }

        let instances = self.instance_count();
        backend.draw_instanced_indirect(&DrawCall {
            mesh: self.config.mesh,
            material: self.config.material,
            bounds: self.bounds(),
            instance_count: instances,
            args: self.args.handle(),
            args_index: 0,
            parameters: &self.parameters,
        })?;
        stats.record_draw(instances);
        Ok(stats)
    }

    /// Releases the positions and argument buffers.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure; both buffers are still released.
    pub fn teardown<A: BufferAllocator + ?Sized>(self, allocator: &mut A) -> Result<(), BackendError> {
        let args = self.args.release(allocator);
        let positions = match self.positions {
            PositionSource::Gpu(buffer) => buffer.release(allocator),
            PositionSource::Cpu { buffer, .. } => buffer.release(allocator),
        };
        tracing::info!(resolution = self.config.resolution, "graph torn down");
        args.and(positions)
    }

    /// Tears down and initializes again with `config`.
    ///
    /// # Errors
    ///
    /// Returns the teardown failure, or the initialization failure.
    pub fn reconfigure<A: BufferAllocator + ?Sized>(
        self,
        config: &GraphConfig,
        allocator: &mut A,
    ) -> Result<Self, RenderError> {
        self.teardown(allocator)?;
        Self::initialize(config, allocator)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Grid being drawn.
    #[must_use]
    pub const fn grid(&self) -> &GridMapping {
        &self.grid
    }

    /// Function selection state.
    #[must_use]
    pub const fn controller(&self) -> &TransitionController {
        &self.controller
    }

    /// Buffer holding the positions.
    #[must_use]
    pub fn positions_handle(&self) -> BufferHandle {
        self.positions.handle()
    }

    /// Draw parameters.
    #[must_use]
    pub const fn parameters(&self) -> &ParameterBlock {
        &self.parameters
    }

    /// Points drawn per frame.
    #[must_use]
    pub fn instance_count(&self) -> u32 {
        self.grid.resolution() * self.grid.resolution()
    }

    /// Draw bounds.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::cube(Vec3::ZERO, 2.0 + 2.0 / self.grid.resolution() as f32)
    }
}

fn create_args<A: BufferAllocator + ?Sized>(
    allocator: &mut A,
    config: &GraphConfig,
    grid: &GridMapping,
) -> Result<StagingBuffer<DrawIndexedIndirectArgs>, BackendError> {
    let args = StagingBuffer::create(allocator, "graph args", BufferUsage::Indirect, 1)?;
    let instances = grid.resolution() * grid.resolution();
    if let Err(e) = args.upload(allocator, &[DrawIndexedIndirectArgs::for_mesh(config.mesh, instances)]) {
        args.release_or_warn(allocator);
        return Err(e);
    }
    Ok(args)
}

fn release_positions<A: BufferAllocator + ?Sized>(allocator: &mut A, positions: PositionSource) {
    let released = match positions {
        PositionSource::Gpu(buffer) => buffer.release(allocator),
        PositionSource::Cpu { buffer, .. } => buffer.release(allocator),
    };
    if let Err(e) = released {
        tracing::warn!(error = %e, "release after failed initialization");
    }
}
