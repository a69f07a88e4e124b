//! # Shape Visualization
//!
//! Samples a [`Shape`] on worker threads, maps it through the host
//! transform and draws one instance per grid point. Work is only redone
//! when something changed:
//!
//! ```text
//!   update(host)
//!     ├─ dirty or host moved? ──yes──► evaluate ─► hooks.update ─► upload x2
//!     └─ always ─────────────────────► draw_instanced_indirect
//! ```
//!
//! Behaviour specific to a particular visualization plugs in through
//! [`VisualizationHooks`].

use fractalis_procedural::SurfaceEvaluator;
use fractalis_shared::constants::names;
use fractalis_shared::{Float3x4, Transform, Vec4};

use crate::backend::{BufferAllocator, BufferUsage, DrawSink};
use crate::bounds::Aabb;
use crate::config::VisualizationConfig;
use crate::error::{BackendError, RenderError};
use crate::indirect::{DrawCall, DrawIndexedIndirectArgs};
use crate::parameters::ParameterBlock;
use crate::staging::StagingBuffer;
use crate::stats::RenderStats;

/// Extension points of a [`Visualization`]. Every method defaults to a
/// no-op.
pub trait VisualizationHooks {
    /// Called once after buffers exist, with the packed array length and
    /// the draw parameters to extend.
    fn enable(&mut self, _packed_len: usize, _parameters: &mut ParameterBlock) {}

    /// Called once before buffers are released.
    fn disable(&mut self) {}

    /// Called after each re-evaluation, before upload.
    fn update(&mut self, _positions: &[Float3x4], _resolution: u32) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl VisualizationHooks for NoHooks {}

/// An initialized shape visualization.
#[derive(Debug)]
pub struct Visualization<H: VisualizationHooks = NoHooks> {
    config: VisualizationConfig,
    evaluator: SurfaceEvaluator,
    positions: Vec<Float3x4>,
    normals: Vec<Float3x4>,
    positions_buffer: StagingBuffer<Float3x4>,
    normals_buffer: StagingBuffer<Float3x4>,
    args: StagingBuffer<DrawIndexedIndirectArgs>,
    parameters: ParameterBlock,
    hooks: H,
    dirty: bool,
    last_transform: Option<Transform>,
    bounds: Aabb,
}

impl<H: VisualizationHooks> Visualization<H> {
    /// Validates `config`, allocates buffers and enables `hooks`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Config`] before allocating anything if the
    /// config is invalid.
    pub fn initialize<A: BufferAllocator + ?Sized>(
        config: &VisualizationConfig,
        mut hooks: H,
        allocator: &mut A,
    ) -> Result<Self, RenderError> {
        config.validate()?;
        let evaluator = SurfaceEvaluator::new(config.resolution, config.worker_threads)?;
        let packs = evaluator.packed_len();

        let positions_buffer =
            StagingBuffer::create(allocator, "visualization positions", BufferUsage::Storage, packs)?;
        let normals_buffer =
            match StagingBuffer::create(allocator, "visualization normals", BufferUsage::Storage, packs) {
                Ok(buffer) => buffer,
                Err(e) => {
                    positions_buffer.release_or_warn(allocator);
                    return Err(e.into());
                }
            };
        let args = match create_args(allocator, config) {
            Ok(args) => args,
            Err(e) => {
                positions_buffer.release_or_warn(allocator);
                normals_buffer.release_or_warn(allocator);
                return Err(e.into());
            }
        };

        let resolution = config.resolution as f32;
        let mut parameters = ParameterBlock::new();
        parameters
            .set_buffer(names::POSITIONS, positions_buffer.handle())
            .set_buffer(names::NORMALS, normals_buffer.handle())
            .set_vector(
                names::CONFIG,
                Vec4::new(resolution, config.instance_scale / resolution, config.displacement, 0.0),
            );
        hooks.enable(packs, &mut parameters);

        tracing::info!(
            resolution = config.resolution,
            shape = ?config.shape,
            "visualization initialized"
        );

        Ok(Self {
            config: config.clone(),
            evaluator,
            positions: vec![Float3x4::default(); packs],
            normals: vec![Float3x4::default(); packs],
            positions_buffer,
            normals_buffer,
            args,
            parameters,
            hooks,
            dirty: true,
            last_transform: None,
            bounds: Aabb::default(),
        })
    }

    /// Re-evaluates if needed, then draws.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub fn update<B: BufferAllocator + DrawSink + ?Sized>(
        &mut self,
        host: &Transform,
        backend: &mut B,
    ) -> Result<RenderStats, RenderError> {
        let mut stats = RenderStats::default();

        if self.dirty || self.last_transform.as_ref() != Some(host) {
            self.dirty = false;
            self.last_transform = Some(*host);

            self.evaluator
                .evaluate_shape(self.config.shape, host, &mut self.positions, &mut self.normals);
            self.hooks.update(&self.positions, self.config.resolution);

            self.positions_buffer.upload(backend, &self.positions)?;
            self.normals_buffer.upload(backend, &self.normals)?;
            stats.record_upload(self.positions_buffer.byte_len());
            stats.record_upload(self.normals_buffer.byte_len());

            let extent = 2.0 * host.scale.abs().max_element() + self.config.displacement;
            self.bounds = Aabb::cube(host.position, extent);
            stats.recomputed = true;
            tracing::debug!(shape = ?self.config.shape, "visualization re-evaluated");
        }

        let instances = self.instance_count();
        backend.draw_instanced_indirect(&DrawCall {
            mesh: self.config.mesh,
            material: self.config.material,
            bounds: self.bounds,
            instance_count: instances,
            args: self.args.handle(),
            args_index: 0,
            parameters: &self.parameters,
        })?;
        stats.record_draw(instances);
        Ok(stats)
    }

    /// Forces re-evaluation on the next update.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Disables the hooks, releases every buffer and hands the hooks back.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure; all buffers are still released.
    pub fn teardown<A: BufferAllocator + ?Sized>(mut self, allocator: &mut A) -> Result<H, BackendError> {
        self.hooks.disable();
        let positions = self.positions_buffer.release(allocator);
        let normals = self.normals_buffer.release(allocator);
        let args = self.args.release(allocator);
        tracing::info!(resolution = self.config.resolution, "visualization torn down");
        positions.and(normals).and(args).map(|()| self.hooks)
    }

    /// Tears down and initializes again with `config`, keeping the hooks.
    ///
    /// # Errors
    ///
    /// Returns the teardown failure, or the initialization failure.
    pub fn reconfigure<A: BufferAllocator + ?Sized>(
        self,
        config: &VisualizationConfig,
        allocator: &mut A,
    ) -> Result<Self, RenderError> {
        let hooks = self.teardown(allocator)?;
        Self::initialize(config, hooks, allocator)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &VisualizationConfig {
        &self.config
    }

    /// The plugged-in hooks.
    #[must_use]
    pub const fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Native positions from the last evaluation.
    #[must_use]
    pub fn positions(&self) -> &[Float3x4] {
        &self.positions
    }

    /// Native normals from the last evaluation.
    #[must_use]
    pub fn normals(&self) -> &[Float3x4] {
        &self.normals
    }

    /// Draw parameters.
    #[must_use]
    pub const fn parameters(&self) -> &ParameterBlock {
        &self.parameters
    }

    /// Bounds of the last evaluation.
    #[must_use]
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Instances drawn per frame.
    #[must_use]
    pub fn instance_count(&self) -> u32 {
        self.config.resolution * self.config.resolution
    }
}

fn create_args<A: BufferAllocator + ?Sized>(
    allocator: &mut A,
    config: &VisualizationConfig,
) -> Result<StagingBuffer<DrawIndexedIndirectArgs>, BackendError> {
    let args = StagingBuffer::create(allocator, "visualization args", BufferUsage::Indirect, 1)?;
    let instances = config.resolution * config.resolution;
    if let Err(e) = args.upload(allocator, &[DrawIndexedIndirectArgs::for_mesh(config.mesh, instances)]) {
        args.release_or_warn(allocator);
        return Err(e);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::parameters::ParameterValue;
    use fractalis_procedural::Shape;
    use fractalis_shared::{Quaternion, Vec3};

    #[derive(Default)]
    struct CountingHooks {
        enabled: usize,
        updates: usize,
        disabled: bool,
    }

    impl VisualizationHooks for CountingHooks {
        fn enable(&mut self, packed_len: usize, parameters: &mut ParameterBlock) {
            self.enabled = packed_len;
            parameters.set_float("_Extra", 1.0);
        }

        fn disable(&mut self) {
            self.disabled = true;
        }

        fn update(&mut self, _positions: &[Float3x4], _resolution: u32) {
            self.updates += 1;
        }
    }

    fn config() -> VisualizationConfig {
        VisualizationConfig { resolution: 8, shape: Shape::Sphere, ..VisualizationConfig::default() }
    }

    #[test]
    fn test_reevaluates_only_on_change() {
        let mut backend = RecordingBackend::new();
        let mut vis = Visualization::initialize(&config(), CountingHooks::default(), &mut backend).unwrap();
        assert_eq!(vis.hooks().enabled, 16);
        assert_eq!(vis.parameters().get("_Extra"), Some(ParameterValue::Float(1.0)));

        let host = Transform::IDENTITY;
        assert!(vis.update(&host, &mut backend).unwrap().recomputed);
        assert!(!vis.update(&host, &mut backend).unwrap().recomputed);

        let moved = Transform { position: Vec3::new(0.0, 1.0, 0.0), ..host };
        assert!(vis.update(&moved, &mut backend).unwrap().recomputed);

        vis.mark_dirty();
        assert!(vis.update(&moved, &mut backend).unwrap().recomputed);
        assert_eq!(vis.hooks().updates, 3);
        // Every update draws, recomputed or not.
        assert_eq!(backend.draws().len(), 4);

        let hooks = vis.teardown(&mut backend).unwrap();
        assert!(hooks.disabled);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_bounds_follow_scale() {
        let mut backend = RecordingBackend::new();
        let mut vis = Visualization::initialize(&config(), NoHooks, &mut backend).unwrap();
        let host = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quaternion::IDENTITY,
            Vec3::new(1.0, -3.0, 2.0),
        );
        vis.update(&host, &mut backend).unwrap();
        assert_eq!(vis.bounds(), Aabb::cube(host.position, 2.0 * 3.0 + 0.1));
    }

    #[test]
    fn test_config_vector() {
        let mut backend = RecordingBackend::new();
        let vis = Visualization::initialize(&config(), NoHooks, &mut backend).unwrap();
        assert_eq!(
            vis.parameters().get(names::CONFIG),
            Some(ParameterValue::Vector(Vec4::new(8.0, 2.0 / 8.0, 0.1, 0.0)))
        );
    }

    #[test]
    fn test_uploads_world_space_positions() {
        let mut backend = RecordingBackend::new();
        let mut vis = Visualization::initialize(&config(), NoHooks, &mut backend).unwrap();
        let host = Transform::new(Vec3::new(10.0, 0.0, 0.0), Quaternion::IDENTITY, Vec3::ONE);
        vis.update(&host, &mut backend).unwrap();
        let handle = vis.parameters().buffer(names::POSITIONS).unwrap();
        let uploaded: Vec<Float3x4> = backend.read(handle).unwrap();
        assert_eq!(uploaded, vis.positions());
        for pack in &uploaded {
            for column in 0..4 {
                assert!((pack.column(column).distance(host.position) - 0.5).abs() < 1.0e-4);
            }
        }
    }
}
