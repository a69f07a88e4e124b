//! # Fractal Renderer
//!
//! Owns a [`FractalHierarchy`] and one GPU buffer per level. Each frame:
//!
//! ```text
//!   host transform ─► hierarchy.advance()      (worker pool, level barriers)
//!                          │
//!                          ▼
//!   for each level:  upload matrices ─► buffer[level]
//!                    draw_instanced_indirect(mesh, material, bounds,
//!                                            5^level, params[level])
//! ```
//!
//! Buffers, colors and seeds are fixed at `initialize`. Any change to the
//! config goes through [`FractalRenderer::reconfigure`], which tears the
//! renderer down and builds a new one.

use fractalis_core::FractalHierarchy;
use fractalis_procedural::{seeded_rng, SequenceNumbers};
use fractalis_shared::constants::names;
use fractalis_shared::{Float3x4, Transform};

use crate::backend::{BufferAllocator, BufferUsage, DrawSink};
use crate::bounds::Aabb;
use crate::config::FractalConfig;
use crate::error::{BackendError, RenderError};
use crate::indirect::{DrawCall, DrawIndexedIndirectArgs, MeshHandle};
use crate::parameters::ParameterBlock;
use crate::staging::StagingBuffer;
use crate::stats::RenderStats;

/// Draw bounds edge length per unit of object scale.
///
/// Deepest leaves poke slightly past this cube (1.5 * scale plus their own
/// half size). The size is kept as inherited; culling hosts pad it.
const BOUNDS_SCALE: f32 = 3.0;

/// Mesh and shader parameters of one level.
#[derive(Debug, Clone)]
struct LevelStyle {
    mesh: MeshHandle,
    leaf: bool,
    parameters: ParameterBlock,
}

/// An initialized fractal: hierarchy, level buffers and draw state.
#[derive(Debug)]
pub struct FractalRenderer {
    config: FractalConfig,
    hierarchy: FractalHierarchy,
    buffers: Vec<StagingBuffer<Float3x4>>,
    args: StagingBuffer<DrawIndexedIndirectArgs>,
    styles: Vec<LevelStyle>,
    sequence: SequenceNumbers,
}

impl FractalRenderer {
    /// Validates `config`, builds the hierarchy and allocates every buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Config`] before allocating anything if the
    /// config is invalid. Backend failures release whatever was already
    /// allocated.
    pub fn initialize<A: BufferAllocator + ?Sized>(
        config: &FractalConfig,
        allocator: &mut A,
    ) -> Result<Self, RenderError> {
        config.validate()?;
        let hierarchy = FractalHierarchy::initialize(&config.hierarchy())?;
        let depth = hierarchy.depth();
        let sequence = SequenceNumbers::generate(depth, &mut seeded_rng(config.seed));

        let mut buffers: Vec<StagingBuffer<Float3x4>> = Vec::with_capacity(depth);
        for level in hierarchy.levels() {
            let label = format!("fractal level {}", level.index());
            match StagingBuffer::create(allocator, &label, BufferUsage::Storage, level.len()) {
                Ok(buffer) => buffers.push(buffer),
                Err(e) => {
                    release_all(allocator, buffers);
                    return Err(e.into());
                }
            }
        }

        let args: StagingBuffer<DrawIndexedIndirectArgs> =
            match StagingBuffer::create(allocator, "fractal args", BufferUsage::Indirect, depth) {
                Ok(args) => args,
                Err(e) => {
                    release_all(allocator, buffers);
                    return Err(e.into());
                }
            };

        let styles: Vec<LevelStyle> = buffers
            .iter()
            .enumerate()
            .map(|(level, buffer)| level_style(config, &sequence, level, depth, buffer))
            .collect();

        let draw_args: Vec<DrawIndexedIndirectArgs> = hierarchy
            .levels()
            .iter()
            .zip(&styles)
            .map(|(level, style)| DrawIndexedIndirectArgs::for_mesh(style.mesh, level.len() as u32))
            .collect();
        if let Err(e) = args.upload(allocator, &draw_args) {
            release_all(allocator, buffers);
            args.release_or_warn(allocator);
            return Err(e.into());
        }

        tracing::info!(
            depth,
            parts = hierarchy.total_parts(),
            leaf_levels = config.leaf_policy.trailing_levels,
            "fractal renderer initialized"
        );

        Ok(Self {
            config: config.clone(),
            hierarchy,
            buffers,
            args,
            styles,
            sequence,
        })
    }

    /// Advances the hierarchy, uploads every level and issues its draw.
    ///
    /// # Errors
    ///
    /// Propagates backend failures. The next frame overwrites whatever was
    /// partially written.
    pub fn update<B: BufferAllocator + DrawSink + ?Sized>(
        &mut self,
        host: &Transform,
        delta_time: f32,
        backend: &mut B,
    ) -> Result<RenderStats, RenderError> {
        self.hierarchy.advance(host, delta_time);

        let bounds = Aabb::cube(
            self.hierarchy.root().world_position,
            BOUNDS_SCALE * host.uniform_scale().abs(),
        );

        let mut stats = RenderStats { recomputed: true, ..RenderStats::default() };
        for ((level, buffer), style) in self
            .hierarchy
            .levels()
            .iter()
            .zip(&self.buffers)
            .zip(&self.styles)
        {
            buffer.upload(backend, level.matrices())?;
            stats.record_upload(buffer.byte_len());

            let instances = level.len() as u32;
            backend.draw_instanced_indirect(&DrawCall {
                mesh: style.mesh,
                material: self.config.material,
                bounds,
                instance_count: instances,
                args: self.args.handle(),
                args_index: level.index() as u32,
                parameters: &style.parameters,
            })?;
            stats.record_draw(instances);
        }

        tracing::trace!(frame = self.hierarchy.frame(), draws = stats.draw_calls, "fractal frame");
        Ok(stats)
    }

    /// Releases every buffer.
    ///
    /// All buffers are released even if one fails; the first failure is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure.
    pub fn teardown<A: BufferAllocator + ?Sized>(self, allocator: &mut A) -> Result<(), BackendError> {
        let depth = self.hierarchy.depth();
        let mut result = self.args.release(allocator);
        for buffer in self.buffers {
            let released = buffer.release(allocator);
            if result.is_ok() {
                result = released;
            }
        }
        tracing::info!(depth, "fractal renderer torn down");
        result
    }

    /// Tears down and initializes again with `config`.
    ///
    /// # Errors
    ///
    /// Returns the teardown failure, or the initialization failure. An
    /// invalid `config` leaves nothing allocated.
    pub fn reconfigure<A: BufferAllocator + ?Sized>(
        self,
        config: &FractalConfig,
        allocator: &mut A,
    ) -> Result<Self, RenderError> {
        self.teardown(allocator)?;
        Self::initialize(config, allocator)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &FractalConfig {
        &self.config
    }

    /// The propagated hierarchy.
    #[must_use]
    pub const fn hierarchy(&self) -> &FractalHierarchy {
        &self.hierarchy
    }

    /// GPU buffer of `level`.
    #[must_use]
    pub fn level_buffer(&self, level: usize) -> Option<&StagingBuffer<Float3x4>> {
        self.buffers.get(level)
    }

    /// Shader parameters of `level`.
    #[must_use]
    pub fn level_parameters(&self, level: usize) -> Option<&ParameterBlock> {
        self.styles.get(level).map(|style| &style.parameters)
    }

    /// Whether `level` is drawn with leaf styling.
    #[must_use]
    pub fn is_leaf_level(&self, level: usize) -> bool {
        self.styles.get(level).is_some_and(|style| style.leaf)
    }

    /// Per-level seed vectors.
    #[must_use]
    pub const fn sequence_numbers(&self) -> &SequenceNumbers {
        &self.sequence
    }

    /// Indirect argument buffer, one entry per level.
    #[must_use]
    pub const fn args(&self) -> &StagingBuffer<DrawIndexedIndirectArgs> {
        &self.args
    }
}

fn level_style(
    config: &FractalConfig,
    sequence: &SequenceNumbers,
    level: usize,
    depth: usize,
    buffer: &StagingBuffer<Float3x4>,
) -> LevelStyle {
    let leaf = config.leaf_policy.is_leaf(level, depth);
    let (mesh, color_a, color_b) = if leaf {
        (config.leaf_mesh, config.leaf_color_a, config.leaf_color_b)
    } else {
        let t = level as f32 / (depth - 1) as f32;
        (config.mesh, config.gradient_a.evaluate(t), config.gradient_b.evaluate(t))
    };

    let mut parameters = ParameterBlock::new();
    parameters
        .set_vector(names::COLOR_A, color_a.to_vec4())
        .set_vector(names::COLOR_B, color_b.to_vec4())
        .set_buffer(names::MATRICES, buffer.handle());
    if let Some(seed) = sequence.get(level) {
        parameters.set_vector(names::SEQUENCE_NUMBERS, seed);
    }
    LevelStyle { mesh, leaf, parameters }
}

fn release_all<T: bytemuck::Pod, A: BufferAllocator + ?Sized>(
    allocator: &mut A,
    buffers: Vec<StagingBuffer<T>>,
) {
    for buffer in buffers {
        buffer.release_or_warn(allocator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::color::Color;
    use crate::parameters::ParameterValue;

    fn config(depth: usize) -> FractalConfig {
        FractalConfig { depth, seed: Some(5), ..FractalConfig::default() }
    }

    #[test]
    fn test_one_buffer_per_level() {
        let mut backend = RecordingBackend::new();
        let renderer = FractalRenderer::initialize(&config(4), &mut backend).unwrap();
        // 4 level buffers plus the args buffer.
        assert_eq!(backend.live_buffers(), 5);
        for level in 0..4 {
            assert_eq!(renderer.level_buffer(level).unwrap().capacity(), 5usize.pow(level as u32));
        }
        renderer.teardown(&mut backend).unwrap();
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_invalid_config_allocates_nothing() {
        let mut backend = RecordingBackend::new();
        let err = FractalRenderer::initialize(&config(2), &mut backend).unwrap_err();
        assert!(matches!(err, RenderError::Config(_)));
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_leaf_level_styling() {
        let mut backend = RecordingBackend::new();
        let renderer = FractalRenderer::initialize(&config(5), &mut backend).unwrap();
        let cfg = renderer.config().clone();
        assert!(renderer.is_leaf_level(4));
        assert!(!renderer.is_leaf_level(3));
        assert_eq!(
            renderer.level_parameters(4).unwrap().get(names::COLOR_A),
            Some(ParameterValue::Vector(cfg.leaf_color_a.to_vec4()))
        );
        assert_eq!(
            renderer.level_parameters(0).unwrap().get(names::COLOR_A),
            Some(ParameterValue::Vector(cfg.gradient_a.evaluate(0.0).to_vec4()))
        );
    }

    #[test]
    fn test_gradient_sampled_per_level() {
        let mut backend = RecordingBackend::new();
        let fractal = FractalConfig {
            gradient_a: crate::color::Gradient::linear(Color::BLACK, Color::WHITE),
            leaf_policy: fractalis_core::LeafPolicy::NONE,
            ..config(5)
        };
        let renderer = FractalRenderer::initialize(&fractal, &mut backend).unwrap();
        let expected = Color::rgb(0.5, 0.5, 0.5).to_vec4();
        assert_eq!(
            renderer.level_parameters(2).unwrap().get(names::COLOR_A),
            Some(ParameterValue::Vector(expected))
        );
    }

    #[test]
    fn test_update_draws_every_level() {
        let mut backend = RecordingBackend::new();
        let mut renderer = FractalRenderer::initialize(&config(3), &mut backend).unwrap();
        let stats = renderer.update(&Transform::IDENTITY, 1.0 / 60.0, &mut backend).unwrap();
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.instances, 1 + 5 + 25);
        let counts: Vec<u32> = backend.draws().iter().map(|d| d.instance_count).collect();
        assert_eq!(counts, vec![1, 5, 25]);
        assert_eq!(backend.draws()[2].mesh, renderer.config().leaf_mesh);
    }
}
