//! # Pipeline Lifecycle Tests
//!
//! Exercises initialize / update / reconfigure / teardown against the
//! recording backend and checks buffers stay consistent with the data
//! the worker pool produced.

use fractalis_core::parent_index;
use fractalis_rendering::{
    BackendError, BufferAllocator, BufferHandle, BufferUsage, DrawSink, Evaluation, FractalConfig,
    FractalRenderer, GpuGraph, GraphConfig, NoHooks, RecordingBackend, RenderError, Visualization,
    VisualizationConfig,
};
use fractalis_shared::constants::names;
use fractalis_shared::{Float3x4, Quaternion, Transform, Vec3};

fn host(frame: u32) -> Transform {
    let t = frame as f32 / 60.0;
    Transform::new(
        Vec3::new(t, 0.0, -t),
        Quaternion::from_rotation_y(t),
        Vec3::splat(2.0),
    )
}

/// Allocator that refuses every create or write once its budget runs out.
struct FailingAllocator {
    inner: RecordingBackend,
    remaining: usize,
}

impl FailingAllocator {
    fn new(remaining: usize) -> Self {
        let mut inner = RecordingBackend::new();
        // Unrelated buffer that must survive every failed initialization.
        inner.create_buffer("host", BufferUsage::Storage, 1, 4).unwrap();
        Self { inner, remaining }
    }

    fn spend(&mut self) -> Result<(), BackendError> {
        if self.remaining == 0 {
            return Err(BackendError::Device("out of memory".to_owned()));
        }
        self.remaining -= 1;
        Ok(())
    }
}

impl BufferAllocator for FailingAllocator {
    fn create_buffer(
        &mut self,
        label: &str,
        usage: BufferUsage,
        count: usize,
        stride: usize,
    ) -> Result<BufferHandle, BackendError> {
        self.spend()?;
        self.inner.create_buffer(label, usage, count, stride)
    }

    fn write_buffer(&mut self, handle: BufferHandle, bytes: &[u8]) -> Result<(), BackendError> {
        self.spend()?;
        self.inner.write_buffer(handle, bytes)
    }

    fn release_buffer(&mut self, handle: BufferHandle) -> Result<(), BackendError> {
        self.inner.release_buffer(handle)
    }
}

/// Raises the allocation budget until `init` succeeds, checking that every
/// failure along the way left only the host buffer alive.
fn fail_at_every_step<T>(
    mut init: impl FnMut(&mut FailingAllocator) -> Result<T, RenderError>,
    teardown: impl FnOnce(T, &mut FailingAllocator),
) -> usize {
    for budget in 0..64 {
        let mut alloc = FailingAllocator::new(budget);
        let start = alloc.inner.live_buffers();
        match init(&mut alloc) {
            Err(err) => {
                assert!(matches!(err, RenderError::Backend(BackendError::Device(_))));
                assert_eq!(alloc.inner.live_buffers(), start, "leak at budget {budget}");
            }
            Ok(renderer) => {
                teardown(renderer, &mut alloc);
                assert_eq!(alloc.inner.live_buffers(), start);
                return budget;
            }
        }
    }
    panic!("initialization never succeeded");
}

/// Test: a fractal renderer failing at any allocation step frees what it had.
#[test]
fn test_fractal_partial_allocation_failure_releases_buffers() {
    let config = FractalConfig { depth: 4, ..Default::default() };
    let needed = fail_at_every_step(
        |alloc| FractalRenderer::initialize(&config, alloc),
        |renderer, alloc| renderer.teardown(alloc).unwrap(),
    );
    // Four level buffers, the args buffer and its upload.
    assert_eq!(needed, 4 + 1 + 1);
}

/// Test: the grapher failing at any allocation step frees what it had.
#[test]
fn test_graph_partial_allocation_failure_releases_buffers() {
    for evaluation in [Evaluation::Gpu, Evaluation::Cpu] {
        let config = GraphConfig { evaluation, resolution: 6, ..Default::default() };
        let needed = fail_at_every_step(
            |alloc| GpuGraph::initialize(&config, alloc),
            |graph, alloc| graph.teardown(alloc).unwrap(),
        );
        assert_eq!(needed, 3);
    }
}

/// Test: the visualization failing at any allocation step frees what it had.
#[test]
fn test_visualization_partial_allocation_failure_releases_buffers() {
    let config = VisualizationConfig { resolution: 6, ..Default::default() };
    let needed = fail_at_every_step(
        |alloc| Visualization::initialize(&config, NoHooks, alloc),
        |shapes, alloc| {
            shapes.teardown(alloc).unwrap();
        },
    );
    assert_eq!(needed, 4);
}

/// Test: after every reconfiguration each level buffer holds exactly 5^level elements.
#[test]
fn test_reconfigure_resizes_level_buffers() {
    let mut backend = RecordingBackend::new();
    let mut renderer =
        FractalRenderer::initialize(&FractalConfig { depth: 3, seed: Some(1), ..Default::default() }, &mut backend)
            .unwrap();

    for depth in [5, 8, 4, 3] {
        renderer = renderer
            .reconfigure(&FractalConfig { depth, seed: Some(1), ..Default::default() }, &mut backend)
            .unwrap();
        assert_eq!(renderer.hierarchy().depth(), depth);
        assert_eq!(backend.live_buffers(), depth + 1);
        for level in 0..depth {
            let buffer = renderer.level_buffer(level).unwrap();
            assert_eq!(buffer.capacity(), 5usize.pow(level as u32));
            assert_eq!(backend.buffer(buffer.handle()).unwrap().count, 5usize.pow(level as u32));
        }
    }

    renderer.teardown(&mut backend).unwrap();
    assert_eq!(backend.live_buffers(), 0);
}

/// Test: an invalid reconfiguration leaves nothing allocated.
#[test]
fn test_invalid_reconfigure_releases_everything() {
    let mut backend = RecordingBackend::new();
    let renderer = FractalRenderer::initialize(&FractalConfig::default(), &mut backend).unwrap();
    let err = renderer
        .reconfigure(&FractalConfig { depth: 12, ..Default::default() }, &mut backend)
        .unwrap_err();
    assert!(matches!(err, RenderError::Config(_)));
    assert_eq!(backend.live_buffers(), 0);
}

/// Test: uploaded matrices are exactly the hierarchy's packed matrices, every frame.
#[test]
fn test_uploads_mirror_hierarchy() {
    let mut backend = RecordingBackend::new();
    let mut renderer =
        FractalRenderer::initialize(&FractalConfig { depth: 4, seed: Some(3), ..Default::default() }, &mut backend)
            .unwrap();

    for frame in 0..10 {
        let host = host(frame);
        renderer.update(&host, 1.0 / 60.0, &mut backend).unwrap();

        for level in renderer.hierarchy().levels() {
            let buffer = renderer.level_buffer(level.index()).unwrap();
            let uploaded: Vec<Float3x4> = backend.read(buffer.handle()).unwrap();
            assert_eq!(uploaded, level.matrices());
        }

        let root = renderer.hierarchy().root();
        assert_eq!(root.world_position, host.position);
        for draw in backend.take_draws() {
            assert_eq!(draw.bounds.center, host.position);
            assert_eq!(draw.bounds.size, Vec3::splat(6.0));
        }
    }
}

/// Test: uploaded children sit next to their uploaded parents.
#[test]
fn test_uploaded_children_follow_parents() {
    let mut backend = RecordingBackend::new();
    let mut renderer = FractalRenderer::initialize(&FractalConfig::default(), &mut backend).unwrap();
    renderer.update(&host(30), 0.5, &mut backend).unwrap();

    let parents: Vec<Float3x4> =
        backend.read(renderer.level_buffer(1).unwrap().handle()).unwrap();
    let children: Vec<Float3x4> =
        backend.read(renderer.level_buffer(2).unwrap().handle()).unwrap();
    // Level 2 scale is 2.0 * 0.25.
    for (i, child) in children.iter().enumerate() {
        let parent = parents[parent_index(i)];
        let distance = child.column(3).distance(parent.column(3));
        assert!((distance - 1.5 * 0.5).abs() < 1.0e-4);
    }
}

/// Test: the grapher survives a switch between GPU and CPU evaluation.
#[test]
fn test_graph_switches_evaluation() {
    let mut backend = RecordingBackend::new();
    let mut graph = GpuGraph::initialize(&GraphConfig::default(), &mut backend).unwrap();
    graph.update(0.1, &mut backend).unwrap();
    assert_eq!(backend.dispatches().len(), 1);
    backend.submit();

    let mut graph = graph
        .reconfigure(&GraphConfig { evaluation: Evaluation::Cpu, resolution: 7, ..Default::default() }, &mut backend)
        .unwrap();
    graph.update(0.1, &mut backend).unwrap();
    assert!(backend.dispatches().is_empty());
    assert_eq!(backend.draws()[0].instance_count, 49);
    // 49 cells need 13 packs; plus the args buffer.
    assert_eq!(backend.buffer(graph.positions_handle()).unwrap().count, 13);
    assert_eq!(backend.live_buffers(), 2);

    graph.teardown(&mut backend).unwrap();
    assert_eq!(backend.live_buffers(), 0);
}

/// Test: all three renderers share one backend without interfering.
#[test]
fn test_three_renderers_one_backend() {
    let mut backend = RecordingBackend::new();
    let mut fractal = FractalRenderer::initialize(&FractalConfig::default(), &mut backend).unwrap();
    let mut graph = GpuGraph::initialize(&GraphConfig::default(), &mut backend).unwrap();
    let mut shapes =
        Visualization::initialize(&VisualizationConfig::default(), NoHooks, &mut backend).unwrap();

    for frame in 0..3 {
        let host = host(frame);
        fractal.update(&host, 1.0 / 60.0, &mut backend).unwrap();
        graph.update(1.0 / 60.0, &mut backend).unwrap();
        shapes.update(&host, &mut backend).unwrap();
        let draws = backend.take_draws();
        assert_eq!(draws.len(), 4 + 1 + 1);
        assert!(draws[5].parameters.buffer(names::NORMALS).is_some());
        backend.submit();
    }

    fractal.teardown(&mut backend).unwrap();
    graph.teardown(&mut backend).unwrap();
    shapes.teardown(&mut backend).unwrap();
    assert_eq!(backend.live_buffers(), 0);
}
