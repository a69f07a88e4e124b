//! # FRACTALIS Frame Loop
//!
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. HOST TRANSFORM                                                   │
//! │    └─ TransformProvider yields position / rotation / scale          │
//! │                                                                     │
//! │ 2. FRACTAL                                                          │
//! │    ├─ Advance hierarchy (level by level on the worker pool)         │
//! │    └─ Upload every level, one indirect draw per level               │
//! │                                                                     │
//! │ 3. GRAPH                                                            │
//! │    ├─ Tick transition controller                                    │
//! │    ├─ Dispatch kernel, or evaluate on workers and upload            │
//! │    └─ One indirect draw                                             │
//! │                                                                     │
//! │ 4. VISUALIZATION                                                    │
//! │    ├─ Re-evaluate only if dirty or the host moved                   │
//! │    └─ One indirect draw                                             │
//! │                                                                     │
//! │ 5. SUBMIT                                                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reconfiguration happens between frames. Only sections whose settings
//! changed are torn down and rebuilt.

use std::time::{Duration, Instant};

use fractalis_rendering::{
    BackendError, FractalRenderer, GpuGraph, NoHooks, RenderBackend, RenderError, RenderStats,
    Visualization,
};
use fractalis_shared::{Quaternion, Transform, Vec3};

use crate::settings::Settings;

/// Target frame time for 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Frame time above which a warning is logged.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(33);

/// Supplies the host transform for each frame.
pub trait TransformProvider {
    /// Transform for `frame`, `time` seconds into the run.
    fn transform(&mut self, frame: u64, time: f32) -> Transform;
}

impl<F> TransformProvider for F
where
    F: FnMut(u64, f32) -> Transform,
{
    fn transform(&mut self, frame: u64, time: f32) -> Transform {
        self(frame, time)
    }
}

/// The same transform every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StaticTransform(pub Transform);

impl TransformProvider for StaticTransform {
    fn transform(&mut self, _frame: u64, _time: f32) -> Transform {
        self.0
    }
}

/// Circles the origin in the XZ plane, facing along the orbit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitTransform {
    /// Orbit radius.
    pub radius: f32,
    /// Angular speed in radians per second.
    pub speed: f32,
    /// Uniform scale.
    pub scale: f32,
}

impl TransformProvider for OrbitTransform {
    fn transform(&mut self, _frame: u64, time: f32) -> Transform {
        let angle = self.speed * time;
        Transform::new(
            Vec3::new(self.radius * angle.cos(), 0.0, self.radius * angle.sin()),
            Quaternion::from_rotation_y(angle),
            Vec3::splat(self.scale),
        )
    }
}

/// Timing and work of one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Fractal update time in microseconds.
    pub fractal_us: u64,
    /// Graph update time in microseconds.
    pub graph_us: u64,
    /// Visualization update time in microseconds.
    pub visualization_us: u64,
    /// Work issued by every renderer.
    pub render: RenderStats,
}

/// Drives the enabled renderers against one backend.
pub struct FrameLoop<B: RenderBackend> {
    backend: B,
    fractal: Option<FractalRenderer>,
    graph: Option<GpuGraph>,
    visualization: Option<Visualization<NoHooks>>,
    frame: u64,
    stats: FrameStatsAccumulator,
}

impl<B: RenderBackend> FrameLoop<B> {
    /// Initializes every renderer enabled in `settings`.
    ///
    /// # Errors
    ///
    /// Returns the first initialization failure. Renderers built before
    /// the failure are released again.
    pub fn new(backend: B, settings: &Settings) -> Result<Self, RenderError> {
        let mut frame_loop = Self {
            backend,
            fractal: None,
            graph: None,
            visualization: None,
            frame: 0,
            stats: FrameStatsAccumulator::new(),
        };
        if let Err(err) = frame_loop.reconfigure(settings) {
            if let Err(release) = frame_loop.release_all() {
                tracing::warn!(error = %release, "release after failed start");
            }
            return Err(err);
        }
        tracing::info!(
            fractal = frame_loop.fractal.is_some(),
            graph = frame_loop.graph.is_some(),
            visualization = frame_loop.visualization.is_some(),
            "frame loop started"
        );
        Ok(frame_loop)
    }

    /// Runs one frame and submits it.
    ///
    /// # Errors
    ///
    /// Propagates the first renderer failure; nothing is submitted then.
    pub fn tick(&mut self, host: &Transform, delta_time: f32) -> Result<FrameStats, RenderError> {
        let start = Instant::now();
        let mut stats = FrameStats { frame: self.frame, ..FrameStats::default() };

        if let Some(fractal) = &mut self.fractal {
            let started = Instant::now();
            stats.render += fractal.update(host, delta_time, &mut self.backend)?;
            stats.fractal_us = elapsed_us(started);
        }
        if let Some(graph) = &mut self.graph {
            let started = Instant::now();
            stats.render += graph.update(delta_time, &mut self.backend)?;
            stats.graph_us = elapsed_us(started);
        }
        if let Some(visualization) = &mut self.visualization {
            let started = Instant::now();
            stats.render += visualization.update(host, &mut self.backend)?;
            stats.visualization_us = elapsed_us(started);
        }

        self.backend.submit();
        stats.total_us = elapsed_us(start);
        self.frame += 1;
        self.stats.record(&stats);

        if stats.total_us > MAX_FRAME_TIME.as_micros() as u64 {
            tracing::warn!(
                frame = stats.frame,
                ms = stats.total_us as f64 / 1000.0,
                "frame exceeded budget"
            );
        }
        Ok(stats)
    }

    /// Runs `frames` frames with a fixed time step.
    ///
    /// # Errors
    ///
    /// Stops at the first failing frame.
    pub fn run<P: TransformProvider + ?Sized>(
        &mut self,
        provider: &mut P,
        frames: u64,
        delta_time: f32,
    ) -> Result<(), RenderError> {
        for _ in 0..frames {
            let time = self.frame as f32 * delta_time;
            let host = provider.transform(self.frame, time);
            self.tick(&host, delta_time)?;
        }
        Ok(())
    }

    /// Applies new settings between frames.
    ///
    /// Unchanged sections keep their buffers and state. Changed sections
    /// are torn down and initialized again; removed ones are released.
    ///
    /// # Errors
    ///
    /// Returns the first failure. The failing renderer is left disabled
    /// with nothing allocated.
    pub fn reconfigure(&mut self, settings: &Settings) -> Result<(), RenderError> {
        let backend = &mut self.backend;

        self.fractal = match (self.fractal.take(), &settings.fractal) {
            (Some(fractal), Some(config)) if fractal.config() == config => Some(fractal),
            (Some(fractal), Some(config)) => Some(fractal.reconfigure(config, backend)?),
            (Some(fractal), None) => {
                fractal.teardown(backend)?;
                None
            }
            (None, Some(config)) => Some(FractalRenderer::initialize(config, backend)?),
            (None, None) => None,
        };

        self.graph = match (self.graph.take(), &settings.graph) {
            (Some(graph), Some(config)) if graph.config() == config => Some(graph),
            (Some(graph), Some(config)) => Some(graph.reconfigure(config, backend)?),
            (Some(graph), None) => {
                graph.teardown(backend)?;
                None
            }
            (None, Some(config)) => Some(GpuGraph::initialize(config, backend)?),
            (None, None) => None,
        };

        self.visualization = match (self.visualization.take(), &settings.visualization) {
            (Some(shapes), Some(config)) if shapes.config() == config => Some(shapes),
            (Some(shapes), Some(config)) => Some(shapes.reconfigure(config, backend)?),
            (Some(shapes), None) => {
                shapes.teardown(backend)?;
                None
            }
            (None, Some(config)) => Some(Visualization::initialize(config, NoHooks, backend)?),
            (None, None) => None,
        };

        Ok(())
    }

    /// Releases every renderer and hands the backend back.
    ///
    /// # Errors
    ///
    /// Returns the first release failure; later renderers are still
    /// released.
    pub fn shutdown(mut self) -> Result<B, RenderError> {
        self.release_all()?;
        tracing::info!(frames = self.frame, "frame loop shut down");
        Ok(self.backend)
    }

    fn release_all(&mut self) -> Result<(), BackendError> {
        let mut result = Ok(());
        if let Some(fractal) = self.fractal.take() {
            result = result.and(fractal.teardown(&mut self.backend));
        }
        if let Some(graph) = self.graph.take() {
            let released = graph.teardown(&mut self.backend);
            result = result.and(released);
        }
        if let Some(shapes) = self.visualization.take() {
            let released = shapes.teardown(&mut self.backend).map(|NoHooks| ());
            result = result.and(released);
        }
        result
    }

    /// Frames run so far.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Accumulated statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }

    /// The backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The fractal renderer, if enabled.
    #[must_use]
    pub const fn fractal(&self) -> Option<&FractalRenderer> {
        self.fractal.as_ref()
    }

    /// The function grapher, if enabled.
    #[must_use]
    pub const fn graph(&self) -> Option<&GpuGraph> {
        self.graph.as_ref()
    }

    /// The shape visualization, if enabled.
    #[must_use]
    pub const fn visualization(&self) -> Option<&Visualization<NoHooks>> {
        self.visualization.as_ref()
    }

    /// Forces the visualization to re-evaluate next frame.
    pub fn mark_visualization_dirty(&mut self) {
        if let Some(shapes) = &mut self.visualization {
            shapes.mark_dirty();
        }
    }
}

fn elapsed_us(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_micros()).unwrap_or(u64::MAX)
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of fractal update times.
    pub fractal_us_sum: u64,
    /// Sum of graph update times.
    pub graph_us_sum: u64,
    /// Sum of visualization update times.
    pub visualization_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
    /// Work issued across all frames.
    pub render: RenderStats,
}

impl FrameStatsAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            fractal_us_sum: 0,
            graph_us_sum: 0,
            visualization_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            render: RenderStats::default(),
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: &FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.fractal_us_sum += stats.fractal_us;
        self.graph_us_sum += stats.graph_us;
        self.visualization_us_sum += stats.visualization_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.render += stats.render;

        if stats.total_us > TARGET_FRAME_TIME.as_micros() as u64 {
            self.frames_over_budget += 1;
        }
    }

    /// Average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        average_ms(self.total_us_sum, self.frames_recorded)
    }

    /// Average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Fraction of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a summary at `info`.
    pub fn log_summary(&self) {
        let min_ms = if self.frames_recorded == 0 { 0.0 } else { self.min_frame_us as f64 / 1000.0 };
        tracing::info!(
            frames = self.frames_recorded,
            avg_ms = self.avg_frame_ms(),
            avg_fps = self.avg_fps(),
            min_ms,
            max_ms = self.max_frame_us as f64 / 1000.0,
            over_budget = self.frames_over_budget,
            "frame timing"
        );
        tracing::info!(
            fractal_ms = average_ms(self.fractal_us_sum, self.frames_recorded),
            graph_ms = average_ms(self.graph_us_sum, self.frames_recorded),
            visualization_ms = average_ms(self.visualization_us_sum, self.frames_recorded),
            "frame breakdown"
        );
        tracing::info!(
            draw_calls = self.render.draw_calls,
            instances = self.render.instances,
            uploads = self.render.uploads,
            bytes_uploaded = self.render.bytes_uploaded,
            dispatches = self.render.dispatches,
            "render totals"
        );
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

fn average_ms(sum_us: u64, frames: u64) -> f64 {
    if frames == 0 {
        return 0.0;
    }
    (sum_us as f64 / frames as f64) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractalis_rendering::{FractalConfig, RecordingBackend, VisualizationConfig};

    fn demo_loop() -> FrameLoop<RecordingBackend> {
        FrameLoop::new(RecordingBackend::new(), &Settings::demo()).unwrap()
    }

    #[test]
    fn test_frame_loop_creation() {
        let frame_loop = demo_loop();
        assert_eq!(frame_loop.frame(), 0);
        assert!(frame_loop.fractal().is_some());
        assert!(frame_loop.graph().is_some());
        assert!(frame_loop.visualization().is_some());
        // 4 levels + args, positions + args, positions + normals + args.
        assert_eq!(frame_loop.backend().live_buffers(), 10);
    }

    #[test]
    fn test_tick_submits_every_draw() {
        let mut frame_loop = demo_loop();
        let stats = frame_loop.tick(&Transform::IDENTITY, 1.0 / 60.0).unwrap();
        assert_eq!(stats.frame, 0);
        assert_eq!(stats.render.draw_calls, 4 + 1 + 1);
        assert_eq!(stats.render.dispatches, 1);
        assert_eq!(frame_loop.backend().last_submitted().len(), 6);
        assert!(frame_loop.backend().draws().is_empty());
        assert_eq!(frame_loop.frame(), 1);
    }

    #[test]
    fn test_static_host_skips_visualization_recompute() {
        let mut frame_loop = demo_loop();
        frame_loop.tick(&Transform::IDENTITY, 0.1).unwrap();
        let first = frame_loop.stats().render.uploads;
        frame_loop.tick(&Transform::IDENTITY, 0.1).unwrap();
        let second = frame_loop.stats().render.uploads - first;
        // Fractal levels re-upload every frame, visualization buffers do not.
        assert_eq!(first, 4 + 2);
        assert_eq!(second, 4);

        frame_loop.mark_visualization_dirty();
        let stats = frame_loop.tick(&Transform::IDENTITY, 0.1).unwrap();
        assert_eq!(stats.render.uploads, 4 + 2);
    }

    #[test]
    fn test_run_uses_provider() {
        let mut frame_loop = demo_loop();
        let mut seen = Vec::new();
        let mut provider = |frame: u64, time: f32| {
            seen.push((frame, time));
            Transform::IDENTITY
        };
        frame_loop.run(&mut provider, 3, 0.5).unwrap();
        assert_eq!(seen, vec![(0, 0.0), (1, 0.5), (2, 1.0)]);
        assert_eq!(frame_loop.stats().frames_recorded, 3);
    }

    #[test]
    fn test_reconfigure_keeps_unchanged_sections() {
        let mut frame_loop = demo_loop();
        let fractal_buffer = frame_loop.fractal().unwrap().level_buffer(0).unwrap().handle();
        let graph_buffer = frame_loop.graph().unwrap().positions_handle();

        let mut settings = Settings::demo();
        if let Some(graph) = &mut settings.graph {
            graph.resolution = 20;
        }
        frame_loop.reconfigure(&settings).unwrap();

        let fractal = frame_loop.fractal().unwrap();
        assert_eq!(fractal.level_buffer(0).unwrap().handle(), fractal_buffer);
        let graph = frame_loop.graph().unwrap();
        assert_ne!(graph.positions_handle(), graph_buffer);
        assert_eq!(graph.instance_count(), 400);
        assert_eq!(frame_loop.backend().live_buffers(), 10);
    }

    #[test]
    fn test_reconfigure_disables_removed_section() {
        let mut frame_loop = demo_loop();
        let settings = Settings { graph: None, visualization: None, ..Settings::demo() };
        frame_loop.reconfigure(&settings).unwrap();
        assert!(frame_loop.graph().is_none());
        assert!(frame_loop.visualization().is_none());
        assert_eq!(frame_loop.backend().live_buffers(), 5);

        let stats = frame_loop.tick(&Transform::IDENTITY, 0.1).unwrap();
        assert_eq!(stats.render.draw_calls, 4);
    }

    #[test]
    fn test_failed_start_releases_everything() {
        let settings = Settings {
            visualization: Some(VisualizationConfig { resolution: 0, ..Default::default() }),
            ..Settings::demo()
        };
        let err = FrameLoop::new(RecordingBackend::new(), &settings).err();
        assert!(matches!(err, Some(RenderError::Config(_))));
    }

    #[test]
    fn test_invalid_reconfigure_leaves_section_empty() {
        let mut frame_loop = demo_loop();
        let settings = Settings {
            fractal: Some(FractalConfig { depth: 2, ..Default::default() }),
            ..Settings::demo()
        };
        assert!(frame_loop.reconfigure(&settings).is_err());
        assert!(frame_loop.fractal().is_none());
        assert_eq!(frame_loop.backend().live_buffers(), 5);
    }

    #[test]
    fn test_shutdown_returns_clean_backend() {
        let mut frame_loop = demo_loop();
        frame_loop.tick(&Transform::IDENTITY, 0.1).unwrap();
        let backend = frame_loop.shutdown().unwrap();
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.frames_submitted(), 1);
    }

    #[test]
    fn test_orbit_transform() {
        let mut orbit = OrbitTransform { radius: 2.0, speed: 1.0, scale: 3.0 };
        let at_start = orbit.transform(0, 0.0);
        assert!((at_start.position.x - 2.0).abs() < 1.0e-6);
        assert!((at_start.scale.y - 3.0).abs() < f32::EPSILON);

        let quarter = orbit.transform(1, std::f32::consts::FRAC_PI_2);
        assert!(quarter.position.x.abs() < 1.0e-5);
        assert!((quarter.position.z - 2.0).abs() < 1.0e-5);
    }

    #[test]
    fn test_accumulator() {
        let mut acc = FrameStatsAccumulator::new();
        acc.record(&FrameStats { total_us: 1000, ..Default::default() });
        acc.record(&FrameStats { total_us: 3000, ..Default::default() });
        acc.record(&FrameStats { total_us: 20_000, ..Default::default() });
        assert_eq!(acc.min_frame_us, 1000);
        assert_eq!(acc.max_frame_us, 20_000);
        assert_eq!(acc.frames_over_budget, 1);
        assert!((acc.avg_frame_ms() - 8.0).abs() < 1.0e-9);
        assert!((acc.over_budget_ratio() - 1.0 / 3.0).abs() < 1.0e-9);
    }

    #[test]
    fn test_empty_accumulator() {
        let acc = FrameStatsAccumulator::default();
        assert!(acc.avg_frame_ms().abs() < f64::EPSILON);
        assert!(acc.avg_fps().abs() < f64::EPSILON);
    }
}
