//! # FRACTALIS Rendering
//!
//! Moves per-instance data from worker-pool arrays into GPU buffers and
//! issues one indirect instanced draw per batch.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    PER-FRAME PIPELINE                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  TransitionController → Evaluator / Hierarchy (worker pool)   │
//! │          ↓                          ↓                         │
//! │  compute dispatch           native arrays → StagingBuffer     │
//! │          ↓                          ↓                         │
//! │        draw_instanced_indirect(mesh, material, bounds, n)     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Three renderers share the pipeline: [`FractalRenderer`], [`GpuGraph`]
//! and [`Visualization`]. Each has `initialize`, `update`, `teardown` and
//! `reconfigure`; buffers live exactly from `initialize` to `teardown`.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod bounds;
pub mod color;
pub mod config;
pub mod error;
pub mod fractal;
pub mod graph;
pub mod indirect;
pub mod parameters;
pub mod staging;
pub mod stats;
pub mod visualization;

pub use backend::{
    BufferAllocator, BufferHandle, BufferUsage, ComputeDispatch, DrawSink, KernelId,
    RecordingBackend, RenderBackend, WgpuAllocator,
};
pub use bounds::Aabb;
pub use color::{Color, Gradient, GradientKey};
pub use config::{Evaluation, FractalConfig, GraphConfig, VisualizationConfig};
pub use error::{BackendError, RenderError};
pub use fractal::FractalRenderer;
pub use graph::GpuGraph;
pub use indirect::{DrawCall, DrawIndexedIndirectArgs, MaterialHandle, MeshHandle};
pub use parameters::{ParameterBlock, ParameterValue};
pub use staging::StagingBuffer;
pub use stats::RenderStats;
pub use visualization::{NoHooks, Visualization, VisualizationHooks};
