//! # FRACTALIS Procedural
//!
//! Parametric surfaces evaluated over a uniform grid:
//!
//! - [`GridMapping`]: cell index to `[-1, 1]` domain coordinate
//! - [`FunctionName`]: the animated function catalog used by the grapher
//! - [`Shape`]: static shapes with normals used by the visualization
//! - [`SurfaceEvaluator`]: worker-thread evaluation, packed 4 cells wide
//! - [`TransitionController`]: timed crossfades between functions
//!
//! Nothing here touches a GPU; the rendering crate uploads what this
//! crate computes, or dispatches kernels implementing the same math.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod evaluator;
pub mod functions;
pub mod grid;
pub mod sequence;
pub mod shapes;
pub mod transition;

pub use config::{TransitionConfig, TransitionMode};
pub use evaluator::{evaluate_function_grid, unpack_cell, SurfaceEvaluator};
pub use functions::{morph, FunctionBlend, FunctionName, SurfaceFn};
pub use grid::GridMapping;
pub use sequence::{seeded_rng, SequenceNumbers};
pub use shapes::{Shape, ShapeFn, ShapeSample};
pub use transition::{TransitionController, TransitionEvent, TransitionState};
