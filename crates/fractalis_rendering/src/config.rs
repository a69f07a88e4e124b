//! # Renderer Configuration
//!
//! One section per renderer. Every section deserializes with defaults for
//! missing keys and is checked by `validate()` before anything is
//! allocated. Changing any value means `teardown` then `initialize`.
//!
//! ```toml
//! [fractal]
//! depth = 6
//! mesh = { id = 1, index_count = 36 }
//!
//! [graph]
//! resolution = 100
//! evaluation = "Cpu"
//! [graph.transition]
//! mode = "Random"
//! ```

use fractalis_core::{check_range, ConfigError, HierarchyConfig, LeafPolicy};
use fractalis_procedural::{GridMapping, Shape, TransitionConfig};
use serde::{Deserialize, Serialize};

use crate::color::{Color, Gradient};
use crate::indirect::{MaterialHandle, MeshHandle};

/// Fractal renderer settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalConfig {
    /// Number of levels, root included (3..=8).
    pub depth: usize,
    /// Dedicated propagation threads. `0` uses the global pool.
    pub worker_threads: usize,
    /// Minimum parts per worker task.
    pub batch_size: usize,
    /// Mesh for inner levels.
    pub mesh: MeshHandle,
    /// Mesh for leaf levels.
    pub leaf_mesh: MeshHandle,
    /// Material for every level.
    pub material: MaterialHandle,
    /// First color, sampled at `level / (depth - 1)`.
    pub gradient_a: Gradient,
    /// Second color, sampled at `level / (depth - 1)`.
    pub gradient_b: Gradient,
    /// First color of leaf levels.
    pub leaf_color_a: Color,
    /// Second color of leaf levels.
    pub leaf_color_b: Color,
    /// Which levels are leaves.
    pub leaf_policy: LeafPolicy,
    /// Seed for per-level sequence numbers. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            depth: 4,
            worker_threads: 0,
            batch_size: 5,
            mesh: MeshHandle::new(0, 36),
            leaf_mesh: MeshHandle::new(1, 36),
            material: MaterialHandle(0),
            gradient_a: Gradient::linear(Color::rgb(0.2, 0.2, 0.8), Color::rgb(0.9, 0.9, 0.9)),
            gradient_b: Gradient::linear(Color::rgb(0.1, 0.1, 0.5), Color::rgb(0.6, 0.6, 0.6)),
            leaf_color_a: Color::rgb(0.2, 0.8, 0.2),
            leaf_color_b: Color::rgb(0.1, 0.5, 0.1),
            leaf_policy: LeafPolicy::default(),
            seed: None,
        }
    }
}

impl FractalConfig {
    /// Hierarchy part of this config.
    #[must_use]
    pub fn hierarchy(&self) -> HierarchyConfig {
        HierarchyConfig {
            depth: self.depth,
            worker_threads: self.worker_threads,
            batch_size: self.batch_size,
        }
    }

    /// Validates depth, scheduling and leaf policy.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hierarchy().validate()?;
        self.leaf_policy.validate(self.depth)
    }
}

/// Where the grapher evaluates its functions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Evaluation {
    /// Compute kernel dispatch.
    #[default]
    Gpu,
    /// Worker threads, then upload.
    Cpu,
}

/// Function grapher settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Points per axis (1..=1000).
    pub resolution: u32,
    /// GPU kernels or worker threads.
    pub evaluation: Evaluation,
    /// Worker threads for `Evaluation::Cpu`. `0` uses the global pool.
    pub worker_threads: usize,
    /// Function selection and timing.
    pub transition: TransitionConfig,
    /// Point mesh.
    pub mesh: MeshHandle,
    /// Point material.
    pub material: MaterialHandle,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            resolution: 10,
            evaluation: Evaluation::Gpu,
            worker_threads: 0,
            transition: TransitionConfig::default(),
            mesh: MeshHandle::new(0, 36),
            material: MaterialHandle(1),
        }
    }
}

impl GraphConfig {
    /// Validates resolution and transition timing.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        GridMapping::new(self.resolution)?;
        self.transition.validate()
    }
}

/// Shape visualization settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Points per axis (1..=1000).
    pub resolution: u32,
    /// Surface to sample.
    pub shape: Shape,
    /// Instance size relative to cell size (0.1..=10).
    pub instance_scale: f32,
    /// Offset along the normal (-0.5..=0.5).
    pub displacement: f32,
    /// Worker threads. `0` uses the global pool.
    pub worker_threads: usize,
    /// Instance mesh.
    pub mesh: MeshHandle,
    /// Instance material.
    pub material: MaterialHandle,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            resolution: 16,
            shape: Shape::Plane,
            instance_scale: 2.0,
            displacement: 0.1,
            worker_threads: 0,
            mesh: MeshHandle::new(0, 36),
            material: MaterialHandle(2),
        }
    }
}

impl VisualizationConfig {
    /// Validates resolution, scale and displacement.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        GridMapping::new(self.resolution)?;
        check_range("instance_scale", self.instance_scale, 0.1, 10.0)?;
        check_range("displacement", self.displacement, -0.5, 0.5)
    }
}
