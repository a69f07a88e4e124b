//! # FRACTALIS Core
//!
//! Hierarchical transform propagation designed for:
//! - Up to 97,656 parts over 8 levels, every frame
//! - Level-by-level fork/join over a rayon worker pool
//! - Zero allocations after initialization
//!
//! ## Architecture Rules
//!
//! 1. **Fixed shape** - levels are sized `5^level` once and never resized
//! 2. **Index-only addressing** - a part's parent is `i / 5`, nothing else
//! 3. **Barrier per level** - level `L+1` starts after every item of `L`
//!
//! ## Example
//!
//! ```rust,ignore
//! use fractalis_core::{FractalHierarchy, HierarchyConfig};
//! use fractalis_shared::Transform;
//!
//! let mut hierarchy = FractalHierarchy::initialize(&HierarchyConfig::with_depth(6))?;
//! hierarchy.advance(&Transform::IDENTITY, 1.0 / 60.0);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod hierarchy;

pub use config::{HierarchyConfig, LeafPolicy};
pub use error::{check_duration, check_range, ConfigError};
pub use hierarchy::{
    child_index, parent_index, propagate, FractalHierarchy, FractalPart, HierarchyScheduler,
    Level, WorkerPool,
};
