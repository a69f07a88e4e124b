//! # FRACTALIS Shared
//!
//! Math types and constants used by every FRACTALIS crate.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `wgpu`
//! - Any GPU or window-related crate
//!
//! If you need graphics types, put them in `fractalis_rendering`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{
    child_rotations, BRANCHING_FACTOR, CELLS_PER_PACK, CHILD_DIRECTIONS, MAX_DEPTH,
    MAX_RESOLUTION, MIN_DEPTH, MIN_RESOLUTION,
};
pub use math::{smoothstep, Float3x4, Quaternion, Transform, Vec3, Vec4};
