//! # Hierarchy & Grid Constants
//!
//! Fixed shape of the fractal hierarchy and the configuration limits every
//! subsystem validates against.
//!
//! **CRITICAL:** Buffer strides and shader parameter names here are baked
//! into the materials and compute kernels. Changing them requires matching
//! shader changes.

use std::f32::consts::FRAC_PI_2;

use crate::math::{Quaternion, Vec3};

// =============================================================================
// HIERARCHY SHAPE
// =============================================================================

/// Children per part. Parent of item `i` is `i / BRANCHING_FACTOR`.
pub const BRANCHING_FACTOR: usize = 5;

/// Shallowest supported hierarchy.
pub const MIN_DEPTH: usize = 3;

/// Deepest supported hierarchy (5^7 = 78,125 parts on the last level).
pub const MAX_DEPTH: usize = 8;

/// Distance from parent to child, in units of the child's scale.
pub const CHILD_OFFSET: f32 = 1.5;

/// Each level is drawn at half the scale of its parent.
pub const LEVEL_SCALE_FACTOR: f32 = 0.5;

/// Spin speed of every part: 22.5 degrees per second.
pub const SPIN_SPEED: f32 = std::f32::consts::PI / 8.0;

/// Direction of child `i % 5` relative to its parent.
pub const CHILD_DIRECTIONS: [Vec3; BRANCHING_FACTOR] = [
    Vec3::Y,                    // up
    Vec3::X,                    // right
    Vec3::new(-1.0, 0.0, 0.0),  // left
    Vec3::Z,                    // forward
    Vec3::new(0.0, 0.0, -1.0),  // back
];

/// Local rotation of child `i % 5`: points its up axis along its direction.
#[must_use]
pub fn child_rotations() -> [Quaternion; BRANCHING_FACTOR] {
    [
        Quaternion::IDENTITY,
        Quaternion::from_rotation_z(-FRAC_PI_2),
        Quaternion::from_rotation_z(FRAC_PI_2),
        Quaternion::from_rotation_x(FRAC_PI_2),
        Quaternion::from_rotation_x(-FRAC_PI_2),
    ]
}

// =============================================================================
// GRID LIMITS
// =============================================================================

/// Smallest grid resolution.
pub const MIN_RESOLUTION: u32 = 1;

/// Largest grid resolution (1,000,000 instances).
pub const MAX_RESOLUTION: u32 = 1000;

/// Grid cells packed into one `Float3x4`.
pub const CELLS_PER_PACK: usize = 4;

/// Compute kernel workgroup edge (8x8 threads).
pub const KERNEL_GROUP_SIZE: u32 = 8;

// =============================================================================
// SHADER PARAMETER NAMES
// =============================================================================

/// Names bound on materials and compute kernels.
pub mod names {
    /// Per-level packed matrix buffer.
    pub const MATRICES: &str = "_Matrices";
    /// Per-level primary color.
    pub const COLOR_A: &str = "_ColorA";
    /// Per-level secondary color.
    pub const COLOR_B: &str = "_ColorB";
    /// Per-level random seed vector.
    pub const SEQUENCE_NUMBERS: &str = "_SequenceNumbers";
    /// Grid positions buffer.
    pub const POSITIONS: &str = "_Positions";
    /// Grid normals buffer.
    pub const NORMALS: &str = "_Normals";
    /// Grid resolution.
    pub const RESOLUTION: &str = "_Resolution";
    /// Grid step (2 / resolution).
    pub const STEP: &str = "_Step";
    /// Elapsed time in seconds.
    pub const TIME: &str = "_Time";
    /// Smoothed transition progress.
    pub const TRANSITION_PROGRESS: &str = "_TransitionProgress";
    /// Visualization config vector.
    pub const CONFIG: &str = "_Config";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_rotations_align_up_with_direction() {
        for (rotation, direction) in child_rotations().iter().zip(CHILD_DIRECTIONS) {
            let up = *rotation * Vec3::Y;
            assert!(up.distance(direction) < 1.0e-5, "{up:?} vs {direction:?}");
        }
    }

    #[test]
    fn test_deepest_level_size() {
        assert_eq!(BRANCHING_FACTOR.pow(MAX_DEPTH as u32 - 1), 78_125);
    }
}
