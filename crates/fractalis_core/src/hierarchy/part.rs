//! Fractal part: one node of the hierarchy.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use fractalis_shared::{child_rotations, Quaternion, Vec3, BRANCHING_FACTOR, CHILD_DIRECTIONS};

/// Local and world transform state of one part.
///
/// The local half (`direction`, `local_rotation`) is fixed at creation and
/// only depends on the part's slot within its sibling group. The world half
/// is rewritten every frame by propagation.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FractalPart {
    /// Unit offset direction from the parent.
    pub direction: Vec3,
    /// Rotation relative to the parent.
    pub local_rotation: Quaternion,
    /// World-space position, derived.
    pub world_position: Vec3,
    /// World-space rotation, derived.
    pub world_rotation: Quaternion,
    /// Spin about the local up axis, in radians, kept within `[0, TAU)`.
    pub spin_angle: f32,
}

impl FractalPart {
    /// Creates the part for sibling slot `child_index`.
    ///
    /// # Panics
    ///
    /// Panics if `child_index >= BRANCHING_FACTOR`.
    #[must_use]
    pub fn for_child(child_index: usize) -> Self {
        assert!(child_index < BRANCHING_FACTOR, "child index {child_index} out of range");
        let local_rotation = child_rotations()[child_index];
        Self {
            direction: CHILD_DIRECTIONS[child_index],
            local_rotation,
            world_position: Vec3::ZERO,
            world_rotation: local_rotation,
            spin_angle: 0.0,
        }
    }

    /// Adds `delta` to the spin angle, wrapped to one turn.
    #[inline]
    pub fn add_spin(&mut self, delta: f32) {
        self.spin_angle = (self.spin_angle + delta).rem_euclid(TAU);
    }

    /// Creates the root part.
    #[must_use]
    pub fn root() -> Self {
        Self::for_child(0)
    }
}

impl Default for FractalPart {
    fn default() -> Self {
        Self::root()
    }
}
