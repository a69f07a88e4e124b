//! # Level Propagation Kernel
//!
//! The per-item function run once per part per level:
//!
//! ```text
//!   parent (level L-1, index i / 5)      part (level L, index i)
//!   ┌────────────────────────┐           ┌────────────────────────┐
//!   │ world_position         │──┐     ┌──│ direction              │
//!   │ world_rotation         │  │     │  │ local_rotation         │
//!   └────────────────────────┘  │     │  │ spin_angle += delta    │
//!                               ▼     ▼  └────────────────────────┘
//!                         world_rotation = P.rot * local * spin(up)
//!                         world_position = P.pos + P.rot * (1.5 * s * dir)
//!                                      │
//!                                      ▼
//!                            Float3x4 (rot * s | pos)
//! ```
//!
//! Reads nothing but its two inputs, so items of one level can run in any
//! order on any thread.

use fractalis_shared::{Float3x4, Quaternion, BRANCHING_FACTOR};
use fractalis_shared::constants::CHILD_OFFSET;

use super::part::FractalPart;

/// Index of the parent of item `index` in the previous level.
#[inline]
#[must_use]
pub const fn parent_index(index: usize) -> usize {
    index / BRANCHING_FACTOR
}

/// Slot of item `index` within its sibling group.
#[inline]
#[must_use]
pub const fn child_index(index: usize) -> usize {
    index % BRANCHING_FACTOR
}

/// Propagates the parent's world transform to `part`.
///
/// Returns the updated part and its packed matrix, both to be stored at
/// the same index the part was read from.
#[inline]
#[must_use]
pub fn propagate(
    parent: &FractalPart,
    part: &FractalPart,
    spin_delta: f32,
    scale: f32,
) -> (FractalPart, Float3x4) {
    let mut updated = *part;
    updated.add_spin(spin_delta);
    updated.world_rotation = parent.world_rotation
        * (updated.local_rotation * Quaternion::from_rotation_y(updated.spin_angle));
    updated.world_position = parent.world_position
        + parent.world_rotation * (updated.direction * (CHILD_OFFSET * scale));

    let matrix = Float3x4::from_rotation_translation_scale(
        updated.world_rotation,
        updated.world_position,
        scale,
    );
    (updated, matrix)
}
