//! Per-level random seeds.
//!
//! Each hierarchy level gets one 4-vector of uniform `[0, 1)` values at
//! initialization. Shaders use them to vary color and shape per level.
//! They never change afterwards.

use fractalis_shared::Vec4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Builds the generator for a subsystem: seeded when `seed` is set,
/// otherwise from OS entropy.
#[must_use]
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Immutable per-level seed vectors.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceNumbers {
    values: Box<[Vec4]>,
}

impl SequenceNumbers {
    /// Draws one vector per level.
    pub fn generate<R: Rng + ?Sized>(levels: usize, rng: &mut R) -> Self {
        let values = (0..levels)
            .map(|_| Vec4::new(rng.gen(), rng.gen(), rng.gen(), rng.gen()))
            .collect();
        Self { values }
    }

    /// Vector for `level`, if it exists.
    #[must_use]
    pub fn get(&self, level: usize) -> Option<Vec4> {
        self.values.get(level).copied()
    }

    /// Number of levels covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no levels are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All vectors in level order.
    #[must_use]
    pub fn as_slice(&self) -> &[Vec4] {
        &self.values
    }
}
