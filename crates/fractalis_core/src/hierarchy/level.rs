//! One depth tier of the hierarchy.

use fractalis_shared::{Float3x4, BRANCHING_FACTOR};

use super::kernel::child_index;
use super::part::FractalPart;
use crate::error::ConfigError;

/// Parts of one level and their packed matrices, index-aligned.
///
/// Both arrays are allocated once with exactly `5^index` entries and never
/// grow or shrink.
#[derive(Clone, Debug)]
pub struct Level {
    /// Depth of this level (0 = root).
    index: usize,
    /// Part state, written by propagation.
    pub(crate) parts: Vec<FractalPart>,
    /// Packed matrices, written by propagation, read by upload.
    pub(crate) matrices: Vec<Float3x4>,
}

impl Level {
    /// Number of parts on level `index`.
    #[must_use]
    pub fn expected_len(index: usize) -> usize {
        BRANCHING_FACTOR.pow(index as u32)
    }

    /// Allocates level `index` with every sibling group populated in
    /// direction-catalog order.
    #[must_use]
    pub fn new(index: usize) -> Self {
        let len = Self::expected_len(index);
        let parts = (0..len).map(|i| FractalPart::for_child(child_index(i))).collect();
        Self {
            index,
            parts,
            matrices: vec![Float3x4::default(); len],
        }
    }

    /// Depth of this level.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Always false for a constructed level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Part state.
    #[must_use]
    pub fn parts(&self) -> &[FractalPart] {
        &self.parts
    }

    /// Packed matrices in part order.
    #[must_use]
    pub fn matrices(&self) -> &[Float3x4] {
        &self.matrices
    }

    /// Checks both arrays hold exactly `5^index` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedLevel`] naming the first bad array.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let expected = Self::expected_len(self.index);
        for actual in [self.parts.len(), self.matrices.len()] {
            if actual != expected {
                return Err(ConfigError::MalformedLevel {
                    level: self.index,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}
