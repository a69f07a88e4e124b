//! Named shader parameters.
//!
//! Each renderer owns its blocks and passes them by reference into the
//! draw call. Nothing is shared between pipelines.

use std::collections::BTreeMap;

use fractalis_shared::Vec4;

use crate::backend::BufferHandle;

/// Value of one shader parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParameterValue {
    /// Scalar float.
    Float(f32),
    /// Scalar integer.
    Int(u32),
    /// Four floats (colors, seeds, packed config).
    Vector(Vec4),
    /// Structured buffer.
    Buffer(BufferHandle),
}

/// Parameter set bound to one draw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterBlock {
    values: BTreeMap<&'static str, ParameterValue>,
}

impl ParameterBlock {
    /// Empty block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing any previous value.
    pub fn set(&mut self, name: &'static str, value: ParameterValue) -> &mut Self {
        self.values.insert(name, value);
        self
    }

    /// Sets a float.
    pub fn set_float(&mut self, name: &'static str, value: f32) -> &mut Self {
        self.set(name, ParameterValue::Float(value))
    }

    /// Sets a vector.
    pub fn set_vector(&mut self, name: &'static str, value: Vec4) -> &mut Self {
        self.set(name, ParameterValue::Vector(value))
    }

    /// Binds a buffer.
    pub fn set_buffer(&mut self, name: &'static str, buffer: BufferHandle) -> &mut Self {
        self.set(name, ParameterValue::Buffer(buffer))
    }

    /// Looks up a value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ParameterValue> {
        self.values.get(name).copied()
    }

    /// Buffer bound to `name`, if any.
    #[must_use]
    pub fn buffer(&self, name: &str) -> Option<BufferHandle> {
        match self.get(name) {
            Some(ParameterValue::Buffer(handle)) => Some(handle),
            _ => None,
        }
    }

    /// Every buffer referenced by the block.
    pub fn buffers(&self) -> impl Iterator<Item = BufferHandle> + '_ {
        self.values.values().filter_map(|value| match value {
            ParameterValue::Buffer(handle) => Some(*handle),
            _ => None,
        })
    }

    /// Number of parameters set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the block is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces() {
        let mut block = ParameterBlock::new();
        block.set_float("_Step", 0.1).set_float("_Step", 0.2);
        assert_eq!(block.len(), 1);
        assert_eq!(block.get("_Step"), Some(ParameterValue::Float(0.2)));
    }

    #[test]
    fn test_buffer_lookup() {
        let mut block = ParameterBlock::new();
        block.set_buffer("_Matrices", BufferHandle(7)).set_float("_Time", 1.0);
        assert_eq!(block.buffer("_Matrices"), Some(BufferHandle(7)));
        assert_eq!(block.buffer("_Time"), None);
        assert_eq!(block.buffers().collect::<Vec<_>>(), vec![BufferHandle(7)]);
    }
}
