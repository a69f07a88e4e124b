//! # Staging Buffers
//!
//! A typed view of one backend buffer with a fixed element count. The
//! native-side array lives with whoever computes the data (a hierarchy
//! level, an evaluator output); `upload` copies it across in one write:
//!
//! ```text
//!   native [T; capacity] ──upload──► GPU buffer [T; capacity]
//!        (worker pool writes)           (shaders read)
//! ```
//!
//! Capacity never changes. A different size means releasing this buffer
//! and creating a new one.

use std::marker::PhantomData;

use bytemuck::Pod;

use crate::backend::{BufferAllocator, BufferHandle, BufferUsage};
use crate::error::BackendError;

/// Fixed-capacity GPU buffer of `T`.
#[derive(Debug, PartialEq, Eq)]
pub struct StagingBuffer<T: Pod> {
    handle: BufferHandle,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> StagingBuffer<T> {
    /// Bytes per element.
    pub const STRIDE: usize = std::mem::size_of::<T>();

    /// Allocates room for exactly `capacity` elements.
    ///
    /// # Errors
    ///
    /// Propagates allocator failures, including zero capacity.
    pub fn create<A: BufferAllocator + ?Sized>(
        allocator: &mut A,
        label: &str,
        usage: BufferUsage,
        capacity: usize,
    ) -> Result<Self, BackendError> {
        let handle = allocator.create_buffer(label, usage, capacity, Self::STRIDE)?;
        Ok(Self { handle, capacity, _marker: PhantomData })
    }

    /// Overwrites the whole buffer with `data`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::SizeMismatch`] unless `data.len()` equals the
    /// capacity.
    pub fn upload<A: BufferAllocator + ?Sized>(
        &self,
        allocator: &mut A,
        data: &[T],
    ) -> Result<(), BackendError> {
        if data.len() != self.capacity {
            return Err(BackendError::SizeMismatch {
                handle: self.handle,
                expected: self.byte_len(),
                actual: std::mem::size_of_val(data),
            });
        }
        allocator.write_buffer(self.handle, bytemuck::cast_slice(data))
    }

    /// Frees the backend buffer.
    ///
    /// # Errors
    ///
    /// Propagates allocator failures.
    pub fn release<A: BufferAllocator + ?Sized>(self, allocator: &mut A) -> Result<(), BackendError> {
        allocator.release_buffer(self.handle)
    }

    /// Frees the backend buffer on a cleanup path, logging any failure.
    pub fn release_or_warn<A: BufferAllocator + ?Sized>(self, allocator: &mut A) {
        let handle = self.handle;
        if let Err(err) = self.release(allocator) {
            tracing::warn!(%err, ?handle, "buffer release failed during cleanup");
        }
    }

    /// Backend handle, for binding.
    #[must_use]
    pub const fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Element count.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size in bytes.
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.capacity * Self::STRIDE
    }
}
