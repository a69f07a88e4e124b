//! `wgpu`-backed buffer allocator.
//!
//! Owns the `wgpu::Buffer` objects behind each [`BufferHandle`]. The host
//! keeps the device, encodes its own passes and looks buffers up with
//! [`WgpuAllocator::buffer`] to build bind groups and indirect draws.

use std::collections::HashMap;

use super::{BufferAllocator, BufferHandle, BufferUsage};
use crate::error::BackendError;

/// Buffer allocator over a borrowed device and queue.
pub struct WgpuAllocator<'a> {
    device: &'a ::wgpu::Device,
    queue: &'a ::wgpu::Queue,
    buffers: HashMap<BufferHandle, ::wgpu::Buffer>,
    next_handle: u32,
}

impl<'a> WgpuAllocator<'a> {
    /// Creates an allocator with no buffers.
    #[must_use]
    pub fn new(device: &'a ::wgpu::Device, queue: &'a ::wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            buffers: HashMap::new(),
            next_handle: 0,
        }
    }

    /// The `wgpu` buffer behind `handle`.
    #[must_use]
    pub fn buffer(&self, handle: BufferHandle) -> Option<&::wgpu::Buffer> {
        self.buffers.get(&handle)
    }

    /// Number of buffers not yet released.
    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    fn usages(usage: BufferUsage) -> ::wgpu::BufferUsages {
        match usage {
            BufferUsage::Storage => ::wgpu::BufferUsages::STORAGE | ::wgpu::BufferUsages::COPY_DST,
            BufferUsage::Indirect => {
                ::wgpu::BufferUsages::INDIRECT
                    | ::wgpu::BufferUsages::STORAGE
                    | ::wgpu::BufferUsages::COPY_DST
            }
        }
    }
}

impl BufferAllocator for WgpuAllocator<'_> {
    fn create_buffer(
        &mut self,
        label: &str,
        usage: BufferUsage,
        count: usize,
        stride: usize,
    ) -> Result<BufferHandle, BackendError> {
        if count == 0 || stride == 0 {
            return Err(BackendError::ZeroCapacity { label: label.to_owned() });
        }
        let size = (count * stride) as u64;
        if size % ::wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(BackendError::Device(format!(
                "buffer '{label}' size {size} is not a multiple of {}",
                ::wgpu::COPY_BUFFER_ALIGNMENT
            )));
        }
        let limit = self.device.limits().max_buffer_size;
        if size > limit {
            return Err(BackendError::Device(format!(
                "buffer '{label}' size {size} exceeds device limit {limit}"
            )));
        }

        let buffer = self.device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: Self::usages(usage),
            mapped_at_creation: false,
        });
        let handle = BufferHandle(self.next_handle);
        self.next_handle += 1;
        self.buffers.insert(handle, buffer);
        tracing::trace!(?handle, label, size, "wgpu buffer created");
        Ok(handle)
    }

    fn write_buffer(&mut self, handle: BufferHandle, bytes: &[u8]) -> Result<(), BackendError> {
        let buffer = self
            .buffers
            .get(&handle)
            .ok_or(BackendError::UnknownBuffer(handle))?;
        if bytes.len() as u64 != buffer.size() {
            return Err(BackendError::SizeMismatch {
                handle,
                expected: buffer.size() as usize,
                actual: bytes.len(),
            });
        }
        self.queue.write_buffer(buffer, 0, bytes);
        Ok(())
    }

    fn release_buffer(&mut self, handle: BufferHandle) -> Result<(), BackendError> {
        let buffer = self
            .buffers
            .remove(&handle)
            .ok_or(BackendError::UnknownBuffer(handle))?;
        buffer.destroy();
        Ok(())
    }
}
