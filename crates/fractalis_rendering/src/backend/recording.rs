//! # Recording Backend
//!
//! In-memory implementation of every backend trait. Buffers are byte
//! vectors; dispatches and draws are appended to logs the caller drains
//! each frame. Used by tests and by headless runs of the demo binary.

use std::collections::{BTreeMap, HashMap};

use bytemuck::Pod;

use super::{BufferAllocator, BufferHandle, BufferUsage, ComputeDispatch, DrawSink, KernelId};
use crate::bounds::Aabb;
use crate::error::BackendError;
use crate::indirect::{DrawCall, MaterialHandle, MeshHandle};
use crate::parameters::{ParameterBlock, ParameterValue};

/// A live buffer and its contents.
#[derive(Debug, Clone)]
pub struct RecordedBuffer {
    /// Debug label.
    pub label: String,
    /// Binding kind.
    pub usage: BufferUsage,
    /// Element count.
    pub count: usize,
    /// Bytes per element.
    pub stride: usize,
    /// Current contents.
    pub data: Vec<u8>,
    /// Number of writes since creation.
    pub writes: u64,
}

/// One queued compute dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    /// Kernel run.
    pub kernel: KernelId,
    /// Workgroup counts.
    pub groups: [u32; 3],
    /// Global parameters at dispatch time.
    pub parameters: BTreeMap<&'static str, ParameterValue>,
    /// Buffers bound to the kernel.
    pub bindings: BTreeMap<&'static str, BufferHandle>,
}

/// One queued draw, with its parameter block copied.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    /// Mesh drawn.
    pub mesh: MeshHandle,
    /// Material used.
    pub material: MaterialHandle,
    /// Draw bounds.
    pub bounds: Aabb,
    /// Instances drawn.
    pub instance_count: u32,
    /// Indirect argument buffer.
    pub args: BufferHandle,
    /// Entry within `args`.
    pub args_index: u32,
    /// Snapshot of the draw parameters.
    pub parameters: ParameterBlock,
}

/// Headless backend that records everything.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    buffers: HashMap<BufferHandle, RecordedBuffer>,
    next_handle: u32,
    parameters: BTreeMap<&'static str, ParameterValue>,
    bindings: HashMap<KernelId, BTreeMap<&'static str, BufferHandle>>,
    dispatches: Vec<DispatchRecord>,
    draws: Vec<DrawRecord>,
    submitted: Vec<DrawRecord>,
    frames_submitted: u64,
    bytes_written: u64,
}

impl RecordingBackend {
    /// Empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffers not yet released.
    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Looks up a live buffer.
    #[must_use]
    pub fn buffer(&self, handle: BufferHandle) -> Option<&RecordedBuffer> {
        self.buffers.get(&handle)
    }

    /// Decodes a buffer's contents as `T`.
    #[must_use]
    pub fn read<T: Pod>(&self, handle: BufferHandle) -> Option<Vec<T>> {
        let buffer = self.buffers.get(&handle)?;
        Some(
            buffer
                .data
                .chunks_exact(std::mem::size_of::<T>())
                .map(bytemuck::pod_read_unaligned)
                .collect(),
        )
    }

    /// Current value of a global compute parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<ParameterValue> {
        self.parameters.get(name).copied()
    }

    /// Dispatches queued since the last drain.
    #[must_use]
    pub fn dispatches(&self) -> &[DispatchRecord] {
        &self.dispatches
    }

    /// Draws queued since the last drain.
    #[must_use]
    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    /// Total bytes written across all buffers.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Takes this frame's draws.
    pub fn take_draws(&mut self) -> Vec<DrawRecord> {
        std::mem::take(&mut self.draws)
    }

    /// Draws of the last submitted frame.
    #[must_use]
    pub fn last_submitted(&self) -> &[DrawRecord] {
        &self.submitted
    }

    /// Frames submitted so far.
    #[must_use]
    pub const fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    fn check(&self, handle: BufferHandle) -> Result<(), BackendError> {
        if self.buffers.contains_key(&handle) {
            Ok(())
        } else {
            Err(BackendError::UnknownBuffer(handle))
        }
    }
}

impl BufferAllocator for RecordingBackend {
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
        let handle = BufferHandle(self.next_handle);
        self.next_handle += 1;
        self.buffers.insert(
            handle,
            RecordedBuffer {
                label: label.to_owned(),
                usage,
                count,
                stride,
                data: vec![0; count * stride],
                writes: 0,
            },
        );
        Ok(handle)
    }

    fn write_buffer(&mut self, handle: BufferHandle, bytes: &[u8]) -> Result<(), BackendError> {
        let buffer = self
            .buffers
            .get_mut(&handle)
            .ok_or(BackendError::UnknownBuffer(handle))?;
        if bytes.len() != buffer.data.len() {
            return Err(BackendError::SizeMismatch {
                handle,
                expected: buffer.data.len(),
                actual: bytes.len(),
            });
        }
        buffer.data.copy_from_slice(bytes);
        buffer.writes += 1;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    fn release_buffer(&mut self, handle: BufferHandle) -> Result<(), BackendError> {
        self.buffers
            .remove(&handle)
            .map(|_| ())
            .ok_or(BackendError::UnknownBuffer(handle))
    }
}

impl ComputeDispatch for RecordingBackend {
    fn set_parameter(&mut self, name: &'static str, value: ParameterValue) {
        self.parameters.insert(name, value);
    }

    fn bind_buffer(&mut self, kernel: KernelId, name: &'static str, buffer: BufferHandle) {
        self.bindings.entry(kernel).or_default().insert(name, buffer);
    }

    fn dispatch(&mut self, kernel: KernelId, groups: [u32; 3]) -> Result<(), BackendError> {
        let bindings = self.bindings.get(&kernel).cloned().unwrap_or_default();
        for handle in bindings.values() {
            self.check(*handle)?;
        }
        self.dispatches.push(DispatchRecord {
            kernel,
            groups,
            parameters: self.parameters.clone(),
            bindings,
        });
        Ok(())
    }
}

impl DrawSink for RecordingBackend {
    fn draw_instanced_indirect(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError> {
        self.check(call.args)?;
        for handle in call.parameters.buffers() {
            self.check(handle)?;
        }
        self.draws.push(DrawRecord {
            mesh: call.mesh,
            material: call.material,
            bounds: call.bounds,
            instance_count: call.instance_count,
            args: call.args,
            args_index: call.args_index,
            parameters: call.parameters.clone(),
        });
        Ok(())
    }

    fn submit(&mut self) {
        self.dispatches.clear();
        self.submitted = std::mem::take(&mut self.draws);
        self.frames_submitted += 1;
    }
}
