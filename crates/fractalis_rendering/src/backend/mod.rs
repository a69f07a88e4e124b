//! # Backend Contract
//!
//! Renderers talk to the GPU through three narrow traits:
//!
//! ```text
//!   ┌──────────────────┐   create / write / release   ┌───────────────┐
//!   │                  │ ───────────────────────────► │ BufferAllocator│
//!   │  FractalRenderer │   set_parameter / dispatch   ├───────────────┤
//!   │  GpuGraph        │ ───────────────────────────► │ ComputeDispatch│
//!   │  Visualization   │   draw_instanced_indirect    ├───────────────┤
//!   │                  │ ───────────────────────────► │ DrawSink       │
//!   └──────────────────┘                              └───────────────┘
//! ```
//!
//! Renderers only ask for the traits they use, so a host can wire the
//! allocator to `wgpu` and route dispatches and draws through its own
//! command encoder.

pub mod recording;
pub mod wgpu;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::indirect::DrawCall;
use crate::parameters::ParameterValue;

pub use self::recording::{DispatchRecord, DrawRecord, RecordedBuffer, RecordingBackend};
pub use self::wgpu::WgpuAllocator;

/// Opaque id of a backend buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Compute program id. Kernels are addressed by index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KernelId(pub u32);

/// What a buffer is bound as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Structured data read by shaders, written by uploads or kernels.
    Storage,
    /// Indirect draw arguments.
    Indirect,
}

/// Creates, fills and frees GPU buffers.
pub trait BufferAllocator {
    /// Allocates `count * stride` bytes.
    ///
    /// # Errors
    ///
    /// Fails for zero-sized requests or when the device refuses.
    fn create_buffer(
        &mut self,
        label: &str,
        usage: BufferUsage,
        count: usize,
        stride: usize,
    ) -> Result<BufferHandle, BackendError>;

    /// Overwrites the whole buffer with `bytes`.
    ///
    /// # Errors
    ///
    /// Fails for unknown handles or when `bytes` is not exactly the
    /// buffer size.
    fn write_buffer(&mut self, handle: BufferHandle, bytes: &[u8]) -> Result<(), BackendError>;

    /// Frees a buffer. The handle is invalid afterwards.
    ///
    /// # Errors
    ///
    /// Fails for unknown handles.
    fn release_buffer(&mut self, handle: BufferHandle) -> Result<(), BackendError>;
}

/// Runs compute kernels with named parameters.
pub trait ComputeDispatch {
    /// Sets a parameter visible to every kernel.
    fn set_parameter(&mut self, name: &'static str, value: ParameterValue);

    /// Binds `buffer` to slot `name` of `kernel`.
    fn bind_buffer(&mut self, kernel: KernelId, name: &'static str, buffer: BufferHandle);

    /// Queues `kernel` over `groups` workgroups. Does not wait.
    ///
    /// # Errors
    ///
    /// Fails if the kernel is unknown or a bound buffer is gone.
    fn dispatch(&mut self, kernel: KernelId, groups: [u32; 3]) -> Result<(), BackendError>;
}

/// Accepts indirect instanced draws.
pub trait DrawSink {
    /// Queues one draw.
    ///
    /// # Errors
    ///
    /// Fails if a buffer referenced by the call is gone.
    fn draw_instanced_indirect(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError>;

    /// Ends the frame; queued work may be flushed here.
    fn submit(&mut self) {}
}

/// Everything a renderer may need.
pub trait RenderBackend: BufferAllocator + ComputeDispatch + DrawSink {}

impl<T: BufferAllocator + ComputeDispatch + DrawSink + ?Sized> RenderBackend for T {}
