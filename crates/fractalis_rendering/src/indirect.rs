//! Indirect draw arguments and draw call descriptions.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::backend::BufferHandle;
use crate::bounds::Aabb;
use crate::parameters::ParameterBlock;

/// `DrawIndexedIndirect` arguments, laid out as the GPU reads them.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
    /// Indices per instance.
    pub index_count: u32,
    /// Number of instances to draw.
    pub instance_count: u32,
    /// First index.
    pub first_index: u32,
    /// Base vertex.
    pub base_vertex: i32,
    /// First instance.
    pub first_instance: u32,
}

impl DrawIndexedIndirectArgs {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Draws every index of `mesh`, `instances` times.
    #[must_use]
    pub const fn for_mesh(mesh: MeshHandle, instances: u32) -> Self {
        Self {
            index_count: mesh.index_count,
            instance_count: instances,
            first_index: 0,
            base_vertex: 0,
            first_instance: 0,
        }
    }
}

/// Host mesh reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshHandle {
    /// Host-side id.
    pub id: u32,
    /// Indices in the mesh.
    pub index_count: u32,
}

impl MeshHandle {
    /// Creates a handle.
    #[must_use]
    pub const fn new(id: u32, index_count: u32) -> Self {
        Self { id, index_count }
    }
}

/// Host material reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialHandle(pub u32);

/// One indirect instanced draw.
#[derive(Clone, Copy, Debug)]
pub struct DrawCall<'a> {
    /// Mesh to instance.
    pub mesh: MeshHandle,
    /// Material to draw with.
    pub material: MaterialHandle,
    /// World-space bounds of every instance.
    pub bounds: Aabb,
    /// Instances drawn.
    pub instance_count: u32,
    /// Buffer holding the indirect arguments.
    pub args: BufferHandle,
    /// Entry index within `args`.
    pub args_index: u32,
    /// Per-draw shader parameters.
    pub parameters: &'a ParameterBlock,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_layout() {
        assert_eq!(DrawIndexedIndirectArgs::SIZE, 20);
        let args = DrawIndexedIndirectArgs::for_mesh(MeshHandle::new(3, 36), 125);
        assert_eq!(bytemuck::cast::<_, [u32; 5]>(args), [36, 125, 0, 0, 0]);
    }
}
