use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::resource::Handle;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct ModelVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

#[inline]
pub fn v(pos: [f32; 3], normal: [f32; 3], color: [f32; 4]) -> ModelVertex {
    ModelVertex { pos, normal, color }
}

/// CPU-side triangle mesh. Construction and loading are the caller's
/// business; the pipelines only move these bytes to the device.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Single flat-shaded triangle, handy for smoke tests and examples.
    pub fn triangle() -> Self {
        let color = [0.5, 0.5, 0.5, 1.0];
        let normal = [0.0, 0.0, 1.0];
        MeshData {
            vertices: vec![
                v([0.0, 0.5, 0.5], normal, color),
                v([0.5, -0.5, 0.5], normal, color),
                v([-0.5, -0.5, 0.5], normal, color),
            ],
            indices: vec![0, 1, 2],
        }
    }
}

/// One model instance as supplied to a scene. Identity (`id`) is allocated
/// by the caller through a [`crate::resource::HandleAllocator`]; upserts
/// into a scene are keyed by it.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub id: Handle<Model>,
    pub mesh: MeshData,
    pub transform: Mat4,
}
