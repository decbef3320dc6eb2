use bitflags::bitflags;

use crate::resource::{Buffer, Handle, Texture};

/// Element/pixel formats the portable contract speaks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFormat {
    R8G8B8A8Unorm,
    R16G16B16A16Float,
    R32G32Float,
    R32G32B32Float,
    R32G32B32A32Float,
    D24UnormS8Uint,
}

impl ResourceFormat {
    pub fn byte_size(self) -> usize {
        match self {
            ResourceFormat::R8G8B8A8Unorm => 4,
            ResourceFormat::R16G16B16A16Float => 8,
            ResourceFormat::R32G32Float => 8,
            ResourceFormat::R32G32B32Float => 12,
            ResourceFormat::R32G32B32A32Float => 16,
            ResourceFormat::D24UnormS8Uint => 4,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TextureFlags: u32 {
        const SHADER_RESOURCE = 1 << 0;
        const RENDER_TARGET = 1 << 1;
        const DEPTH_STENCIL = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: ResourceFormat,
    pub flags: TextureFlags,
}

impl TextureDesc {
    /// Plain sampled 2D texture.
    pub fn simple_2d(width: u32, height: u32, format: ResourceFormat) -> Self {
        TextureDesc {
            width,
            height,
            format,
            flags: TextureFlags::SHADER_RESOURCE,
        }
    }

    pub fn render_target(width: u32, height: u32, format: ResourceFormat) -> Self {
        TextureDesc {
            width,
            height,
            format,
            flags: TextureFlags::SHADER_RESOURCE | TextureFlags::RENDER_TARGET,
        }
    }

    pub fn depth_stencil(width: u32, height: u32) -> Self {
        TextureDesc {
            width,
            height,
            format: ResourceFormat::D24UnormS8Uint,
            flags: TextureFlags::DEPTH_STENCIL,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.byte_size()
    }
}

/// One vertex attribute in a shader's input signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexInputDesc {
    pub semantic: &'static str,
    pub format: ResourceFormat,
    pub offset: u32,
}

/// Fixed-function and signature metadata supplied alongside shader source.
/// Source text itself is opaque to the core; compilation is the backend's
/// business.
#[derive(Debug, Clone, Default)]
pub struct ShaderMeta {
    pub vertex_inputs: Vec<VertexInputDesc>,
    pub depth_stencil_disabled: bool,
    pub front_clockwise: bool,
    pub alpha_blend: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderDataType {
    Float,
    Float2,
    Float3,
    Float4,
    Float4x4,
}

impl ShaderDataType {
    pub fn byte_size(self) -> usize {
        match self {
            ShaderDataType::Float => 4,
            ShaderDataType::Float2 => 8,
            ShaderDataType::Float3 => 12,
            ShaderDataType::Float4 => 16,
            ShaderDataType::Float4x4 => 64,
        }
    }
}

/// Member layout of one constant-buffer element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstBufferLayout {
    members: Vec<ShaderDataType>,
}

impl ConstBufferLayout {
    pub fn new(members: impl Into<Vec<ShaderDataType>>) -> Self {
        ConstBufferLayout {
            members: members.into(),
        }
    }

    pub fn members(&self) -> &[ShaderDataType] {
        &self.members
    }

    /// Stride of one element.
    pub fn byte_size(&self) -> usize {
        self.members.iter().map(|m| m.byte_size()).sum()
    }

    /// Byte offset of `member` within an element, with its size.
    pub fn member_range(&self, member: u32) -> Option<(usize, usize)> {
        let member = member as usize;
        if member >= self.members.len() {
            return None;
        }
        let offset = self.members[..member].iter().map(|m| m.byte_size()).sum();
        Some((offset, self.members[member].byte_size()))
    }
}

/// Geometry buffer contents or, with `bytes` absent, a capacity
/// declaration. Resizing and uploading are deliberately distinct: growth
/// is always an explicit `size_only` call, never a side effect of upload.
#[derive(Debug, Clone, Copy)]
pub struct GeometryData<'a> {
    pub bytes: Option<&'a [u8]>,
    pub element_count: u32,
    pub element_bytesize: u32,
}

impl<'a> GeometryData<'a> {
    /// Declare capacity without supplying content.
    pub fn size_only(element_count: u32, element_bytesize: u32) -> Self {
        GeometryData {
            bytes: None,
            element_count,
            element_bytesize,
        }
    }

    /// Upload `bytes` as `element_count` elements.
    pub fn of_bytes(bytes: &'a [u8], element_count: u32, element_bytesize: u32) -> Self {
        GeometryData {
            bytes: Some(bytes),
            element_count,
            element_bytesize,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.element_count as usize * self.element_bytesize as usize
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GeometryDesc<'a> {
    pub index: GeometryData<'a>,
    pub vertex: GeometryData<'a>,
    /// Dynamic geometry is expected to be resized and re-uploaded per
    /// frame (UI batches); static geometry is uploaded once.
    pub dynamic: bool,
}

/// The index/vertex buffer pair a geometry allocation yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryBuffers {
    pub index_buffer: Handle<Buffer>,
    pub vertex_buffer: Handle<Buffer>,
}

/// Bindings baked into a shader argument at creation time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderArgumentDesc {
    pub const_buffers: Vec<Handle<Buffer>>,
    pub const_buffer_offsets: Vec<u32>,
    pub shader_resources: Vec<Handle<Texture>>,
}
