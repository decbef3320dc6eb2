//! The portable contract between render pipelines and a graphics backend.
//!
//! Pipelines speak exclusively through [`RenderDevice`] and the opaque
//! handles it issues; no concrete GPU API leaks through this seam. The
//! crate ships one implementation, [`HeadlessDevice`], which is both the
//! reference semantics and the test double. Real backends live outside
//! the crate.

pub mod headless;
pub mod types;

pub use headless::HeadlessDevice;
pub use types::{
    ConstBufferLayout, GeometryBuffers, GeometryData, GeometryDesc, ResourceFormat,
    ShaderArgumentDesc, ShaderDataType, ShaderMeta, TextureDesc, TextureFlags, VertexInputDesc,
};

use crate::command::{CommandList, ResourceState};
use crate::error::RenderResult;
use crate::resource::{Buffer, Handle, Shader, ShaderArgument, Texture};

/// Backend capability consumed by the pipelines.
///
/// Handles returned here are owned by the device: it retains exclusive
/// ownership of the underlying resources and releases them itself.
/// Mutation must be serialized by the caller; the `&mut` receivers make a
/// single-control-thread frame loop the only way to drive a device
/// without external locking.
pub trait RenderDevice {
    fn create_shader(
        &mut self,
        vertex_src: &str,
        pixel_src: &str,
        meta: ShaderMeta,
    ) -> RenderResult<Handle<Shader>>;

    fn create_texture(
        &mut self,
        desc: TextureDesc,
        initial_state: ResourceState,
        label: &str,
    ) -> RenderResult<Handle<Texture>>;

    fn upload_texture(&mut self, texture: Handle<Texture>, pixels: &[u8]) -> RenderResult<()>;

    /// Immediate state transition, for upload-time changes outside any
    /// command list.
    fn transition(&mut self, texture: Handle<Texture>, state: ResourceState) -> RenderResult<()>;

    fn release_texture(&mut self, texture: Handle<Texture>) -> RenderResult<()>;

    fn create_const_buffer(
        &mut self,
        layout: ConstBufferLayout,
        count: u32,
        label: &str,
    ) -> RenderResult<Handle<Buffer>>;

    /// Write `bytes` into member `member` of element `element`.
    fn update_const_buffer(
        &mut self,
        buffer: Handle<Buffer>,
        element: u32,
        member: u32,
        bytes: &[u8],
    ) -> RenderResult<()>;

    fn create_geometry(&mut self, desc: GeometryDesc<'_>) -> RenderResult<GeometryBuffers>;

    /// Resize (`GeometryData::size_only`) or upload (`GeometryData::of_bytes`)
    /// a geometry buffer. Growth preserves previously uploaded bytes up to
    /// the old capacity; uploads land at `element_offset` elements.
    fn update_geometry(
        &mut self,
        buffer: Handle<Buffer>,
        data: GeometryData<'_>,
        element_offset: u32,
    ) -> RenderResult<()>;

    fn release_buffer(&mut self, buffer: Handle<Buffer>) -> RenderResult<()>;

    fn create_shader_argument(
        &mut self,
        desc: ShaderArgumentDesc,
    ) -> RenderResult<Handle<ShaderArgument>>;

    fn release_shader_argument(&mut self, argument: Handle<ShaderArgument>) -> RenderResult<()>;

    /// Acquire a fresh recordable command list for the current frame.
    fn prepare(&mut self) -> CommandList;

    /// Hand a finished list to the execution queue. Consumes the list;
    /// it is not replayable to a second backend.
    fn submit(&mut self, list: CommandList) -> RenderResult<()>;
}
