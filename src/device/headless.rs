use crate::command::{Command, CommandList, ResourceState};
use crate::error::{RenderError, RenderResult};
use crate::resource::{Buffer, Handle, Registry, Shader, ShaderArgument, Texture};

use super::types::{
    ConstBufferLayout, GeometryBuffers, GeometryData, GeometryDesc, ShaderArgumentDesc, ShaderMeta,
    TextureDesc,
};
use super::RenderDevice;

#[allow(dead_code)]
struct ShaderRecord {
    vertex_src: String,
    pixel_src: String,
    meta: ShaderMeta,
}

struct TextureRecord {
    desc: TextureDesc,
    state: ResourceState,
    label: String,
    pixels: Vec<u8>,
}

enum BufferRecord {
    Const {
        layout: ConstBufferLayout,
        count: u32,
        data: Vec<u8>,
    },
    Geometry {
        element_bytesize: u32,
        element_count: u32,
        data: Vec<u8>,
    },
}

impl BufferRecord {
    fn byte_len(&self) -> usize {
        match self {
            BufferRecord::Const { data, .. } => data.len(),
            BufferRecord::Geometry { data, .. } => data.len(),
        }
    }
}

/// CPU-side reference backend.
///
/// Implements the full [`RenderDevice`] contract against in-memory
/// storage: geometry and constant buffers are byte-accurate, submitted
/// command lists are retained for inspection, and an optional byte budget
/// makes allocation-failure paths reachable. Pipelines behave identically
/// on a GPU backend and on this one up to actual pixel output.
pub struct HeadlessDevice {
    shaders: Registry<ShaderRecord, Shader>,
    textures: Registry<TextureRecord, Texture>,
    buffers: Registry<BufferRecord, Buffer>,
    shader_arguments: Registry<ShaderArgumentDesc, ShaderArgument>,
    submitted: Vec<CommandList>,
    byte_budget: Option<usize>,
    bytes_allocated: usize,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        HeadlessDevice {
            shaders: Registry::new(),
            textures: Registry::new(),
            buffers: Registry::new(),
            shader_arguments: Registry::new(),
            submitted: Vec::new(),
            byte_budget: None,
            bytes_allocated: 0,
        }
    }

    /// Cap total buffer/texture storage so exhaustion paths can be
    /// exercised without a real device.
    pub fn with_byte_budget(budget: usize) -> Self {
        let mut device = Self::new();
        device.byte_budget = Some(budget);
        device
    }

    /// Every command list submitted so far, in submission order.
    pub fn submitted(&self) -> &[CommandList] {
        &self.submitted
    }

    pub fn texture_state(&self, texture: Handle<Texture>) -> Option<ResourceState> {
        self.textures.get(texture).map(|r| r.state)
    }

    pub fn texture_desc(&self, texture: Handle<Texture>) -> Option<TextureDesc> {
        self.textures.get(texture).map(|r| r.desc)
    }

    pub fn texture_pixels(&self, texture: Handle<Texture>) -> Option<&[u8]> {
        self.textures.get(texture).map(|r| r.pixels.as_slice())
    }

    /// Raw contents of a geometry buffer, full declared capacity.
    pub fn geometry_bytes(&self, buffer: Handle<Buffer>) -> Option<&[u8]> {
        match self.buffers.get(buffer)? {
            BufferRecord::Geometry { data, .. } => Some(data.as_slice()),
            BufferRecord::Const { .. } => None,
        }
    }

    /// Declared element capacity of a geometry buffer.
    pub fn geometry_element_count(&self, buffer: Handle<Buffer>) -> Option<u32> {
        match self.buffers.get(buffer)? {
            BufferRecord::Geometry { element_count, .. } => Some(*element_count),
            BufferRecord::Const { .. } => None,
        }
    }

    pub fn const_buffer_bytes(&self, buffer: Handle<Buffer>) -> Option<&[u8]> {
        match self.buffers.get(buffer)? {
            BufferRecord::Const { data, .. } => Some(data.as_slice()),
            BufferRecord::Geometry { .. } => None,
        }
    }

    pub fn is_texture_live(&self, texture: Handle<Texture>) -> bool {
        self.textures.contains(texture)
    }

    pub fn is_buffer_live(&self, buffer: Handle<Buffer>) -> bool {
        self.buffers.contains(buffer)
    }

    pub fn is_shader_argument_live(&self, argument: Handle<ShaderArgument>) -> bool {
        self.shader_arguments.contains(argument)
    }

    fn reserve(&mut self, what: &'static str, requested: usize) -> RenderResult<()> {
        if let Some(budget) = self.byte_budget {
            if self.bytes_allocated + requested > budget {
                return Err(RenderError::ResourceExhaustion { what, requested });
            }
        }
        self.bytes_allocated += requested;
        Ok(())
    }

    fn release_bytes(&mut self, len: usize) {
        self.bytes_allocated = self.bytes_allocated.saturating_sub(len);
    }

    fn allocate_geometry_buffer(
        &mut self,
        data: GeometryData<'_>,
        what: &'static str,
    ) -> RenderResult<Handle<Buffer>> {
        let size = data.byte_size();
        self.reserve(what, size)?;
        let mut storage = vec![0u8; size];
        if let Some(bytes) = data.bytes {
            let len = bytes.len().min(size);
            storage[..len].copy_from_slice(&bytes[..len]);
        }
        Ok(self.buffers.insert(BufferRecord::Geometry {
            element_bytesize: data.element_bytesize,
            element_count: data.element_count,
            data: storage,
        }))
    }

    fn validate_list(&self, list: &CommandList) -> RenderResult<()> {
        for command in list.commands() {
            match command {
                Command::Transition { texture, .. } => {
                    self.textures.try_get(*texture)?;
                }
                Command::BeginRenderPass(desc) => {
                    for target in &desc.render_targets {
                        self.textures.try_get(*target)?;
                    }
                    if !desc.depth_stencil.is_empty() {
                        self.textures.try_get(desc.depth_stencil)?;
                    }
                }
                Command::Draw(draw) => {
                    self.buffers.try_get(draw.index_buffer)?;
                    self.buffers.try_get(draw.vertex_buffer)?;
                    self.shaders.try_get(draw.shader)?;
                    for argument in &draw.arguments {
                        self.shader_arguments.try_get(*argument)?;
                    }
                }
                Command::EndRenderPass => {}
            }
        }
        Ok(())
    }
}

impl RenderDevice for HeadlessDevice {
    fn create_shader(
        &mut self,
        vertex_src: &str,
        pixel_src: &str,
        meta: ShaderMeta,
    ) -> RenderResult<Handle<Shader>> {
        Ok(self.shaders.insert(ShaderRecord {
            vertex_src: vertex_src.to_owned(),
            pixel_src: pixel_src.to_owned(),
            meta,
        }))
    }

    fn create_texture(
        &mut self,
        desc: TextureDesc,
        initial_state: ResourceState,
        label: &str,
    ) -> RenderResult<Handle<Texture>> {
        self.reserve("texture", desc.byte_size())?;
        Ok(self.textures.insert(TextureRecord {
            desc,
            state: initial_state,
            label: label.to_owned(),
            pixels: vec![0u8; desc.byte_size()],
        }))
    }

    fn upload_texture(&mut self, texture: Handle<Texture>, pixels: &[u8]) -> RenderResult<()> {
        let record = self.textures.try_get_mut(texture)?;
        if pixels.len() > record.pixels.len() {
            return Err(RenderError::IllegalState(
                "texture upload exceeds allocated size",
            ));
        }
        record.pixels[..pixels.len()].copy_from_slice(pixels);
        Ok(())
    }

    fn transition(&mut self, texture: Handle<Texture>, state: ResourceState) -> RenderResult<()> {
        self.textures.try_get_mut(texture)?.state = state;
        Ok(())
    }

    fn release_texture(&mut self, texture: Handle<Texture>) -> RenderResult<()> {
        if let Some(record) = self.textures.remove(texture)? {
            log::debug!("released texture '{}'", record.label);
            self.release_bytes(record.pixels.len());
        }
        Ok(())
    }

    fn create_const_buffer(
        &mut self,
        layout: ConstBufferLayout,
        count: u32,
        _label: &str,
    ) -> RenderResult<Handle<Buffer>> {
        let size = layout.byte_size() * count as usize;
        self.reserve("const buffer", size)?;
        Ok(self.buffers.insert(BufferRecord::Const {
            layout,
            count,
            data: vec![0u8; size],
        }))
    }

    fn update_const_buffer(
        &mut self,
        buffer: Handle<Buffer>,
        element: u32,
        member: u32,
        bytes: &[u8],
    ) -> RenderResult<()> {
        match self.buffers.try_get_mut(buffer)? {
            BufferRecord::Const {
                layout,
                count,
                data,
            } => {
                if element >= *count {
                    return Err(RenderError::IllegalState(
                        "const buffer element out of range",
                    ));
                }
                let (offset, size) = layout
                    .member_range(member)
                    .ok_or(RenderError::IllegalState("const buffer member out of range"))?;
                if bytes.len() != size {
                    return Err(RenderError::IllegalState(
                        "const buffer write does not match member size",
                    ));
                }
                let start = element as usize * layout.byte_size() + offset;
                data[start..start + size].copy_from_slice(bytes);
                Ok(())
            }
            BufferRecord::Geometry { .. } => Err(RenderError::IllegalState(
                "const buffer update on a geometry buffer",
            )),
        }
    }

    fn create_geometry(&mut self, desc: GeometryDesc<'_>) -> RenderResult<GeometryBuffers> {
        // Check both allocations up front so a failed vertex allocation
        // leaves no dangling index buffer behind.
        let total = desc.index.byte_size() + desc.vertex.byte_size();
        if let Some(budget) = self.byte_budget {
            if self.bytes_allocated + total > budget {
                return Err(RenderError::ResourceExhaustion {
                    what: "geometry",
                    requested: total,
                });
            }
        }
        let index_buffer = self.allocate_geometry_buffer(desc.index, "index buffer")?;
        let vertex_buffer = self.allocate_geometry_buffer(desc.vertex, "vertex buffer")?;
        Ok(GeometryBuffers {
            index_buffer,
            vertex_buffer,
        })
    }

    fn update_geometry(
        &mut self,
        buffer: Handle<Buffer>,
        data: GeometryData<'_>,
        element_offset: u32,
    ) -> RenderResult<()> {
        match data.bytes {
            None => {
                // Capacity declaration. Preserve existing content up to the
                // old capacity. Budget is checked before anything mutates so
                // an exhausted resize leaves the buffer untouched.
                let old_len = match self.buffers.try_get(buffer)? {
                    BufferRecord::Geometry { data: storage, .. } => storage.len(),
                    BufferRecord::Const { .. } => {
                        return Err(RenderError::IllegalState(
                            "geometry resize on a const buffer",
                        ))
                    }
                };
                let new_len = data.byte_size();
                if new_len > old_len {
                    self.reserve("geometry", new_len - old_len)?;
                } else {
                    self.release_bytes(old_len - new_len);
                }
                if let BufferRecord::Geometry {
                    element_bytesize,
                    element_count,
                    data: storage,
                } = self.buffers.try_get_mut(buffer)?
                {
                    *element_bytesize = data.element_bytesize;
                    *element_count = data.element_count;
                    storage.resize(new_len, 0);
                }
                if new_len > old_len {
                    log::info!("growing geometry buffer: {} -> {} bytes", old_len, new_len);
                }
                Ok(())
            }
            Some(bytes) => match self.buffers.try_get_mut(buffer)? {
                BufferRecord::Geometry {
                    element_bytesize,
                    data: storage,
                    ..
                } => {
                    let start = element_offset as usize * *element_bytesize as usize;
                    let end = start + bytes.len();
                    if end > storage.len() {
                        return Err(RenderError::IllegalState(
                            "geometry upload exceeds declared capacity",
                        ));
                    }
                    storage[start..end].copy_from_slice(bytes);
                    Ok(())
                }
                BufferRecord::Const { .. } => Err(RenderError::IllegalState(
                    "geometry upload on a const buffer",
                )),
            },
        }
    }

    fn release_buffer(&mut self, buffer: Handle<Buffer>) -> RenderResult<()> {
        if let Some(record) = self.buffers.remove(buffer)? {
            self.release_bytes(record.byte_len());
        }
        Ok(())
    }

    fn create_shader_argument(
        &mut self,
        desc: ShaderArgumentDesc,
    ) -> RenderResult<Handle<ShaderArgument>> {
        for buffer in &desc.const_buffers {
            self.buffers.try_get(*buffer)?;
        }
        for texture in &desc.shader_resources {
            self.textures.try_get(*texture)?;
        }
        Ok(self.shader_arguments.insert(desc))
    }

    fn release_shader_argument(&mut self, argument: Handle<ShaderArgument>) -> RenderResult<()> {
        self.shader_arguments.remove(argument)?;
        Ok(())
    }

    fn prepare(&mut self) -> CommandList {
        CommandList::new()
    }

    fn submit(&mut self, mut list: CommandList) -> RenderResult<()> {
        self.validate_list(&list)?;
        list.mark_submitted()?;
        self.submitted.push(list);
        Ok(())
    }
}
