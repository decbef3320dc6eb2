//! Deferred-shading pipeline: a geometry pass into a per-viewport
//! g-buffer, then a lighting pass composing it into the caller's render
//! target.

use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;

use glam::Mat4;
use log::warn;

use crate::camera::Camera;
use crate::command::{ClearFlags, DrawCommand, Rect, RenderPassDesc, ResourceState};
use crate::device::{
    ConstBufferLayout, GeometryBuffers, GeometryData, GeometryDesc, RenderDevice, ResourceFormat,
    ShaderArgumentDesc, ShaderDataType, ShaderMeta, TextureDesc, VertexInputDesc,
};
use crate::error::RenderResult;
use crate::model::{Model, ModelVertex};
use crate::resource::{Buffer, Handle, Registry, Scene, Shader, ShaderArgument, Texture, Viewport};
use crate::settings::PipelineSettings;

use super::{RenderPipeline, SceneConfig, ShaderSource, ViewportConfig};

/// Sources for the two shaders the pipeline records draws with.
#[derive(Debug, Clone, Copy)]
pub struct DeferredShaders<'a> {
    pub geometry: ShaderSource<'a>,
    pub lighting: ShaderSource<'a>,
}

struct ViewportData {
    target: Handle<Texture>,
    width: u32,
    height: u32,
    camera: Camera,
    depth: Handle<Texture>,
    /// World-space normal attachment.
    normal: Handle<Texture>,
    /// Albedo + shininess attachment.
    albedo: Handle<Texture>,
    lighting_argument: Handle<ShaderArgument>,
}

impl ViewportData {
    fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Device-side state derived from one model in one scene.
struct ModelGpu {
    buffers: GeometryBuffers,
    object_buffer: Handle<Buffer>,
    argument: Handle<ShaderArgument>,
    index_count: u32,
    index_capacity: u32,
    vertex_capacity: u32,
}

#[derive(Default)]
struct SceneData {
    label: String,
    /// Ordered by handle so recorded draw streams are deterministic.
    members: BTreeSet<Handle<Model>>,
    dirty: BTreeSet<Handle<Model>>,
    gpu: BTreeMap<Handle<Model>, ModelGpu>,
}

/// Classic two-pass deferred shading behind the [`RenderPipeline`]
/// surface.
///
/// Model data lives at the pipeline level so one `update_model` can feed
/// any number of scenes; each scene derives its own GPU state lazily on
/// the next `render` after a model was marked dirty. The type is bound to
/// the device that created its resources; handles never cross devices.
pub struct DeferredPipeline<D: RenderDevice> {
    geometry_shader: Handle<Shader>,
    lighting_shader: Handle<Shader>,
    /// Per-render constants: view-projection and camera position.
    frame_buffer: Handle<Buffer>,
    /// Static full-screen triangle driving the lighting pass.
    fullscreen: GeometryBuffers,
    clear_color: [f32; 4],
    viewports: Registry<ViewportData, Viewport>,
    scenes: Registry<SceneData, Scene>,
    models: BTreeMap<Handle<Model>, Model>,
    _device: PhantomData<D>,
}

const OBJECT_BUFFER_LAYOUT: [ShaderDataType; 1] = [ShaderDataType::Float4x4];
const FRAME_BUFFER_LAYOUT: [ShaderDataType; 2] =
    [ShaderDataType::Float4x4, ShaderDataType::Float4];

const MODEL_VERTEX_SIZE: u32 = std::mem::size_of::<ModelVertex>() as u32;
const INDEX_SIZE: u32 = std::mem::size_of::<u32>() as u32;

impl<D: RenderDevice> DeferredPipeline<D> {
    pub fn new(
        device: &mut D,
        shaders: DeferredShaders<'_>,
        settings: &PipelineSettings,
    ) -> RenderResult<Self> {
        let geometry_shader = device.create_shader(
            shaders.geometry.vertex,
            shaders.geometry.pixel,
            ShaderMeta {
                vertex_inputs: vec![
                    VertexInputDesc {
                        semantic: "POSITION",
                        format: ResourceFormat::R32G32B32Float,
                        offset: 0,
                    },
                    VertexInputDesc {
                        semantic: "NORMAL",
                        format: ResourceFormat::R32G32B32Float,
                        offset: 12,
                    },
                    VertexInputDesc {
                        semantic: "COLOR",
                        format: ResourceFormat::R32G32B32A32Float,
                        offset: 24,
                    },
                ],
                ..ShaderMeta::default()
            },
        )?;
        let lighting_shader = device.create_shader(
            shaders.lighting.vertex,
            shaders.lighting.pixel,
            ShaderMeta {
                vertex_inputs: vec![VertexInputDesc {
                    semantic: "POSITION",
                    format: ResourceFormat::R32G32Float,
                    offset: 0,
                }],
                depth_stencil_disabled: true,
                ..ShaderMeta::default()
            },
        )?;
        let frame_buffer =
            device.create_const_buffer(ConstBufferLayout::new(FRAME_BUFFER_LAYOUT), 1, "frame")?;

        // One triangle overshooting the corners covers the whole target
        // without a quad's diagonal seam.
        let corners: [[f32; 2]; 3] = [[-1.0, -1.0], [3.0, -1.0], [-1.0, 3.0]];
        let indices: [u32; 3] = [0, 1, 2];
        let fullscreen = device.create_geometry(GeometryDesc {
            index: GeometryData::of_bytes(bytemuck::cast_slice(&indices), 3, INDEX_SIZE),
            vertex: GeometryData::of_bytes(bytemuck::cast_slice(&corners), 3, 8),
            dynamic: false,
        })?;

        Ok(DeferredPipeline {
            geometry_shader,
            lighting_shader,
            frame_buffer,
            fullscreen,
            clear_color: settings.clear_color,
            viewports: Registry::new(),
            scenes: Registry::new(),
            models: BTreeMap::new(),
            _device: PhantomData,
        })
    }

    /// Build or refresh the device state behind every dirty model of the
    /// scene. A dirty id without stored data is a bug upstream; it is
    /// logged and dropped so the frame still completes. On a device error
    /// the failing model and everything not yet processed stay dirty, so
    /// a later render retries them instead of silently omitting them.
    fn flush_scene(&mut self, device: &mut D, scene: Handle<Scene>) -> RenderResult<()> {
        let frame_buffer = self.frame_buffer;
        let data = self.scenes.try_get_mut(scene)?;
        let mut dirty = std::mem::take(&mut data.dirty);
        while let Some(id) = dirty.pop_first() {
            let Some(model) = self.models.get(&id) else {
                warn!("model {:?} is dirty but has no data, skipping", id);
                data.gpu.remove(&id);
                continue;
            };
            if let Err(err) = Self::flush_model(device, frame_buffer, model, &mut data.gpu, id) {
                data.dirty.insert(id);
                data.dirty.append(&mut dirty);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Upload one model's data, reusing its buffers when they are big
    /// enough. Fresh allocations are released again if a later step
    /// fails; the replaced entry is only torn down once everything new
    /// exists.
    fn flush_model(
        device: &mut D,
        frame_buffer: Handle<Buffer>,
        model: &Model,
        gpu_map: &mut BTreeMap<Handle<Model>, ModelGpu>,
        id: Handle<Model>,
    ) -> RenderResult<()> {
        let index_count = model.mesh.index_count();
        let vertex_count = model.mesh.vertex_count();
        let index_bytes: &[u8] = bytemuck::cast_slice(&model.mesh.indices);
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&model.mesh.vertices);

        let fits = gpu_map
            .get(&id)
            .map(|gpu| gpu.index_capacity >= index_count && gpu.vertex_capacity >= vertex_count)
            .unwrap_or(false);
        if let Some(gpu) = gpu_map.get_mut(&id).filter(|_| fits) {
            device.update_geometry(
                gpu.buffers.index_buffer,
                GeometryData::of_bytes(index_bytes, index_count, INDEX_SIZE),
                0,
            )?;
            device.update_geometry(
                gpu.buffers.vertex_buffer,
                GeometryData::of_bytes(vertex_bytes, vertex_count, MODEL_VERTEX_SIZE),
                0,
            )?;
            gpu.index_count = index_count;
            device.update_const_buffer(
                gpu.object_buffer,
                0,
                0,
                bytemuck::bytes_of(&model.transform.to_cols_array()),
            )?;
            return Ok(());
        }

        let object_buffer =
            device.create_const_buffer(ConstBufferLayout::new(OBJECT_BUFFER_LAYOUT), 1, "object")?;
        let buffers = match device.create_geometry(GeometryDesc {
            index: GeometryData::of_bytes(index_bytes, index_count, INDEX_SIZE),
            vertex: GeometryData::of_bytes(vertex_bytes, vertex_count, MODEL_VERTEX_SIZE),
            dynamic: false,
        }) {
            Ok(buffers) => buffers,
            Err(err) => {
                device.release_buffer(object_buffer)?;
                return Err(err);
            }
        };
        let argument = match device.create_shader_argument(ShaderArgumentDesc {
            const_buffers: vec![frame_buffer, object_buffer],
            const_buffer_offsets: vec![0, 0],
            shader_resources: Vec::new(),
        }) {
            Ok(argument) => argument,
            Err(err) => {
                device.release_buffer(object_buffer)?;
                device.release_buffer(buffers.index_buffer)?;
                device.release_buffer(buffers.vertex_buffer)?;
                return Err(err);
            }
        };
        device.update_const_buffer(
            object_buffer,
            0,
            0,
            bytemuck::bytes_of(&model.transform.to_cols_array()),
        )?;

        if let Some(old) = gpu_map.remove(&id) {
            device.release_buffer(old.buffers.index_buffer)?;
            device.release_buffer(old.buffers.vertex_buffer)?;
            device.release_buffer(old.object_buffer)?;
            device.release_shader_argument(old.argument)?;
        }
        gpu_map.insert(
            id,
            ModelGpu {
                buffers,
                object_buffer,
                argument,
                index_count,
                index_capacity: index_count,
                vertex_capacity: vertex_count,
            },
        );
        Ok(())
    }

    fn write_frame_constants(&mut self, device: &mut D, viewport: Handle<Viewport>) -> RenderResult<()> {
        let data = self.viewports.try_get(viewport)?;
        let view_proj: Mat4 = data.camera.view_proj(data.aspect());
        let position = data.camera.position();
        device.update_const_buffer(
            self.frame_buffer,
            0,
            0,
            bytemuck::bytes_of(&view_proj.to_cols_array()),
        )?;
        device.update_const_buffer(
            self.frame_buffer,
            0,
            1,
            bytemuck::bytes_of(&[position.x, position.y, position.z, 1.0f32]),
        )?;
        Ok(())
    }
}

impl<D: RenderDevice> RenderPipeline<D> for DeferredPipeline<D> {
    fn register_viewport(
        &mut self,
        device: &mut D,
        config: ViewportConfig,
    ) -> RenderResult<Handle<Viewport>> {
        let depth = device.create_texture(
            TextureDesc::depth_stencil(config.width, config.height),
            ResourceState::DepthWrite,
            "viewport depth",
        )?;
        let normal = device.create_texture(
            TextureDesc::render_target(
                config.width,
                config.height,
                ResourceFormat::R32G32B32A32Float,
            ),
            ResourceState::Common,
            "gbuffer normal",
        )?;
        let albedo = device.create_texture(
            TextureDesc::render_target(config.width, config.height, ResourceFormat::R8G8B8A8Unorm),
            ResourceState::Common,
            "gbuffer albedo",
        )?;
        let lighting_argument = device.create_shader_argument(ShaderArgumentDesc {
            const_buffers: vec![self.frame_buffer],
            const_buffer_offsets: vec![0],
            shader_resources: vec![normal, albedo],
        })?;
        Ok(self.viewports.insert(ViewportData {
            target: config.render_target,
            width: config.width,
            height: config.height,
            camera: config.camera,
            depth,
            normal,
            albedo,
            lighting_argument,
        }))
    }

    fn remove_viewport(&mut self, device: &mut D, viewport: Handle<Viewport>) -> RenderResult<()> {
        if let Some(data) = self.viewports.remove(viewport)? {
            device.release_shader_argument(data.lighting_argument)?;
            device.release_texture(data.depth)?;
            device.release_texture(data.normal)?;
            device.release_texture(data.albedo)?;
        }
        Ok(())
    }

    fn transform_viewport(
        &mut self,
        viewport: Handle<Viewport>,
        camera: &Camera,
    ) -> RenderResult<()> {
        self.viewports.try_get_mut(viewport)?.camera = *camera;
        Ok(())
    }

    fn register_scene(
        &mut self,
        _device: &mut D,
        config: SceneConfig,
    ) -> RenderResult<Handle<Scene>> {
        Ok(self.scenes.insert(SceneData {
            label: config.label,
            ..SceneData::default()
        }))
    }

    fn remove_scene(&mut self, device: &mut D, scene: Handle<Scene>) -> RenderResult<()> {
        if let Some(data) = self.scenes.remove(scene)? {
            for (_, gpu) in data.gpu {
                device.release_shader_argument(gpu.argument)?;
                device.release_buffer(gpu.buffers.index_buffer)?;
                device.release_buffer(gpu.buffers.vertex_buffer)?;
                device.release_buffer(gpu.object_buffer)?;
            }
        }
        Ok(())
    }

    fn update_model(&mut self, scene: Handle<Scene>, model: &Model) -> RenderResult<()> {
        let data = self.scenes.try_get_mut(scene)?;
        data.members.insert(model.id);
        data.dirty.insert(model.id);
        self.models.insert(model.id, model.clone());
        Ok(())
    }

    fn add_model(&mut self, scene: Handle<Scene>, model: Handle<Model>) -> RenderResult<()> {
        if !self.models.contains_key(&model) {
            return Err(crate::error::RenderError::invalid_handle::<Model>());
        }
        let data = self.scenes.try_get_mut(scene)?;
        data.members.insert(model);
        data.dirty.insert(model);
        Ok(())
    }

    fn render(
        &mut self,
        device: &mut D,
        viewport: Handle<Viewport>,
        scene: Handle<Scene>,
    ) -> RenderResult<()> {
        self.viewports.try_get(viewport)?;
        self.scenes.try_get(scene)?;

        self.flush_scene(device, scene)?;
        self.write_frame_constants(device, viewport)?;

        let vp = self.viewports.try_get(viewport)?;
        let sc = self.scenes.try_get(scene)?;
        let bounds = Rect::full(vp.width as f32, vp.height as f32);

        let mut list = device.prepare();

        // Geometry pass: scene into the g-buffer.
        list.transition(vp.normal, ResourceState::RenderTarget)?;
        list.transition(vp.albedo, ResourceState::RenderTarget)?;
        list.begin_render_pass(RenderPassDesc {
            render_targets: vec![vp.normal, vp.albedo],
            depth_stencil: vp.depth,
            clear: ClearFlags::COLOR | ClearFlags::DEPTH,
            clear_color: self.clear_color,
            viewport: bounds,
            area: None,
        })?;
        for id in &sc.members {
            let Some(gpu) = sc.gpu.get(id) else {
                warn!("model {:?} has no device state in scene '{}', skipping", id, sc.label);
                continue;
            };
            list.draw(DrawCommand {
                index_buffer: gpu.buffers.index_buffer,
                vertex_buffer: gpu.buffers.vertex_buffer,
                index_count: gpu.index_count,
                index_offset: 0,
                vertex_offset: 0,
                shader: self.geometry_shader,
                arguments: vec![gpu.argument],
                override_area: None,
            })?;
        }
        list.end_render_pass()?;

        // Lighting pass: compose the g-buffer into the caller's target.
        list.transition(vp.normal, ResourceState::PixelShaderResource)?;
        list.transition(vp.albedo, ResourceState::PixelShaderResource)?;
        list.transition(vp.target, ResourceState::RenderTarget)?;
        list.begin_render_pass(RenderPassDesc {
            render_targets: vec![vp.target],
            depth_stencil: Handle::EMPTY,
            clear: ClearFlags::COLOR,
            clear_color: self.clear_color,
            viewport: bounds,
            area: None,
        })?;
        list.draw(DrawCommand {
            index_buffer: self.fullscreen.index_buffer,
            vertex_buffer: self.fullscreen.vertex_buffer,
            index_count: 3,
            index_offset: 0,
            vertex_offset: 0,
            shader: self.lighting_shader,
            arguments: vec![vp.lighting_argument],
            override_area: None,
        })?;
        list.end_render_pass()?;
        list.transition(vp.target, ResourceState::Common)?;

        list.finish()?;
        device.submit(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::device::HeadlessDevice;
    use crate::model::MeshData;
    use crate::resource::HandleAllocator;

    fn shaders() -> DeferredShaders<'static> {
        DeferredShaders {
            geometry: ShaderSource {
                vertex: "gbuf_vs",
                pixel: "gbuf_ps",
            },
            lighting: ShaderSource {
                vertex: "light_vs",
                pixel: "light_ps",
            },
        }
    }

    fn setup() -> (
        HeadlessDevice,
        DeferredPipeline<HeadlessDevice>,
        Handle<Viewport>,
        Handle<Scene>,
    ) {
        let mut device = HeadlessDevice::new();
        let mut pipeline =
            DeferredPipeline::new(&mut device, shaders(), &PipelineSettings::default()).unwrap();
        let target = device
            .create_texture(
                TextureDesc::render_target(800, 600, ResourceFormat::R8G8B8A8Unorm),
                ResourceState::Common,
                "target",
            )
            .unwrap();
        let viewport = pipeline
            .register_viewport(
                &mut device,
                ViewportConfig {
                    render_target: target,
                    width: 800,
                    height: 600,
                    camera: Camera::default(),
                },
            )
            .unwrap();
        let scene = pipeline
            .register_scene(&mut device, SceneConfig::default())
            .unwrap();
        (device, pipeline, viewport, scene)
    }

    #[test]
    fn empty_scene_records_two_passes_and_no_geometry_draws() {
        let (mut device, mut pipeline, viewport, scene) = setup();
        pipeline.render(&mut device, viewport, scene).unwrap();

        let list = device.submitted().last().unwrap();
        let begins = list
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::BeginRenderPass(_)))
            .count();
        assert_eq!(begins, 2);
        // Only the lighting composition triangle draws.
        assert_eq!(list.draw_count(), 1);
    }

    #[test]
    fn one_model_means_one_geometry_draw() {
        let (mut device, mut pipeline, viewport, scene) = setup();
        let mut ids: HandleAllocator<Model> = HandleAllocator::new();
        let model = Model {
            id: ids.allocate(),
            mesh: MeshData::triangle(),
            transform: Mat4::IDENTITY,
        };
        pipeline.update_model(scene, &model).unwrap();
        pipeline.render(&mut device, viewport, scene).unwrap();

        let list = device.submitted().last().unwrap();
        assert_eq!(list.draw_count(), 2);
        let first = list.draws().next().unwrap();
        assert_eq!(first.index_count, 3);
        assert_eq!(first.index_offset, 0);
    }

    #[test]
    fn update_model_upserts_by_id() {
        let (mut device, mut pipeline, viewport, scene) = setup();
        let mut ids: HandleAllocator<Model> = HandleAllocator::new();
        let mut model = Model {
            id: ids.allocate(),
            mesh: MeshData::triangle(),
            transform: Mat4::IDENTITY,
        };
        pipeline.update_model(scene, &model).unwrap();
        model.transform = Mat4::from_translation(glam::Vec3::X);
        pipeline.update_model(scene, &model).unwrap();
        pipeline.render(&mut device, viewport, scene).unwrap();

        // Still one geometry draw plus the lighting triangle.
        assert_eq!(device.submitted().last().unwrap().draw_count(), 2);
    }

    #[test]
    fn add_model_requires_known_data() {
        let (mut device, mut pipeline, _viewport, scene) = setup();
        let mut ids: HandleAllocator<Model> = HandleAllocator::new();
        let unknown = ids.allocate();
        assert!(pipeline.add_model(scene, unknown).is_err());

        let model = Model {
            id: ids.allocate(),
            mesh: MeshData::triangle(),
            transform: Mat4::IDENTITY,
        };
        pipeline.update_model(scene, &model).unwrap();
        let second = pipeline
            .register_scene(&mut device, SceneConfig::default())
            .unwrap();
        pipeline.add_model(second, model.id).unwrap();
    }

    #[test]
    fn render_after_remove_viewport_is_invalid() {
        let (mut device, mut pipeline, viewport, scene) = setup();
        pipeline.remove_viewport(&mut device, viewport).unwrap();
        assert!(pipeline.render(&mut device, viewport, scene).is_err());
    }

    #[test]
    fn exhaustion_during_flush_keeps_the_model_dirty() {
        use crate::error::RenderError;

        // Enough for construction, the target and a 2x2 viewport's
        // attachments, but not for the triangle's buffers.
        let mut device = HeadlessDevice::with_byte_budget(300);
        let mut pipeline =
            DeferredPipeline::new(&mut device, shaders(), &PipelineSettings::default()).unwrap();
        let target = device
            .create_texture(
                TextureDesc::render_target(2, 2, ResourceFormat::R8G8B8A8Unorm),
                ResourceState::Common,
                "target",
            )
            .unwrap();
        let viewport = pipeline
            .register_viewport(
                &mut device,
                ViewportConfig {
                    render_target: target,
                    width: 2,
                    height: 2,
                    camera: Camera::default(),
                },
            )
            .unwrap();
        let scene = pipeline
            .register_scene(&mut device, SceneConfig::default())
            .unwrap();
        let mut ids: HandleAllocator<Model> = HandleAllocator::new();
        let model = Model {
            id: ids.allocate(),
            mesh: MeshData::triangle(),
            transform: Mat4::IDENTITY,
        };
        pipeline.update_model(scene, &model).unwrap();

        assert!(matches!(
            pipeline.render(&mut device, viewport, scene),
            Err(RenderError::ResourceExhaustion { .. })
        ));
        // The model stays dirty, so the next render retries the upload
        // instead of quietly rendering without it.
        assert!(matches!(
            pipeline.render(&mut device, viewport, scene),
            Err(RenderError::ResourceExhaustion { .. })
        ));
        assert_eq!(device.submitted().len(), 0);
    }

    #[test]
    fn remove_scene_releases_model_device_state() {
        let (mut device, mut pipeline, viewport, scene) = setup();
        let mut ids: HandleAllocator<Model> = HandleAllocator::new();
        let model = Model {
            id: ids.allocate(),
            mesh: MeshData::triangle(),
            transform: Mat4::IDENTITY,
        };
        pipeline.update_model(scene, &model).unwrap();
        pipeline.render(&mut device, viewport, scene).unwrap();

        let gpu = &pipeline.scenes.get(scene).unwrap().gpu[&model.id];
        let argument = gpu.argument;
        let index_buffer = gpu.buffers.index_buffer;
        pipeline.remove_scene(&mut device, scene).unwrap();
        assert!(!device.is_shader_argument_live(argument));
        assert!(!device.is_buffer_live(index_buffer));
    }

    #[test]
    fn remove_viewport_releases_its_lighting_argument() {
        let (mut device, mut pipeline, viewport, _scene) = setup();
        let argument = pipeline.viewports.get(viewport).unwrap().lighting_argument;
        pipeline.remove_viewport(&mut device, viewport).unwrap();
        assert!(!device.is_shader_argument_live(argument));
    }

    #[test]
    fn replacing_model_data_releases_the_old_argument() {
        let (mut device, mut pipeline, viewport, scene) = setup();
        let mut ids: HandleAllocator<Model> = HandleAllocator::new();
        let mut model = Model {
            id: ids.allocate(),
            mesh: MeshData::triangle(),
            transform: Mat4::IDENTITY,
        };
        pipeline.update_model(scene, &model).unwrap();
        pipeline.render(&mut device, viewport, scene).unwrap();
        let old_argument = pipeline.scenes.get(scene).unwrap().gpu[&model.id].argument;

        // Grow the mesh past its buffers so the flush recreates them.
        let mut mesh = MeshData::triangle();
        mesh.vertices.extend(MeshData::triangle().vertices);
        mesh.indices.extend([3, 4, 5]);
        model.mesh = mesh;
        pipeline.update_model(scene, &model).unwrap();
        pipeline.render(&mut device, viewport, scene).unwrap();

        assert!(!device.is_shader_argument_live(old_argument));
    }

    #[test]
    fn identical_renders_record_identical_draw_streams() {
        let (mut device, mut pipeline, viewport, scene) = setup();
        let mut ids: HandleAllocator<Model> = HandleAllocator::new();
        for i in 0..3 {
            let model = Model {
                id: ids.allocate(),
                mesh: MeshData::triangle(),
                transform: Mat4::from_translation(glam::Vec3::X * i as f32),
            };
            pipeline.update_model(scene, &model).unwrap();
        }
        pipeline.render(&mut device, viewport, scene).unwrap();
        pipeline.render(&mut device, viewport, scene).unwrap();

        let lists = device.submitted();
        let a: Vec<_> = lists[lists.len() - 2].draws().collect();
        let b: Vec<_> = lists[lists.len() - 1].draws().collect();
        assert_eq!(a, b);
    }
}
