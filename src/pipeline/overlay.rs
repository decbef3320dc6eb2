//! UI overlay pipeline: adapts externally produced 2D draw batches (an
//! immediate-mode UI library's output) into a single load pass over a
//! viewport's render target.

use std::collections::HashMap;
use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};
use log::{debug, warn};

use crate::camera::{ortho_for_rect, Camera};
use crate::command::{
    ClearFlags, CommandList, DrawCommand, Rect, RenderPassDesc, ResourceState, ScissorRect,
};
use crate::device::{
    ConstBufferLayout, GeometryBuffers, GeometryData, GeometryDesc, RenderDevice, ResourceFormat,
    ShaderArgumentDesc, ShaderDataType, ShaderMeta, TextureDesc, VertexInputDesc,
};
use crate::error::{RenderError, RenderResult};
use crate::model::Model;
use crate::resource::{Buffer, Handle, Registry, Scene, Shader, ShaderArgument, Texture, Viewport};
use crate::settings::PipelineSettings;

use super::{RenderPipeline, SceneConfig, ShaderSource, ViewportConfig};

/// Identifier the UI library uses for textures in its draw batches. The
/// font atlas always occupies [`FONT_TEXTURE_ID`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UiTextureId(pub u64);

pub const FONT_TEXTURE_ID: UiTextureId = UiTextureId(0);

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct UiVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: [u8; 4],
}

/// Axis-aligned rectangle in the UI's display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiRect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

/// Escape hatch for batches that want to record raw commands themselves.
pub type UiCallback = Box<dyn Fn(&mut CommandList) -> RenderResult<()>>;

pub enum UiBatchKind {
    Draw {
        clip: UiRect,
        /// `None` binds the font atlas.
        texture: Option<UiTextureId>,
    },
    /// Reserved by some UI libraries to force a state reset mid-stream.
    /// This adapter has no retained state to reset and skips it.
    ResetRenderState,
    Callback(UiCallback),
}

/// One contiguous index range of the shared arrays.
pub struct UiBatch {
    pub index_offset: u32,
    pub index_count: u32,
    pub vertex_offset: u32,
    pub kind: UiBatchKind,
}

/// A whole frame of UI output: shared index/vertex arrays, the display
/// rectangle they were laid out in, and the batches referencing them.
pub struct UiDrawData {
    pub indices: Vec<u32>,
    pub vertices: Vec<UiVertex>,
    pub display_rect: Rect,
    pub batches: Vec<UiBatch>,
}

/// Font atlas pixels supplied by the UI library at construction.
#[derive(Debug, Clone, Copy)]
pub struct UiFontAtlas<'a> {
    pub width: u32,
    pub height: u32,
    pub rgba: &'a [u8],
}

/// Per-render counters, readable after each `render` call. Every draw
/// batch is either emitted or skipped; reset requests are tallied
/// separately so nothing the frame carried goes unaccounted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draws_emitted: u32,
    pub draws_skipped: u32,
    pub unknown_textures: u32,
    pub reset_requests: u32,
}

struct ViewportData {
    target: Handle<Texture>,
    width: u32,
    height: u32,
    geometry: GeometryBuffers,
    index_capacity: u32,
    vertex_capacity: u32,
}

#[derive(Default)]
struct SceneData {
    label: String,
    draw_data: Option<UiDrawData>,
}

const UI_VERTEX_SIZE: u32 = std::mem::size_of::<UiVertex>() as u32;
const INDEX_SIZE: u32 = std::mem::size_of::<u32>() as u32;

/// Overlay pipeline over caller-supplied [`UiDrawData`].
///
/// Scenes carry UI frames instead of models; geometry is a growable
/// per-viewport pair re-uploaded every render. The target is loaded, not
/// cleared, so the overlay composes over whatever rendered before it.
pub struct OverlayPipeline<D: RenderDevice> {
    shader: Handle<Shader>,
    projection: Handle<Buffer>,
    font_argument: Handle<ShaderArgument>,
    arguments: HashMap<UiTextureId, Handle<ShaderArgument>>,
    viewports: Registry<ViewportData, Viewport>,
    scenes: Registry<SceneData, Scene>,
    initial_index_capacity: u32,
    initial_vertex_capacity: u32,
    stats: FrameStats,
    _device: PhantomData<D>,
}

impl<D: RenderDevice> OverlayPipeline<D> {
    pub fn new(
        device: &mut D,
        shader: ShaderSource<'_>,
        font: UiFontAtlas<'_>,
        settings: &PipelineSettings,
    ) -> RenderResult<Self> {
        let shader = device.create_shader(
            shader.vertex,
            shader.pixel,
            ShaderMeta {
                vertex_inputs: vec![
                    VertexInputDesc {
                        semantic: "POSITION",
                        format: ResourceFormat::R32G32Float,
                        offset: 0,
                    },
                    VertexInputDesc {
                        semantic: "TEXCOORD",
                        format: ResourceFormat::R32G32Float,
                        offset: 8,
                    },
                    VertexInputDesc {
                        semantic: "COLOR",
                        format: ResourceFormat::R8G8B8A8Unorm,
                        offset: 16,
                    },
                ],
                depth_stencil_disabled: true,
                alpha_blend: true,
                ..ShaderMeta::default()
            },
        )?;
        let projection = device.create_const_buffer(
            ConstBufferLayout::new([ShaderDataType::Float4x4]),
            1,
            "ui projection",
        )?;
        let font_texture = device.create_texture(
            TextureDesc::simple_2d(font.width, font.height, ResourceFormat::R8G8B8A8Unorm),
            ResourceState::CopyDestination,
            "ui font atlas",
        )?;
        device.upload_texture(font_texture, font.rgba)?;
        device.transition(font_texture, ResourceState::PixelShaderResource)?;
        let font_argument = device.create_shader_argument(ShaderArgumentDesc {
            const_buffers: vec![projection],
            const_buffer_offsets: vec![0],
            shader_resources: vec![font_texture],
        })?;
        let mut arguments = HashMap::new();
        arguments.insert(FONT_TEXTURE_ID, font_argument);
        Ok(OverlayPipeline {
            shader,
            projection,
            font_argument,
            arguments,
            viewports: Registry::new(),
            scenes: Registry::new(),
            initial_index_capacity: settings.ui_index_capacity,
            initial_vertex_capacity: settings.ui_vertex_capacity,
            stats: FrameStats::default(),
            _device: PhantomData,
        })
    }

    /// Make `id` resolvable in draw batches. The texture must already be
    /// in shader-resource state; registering an id twice rebinds it and
    /// releases the previous binding.
    pub fn register_texture(
        &mut self,
        device: &mut D,
        id: UiTextureId,
        texture: Handle<Texture>,
    ) -> RenderResult<()> {
        let argument = device.create_shader_argument(ShaderArgumentDesc {
            const_buffers: vec![self.projection],
            const_buffer_offsets: vec![0],
            shader_resources: vec![texture],
        })?;
        if let Some(old) = self.arguments.insert(id, argument) {
            device.release_shader_argument(old)?;
        }
        if id == FONT_TEXTURE_ID {
            self.font_argument = argument;
        }
        Ok(())
    }

    /// Replace the scene's UI frame. The previous frame, if any, is
    /// dropped; uploads happen on the next `render`.
    pub fn set_draw_data(&mut self, scene: Handle<Scene>, data: UiDrawData) -> RenderResult<()> {
        let sc = self.scenes.try_get_mut(scene)?;
        debug!("scene '{}' received {} ui batches", sc.label, data.batches.len());
        sc.draw_data = Some(data);
        Ok(())
    }

    /// Counters from the most recent `render` call.
    pub fn last_frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Grow-only capacity check, then upload the shared arrays.
    fn upload_frame(
        device: &mut D,
        vp: &mut ViewportData,
        data: &UiDrawData,
    ) -> RenderResult<()> {
        let needed_indices = data.indices.len() as u32;
        let needed_vertices = data.vertices.len() as u32;
        if needed_indices > vp.index_capacity {
            let capacity = needed_indices.max(vp.index_capacity * 2);
            device.update_geometry(
                vp.geometry.index_buffer,
                GeometryData::size_only(capacity, INDEX_SIZE),
                0,
            )?;
            debug!("ui index buffer grown to {} elements", capacity);
            vp.index_capacity = capacity;
        }
        if needed_vertices > vp.vertex_capacity {
            let capacity = needed_vertices.max(vp.vertex_capacity * 2);
            device.update_geometry(
                vp.geometry.vertex_buffer,
                GeometryData::size_only(capacity, UI_VERTEX_SIZE),
                0,
            )?;
            debug!("ui vertex buffer grown to {} elements", capacity);
            vp.vertex_capacity = capacity;
        }
        if needed_indices > 0 {
            device.update_geometry(
                vp.geometry.index_buffer,
                GeometryData::of_bytes(
                    bytemuck::cast_slice(&data.indices),
                    needed_indices,
                    INDEX_SIZE,
                ),
                0,
            )?;
        }
        if needed_vertices > 0 {
            device.update_geometry(
                vp.geometry.vertex_buffer,
                GeometryData::of_bytes(
                    bytemuck::cast_slice(&data.vertices),
                    needed_vertices,
                    UI_VERTEX_SIZE,
                ),
                0,
            )?;
        }
        Ok(())
    }

    /// Clip rectangle in display coordinates to a scissor in
    /// target-local pixels. `None` when nothing of it remains on target.
    fn scissor_for_clip(clip: UiRect, display: Rect) -> Option<ScissorRect> {
        let min_x = (clip.min[0] - display.x).max(0.0);
        let min_y = (clip.min[1] - display.y).max(0.0);
        let max_x = (clip.max[0] - display.x).min(display.width);
        let max_y = (clip.max[1] - display.y).min(display.height);
        if max_x <= min_x || max_y <= min_y {
            return None;
        }
        Some(ScissorRect {
            x: min_x as i32,
            y: min_y as i32,
            width: (max_x - min_x) as i32,
            height: (max_y - min_y) as i32,
        })
    }
}

impl<D: RenderDevice> RenderPipeline<D> for OverlayPipeline<D> {
    fn register_viewport(
        &mut self,
        device: &mut D,
        config: ViewportConfig,
    ) -> RenderResult<Handle<Viewport>> {
        let geometry = device.create_geometry(GeometryDesc {
            index: GeometryData::size_only(self.initial_index_capacity, INDEX_SIZE),
            vertex: GeometryData::size_only(self.initial_vertex_capacity, UI_VERTEX_SIZE),
            dynamic: true,
        })?;
        Ok(self.viewports.insert(ViewportData {
            target: config.render_target,
            width: config.width,
            height: config.height,
            geometry,
            index_capacity: self.initial_index_capacity,
            vertex_capacity: self.initial_vertex_capacity,
        }))
    }

    fn remove_viewport(&mut self, device: &mut D, viewport: Handle<Viewport>) -> RenderResult<()> {
        if let Some(data) = self.viewports.remove(viewport)? {
            device.release_buffer(data.geometry.index_buffer)?;
            device.release_buffer(data.geometry.vertex_buffer)?;
        }
        Ok(())
    }

    /// The overlay draws in display coordinates; the camera does not
    /// apply. The handle is still checked.
    fn transform_viewport(
        &mut self,
        viewport: Handle<Viewport>,
        _camera: &Camera,
    ) -> RenderResult<()> {
        self.viewports.try_get(viewport)?;
        Ok(())
    }

    fn register_scene(
        &mut self,
        _device: &mut D,
        config: SceneConfig,
    ) -> RenderResult<Handle<Scene>> {
        Ok(self.scenes.insert(SceneData {
            label: config.label,
            draw_data: None,
        }))
    }

    fn remove_scene(&mut self, _device: &mut D, scene: Handle<Scene>) -> RenderResult<()> {
        self.scenes.remove(scene)?;
        Ok(())
    }

    fn update_model(&mut self, _scene: Handle<Scene>, _model: &Model) -> RenderResult<()> {
        Err(RenderError::IllegalState(
            "overlay scenes take UI draw data, not models",
        ))
    }

    fn add_model(&mut self, _scene: Handle<Scene>, _model: Handle<Model>) -> RenderResult<()> {
        Err(RenderError::IllegalState(
            "overlay scenes take UI draw data, not models",
        ))
    }

    fn render(
        &mut self,
        device: &mut D,
        viewport: Handle<Viewport>,
        scene: Handle<Scene>,
    ) -> RenderResult<()> {
        self.scenes.try_get(scene)?;
        let vp = self.viewports.try_get_mut(viewport)?;
        let mut stats = FrameStats::default();

        if let Some(data) = self.scenes.try_get(scene)?.draw_data.as_ref() {
            Self::upload_frame(device, vp, data)?;
            let d = data.display_rect;
            let proj = ortho_for_rect(d.x, d.y, d.width, d.height);
            device.update_const_buffer(
                self.projection,
                0,
                0,
                bytemuck::bytes_of(&proj.to_cols_array()),
            )?;
        }

        let target = vp.target;
        let bounds = Rect::full(vp.width as f32, vp.height as f32);
        let geometry = vp.geometry;

        let mut list = device.prepare();
        list.transition(target, ResourceState::RenderTarget)?;
        // Load pass: the overlay composes over the target's existing
        // contents.
        list.begin_render_pass(RenderPassDesc {
            render_targets: vec![target],
            depth_stencil: Handle::EMPTY,
            clear: ClearFlags::empty(),
            clear_color: [0.0; 4],
            viewport: bounds,
            area: None,
        })?;

        if let Some(data) = self.scenes.try_get(scene)?.draw_data.as_ref() {
            for batch in &data.batches {
                match &batch.kind {
                    UiBatchKind::Draw { clip, texture } => {
                        let argument = match texture {
                            None => self.font_argument,
                            Some(id) => match self.arguments.get(id) {
                                Some(argument) => *argument,
                                None => {
                                    let err = RenderError::UnrecognizedInput {
                                        what: format!("ui texture id {}", id.0),
                                    };
                                    warn!("{}, skipping draw", err);
                                    stats.unknown_textures += 1;
                                    stats.draws_skipped += 1;
                                    continue;
                                }
                            },
                        };
                        let Some(area) = Self::scissor_for_clip(*clip, data.display_rect) else {
                            stats.draws_skipped += 1;
                            continue;
                        };
                        list.draw(DrawCommand {
                            index_buffer: geometry.index_buffer,
                            vertex_buffer: geometry.vertex_buffer,
                            index_count: batch.index_count,
                            index_offset: batch.index_offset,
                            vertex_offset: batch.vertex_offset,
                            shader: self.shader,
                            arguments: vec![argument],
                            override_area: Some(area),
                        })?;
                        stats.draws_emitted += 1;
                    }
                    UiBatchKind::ResetRenderState => {
                        warn!("ui requested a render-state reset; this adapter keeps no state, skipping");
                        stats.reset_requests += 1;
                    }
                    UiBatchKind::Callback(callback) => callback(&mut list)?,
                }
            }
        }

        list.end_render_pass()?;
        list.transition(target, ResourceState::Common)?;
        list.finish()?;
        device.submit(list)?;
        self.stats = stats;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;

    fn ui_shader() -> ShaderSource<'static> {
        ShaderSource {
            vertex: "ui_vs",
            pixel: "ui_ps",
        }
    }

    fn atlas_pixels() -> Vec<u8> {
        vec![255u8; 4 * 4 * 4]
    }

    fn setup() -> (
        HeadlessDevice,
        OverlayPipeline<HeadlessDevice>,
        Handle<Viewport>,
        Handle<Scene>,
    ) {
        let mut device = HeadlessDevice::new();
        let pixels = atlas_pixels();
        let mut pipeline = OverlayPipeline::new(
            &mut device,
            ui_shader(),
            UiFontAtlas {
                width: 4,
                height: 4,
                rgba: &pixels,
            },
            &PipelineSettings::default(),
        )
        .unwrap();
        let target = device
            .create_texture(
                TextureDesc::render_target(320, 240, ResourceFormat::R8G8B8A8Unorm),
                ResourceState::Common,
                "target",
            )
            .unwrap();
        let viewport = pipeline
            .register_viewport(
                &mut device,
                ViewportConfig {
                    render_target: target,
                    width: 320,
                    height: 240,
                    camera: Camera::default(),
                },
            )
            .unwrap();
        let scene = pipeline
            .register_scene(&mut device, SceneConfig::default())
            .unwrap();
        (device, pipeline, viewport, scene)
    }

    fn quad_vertices() -> Vec<UiVertex> {
        (0..4)
            .map(|i| UiVertex {
                pos: [i as f32, i as f32],
                uv: [0.0, 0.0],
                color: [255, 255, 255, 255],
            })
            .collect()
    }

    fn draw_batch(
        index_offset: u32,
        clip: UiRect,
        texture: Option<UiTextureId>,
    ) -> UiBatch {
        UiBatch {
            index_offset,
            index_count: 6,
            vertex_offset: 0,
            kind: UiBatchKind::Draw { clip, texture },
        }
    }

    #[test]
    fn scene_without_data_still_completes_a_pass() {
        let (mut device, mut pipeline, viewport, scene) = setup();
        pipeline.render(&mut device, viewport, scene).unwrap();
        let list = device.submitted().last().unwrap();
        assert_eq!(list.draw_count(), 0);
        assert!(list
            .commands()
            .iter()
            .any(|c| matches!(c, crate::command::Command::BeginRenderPass(_))));
    }

    #[test]
    fn unknown_texture_skips_the_draw_and_reports() {
        let (mut device, mut pipeline, viewport, scene) = setup();
        pipeline
            .set_draw_data(
                scene,
                UiDrawData {
                    indices: vec![0, 1, 2, 0, 2, 3, 0, 1, 2, 0, 2, 3],
                    vertices: quad_vertices(),
                    display_rect: Rect::full(320.0, 240.0),
                    batches: vec![
                        draw_batch(
                            0,
                            UiRect {
                                min: [0.0, 0.0],
                                max: [100.0, 100.0],
                            },
                            None,
                        ),
                        draw_batch(
                            6,
                            UiRect {
                                min: [50.0, 50.0],
                                max: [150.0, 150.0],
                            },
                            Some(UiTextureId(77)),
                        ),
                    ],
                },
            )
            .unwrap();
        pipeline.render(&mut device, viewport, scene).unwrap();

        let stats = pipeline.last_frame_stats();
        assert_eq!(stats.draws_emitted, 1);
        assert_eq!(stats.draws_skipped, 1);
        assert_eq!(stats.unknown_textures, 1);
        assert_eq!(device.submitted().last().unwrap().draw_count(), 1);
    }

    #[test]
    fn clip_rects_translate_to_target_local_scissors() {
        let (mut device, mut pipeline, viewport, scene) = setup();
        pipeline
            .set_draw_data(
                scene,
                UiDrawData {
                    indices: vec![0, 1, 2, 0, 2, 3],
                    vertices: quad_vertices(),
                    display_rect: Rect {
                        x: 100.0,
                        y: 100.0,
                        width: 320.0,
                        height: 240.0,
                    },
                    batches: vec![draw_batch(
                        0,
                        UiRect {
                            min: [150.0, 150.0],
                            max: [250.0, 250.0],
                        },
                        None,
                    )],
                },
            )
            .unwrap();
        pipeline.render(&mut device, viewport, scene).unwrap();

        let list = device.submitted().last().unwrap();
        let draw = list.draws().next().unwrap();
        assert_eq!(
            draw.override_area,
            Some(ScissorRect {
                x: 50,
                y: 50,
                width: 100,
                height: 100,
            })
        );
    }

    #[test]
    fn geometry_grows_for_large_frames() {
        let (mut device, mut pipeline, viewport, scene) = setup();
        let count = PipelineSettings::default().ui_index_capacity + 1;
        pipeline
            .set_draw_data(
                scene,
                UiDrawData {
                    indices: vec![0; count as usize],
                    vertices: quad_vertices(),
                    display_rect: Rect::full(320.0, 240.0),
                    batches: Vec::new(),
                },
            )
            .unwrap();
        pipeline.render(&mut device, viewport, scene).unwrap();

        // Capacity doubles rather than growing to the exact need.
        let vp = pipeline.viewports.get(viewport).unwrap();
        assert_eq!(
            vp.index_capacity,
            PipelineSettings::default().ui_index_capacity * 2
        );
        let bytes = device.geometry_bytes(vp.geometry.index_buffer).unwrap();
        assert_eq!(bytes.len(), vp.index_capacity as usize * 4);
    }

    #[test]
    fn reset_render_state_is_skipped_without_failing() {
        let (mut device, mut pipeline, viewport, scene) = setup();
        pipeline
            .set_draw_data(
                scene,
                UiDrawData {
                    indices: Vec::new(),
                    vertices: Vec::new(),
                    display_rect: Rect::full(320.0, 240.0),
                    batches: vec![UiBatch {
                        index_offset: 0,
                        index_count: 0,
                        vertex_offset: 0,
                        kind: UiBatchKind::ResetRenderState,
                    }],
                },
            )
            .unwrap();
        pipeline.render(&mut device, viewport, scene).unwrap();
        let stats = pipeline.last_frame_stats();
        assert_eq!(stats.draws_emitted, 0);
        assert_eq!(stats.draws_skipped, 0);
        assert_eq!(stats.reset_requests, 1);
    }

    #[test]
    fn rebinding_a_texture_id_releases_the_old_binding() {
        let (mut device, mut pipeline, _viewport, _scene) = setup();
        let id = UiTextureId(5);
        let first = device
            .create_texture(
                TextureDesc::simple_2d(2, 2, ResourceFormat::R8G8B8A8Unorm),
                ResourceState::PixelShaderResource,
                "icon v1",
            )
            .unwrap();
        let second = device
            .create_texture(
                TextureDesc::simple_2d(2, 2, ResourceFormat::R8G8B8A8Unorm),
                ResourceState::PixelShaderResource,
                "icon v2",
            )
            .unwrap();

        pipeline.register_texture(&mut device, id, first).unwrap();
        let old_argument = pipeline.arguments[&id];
        pipeline.register_texture(&mut device, id, second).unwrap();

        assert!(!device.is_shader_argument_live(old_argument));
        assert!(device.is_shader_argument_live(pipeline.arguments[&id]));
    }

    #[test]
    fn callbacks_record_into_the_open_pass() {
        use std::cell::Cell;
        use std::rc::Rc;

        let (mut device, mut pipeline, viewport, scene) = setup();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        pipeline
            .set_draw_data(
                scene,
                UiDrawData {
                    indices: Vec::new(),
                    vertices: Vec::new(),
                    display_rect: Rect::full(320.0, 240.0),
                    batches: vec![UiBatch {
                        index_offset: 0,
                        index_count: 0,
                        vertex_offset: 0,
                        kind: UiBatchKind::Callback(Box::new(move |_list| {
                            flag.set(true);
                            Ok(())
                        })),
                    }],
                },
            )
            .unwrap();
        pipeline.render(&mut device, viewport, scene).unwrap();
        assert!(ran.get());
    }

    #[test]
    fn models_are_rejected() {
        let (_device, mut pipeline, _viewport, scene) = setup();
        let model = Model::default();
        assert!(matches!(
            pipeline.update_model(scene, &model),
            Err(RenderError::IllegalState(_))
        ));
    }
}
