//! Render pipelines: the policy layer that turns viewports, scenes and
//! models into recorded command lists on a [`RenderDevice`].
//!
//! A pipeline owns everything it creates on the device (attachments,
//! buffers, shader arguments) and is driven from a single control thread;
//! the `&mut` receivers and the `&mut D` device parameter make interleaved
//! mutation unrepresentable rather than merely forbidden in prose. Render
//! calls against the same viewport and scene complete in call order.

pub mod deferred;
pub mod overlay;

pub use deferred::{DeferredPipeline, DeferredShaders};
pub use overlay::{
    FrameStats, OverlayPipeline, UiBatch, UiBatchKind, UiDrawData, UiFontAtlas, UiRect,
    UiTextureId, UiVertex, FONT_TEXTURE_ID,
};

use crate::camera::Camera;
use crate::device::RenderDevice;
use crate::error::RenderResult;
use crate::model::Model;
use crate::resource::{Handle, Scene, Texture, Viewport};

/// Where a viewport draws and how it is sized. The render target is
/// caller-owned; the pipeline allocates its own intermediate attachments
/// at these bounds.
#[derive(Debug, Clone)]
pub struct ViewportConfig {
    pub render_target: Handle<Texture>,
    pub width: u32,
    pub height: u32,
    pub camera: Camera,
}

/// Per-scene construction parameters. Currently only a debug label;
/// content arrives afterwards through `update_model` and friends.
#[derive(Debug, Clone, Default)]
pub struct SceneConfig {
    pub label: String,
}

/// The fixed dispatch surface every pipeline implements.
///
/// Handles returned here are scoped to the pipeline that issued them.
/// Removal invalidates a handle forever; later use fails with
/// [`crate::error::RenderError::InvalidHandle`] instead of touching a
/// reused slot.
pub trait RenderPipeline<D: RenderDevice> {
    fn register_viewport(
        &mut self,
        device: &mut D,
        config: ViewportConfig,
    ) -> RenderResult<Handle<Viewport>>;

    /// Release the viewport and every device resource it owns, eagerly.
    fn remove_viewport(&mut self, device: &mut D, viewport: Handle<Viewport>) -> RenderResult<()>;

    /// Swap the viewport's camera. Constant time, no device work; takes
    /// effect on the next `render`.
    fn transform_viewport(&mut self, viewport: Handle<Viewport>, camera: &Camera)
        -> RenderResult<()>;

    fn register_scene(&mut self, device: &mut D, config: SceneConfig)
        -> RenderResult<Handle<Scene>>;

    fn remove_scene(&mut self, device: &mut D, scene: Handle<Scene>) -> RenderResult<()>;

    /// Upsert a model into the scene, keyed by `model.id`. The data is
    /// copied now; device uploads are deferred to the next `render` of the
    /// scene.
    fn update_model(&mut self, scene: Handle<Scene>, model: &Model) -> RenderResult<()>;

    /// Attach a model whose data this pipeline already holds from an
    /// earlier `update_model`, without re-supplying it. An id the pipeline
    /// has never seen is `InvalidHandle`.
    fn add_model(&mut self, scene: Handle<Scene>, model: Handle<Model>) -> RenderResult<()>;

    /// Flush pending state for the scene, record the pipeline's passes for
    /// this viewport and submit them. Completes with degraded content on
    /// recoverable per-model problems; fails only on invalid handles or
    /// device errors.
    fn render(
        &mut self,
        device: &mut D,
        viewport: Handle<Viewport>,
        scene: Handle<Scene>,
    ) -> RenderResult<()>;
}

/// Vertex and pixel source for one shader, opaque to this crate.
/// Compilation and the source language are the backend's business.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource<'a> {
    pub vertex: &'a str,
    pub pixel: &'a str,
}
