//! Backend-agnostic real-time rendering core.
//!
//! Resources are opaque generation-stamped handles, GPU work is recorded
//! into write-once command lists, and concrete backends hide behind the
//! [`device::RenderDevice`] trait. The shipped pipelines are classic
//! deferred shading ([`pipeline::DeferredPipeline`]) and a UI overlay
//! adapter ([`pipeline::OverlayPipeline`]); both run unchanged against the
//! in-memory [`device::HeadlessDevice`].

pub mod camera;
pub mod command;
pub mod device;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod resource;
pub mod settings;

pub use camera::Camera;
pub use command::{ClearFlags, Command, CommandList, DrawCommand, Rect, RenderPassDesc,
    ResourceState, ScissorRect};
pub use device::{HeadlessDevice, RenderDevice};
pub use error::{RenderError, RenderResult};
pub use model::{MeshData, Model, ModelVertex};
pub use pipeline::{
    DeferredPipeline, OverlayPipeline, RenderPipeline, SceneConfig, ShaderSource, ViewportConfig,
};
pub use resource::{Handle, HandleAllocator, Registry};
pub use settings::PipelineSettings;

/// Route `log` output to stderr, honoring `RUST_LOG`. Safe to call more
/// than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
