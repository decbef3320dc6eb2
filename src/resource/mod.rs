pub mod handle;
pub mod registry;

pub use handle::Handle;
pub use registry::{HandleAllocator, Registry};

// Resource categories. Each kind gets its own registry; handles of
// different kinds never compare or mix.

/// Compiled shader program owned by the backend.
#[derive(Debug, Default)]
pub struct Shader;

/// Generic GPU buffer (constant, index or vertex storage).
#[derive(Debug, Default)]
pub struct Buffer;

/// GPU texture or render-target surface.
#[derive(Debug, Default)]
pub struct Texture;

/// Paired index+vertex buffers created together.
#[derive(Debug, Default)]
pub struct Geometry;

/// Immutable bundle of resource bindings attached at draw time.
#[derive(Debug, Default)]
pub struct ShaderArgument;

/// Pipeline-side render target + camera + bounds.
#[derive(Debug, Default)]
pub struct Viewport;

/// Pipeline-side collection of model instances.
#[derive(Debug, Default)]
pub struct Scene;
