use bitflags::bitflags;

use crate::error::{RenderError, RenderResult};
use crate::resource::{Buffer, Handle, Shader, ShaderArgument, Texture};

bitflags! {
    /// Which attachments a render pass clears on begin.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Viewport rectangle in render-target pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Full-target viewport anchored at the origin.
    pub fn full(width: f32, height: f32) -> Self {
        Rect {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }
}

/// Scissor rectangle in render-target-local integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Resource states a texture can be transitioned through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Common,
    CopyDestination,
    RenderTarget,
    DepthWrite,
    PixelShaderResource,
    Present,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassDesc {
    pub render_targets: Vec<Handle<Texture>>,
    /// [`Handle::EMPTY`] when the pass has no depth-stencil attachment.
    pub depth_stencil: Handle<Texture>,
    pub clear: ClearFlags,
    /// Color the targets are cleared to when [`ClearFlags::COLOR`] is set.
    pub clear_color: [f32; 4],
    pub viewport: Rect,
    pub area: Option<ScissorRect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub index_buffer: Handle<Buffer>,
    pub vertex_buffer: Handle<Buffer>,
    pub index_count: u32,
    pub index_offset: u32,
    pub vertex_offset: u32,
    pub shader: Handle<Shader>,
    pub arguments: Vec<Handle<ShaderArgument>>,
    pub override_area: Option<ScissorRect>,
}

/// One recorded GPU operation. Closed set; pipelines never inspect a
/// backend type to find out what a command is.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Transition {
        texture: Handle<Texture>,
        state: ResourceState,
    },
    BeginRenderPass(RenderPassDesc),
    Draw(DrawCommand),
    EndRenderPass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListState {
    Recording,
    InPass,
    Ended,
    Submitted,
}

/// Ordered, write-once sequence of GPU operations for one frame.
///
/// Recorded, then finished, then submitted exactly once. Out-of-order use
/// (draw outside a pass, nested passes, mutation after `finish`) is a
/// pipeline bug and comes back as [`RenderError::IllegalState`] instead of
/// silently corrupting the stream.
#[derive(Debug)]
pub struct CommandList {
    commands: Vec<Command>,
    state: ListState,
}

impl Default for CommandList {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandList {
    pub fn new() -> Self {
        CommandList {
            commands: Vec::new(),
            state: ListState::Recording,
        }
    }

    pub fn transition(
        &mut self,
        texture: Handle<Texture>,
        state: ResourceState,
    ) -> RenderResult<()> {
        if self.state != ListState::Recording {
            return Err(RenderError::IllegalState(
                "transition is only valid while recording, outside a render pass",
            ));
        }
        self.commands.push(Command::Transition { texture, state });
        Ok(())
    }

    pub fn begin_render_pass(&mut self, desc: RenderPassDesc) -> RenderResult<()> {
        match self.state {
            ListState::Recording => {
                self.commands.push(Command::BeginRenderPass(desc));
                self.state = ListState::InPass;
                Ok(())
            }
            ListState::InPass => Err(RenderError::IllegalState("render passes cannot nest")),
            _ => Err(RenderError::IllegalState(
                "begin_render_pass after the list was finished",
            )),
        }
    }

    pub fn draw(&mut self, draw: DrawCommand) -> RenderResult<()> {
        if self.state != ListState::InPass {
            return Err(RenderError::IllegalState(
                "draw requires an open render pass",
            ));
        }
        self.commands.push(Command::Draw(draw));
        Ok(())
    }

    pub fn end_render_pass(&mut self) -> RenderResult<()> {
        if self.state != ListState::InPass {
            return Err(RenderError::IllegalState(
                "end_render_pass without an open render pass",
            ));
        }
        self.commands.push(Command::EndRenderPass);
        self.state = ListState::Recording;
        Ok(())
    }

    /// Seal the list. No further mutation; the list is ready for submit.
    pub fn finish(&mut self) -> RenderResult<()> {
        match self.state {
            ListState::Recording => {
                self.state = ListState::Ended;
                Ok(())
            }
            ListState::InPass => Err(RenderError::IllegalState(
                "finish with an open render pass",
            )),
            _ => Err(RenderError::IllegalState("finish on a finished list")),
        }
    }

    /// Backend-side acceptance of a finished list. Consumption order is
    /// enforced here so a list can never run twice.
    pub(crate) fn mark_submitted(&mut self) -> RenderResult<()> {
        if self.state != ListState::Ended {
            return Err(RenderError::IllegalState(
                "submit requires a finished, unsubmitted list",
            ));
        }
        self.state = ListState::Submitted;
        Ok(())
    }

    pub fn is_submitted(&self) -> bool {
        self.state == ListState::Submitted
    }

    /// The recorded stream, in order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Draw(_)))
            .count()
    }

    /// The draw commands only, in recorded order.
    pub fn draws(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter_map(|c| match c {
            Command::Draw(draw) => Some(draw),
            _ => None,
        })
    }
}
