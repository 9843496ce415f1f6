use std::cell::RefCell;
use std::rc::Rc;

use crate::base::{Color, Image, Rect};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RenderTargetId(pub u32);

/// A texture handle together with its pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureData {
    pub handle: TextureId,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    SpriteBatch,
    Points,
    WaterEffect,
    NonTexturedRender,
}

impl RenderMode {
    /// Floats per vertex in batches of this mode.
    pub const fn vertex_stride(self) -> usize {
        match self {
            RenderMode::SpriteBatch => 4,
            RenderMode::WaterEffect | RenderMode::Points | RenderMode::NonTexturedRender => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    Points,
    LineStrip,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    /// Column-major 4x4 matrix from logical pixels to normalized device space.
    pub transform: [f32; 16],
    pub overlay_color: Color,
    pub color_modulation: Color,
}

/// One draw call worth of data.
///
/// Vertex layout depends on `mode`: sprite batches carry `x, y, u, v`,
/// water batches `x, y, u, v, mask_u, mask_v`, points and lines
/// `x, y, r, g, b, a` with unit-range colors.
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    pub mode: RenderMode,
    pub primitive: Primitive,
    pub texture: Option<TextureId>,
    pub mask_texture: Option<TextureId>,
    pub vertices: &'a [f32],
    pub indices: &'a [u16],
    pub uniforms: Uniforms,
}

/// Device side of the renderer. The [`super::Renderer`] owns all batching
/// and state tracking; a backend executes what it is handed.
pub trait RenderBackend {
    fn create_texture(&mut self, image: &Image) -> TextureId;

    /// Creates an empty texture plus a target that draws into it.
    fn create_render_target(&mut self, width: i32, height: i32) -> (TextureId, RenderTargetId);

    /// `None` selects the window framebuffer. `viewport` is in the bound
    /// surface's pixels.
    fn bind_render_target(&mut self, target: Option<RenderTargetId>, viewport: Rect);

    fn resize_default_framebuffer(&mut self, width: u32, height: u32);

    fn set_scissor(&mut self, clip: Option<Rect>);

    fn set_water_palette(&mut self, palette: &[Color; 16]);

    fn clear(&mut self, color: Color);

    fn submit(&mut self, submission: &Submission<'_>);

    fn present(&mut self);

    /// CPU copy of the window framebuffer, if the backend keeps one.
    fn default_framebuffer(&self) -> Option<&Image>;

    /// CPU copy of a texture, if the backend keeps one.
    fn texture_image(&self, _texture: TextureId) -> Option<&Image> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSubmission {
    pub mode: RenderMode,
    pub primitive: Primitive,
    pub texture: Option<TextureId>,
    pub mask_texture: Option<TextureId>,
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
    pub uniforms: Uniforms,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateTexture { id: TextureId, width: u32, height: u32 },
    CreateRenderTarget { texture: TextureId, target: RenderTargetId },
    BindRenderTarget { target: Option<RenderTargetId>, viewport: Rect },
    ResizeDefaultFramebuffer { width: u32, height: u32 },
    SetScissor(Option<Rect>),
    SetWaterPalette,
    Clear(Color),
    Submit(RecordedSubmission),
    Present,
}

/// Shared view of the calls a [`RecordingBackend`] received.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<BackendCall>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<BackendCall> {
        self.0.borrow().clone()
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.0
            .borrow()
            .iter()
            .filter_map(|call| match call {
                BackendCall::Submit(submission) => Some(submission.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn submission_count(&self) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|call| matches!(call, BackendCall::Submit(_)))
            .count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, call: BackendCall) {
        self.0.borrow_mut().push(call);
    }
}

/// Backend that only records calls. Used for headless runs and tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    log: CallLog,
    next_id: u32,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl RenderBackend for RecordingBackend {
    fn create_texture(&mut self, image: &Image) -> TextureId {
        let id = TextureId(self.allocate_id());
        self.log.push(BackendCall::CreateTexture {
            id,
            width: image.width(),
            height: image.height(),
        });
        id
    }

    fn create_render_target(&mut self, _width: i32, _height: i32) -> (TextureId, RenderTargetId) {
        let texture = TextureId(self.allocate_id());
        let target = RenderTargetId(self.allocate_id());
        self.log
            .push(BackendCall::CreateRenderTarget { texture, target });
        (texture, target)
    }

    fn bind_render_target(&mut self, target: Option<RenderTargetId>, viewport: Rect) {
        self.log
            .push(BackendCall::BindRenderTarget { target, viewport });
    }

    fn resize_default_framebuffer(&mut self, width: u32, height: u32) {
        self.log
            .push(BackendCall::ResizeDefaultFramebuffer { width, height });
    }

    fn set_scissor(&mut self, clip: Option<Rect>) {
        self.log.push(BackendCall::SetScissor(clip));
    }

    fn set_water_palette(&mut self, _palette: &[Color; 16]) {
        self.log.push(BackendCall::SetWaterPalette);
    }

    fn clear(&mut self, color: Color) {
        self.log.push(BackendCall::Clear(color));
    }

    fn submit(&mut self, submission: &Submission<'_>) {
        self.log.push(BackendCall::Submit(RecordedSubmission {
            mode: submission.mode,
            primitive: submission.primitive,
            texture: submission.texture,
            mask_texture: submission.mask_texture,
            vertices: submission.vertices.to_vec(),
            indices: submission.indices.to_vec(),
            uniforms: submission.uniforms,
        }));
    }

    fn present(&mut self) {
        self.log.push(BackendCall::Present);
    }

    fn default_framebuffer(&self) -> Option<&Image> {
        None
    }
}
