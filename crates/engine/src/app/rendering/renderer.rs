use std::ops::{Deref, DerefMut};

use crate::base::{Color, Extents, Image, PointF, Rect, Vector};

use super::backend::{
    Primitive, RenderBackend, RenderMode, RenderTargetId, Submission, TextureData, Uniforms,
};
use super::transform::{
    determine_default_viewport, projection_matrix, LOGICAL_DISPLAY_HEIGHT, LOGICAL_DISPLAY_WIDTH,
};
use super::water::{
    create_water_surface_anim_image, DEFAULT_INGAME_PALETTE, WATER_ANIM_STEPS,
    WATER_MASK_HEIGHT, WATER_MASK_INDEX_FILLED,
};

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 1];

/// Quads per batch before a forced submit. Keeps every index inside `u16`.
pub const MAX_BATCH_QUADS: usize = 4096;

const SPRITE_VERTEX_FLOATS: usize = 4 * 4;
const WATER_VERTEX_FLOATS: usize = 4 * 6;

/// A bindable drawing surface. `target == None` is the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub size: Extents,
    pub target: Option<RenderTargetId>,
}

impl RenderTarget {
    pub fn default_target() -> Self {
        Self {
            size: Extents::new(LOGICAL_DISPLAY_WIDTH, LOGICAL_DISPLAY_HEIGHT),
            target: None,
        }
    }

    pub fn is_default(&self) -> bool {
        self.target.is_none()
    }
}

/// Texture that can be drawn into and then drawn like any other texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetTexture {
    texture: TextureData,
    target: RenderTargetId,
}

impl RenderTargetTexture {
    pub fn data(&self) -> TextureData {
        self.texture
    }

    pub fn target(&self) -> RenderTarget {
        RenderTarget {
            size: Extents::new(self.texture.width, self.texture.height),
            target: Some(self.target),
        }
    }

    /// Draws the whole texture with its top-left corner at `(x, y)`.
    pub fn render(&self, renderer: &mut Renderer, x: i32, y: i32) {
        let size = Rect::new(0, 0, self.texture.width, self.texture.height);
        renderer.draw_texture(&self.texture, size, size.translated(Vector::new(x, y)));
    }
}

/// Snapshot of the renderer's global drawing state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub target: RenderTarget,
    pub global_translation: Vector,
    pub global_scale: PointF,
    pub clip_rect: Option<Rect>,
    pub overlay_color: Color,
    pub color_modulation: Color,
}

/// Batching 2D renderer.
///
/// Consecutive draws that share the render mode and texture are collected
/// into one submission. Every state change that affects how pending
/// geometry would be drawn submits the batch first.
pub struct Renderer {
    backend: Box<dyn RenderBackend>,
    render_mode: RenderMode,
    last_used_texture: Option<TextureData>,
    batch_vertices: Vec<f32>,
    batch_indices: Vec<u16>,
    overlay_color: Color,
    color_modulation: Color,
    global_translation: Vector,
    global_scale: PointF,
    clip_rect: Option<Rect>,
    current_target: RenderTarget,
    window_size: Extents,
    default_viewport: Rect,
    projection: [f32; 16],
    water_surface_anim_texture: TextureData,
    submitted_batches: u64,
}

impl Renderer {
    pub fn new(mut backend: Box<dyn RenderBackend>, window_size: Extents) -> Self {
        backend.set_water_palette(&DEFAULT_INGAME_PALETTE);
        let mask_image = create_water_surface_anim_image();
        let mask_handle = backend.create_texture(&mask_image);

        let mut renderer = Self {
            backend,
            render_mode: RenderMode::SpriteBatch,
            last_used_texture: None,
            batch_vertices: Vec::new(),
            batch_indices: Vec::new(),
            overlay_color: Color::TRANSPARENT,
            color_modulation: Color::WHITE,
            global_translation: Vector::default(),
            global_scale: PointF::new(1.0, 1.0),
            clip_rect: None,
            current_target: RenderTarget::default_target(),
            window_size,
            default_viewport: determine_default_viewport(window_size),
            projection: [0.0; 16],
            water_surface_anim_texture: TextureData {
                handle: mask_handle,
                width: mask_image.width() as i32,
                height: mask_image.height() as i32,
            },
            submitted_batches: 0,
        };
        renderer.on_render_target_changed();
        renderer
    }

    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    pub fn window_size(&self) -> Extents {
        self.window_size
    }

    pub fn default_viewport(&self) -> Rect {
        self.default_viewport
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    /// Number of submissions handed to the backend so far.
    pub fn submitted_batches(&self) -> u64 {
        self.submitted_batches
    }

    pub fn create_texture(&mut self, image: &Image) -> TextureData {
        TextureData {
            handle: self.backend.create_texture(image),
            width: image.width() as i32,
            height: image.height() as i32,
        }
    }

    pub fn create_render_target_texture(&mut self, width: i32, height: i32) -> RenderTargetTexture {
        let (handle, target) = self.backend.create_render_target(width, height);
        RenderTargetTexture {
            texture: TextureData {
                handle,
                width,
                height,
            },
            target,
        }
    }

    /// Rectangle covering the whole bound target, in its own pixels.
    pub fn full_screen_rect(&self) -> Rect {
        Rect::new(
            0,
            0,
            self.current_target.size.width,
            self.current_target.size.height,
        )
    }

    fn is_visible(&self, rect: &Rect) -> bool {
        rect.intersects(&self.full_screen_rect())
    }

    pub fn set_overlay_color(&mut self, color: Color) {
        if color != self.overlay_color {
            self.submit_batch();
            self.set_render_mode_if_changed(RenderMode::SpriteBatch);
            self.overlay_color = color;
        }
    }

    pub fn overlay_color(&self) -> Color {
        self.overlay_color
    }

    pub fn set_color_modulation(&mut self, color: Color) {
        if color != self.color_modulation {
            self.submit_batch();
            self.set_render_mode_if_changed(RenderMode::SpriteBatch);
            self.color_modulation = color;
        }
    }

    pub fn color_modulation(&self) -> Color {
        self.color_modulation
    }

    pub fn set_global_translation(&mut self, translation: Vector) {
        if translation != self.global_translation {
            self.submit_batch();
            self.global_translation = translation;
            self.update_projection_matrix();
        }
    }

    pub fn global_translation(&self) -> Vector {
        self.global_translation
    }

    pub fn set_global_scale(&mut self, scale: PointF) {
        if scale != self.global_scale {
            self.submit_batch();
            self.global_scale = scale;
            self.update_projection_matrix();
        }
    }

    pub fn global_scale(&self) -> PointF {
        self.global_scale
    }

    /// Restricts drawing to `clip` (target pixels). Pending geometry is
    /// submitted under the previous clip first.
    pub fn set_clip_rect(&mut self, clip: Option<Rect>) {
        if clip == self.clip_rect {
            return;
        }
        self.submit_batch();
        self.clip_rect = clip;
        self.apply_scissor();
    }

    pub fn clip_rect(&self) -> Option<Rect> {
        self.clip_rect
    }

    pub fn current_render_target(&self) -> RenderTarget {
        self.current_target
    }

    pub fn set_render_target(&mut self, target: RenderTarget) {
        if target.target == self.current_target.target {
            return;
        }
        self.submit_batch();
        self.current_target = if target.is_default() {
            RenderTarget::default_target()
        } else {
            target
        };
        self.on_render_target_changed();
    }

    pub fn save_state(&self) -> RenderState {
        RenderState {
            target: self.current_target,
            global_translation: self.global_translation,
            global_scale: self.global_scale,
            clip_rect: self.clip_rect,
            overlay_color: self.overlay_color,
            color_modulation: self.color_modulation,
        }
    }

    pub fn restore_state(&mut self, state: RenderState) {
        self.set_render_target(state.target);
        self.set_global_translation(state.global_translation);
        self.set_global_scale(state.global_scale);
        self.set_clip_rect(state.clip_rect);
        self.set_overlay_color(state.overlay_color);
        self.set_color_modulation(state.color_modulation);
    }

    pub fn draw_texture(&mut self, texture: &TextureData, source: Rect, destination: Rect) {
        if !self.is_visible(&destination) {
            return;
        }

        self.set_render_mode_if_changed(RenderMode::SpriteBatch);
        self.bind_texture_if_changed(texture);

        let mut vertices = [0.0; SPRITE_VERTEX_FLOATS];
        fill_vertex_positions(&destination, &mut vertices, 0, 4);
        fill_tex_coords(&source, texture, &mut vertices, 2, 4);
        self.batch_quad_vertices(&vertices, 4);
    }

    /// Palette-shifts the pixels of `target_texture` under `area`.
    ///
    /// With a surface animation step, the top mask-height band uses that
    /// step's wave mask and the rest of the area the filled mask.
    pub fn draw_water_effect(
        &mut self,
        area: Rect,
        target_texture: TextureData,
        surface_animation_step: Option<i32>,
    ) {
        assert!(
            surface_animation_step.map_or(true, |step| (0..WATER_ANIM_STEPS).contains(&step)),
            "water surface animation step out of range"
        );

        if !self.is_visible(&area) {
            return;
        }

        self.set_render_mode_if_changed(RenderMode::WaterEffect);
        self.bind_texture_if_changed(&target_texture);

        match surface_animation_step {
            Some(step) => {
                let surface = Rect::new(area.left(), area.top(), area.size.width, WATER_MASK_HEIGHT);
                self.batch_water_quad(surface, area.size.width, &target_texture, step);

                let remaining = Rect::new(
                    area.left(),
                    area.top() + WATER_MASK_HEIGHT,
                    area.size.width,
                    area.size.height - WATER_MASK_HEIGHT,
                );
                self.batch_water_quad(
                    remaining,
                    area.size.width,
                    &target_texture,
                    WATER_MASK_INDEX_FILLED,
                );
            }
            None => {
                self.batch_water_quad(area, area.size.width, &target_texture, WATER_MASK_INDEX_FILLED)
            }
        }
    }

    fn batch_water_quad(
        &mut self,
        destination: Rect,
        area_width: i32,
        target_texture: &TextureData,
        mask_index: i32,
    ) {
        let mask_source = Rect::new(0, mask_index * WATER_MASK_HEIGHT, area_width, WATER_MASK_HEIGHT);
        let mask_texture = self.water_surface_anim_texture;

        let mut vertices = [0.0; WATER_VERTEX_FLOATS];
        fill_vertex_positions(&destination, &mut vertices, 0, 6);
        fill_tex_coords(&destination, target_texture, &mut vertices, 2, 6);
        fill_tex_coords(&mask_source, &mask_texture, &mut vertices, 4, 6);
        self.batch_quad_vertices(&vertices, 6);
    }

    /// Unbatched outline, for debug drawing.
    pub fn draw_rectangle(&mut self, rect: Rect, color: Color) {
        if !self.is_visible(&rect) {
            return;
        }
        self.set_render_mode_if_changed(RenderMode::NonTexturedRender);

        let left = rect.left() as f32;
        let right = rect.right() as f32;
        let top = rect.top() as f32;
        let bottom = rect.bottom() as f32;
        let corners = [
            (left, top),
            (left, bottom),
            (right, bottom),
            (right, top),
            (left, top),
        ];
        let vertices = colored_vertices(&corners, color);
        self.submit_unbatched(Primitive::LineStrip, &vertices);
    }

    /// Unbatched line, for debug drawing.
    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        self.set_render_mode_if_changed(RenderMode::NonTexturedRender);
        let vertices = colored_vertices(&[(x1 as f32, y1 as f32), (x2 as f32, y2 as f32)], color);
        self.submit_unbatched(Primitive::LineStrip, &vertices);
    }

    pub fn draw_point(&mut self, position: Vector, color: Color) {
        if !self.full_screen_rect().contains_point(position) {
            return;
        }
        self.set_render_mode_if_changed(RenderMode::Points);
        if self.batch_vertices.len() >= MAX_BATCH_QUADS * 4 * 6 {
            self.submit_batch();
        }
        let vertices = colored_vertices(&[(position.x as f32, position.y as f32)], color);
        self.batch_vertices.extend_from_slice(&vertices);
    }

    pub fn clear(&mut self, color: Color) {
        self.submit_batch();
        self.backend.clear(color);
    }

    pub fn swap_buffers(&mut self) {
        self.submit_batch();
        self.backend.present();
    }

    /// Follows a window resize: the default viewport is recomputed and the
    /// window surface reallocated.
    pub fn resize_window(&mut self, window_size: Extents) {
        self.submit_batch();
        self.window_size = window_size;
        self.default_viewport = determine_default_viewport(window_size);
        self.backend
            .resize_default_framebuffer(window_size.width.max(0) as u32, window_size.height.max(0) as u32);
        if self.current_target.is_default() {
            self.on_render_target_changed();
        }
    }

    /// Hands pending batched geometry to the backend.
    pub fn submit_batch(&mut self) {
        if self.batch_vertices.is_empty() {
            return;
        }

        let primitive = match self.render_mode {
            RenderMode::SpriteBatch | RenderMode::WaterEffect => Primitive::Triangles,
            RenderMode::Points => Primitive::Points,
            RenderMode::NonTexturedRender => {
                unreachable!("non-textured geometry is never batched")
            }
        };
        let mask_texture = (self.render_mode == RenderMode::WaterEffect)
            .then_some(self.water_surface_anim_texture.handle);
        let texture = match self.render_mode {
            RenderMode::SpriteBatch | RenderMode::WaterEffect => {
                self.last_used_texture.map(|texture| texture.handle)
            }
            _ => None,
        };

        self.backend.submit(&Submission {
            mode: self.render_mode,
            primitive,
            texture,
            mask_texture,
            vertices: &self.batch_vertices,
            indices: &self.batch_indices,
            uniforms: self.uniforms(),
        });
        self.submitted_batches += 1;

        self.batch_vertices.clear();
        self.batch_indices.clear();
    }

    fn submit_unbatched(&mut self, primitive: Primitive, vertices: &[f32]) {
        self.backend.submit(&Submission {
            mode: self.render_mode,
            primitive,
            texture: None,
            mask_texture: None,
            vertices,
            indices: &[],
            uniforms: self.uniforms(),
        });
        self.submitted_batches += 1;
    }

    fn uniforms(&self) -> Uniforms {
        Uniforms {
            transform: self.projection,
            overlay_color: self.overlay_color,
            color_modulation: self.color_modulation,
        }
    }

    fn bind_texture_if_changed(&mut self, texture: &TextureData) {
        if self.last_used_texture.map(|last| last.handle) != Some(texture.handle) {
            self.submit_batch();
            self.last_used_texture = Some(*texture);
        }
    }

    fn set_render_mode_if_changed(&mut self, mode: RenderMode) {
        if self.render_mode != mode {
            self.submit_batch();
            self.render_mode = mode;
        }
    }

    fn batch_quad_vertices(&mut self, vertices: &[f32], floats_per_vertex: usize) {
        if self.batch_indices.len() / QUAD_INDICES.len() >= MAX_BATCH_QUADS {
            self.submit_batch();
        }

        let current_index = (self.batch_vertices.len() / floats_per_vertex) as u16;
        self.batch_vertices.extend_from_slice(vertices);
        self.batch_indices
            .extend(QUAD_INDICES.iter().map(|index| index + current_index));
    }

    fn on_render_target_changed(&mut self) {
        let viewport = if self.current_target.is_default() {
            self.default_viewport
        } else {
            self.full_screen_rect()
        };
        self.backend
            .bind_render_target(self.current_target.target, viewport);
        self.update_projection_matrix();
        self.apply_scissor();
    }

    fn update_projection_matrix(&mut self) {
        self.projection = projection_matrix(
            self.current_target.size,
            PointF::new(
                self.global_translation.x as f32,
                self.global_translation.y as f32,
            ),
            self.global_scale,
        );
    }

    /// The backend scissors in surface pixels; the window surface shows the
    /// logical display scaled into the default viewport.
    fn apply_scissor(&mut self) {
        let scissor = self.clip_rect.map(|clip| {
            if self.current_target.is_default() {
                scale_into_viewport(&clip, self.current_target.size, &self.default_viewport)
            } else {
                clip
            }
        });
        self.backend.set_scissor(scissor);
    }
}

/// Binds a render target texture for the guard's lifetime, with neutral
/// translation, scale and clip. The previous state is restored on drop.
pub struct RenderTargetBinder<'a> {
    renderer: &'a mut Renderer,
    saved: RenderState,
}

impl<'a> RenderTargetBinder<'a> {
    pub fn new(renderer: &'a mut Renderer, target: RenderTargetTexture) -> Self {
        Self::bind(renderer, target.target())
    }

    /// Binds the window surface.
    pub fn default_target(renderer: &'a mut Renderer) -> Self {
        Self::bind(renderer, RenderTarget::default_target())
    }

    fn bind(renderer: &'a mut Renderer, target: RenderTarget) -> Self {
        let saved = renderer.save_state();
        renderer.set_render_target(target);
        renderer.set_global_translation(Vector::default());
        renderer.set_global_scale(PointF::new(1.0, 1.0));
        renderer.set_clip_rect(None);
        Self { renderer, saved }
    }
}

impl Deref for RenderTargetBinder<'_> {
    type Target = Renderer;

    fn deref(&self) -> &Renderer {
        self.renderer
    }
}

impl DerefMut for RenderTargetBinder<'_> {
    fn deref_mut(&mut self) -> &mut Renderer {
        self.renderer
    }
}

impl Drop for RenderTargetBinder<'_> {
    fn drop(&mut self) {
        self.renderer.restore_state(self.saved);
    }
}

fn scale_into_viewport(rect: &Rect, logical: Extents, viewport: &Rect) -> Rect {
    let scale_x = viewport.size.width as f32 / logical.width as f32;
    let scale_y = viewport.size.height as f32 / logical.height as f32;
    Rect::new(
        viewport.left() + (rect.left() as f32 * scale_x) as i32,
        viewport.top() + (rect.top() as f32 * scale_y) as i32,
        (rect.size.width as f32 * scale_x).round() as i32,
        (rect.size.height as f32 * scale_y).round() as i32,
    )
}

/// Writes the four corners `(left,bottom) (left,top) (right,bottom)
/// (right,top)` at `offset` within each `stride`-float vertex.
fn fill_vertex_data(
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    vertices: &mut [f32],
    offset: usize,
    stride: usize,
) {
    let corners = [(left, bottom), (left, top), (right, bottom), (right, top)];
    for (vertex, (x, y)) in corners.into_iter().enumerate() {
        vertices[vertex * stride + offset] = x;
        vertices[vertex * stride + offset + 1] = y;
    }
}

fn fill_vertex_positions(rect: &Rect, vertices: &mut [f32], offset: usize, stride: usize) {
    let left = rect.left() as f32;
    let top = rect.top() as f32;
    let right = left + rect.size.width as f32;
    let bottom = top + rect.size.height as f32;
    fill_vertex_data(left, right, top, bottom, vertices, offset, stride);
}

fn fill_tex_coords(
    rect: &Rect,
    texture: &TextureData,
    vertices: &mut [f32],
    offset: usize,
    stride: usize,
) {
    let width = texture.width as f32;
    let height = texture.height as f32;
    let left = rect.left() as f32 / width;
    let top = rect.top() as f32 / height;
    let right = left + rect.size.width as f32 / width;
    let bottom = top + rect.size.height as f32 / height;
    fill_vertex_data(left, right, top, bottom, vertices, offset, stride);
}

fn colored_vertices(points: &[(f32, f32)], color: Color) -> Vec<f32> {
    let [r, g, b, a] = color.to_unit();
    points
        .iter()
        .flat_map(|&(x, y)| [x, y, r, g, b, a])
        .collect()
}
