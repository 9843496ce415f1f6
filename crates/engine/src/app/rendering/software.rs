use std::collections::HashMap;
use std::mem;

use crate::base::{Color, Image, Rect, Vector};

use super::backend::{Primitive, RenderBackend, RenderMode, RenderTargetId, Submission, TextureId};
use super::transform::transform_point;
use super::water::{palette_index, water_index, DEFAULT_INGAME_PALETTE};

type Rgba = [f32; 4];

/// CPU rasteriser for renderer submissions.
///
/// Quads are assumed axis aligned (the renderer only emits scale and
/// translation transforms) and are sampled nearest-neighbour. Blending is
/// source-alpha over destination.
pub struct SoftwareBackend {
    textures: Vec<Image>,
    targets: HashMap<RenderTargetId, TextureId>,
    default_framebuffer: Image,
    bound_target: Option<RenderTargetId>,
    viewport: Rect,
    scissor: Option<Rect>,
    palette: [Color; 16],
    next_target_id: u32,
}

impl SoftwareBackend {
    pub fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            textures: Vec::new(),
            targets: HashMap::new(),
            default_framebuffer: Image::filled(window_width, window_height, Color::BLACK),
            bound_target: None,
            viewport: Rect::new(0, 0, window_width as i32, window_height as i32),
            scissor: None,
            palette: DEFAULT_INGAME_PALETTE,
            next_target_id: 0,
        }
    }

    fn surface_slot(&mut self) -> &mut Image {
        match self.bound_target.and_then(|target| self.targets.get(&target).copied()) {
            Some(texture) => &mut self.textures[texture.0 as usize],
            None => &mut self.default_framebuffer,
        }
    }

    /// Moves the bound surface out so sources can be read while it is
    /// written.
    fn take_surface(&mut self) -> Image {
        mem::replace(self.surface_slot(), Image::new(0, 0, Vec::new()))
    }

    fn restore_surface(&mut self, surface: Image) {
        *self.surface_slot() = surface;
    }

    fn draw_area(&self, surface: &Image) -> Rect {
        let surface_rect = Rect::new(0, 0, surface.width() as i32, surface.height() as i32);
        let mut area = intersection(&surface_rect, &self.viewport);
        if let Some(scissor) = self.scissor {
            area = intersection(&area, &scissor);
        }
        area
    }

    fn to_surface(&self, matrix: &[f32; 16], x: f32, y: f32) -> (f32, f32) {
        let (ndc_x, ndc_y) = transform_point(matrix, x, y);
        (
            self.viewport.left() as f32 + (ndc_x + 1.0) * 0.5 * self.viewport.size.width as f32,
            self.viewport.top() as f32 + (1.0 - ndc_y) * 0.5 * self.viewport.size.height as f32,
        )
    }

    fn rasterize_quads(&self, surface: &mut Image, area: Rect, submission: &Submission<'_>) {
        let stride = submission.mode.vertex_stride();
        let Some(texture) = submission.texture.and_then(|id| self.texture_image(id)) else {
            return;
        };
        let mask = submission.mask_texture.and_then(|id| self.texture_image(id));
        let uniforms = &submission.uniforms;
        let overlay = uniforms.overlay_color.to_unit();
        let modulation = uniforms.color_modulation.to_unit();

        for quad in submission.indices.chunks_exact(6) {
            let base = quad[0] as usize;
            let top_left = &submission.vertices[(base + 1) * stride..(base + 2) * stride];
            let bottom_right = &submission.vertices[(base + 2) * stride..(base + 3) * stride];

            let (x0, y0) = self.to_surface(&uniforms.transform, top_left[0], top_left[1]);
            let (x1, y1) = self.to_surface(&uniforms.transform, bottom_right[0], bottom_right[1]);
            let columns = pixel_span(x0, x1, area.left(), area.right());
            let rows = pixel_span(y0, y1, area.top(), area.bottom());

            for py in rows.clone() {
                let ty = (py as f32 + 0.5 - y0) / (y1 - y0);
                for px in columns.clone() {
                    let tx = (px as f32 + 0.5 - x0) / (x1 - x0);
                    let u = lerp(top_left[2], bottom_right[2], tx);
                    let v = lerp(top_left[3], bottom_right[3], ty);
                    let base_color = sample_clamped(texture, u, v);

                    let color = match submission.mode {
                        RenderMode::WaterEffect => {
                            let mask_value = mask
                                .map(|mask| {
                                    let mask_u = lerp(top_left[4], bottom_right[4], tx);
                                    let mask_v = lerp(top_left[5], bottom_right[5], ty);
                                    sample_wrapped(mask, mask_u, mask_v)[0]
                                })
                                .unwrap_or(0.0);
                            let water = self.apply_water_effect(base_color);
                            mix(base_color, water, mask_value)
                        }
                        _ => shade_sprite(base_color, modulation, overlay),
                    };
                    blend_pixel(surface, px, py, color);
                }
            }
        }
    }

    fn apply_water_effect(&self, color: Rgba) -> Rgba {
        let as_color = from_unit(color);
        let index = water_index(palette_index(as_color, &self.palette));
        let replacement = self.palette[index].to_unit();
        [replacement[0], replacement[1], replacement[2], color[3]]
    }

    fn rasterize_points(&self, surface: &mut Image, area: Rect, submission: &Submission<'_>) {
        for vertex in submission.vertices.chunks_exact(6) {
            let (x, y) = self.to_surface(&submission.uniforms.transform, vertex[0], vertex[1]);
            let (px, py) = snap_to_pixel(x, y);
            if area.contains_point(Vector::new(px, py)) {
                blend_pixel(surface, px, py, [vertex[2], vertex[3], vertex[4], vertex[5]]);
            }
        }
    }

    fn rasterize_line_strip(&self, surface: &mut Image, area: Rect, submission: &Submission<'_>) {
        let points: Vec<(i32, i32, Rgba)> = submission
            .vertices
            .chunks_exact(6)
            .map(|vertex| {
                let (x, y) = self.to_surface(&submission.uniforms.transform, vertex[0], vertex[1]);
                let (px, py) = snap_to_pixel(x, y);
                (px, py, [vertex[2], vertex[3], vertex[4], vertex[5]])
            })
            .collect();
        for segment in points.windows(2) {
            let (x0, y0, color) = segment[0];
            let (x1, y1, _) = segment[1];
            for (x, y) in bresenham(x0, y0, x1, y1) {
                if area.contains_point(Vector::new(x, y)) {
                    blend_pixel(surface, x, y, color);
                }
            }
        }
    }
}

/// Vertices sit on integer coordinates; rounding absorbs projection error.
fn snap_to_pixel(x: f32, y: f32) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

impl RenderBackend for SoftwareBackend {
    fn create_texture(&mut self, image: &Image) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(image.clone());
        id
    }

    fn create_render_target(&mut self, width: i32, height: i32) -> (TextureId, RenderTargetId) {
        let texture = self.create_texture(&Image::filled(
            width.max(0) as u32,
            height.max(0) as u32,
            Color::TRANSPARENT,
        ));
        self.next_target_id += 1;
        let target = RenderTargetId(self.next_target_id);
        self.targets.insert(target, texture);
        (texture, target)
    }

    fn bind_render_target(&mut self, target: Option<RenderTargetId>, viewport: Rect) {
        self.bound_target = target;
        self.viewport = viewport;
    }

    fn resize_default_framebuffer(&mut self, width: u32, height: u32) {
        self.default_framebuffer = Image::filled(width, height, Color::BLACK);
    }

    fn set_scissor(&mut self, clip: Option<Rect>) {
        self.scissor = clip;
    }

    fn set_water_palette(&mut self, palette: &[Color; 16]) {
        self.palette = *palette;
    }

    fn clear(&mut self, color: Color) {
        let scissor = self.scissor;
        let surface = self.surface_slot();
        let full = Rect::new(0, 0, surface.width() as i32, surface.height() as i32);
        let area = match scissor {
            Some(scissor) => intersection(&full, &scissor),
            None => full,
        };
        for y in area.top()..=area.bottom() {
            for x in area.left()..=area.right() {
                surface.set_pixel(x as u32, y as u32, color);
            }
        }
    }

    fn submit(&mut self, submission: &Submission<'_>) {
        let mut surface = self.take_surface();
        let area = self.draw_area(&surface);
        if area.is_valid() {
            match submission.primitive {
                Primitive::Triangles => self.rasterize_quads(&mut surface, area, submission),
                Primitive::Points => self.rasterize_points(&mut surface, area, submission),
                Primitive::LineStrip => self.rasterize_line_strip(&mut surface, area, submission),
            }
        }
        self.restore_surface(surface);
    }

    fn present(&mut self) {}

    fn default_framebuffer(&self) -> Option<&Image> {
        Some(&self.default_framebuffer)
    }

    fn texture_image(&self, texture: TextureId) -> Option<&Image> {
        self.textures.get(texture.0 as usize)
    }
}

fn intersection(a: &Rect, b: &Rect) -> Rect {
    let left = a.left().max(b.left());
    let top = a.top().max(b.top());
    let right = a.right().min(b.right());
    let bottom = a.bottom().min(b.bottom());
    Rect::new(left, top, (right - left + 1).max(0), (bottom - top + 1).max(0))
}

/// Pixels whose centers fall in `[from, to)`, clipped to `min..=max`.
fn pixel_span(from: f32, to: f32, min: i32, max: i32) -> std::ops::RangeInclusive<i32> {
    let (low, high) = if from <= to { (from, to) } else { (to, from) };
    let first = ((low - 0.5).ceil() as i32).max(min);
    let last = ((high - 0.5).ceil() as i32 - 1).min(max);
    first..=last
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn mix(a: Rgba, b: Rgba, t: f32) -> Rgba {
    [
        lerp(a[0], b[0], t),
        lerp(a[1], b[1], t),
        lerp(a[2], b[2], t),
        lerp(a[3], b[3], t),
    ]
}

fn shade_sprite(base: Rgba, modulation: Rgba, overlay: Rgba) -> Rgba {
    let modulated = [
        base[0] * modulation[0],
        base[1] * modulation[1],
        base[2] * modulation[2],
        base[3] * modulation[3],
    ];
    [
        lerp(modulated[0], overlay[0], overlay[3]),
        lerp(modulated[1], overlay[1], overlay[3]),
        lerp(modulated[2], overlay[2], overlay[3]),
        modulated[3],
    ]
}

fn texel(image: &Image, x: i64, y: i64) -> Rgba {
    image.pixel(x as u32, y as u32).to_unit()
}

fn sample_clamped(image: &Image, u: f32, v: f32) -> Rgba {
    if image.width() == 0 || image.height() == 0 {
        return [0.0; 4];
    }
    let x = ((u * image.width() as f32).floor() as i64).clamp(0, image.width() as i64 - 1);
    let y = ((v * image.height() as f32).floor() as i64).clamp(0, image.height() as i64 - 1);
    texel(image, x, y)
}

fn sample_wrapped(image: &Image, u: f32, v: f32) -> Rgba {
    sample_clamped(image, u - u.floor(), v)
}

fn from_unit(color: Rgba) -> Color {
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::rgba(
        channel(color[0]),
        channel(color[1]),
        channel(color[2]),
        channel(color[3]),
    )
}

fn blend_pixel(surface: &mut Image, x: i32, y: i32, source: Rgba) {
    if x < 0 || y < 0 || x as u32 >= surface.width() || y as u32 >= surface.height() {
        return;
    }
    let destination = surface.pixel(x as u32, y as u32).to_unit();
    let alpha = source[3];
    let blended = [
        source[0] * alpha + destination[0] * (1.0 - alpha),
        source[1] * alpha + destination[1] * (1.0 - alpha),
        source[2] * alpha + destination[2] * (1.0 - alpha),
        source[3] * alpha + destination[3] * (1.0 - alpha),
    ];
    surface.set_pixel(x as u32, y as u32, from_unit(blended));
}

fn bresenham(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let mut points = Vec::new();
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let step_x = if x0 < x1 { 1 } else { -1 };
    let step_y = if y0 < y1 { 1 } else { -1 };
    let mut error = dx + dy;
    let (mut x, mut y) = (x0, y0);
    loop {
        points.push((x, y));
        if x == x1 && y == y1 {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::rendering::{RenderTargetBinder, Renderer};
    use crate::base::Extents;

    fn renderer(width: u32, height: u32) -> Renderer {
        Renderer::new(
            Box::new(SoftwareBackend::new(width, height)),
            Extents::new(width as i32, height as i32),
        )
    }

    fn framebuffer_pixel(renderer: &Renderer, x: u32, y: u32) -> Color {
        renderer
            .backend()
            .default_framebuffer()
            .expect("software framebuffer")
            .pixel(x, y)
    }

    #[test]
    fn textured_quad_is_copied_into_logical_display() {
        let mut renderer = renderer(640, 480);
        let mut image = Image::filled(2, 2, Color::rgb(255, 0, 0));
        image.set_pixel(1, 1, Color::rgb(0, 0, 255));
        let texture = renderer.create_texture(&image);

        renderer.draw_texture(&texture, Rect::new(0, 0, 2, 2), Rect::new(10, 20, 4, 4));
        renderer.swap_buffers();

        assert_eq!(framebuffer_pixel(&renderer, 10, 20), Color::rgb(255, 0, 0));
        assert_eq!(framebuffer_pixel(&renderer, 13, 23), Color::rgb(0, 0, 255));
        assert_eq!(framebuffer_pixel(&renderer, 14, 20), Color::BLACK);
    }

    #[test]
    fn overlay_color_replaces_sprite_color() {
        let mut renderer = renderer(640, 480);
        let texture = renderer.create_texture(&Image::filled(1, 1, Color::rgb(10, 10, 10)));

        renderer.set_overlay_color(Color::WHITE);
        renderer.draw_texture(&texture, Rect::new(0, 0, 1, 1), Rect::new(0, 0, 1, 1));
        renderer.swap_buffers();

        assert_eq!(framebuffer_pixel(&renderer, 0, 0), Color::WHITE);
    }

    #[test]
    fn translucent_modulation_blends_with_destination() {
        let mut renderer = renderer(640, 480);
        let texture = renderer.create_texture(&Image::filled(1, 1, Color::WHITE));

        renderer.set_color_modulation(Color::rgba(255, 255, 255, 0));
        renderer.draw_texture(&texture, Rect::new(0, 0, 1, 1), Rect::new(0, 0, 1, 1));
        renderer.swap_buffers();

        assert_eq!(framebuffer_pixel(&renderer, 0, 0), Color::BLACK);
    }

    #[test]
    fn water_effect_shifts_palette_under_mask() {
        let mut renderer = renderer(640, 480);
        let target = renderer.create_render_target_texture(16, 16);
        {
            let mut bound = RenderTargetBinder::new(&mut renderer, target);
            bound.clear(DEFAULT_INGAME_PALETTE[5]);
        }
        renderer.draw_water_effect(Rect::new(0, 0, 16, 16), target.data(), None);
        renderer.swap_buffers();

        assert_eq!(framebuffer_pixel(&renderer, 4, 4), DEFAULT_INGAME_PALETTE[9]);
        assert_eq!(framebuffer_pixel(&renderer, 16, 4), Color::BLACK);
    }

    #[test]
    fn points_and_lines_are_drawn() {
        let mut renderer = renderer(640, 480);
        renderer.draw_point(Vector::new(5, 5), Color::WHITE);
        renderer.draw_line(0, 10, 3, 10, Color::rgb(0, 255, 0));
        renderer.swap_buffers();

        assert_eq!(framebuffer_pixel(&renderer, 5, 5), Color::WHITE);
        assert_eq!(framebuffer_pixel(&renderer, 5, 4), Color::BLACK);
        assert_eq!(framebuffer_pixel(&renderer, 2, 10), Color::rgb(0, 255, 0));
        assert_eq!(framebuffer_pixel(&renderer, 4, 10), Color::BLACK);
    }

    #[test]
    fn line_ends_on_its_last_pixel() {
        let mut renderer = renderer(640, 480);
        renderer.draw_line(0, 10, 3, 10, Color::WHITE);
        renderer.draw_line(20, 0, 20, 479, Color::WHITE);
        renderer.swap_buffers();

        for x in 0..=3 {
            assert_eq!(framebuffer_pixel(&renderer, x, 10), Color::WHITE, "x={x}");
        }
        assert_eq!(framebuffer_pixel(&renderer, 20, 0), Color::WHITE);
        assert_eq!(framebuffer_pixel(&renderer, 20, 479), Color::WHITE);
    }

    #[test]
    fn snapping_tolerates_projection_error() {
        assert_eq!(snap_to_pixel(4.999_98, 9.000_02), (5, 9));
        assert_eq!(snap_to_pixel(0.0, 479.0), (0, 479));
    }

    #[test]
    fn bresenham_includes_both_endpoints() {
        assert_eq!(bresenham(0, 0, 3, 1), vec![(0, 0), (1, 0), (2, 1), (3, 1)]);
        assert_eq!(bresenham(2, 2, 2, 2), vec![(2, 2)]);
    }
}
