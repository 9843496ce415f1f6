use crate::base::{Extents, PointF, Rect, Vector};

/// Original game resolution.
pub const GAME_SCREEN_WIDTH: i32 = 320;
pub const GAME_SCREEN_HEIGHT: i32 = 200;

/// 4:3 height the 320x200 image is stretched to before scaling up.
const ASPECT_RATIO_CORRECTED_HEIGHT: i32 = 240;
const SCALE_FACTOR: i32 = 2;

pub const LOGICAL_DISPLAY_WIDTH: i32 = GAME_SCREEN_WIDTH * SCALE_FACTOR;
pub const LOGICAL_DISPLAY_HEIGHT: i32 = ASPECT_RATIO_CORRECTED_HEIGHT * SCALE_FACTOR;

/// Offset and size of the in-game world view inside the 320x200 screen.
pub const INGAME_VIEWPORT_OFFSET: Vector = Vector::new(8, 8);
pub const INGAME_VIEWPORT_SIZE_PX: Extents = Extents::new(256, 160);

pub const IDENTITY_MATRIX: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// `ortho(0, w, h, 0) * scale(s) * translate(t)` in column-major order.
pub fn projection_matrix(target_size: Extents, translation: PointF, scale: PointF) -> [f32; 16] {
    let sx = 2.0 / target_size.width as f32 * scale.x;
    let sy = -2.0 / target_size.height as f32 * scale.y;
    let mut matrix = IDENTITY_MATRIX;
    matrix[0] = sx;
    matrix[5] = sy;
    matrix[10] = -1.0;
    matrix[12] = sx * translation.x - 1.0;
    matrix[13] = sy * translation.y + 1.0;
    matrix
}

/// Applies the 2D part of a column-major matrix.
pub fn transform_point(matrix: &[f32; 16], x: f32, y: f32) -> (f32, f32) {
    (
        matrix[0] * x + matrix[4] * y + matrix[12],
        matrix[1] * x + matrix[5] * y + matrix[13],
    )
}

/// Letterboxed region of the window that shows the logical display with
/// its aspect ratio intact.
pub fn determine_default_viewport(window_size: Extents) -> Rect {
    let window_width = window_size.width as f32;
    let window_height = window_size.height as f32;
    let width_ratio = window_width / LOGICAL_DISPLAY_WIDTH as f32;
    let height_ratio = window_height / LOGICAL_DISPLAY_HEIGHT as f32;
    let smaller_ratio = width_ratio.min(height_ratio);
    let usable_width = LOGICAL_DISPLAY_WIDTH as f32 * smaller_ratio;
    let usable_height = LOGICAL_DISPLAY_HEIGHT as f32 * smaller_ratio;
    let offset_x = (window_width - usable_width) / 2.0;
    let offset_y = (window_height - usable_height) / 2.0;
    Rect::new(
        offset_x as i32,
        offset_y as i32,
        usable_width as i32,
        usable_height as i32,
    )
}

/// Scale that maps the 320x200 game screen onto the logical display.
pub fn game_screen_upscale() -> PointF {
    PointF::new(
        LOGICAL_DISPLAY_WIDTH as f32 / GAME_SCREEN_WIDTH as f32,
        LOGICAL_DISPLAY_HEIGHT as f32 / GAME_SCREEN_HEIGHT as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn projection_maps_corners_to_clip_space() {
        let matrix = projection_matrix(Extents::new(640, 480), PointF::ZERO, PointF::new(1.0, 1.0));
        let (x, y) = transform_point(&matrix, 0.0, 0.0);
        assert!(approx(x, -1.0) && approx(y, 1.0));
        let (x, y) = transform_point(&matrix, 640.0, 480.0);
        assert!(approx(x, 1.0) && approx(y, -1.0));
    }

    #[test]
    fn translation_applies_before_scale() {
        let matrix = projection_matrix(
            Extents::new(100, 100),
            PointF::new(10.0, 5.0),
            PointF::new(2.0, 2.0),
        );
        // (0,0) lands at logical (20,10)
        let (x, y) = transform_point(&matrix, 0.0, 0.0);
        assert!(approx(x, -0.6));
        assert!(approx(y, 0.8));
    }

    #[test]
    fn wide_window_is_pillarboxed() {
        let viewport = determine_default_viewport(Extents::new(1920, 1080));
        assert_eq!(viewport, Rect::new(240, 0, 1440, 1080));
    }

    #[test]
    fn tall_window_is_letterboxed() {
        let viewport = determine_default_viewport(Extents::new(640, 640));
        assert_eq!(viewport, Rect::new(0, 80, 640, 480));
    }

    #[test]
    fn upscale_corrects_aspect_ratio() {
        let scale = game_screen_upscale();
        assert!(approx(scale.x, 2.0));
        assert!(approx(scale.y, 2.4));
    }
}
