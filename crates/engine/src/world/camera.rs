use crate::base::{Extents, Rect, Vector};

use super::activation::{VIEWPORT_HEIGHT_TILES, VIEWPORT_WIDTH_TILES};

const MANUAL_SCROLL_SPEED: i32 = 2;
const MANUAL_SCROLL_COOLDOWN_AFTER_SHOOTING: i32 = 4;
const DEAD_ZONE_START_X: i32 = 11;
const DEAD_ZONE_END_X: i32 = 21;
const DEAD_ZONE_START_Y: i32 = 2;
const DEAD_ZONE_END_Y: i32 = 14;
const MAX_VERTICAL_ADJUSTMENT: i32 = 2;

/// Per-tick camera input: look requests plus the player's world box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraInput {
    pub look_up: bool,
    pub look_down: bool,
    pub player_bounds: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Camera {
    position: Vector,
    max_position: Extents,
    manual_scroll_cooldown: i32,
}

impl Camera {
    pub fn new(map_width: i32, map_height: i32) -> Self {
        Self {
            position: Vector::ZERO,
            max_position: Extents::new(
                (map_width - VIEWPORT_WIDTH_TILES).max(0),
                (map_height - VIEWPORT_HEIGHT_TILES).max(0),
            ),
            manual_scroll_cooldown: 0,
        }
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    pub fn max_position(&self) -> Extents {
        self.max_position
    }

    pub fn update(&mut self, input: &CameraInput) {
        let wants_manual_scroll = input.look_up || input.look_down;
        if self.manual_scroll_cooldown > 0 {
            self.manual_scroll_cooldown -= 1;
        } else if wants_manual_scroll {
            self.update_manual_scrolling(input);
            return;
        }
        self.update_automatic_scrolling(&input.player_bounds);
    }

    /// Shooting suppresses look-scrolling for a few ticks.
    pub fn receive_player_fired_shot(&mut self) {
        self.manual_scroll_cooldown = MANUAL_SCROLL_COOLDOWN_AFTER_SHOOTING;
    }

    pub fn center_view_on_player(&mut self, player_bounds: &Rect) {
        let center_x = player_bounds.left() + player_bounds.size.width / 2;
        let center_y = player_bounds.top() + player_bounds.size.height / 2;
        self.set_position(Vector::new(
            center_x - VIEWPORT_WIDTH_TILES / 2,
            center_y - VIEWPORT_HEIGHT_TILES / 2,
        ));
    }

    fn update_manual_scrolling(&mut self, input: &CameraInput) {
        let mut position = self.position;
        if input.look_up {
            position.y -= MANUAL_SCROLL_SPEED;
        }
        if input.look_down {
            position.y += MANUAL_SCROLL_SPEED;
        }
        self.set_position(position);
    }

    fn update_automatic_scrolling(&mut self, player_bounds: &Rect) {
        let relative_left = player_bounds.left() - self.position.x;
        let relative_right = player_bounds.right() - self.position.x;
        let offset_left = (DEAD_ZONE_START_X - relative_left).max(0);
        let offset_right = (relative_right - DEAD_ZONE_END_X).max(0);
        let offset_x = offset_right - offset_left;

        let relative_top = player_bounds.top() - self.position.y;
        let relative_bottom = player_bounds.bottom() - self.position.y;
        let offset_top = (DEAD_ZONE_START_Y - relative_top).max(0);
        let offset_bottom = (relative_bottom - DEAD_ZONE_END_Y).max(0);
        let offset_y = (offset_bottom - offset_top)
            .clamp(-MAX_VERTICAL_ADJUSTMENT, MAX_VERTICAL_ADJUSTMENT);

        self.set_position(self.position + Vector::new(offset_x, offset_y));
    }

    fn set_position(&mut self, position: Vector) {
        self.position = Vector::new(
            position.x.clamp(0, self.max_position.width),
            position.y.clamp(0, self.max_position.height),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(player_bounds: Rect) -> CameraInput {
        CameraInput {
            look_up: false,
            look_down: false,
            player_bounds,
        }
    }

    #[test]
    fn follows_player_leaving_horizontal_dead_zone() {
        let mut camera = Camera::new(100, 100);
        camera.update(&input(Rect::new(25, 8, 3, 5)));
        assert_eq!(camera.position().x, 6);

        camera.update(&input(Rect::new(25, 8, 3, 5)));
        assert_eq!(camera.position().x, 6);
    }

    #[test]
    fn vertical_follow_is_rate_limited() {
        let mut camera = Camera::new(100, 100);
        camera.update(&input(Rect::new(15, 40, 3, 5)));
        assert_eq!(camera.position().y, MAX_VERTICAL_ADJUSTMENT);
    }

    #[test]
    fn position_stays_within_map_bounds() {
        let mut camera = Camera::new(40, 30);
        for _ in 0..50 {
            camera.update(&input(Rect::new(39, 29, 1, 1)));
            let position = camera.position();
            assert!(position.x >= 0 && position.x <= 8);
            assert!(position.y >= 0 && position.y <= 10);
        }
        assert_eq!(camera.position(), Vector::new(8, 10));

        for _ in 0..50 {
            camera.update(&input(Rect::new(0, 0, 1, 1)));
        }
        assert_eq!(camera.position(), Vector::ZERO);
    }

    #[test]
    fn small_maps_pin_camera_to_origin() {
        let mut camera = Camera::new(10, 10);
        camera.center_view_on_player(&Rect::new(8, 8, 1, 1));
        assert_eq!(camera.position(), Vector::ZERO);
        assert_eq!(camera.max_position(), Extents::new(0, 0));
    }

    #[test]
    fn shooting_blocks_manual_scrolling_for_cooldown() {
        let mut camera = Camera::new(100, 100);
        camera.center_view_on_player(&Rect::new(50, 50, 2, 2));
        let start = camera.position();
        let look_down = CameraInput {
            look_down: true,
            ..input(Rect::new(50, 50, 2, 2))
        };

        camera.receive_player_fired_shot();
        for _ in 0..MANUAL_SCROLL_COOLDOWN_AFTER_SHOOTING {
            camera.update(&look_down);
            assert_eq!(camera.position(), start);
        }

        camera.update(&look_down);
        assert_eq!(camera.position(), start + Vector::new(0, MANUAL_SCROLL_SPEED));
    }

    #[test]
    fn center_view_snaps_to_player() {
        let mut camera = Camera::new(200, 200);
        camera.center_view_on_player(&Rect::new(100, 80, 2, 4));
        assert_eq!(camera.position(), Vector::new(85, 72));
    }
}
