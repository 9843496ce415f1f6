use std::rc::Rc;

use crate::app::rendering::TextureData;
use crate::base::{PointF, Rect, Vector};

pub type WorldPosition = Vector;

/// Entity-local tile rectangle, anchored at the entity's bottom-left tile.
pub type BoundingBox = Rect;

pub fn world_space(bbox: &BoundingBox, position: WorldPosition) -> Rect {
    Rect {
        top_left: bbox.top_left + Vector::new(position.x, position.y - (bbox.size.height - 1)),
        size: bbox.size,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingBody {
    pub velocity: PointF,
    pub gravity_affected: bool,
    pub ignore_collisions: bool,
    pub is_active: bool,
}

impl MovingBody {
    pub fn new(velocity: PointF, gravity_affected: bool) -> Self {
        Self {
            velocity,
            gravity_affected,
            ignore_collisions: false,
            is_active: true,
        }
    }

    pub fn ignoring_collisions(mut self) -> Self {
        self.ignore_collisions = true;
        self
    }
}

/// Per-tick velocity table that overrides a body's velocity while it runs.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementSequence {
    pub velocities: &'static [PointF],
    pub current: usize,
    pub reset_velocity_after: bool,
    pub update_x: bool,
}

impl MovementSequence {
    pub fn new(velocities: &'static [PointF], reset_velocity_after: bool, update_x: bool) -> Self {
        Self {
            velocities,
            current: 0,
            reset_velocity_after,
            update_x,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Active {
    pub is_on_screen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPolicy {
    WhenOnScreen,
    Always,
    AlwaysAfterFirstActivation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationSettings {
    pub policy: ActivationPolicy,
    pub has_been_activated: bool,
}

impl ActivationSettings {
    pub fn new(policy: ActivationPolicy) -> Self {
        Self {
            policy,
            has_been_activated: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Left,
    Right,
}

impl Orientation {
    pub fn opposite(self) -> Self {
        match self {
            Orientation::Left => Orientation::Right,
            Orientation::Right => Orientation::Left,
        }
    }

    pub fn to_movement(self) -> i32 {
        match self {
            Orientation::Left => -1,
            Orientation::Right => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpriteFrame {
    pub image: TextureData,
    pub draw_offset: Vector,
}

/// Shared per-actor-kind drawing data; entities of one kind share one instance.
#[derive(Debug, Clone, Default)]
pub struct SpriteDrawData {
    pub frames: Vec<SpriteFrame>,
    pub virtual_to_real_frame_map: Vec<i32>,
    pub orientation_offset: Option<i32>,
    pub draw_order: i32,
}

pub const IGNORE_RENDER_SLOT: i32 = -1;

#[derive(Debug, Clone)]
pub struct Sprite {
    pub draw_data: Rc<SpriteDrawData>,
    pub frames_to_render: Vec<i32>,
    pub flashing_white: bool,
    pub translucent: bool,
    pub show: bool,
}

impl Sprite {
    pub fn new(draw_data: Rc<SpriteDrawData>, frames_to_render: Vec<i32>) -> Self {
        Self {
            draw_data,
            frames_to_render,
            flashing_white: false,
            translucent: false,
            show: true,
        }
    }

    pub fn flash_white(&mut self) {
        self.flashing_white = true;
    }

    pub fn num_frames(&self) -> i32 {
        self.draw_data.frames.len() as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationLoop {
    pub delay_in_frames: i32,
    pub frames_elapsed: i32,
    pub start_frame: i32,
    pub end_frame: Option<i32>,
    pub render_slot: usize,
}

impl AnimationLoop {
    pub fn new(delay_in_frames: i32) -> Self {
        Self::with_range(delay_in_frames, 0, None, 0)
    }

    pub fn with_range(
        delay_in_frames: i32,
        start_frame: i32,
        end_frame: Option<i32>,
        render_slot: usize,
    ) -> Self {
        Self {
            delay_in_frames,
            frames_elapsed: 0,
            start_frame,
            end_frame,
            render_slot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationSequence {
    pub frames: &'static [i32],
    pub current_frame: usize,
    pub render_slot: usize,
    pub repeat: bool,
}

impl AnimationSequence {
    pub fn new(frames: &'static [i32], render_slot: usize, repeat: bool) -> Self {
        Self {
            frames,
            current_frame: 0,
            render_slot,
            repeat,
        }
    }
}

/// Marks a sprite drawn after the foreground tile layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawTopMost;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideDrawOrder(pub i32);

/// Bounding box follows the size of the frame in render slot 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoBoundingBox;

/// Entities drawn through a dedicated path instead of their sprite frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStrategy {
    WaterArea { animated_surface: bool },
    TileDebris { tile_index: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoDestroy {
    pub on_timeout: Option<i32>,
    pub on_world_collision: bool,
    pub on_leaving_active_region: bool,
}

impl AutoDestroy {
    pub fn after_timeout(frames: i32) -> Self {
        Self {
            on_timeout: Some(frames),
            on_world_collision: false,
            on_leaving_active_region: false,
        }
    }

    pub fn on_leaving_active_region() -> Self {
        Self {
            on_timeout: None,
            on_world_collision: false,
            on_leaving_active_region: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_space_anchors_box_at_bottom_left() {
        let bbox = Rect::new(0, 0, 2, 2);
        let world = world_space(&bbox, Vector::new(5, 10));
        assert_eq!(world, Rect::new(5, 9, 2, 2));
        assert_eq!(world.bottom(), 10);
    }

    #[test]
    fn world_space_keeps_local_offset() {
        let bbox = Rect::new(1, -1, 3, 1);
        let world = world_space(&bbox, Vector::new(4, 4));
        assert_eq!(world, Rect::new(5, 3, 3, 1));
    }
}
