use crate::base::Rect;

use super::components::{world_space, BoundingBox, WorldPosition};
use super::map::Map;

/// Per-edge solidity of a tile cell. Each solid edge blocks motion that
/// would cross it: `SOLID_TOP` stops falling bodies, `SOLID_LEFT` stops
/// bodies moving right into the cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CollisionFlags(u16);

impl CollisionFlags {
    pub const NONE: CollisionFlags = CollisionFlags(0);
    pub const SOLID_TOP: CollisionFlags = CollisionFlags(1 << 0);
    pub const SOLID_BOTTOM: CollisionFlags = CollisionFlags(1 << 1);
    pub const SOLID_LEFT: CollisionFlags = CollisionFlags(1 << 2);
    pub const SOLID_RIGHT: CollisionFlags = CollisionFlags(1 << 3);
    pub const CLIMBABLE: CollisionFlags = CollisionFlags(1 << 4);
    pub const WATER: CollisionFlags = CollisionFlags(1 << 5);
    pub const ALL: CollisionFlags = CollisionFlags(0b11_1111);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn union(self, other: CollisionFlags) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: CollisionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Read-only collision queries against the tile map.
///
/// All queries take an entity position and its local bounding box and look
/// at the row or column directly adjacent to the resulting world box.
#[derive(Debug, Clone, Copy)]
pub struct CollisionChecker<'a> {
    map: &'a Map,
}

impl<'a> CollisionChecker<'a> {
    pub fn new(map: &'a Map) -> Self {
        Self { map }
    }

    fn any_in_row(&self, y: i32, left: i32, right: i32, flag: CollisionFlags) -> bool {
        (left..=right).any(|x| self.map.collision_data(x, y).contains(flag))
    }

    fn any_in_column(&self, x: i32, top: i32, bottom: i32, flag: CollisionFlags) -> bool {
        (top..=bottom).any(|y| self.map.collision_data(x, y).contains(flag))
    }

    pub fn is_on_solid_ground(&self, position: WorldPosition, bbox: &BoundingBox) -> bool {
        let world = world_space(bbox, position);
        self.any_in_row(
            world.bottom() + 1,
            world.left(),
            world.right(),
            CollisionFlags::SOLID_TOP,
        )
    }

    pub fn is_touching_ceiling(&self, position: WorldPosition, bbox: &BoundingBox) -> bool {
        let world = world_space(bbox, position);
        self.any_in_row(
            world.top() - 1,
            world.left(),
            world.right(),
            CollisionFlags::SOLID_BOTTOM,
        )
    }

    pub fn is_touching_left_wall(&self, position: WorldPosition, bbox: &BoundingBox) -> bool {
        let world = world_space(bbox, position);
        self.any_in_column(
            world.left() - 1,
            world.top(),
            world.bottom(),
            CollisionFlags::SOLID_RIGHT,
        )
    }

    pub fn is_touching_right_wall(&self, position: WorldPosition, bbox: &BoundingBox) -> bool {
        let world = world_space(bbox, position);
        self.any_in_column(
            world.right() + 1,
            world.top(),
            world.bottom(),
            CollisionFlags::SOLID_LEFT,
        )
    }

    /// Union of the flags of every cell covered by `world_box`.
    pub fn collision_at(&self, world_box: &Rect) -> CollisionFlags {
        let mut flags = CollisionFlags::NONE;
        for y in world_box.top()..=world_box.bottom() {
            for x in world_box.left()..=world_box.right() {
                flags = flags.union(self.map.collision_data(x, y));
            }
        }
        flags
    }

    pub fn map(&self) -> &'a Map {
        self.map
    }
}
