use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::CollisionFlags;

pub type TileIndex = u16;

pub const LAYER_COUNT: usize = 2;

/// Per-tile attribute bits. The low bits double as [`CollisionFlags`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileAttributes(u16);

impl TileAttributes {
    pub const NONE: TileAttributes = TileAttributes(0);
    pub const SOLID_TOP: TileAttributes = TileAttributes(1 << 0);
    pub const SOLID_BOTTOM: TileAttributes = TileAttributes(1 << 1);
    pub const SOLID_LEFT: TileAttributes = TileAttributes(1 << 2);
    pub const SOLID_RIGHT: TileAttributes = TileAttributes(1 << 3);
    pub const CLIMBABLE: TileAttributes = TileAttributes(1 << 4);
    pub const WATER: TileAttributes = TileAttributes(1 << 5);
    pub const ANIMATED: TileAttributes = TileAttributes(1 << 8);
    pub const FAST_ANIMATION: TileAttributes = TileAttributes(1 << 9);
    pub const FOREGROUND: TileAttributes = TileAttributes(1 << 10);
    pub const FLAMMABLE: TileAttributes = TileAttributes(1 << 11);
    pub const SOLID: TileAttributes = TileAttributes(0b1111);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn union(self, other: TileAttributes) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: TileAttributes) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn collision(self) -> CollisionFlags {
        CollisionFlags::from_bits(self.0 & CollisionFlags::ALL.bits())
    }

    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, MapError> {
        let mut attributes = TileAttributes::NONE;
        for name in names {
            let flag = match name {
                "solid" => TileAttributes::SOLID,
                "solid_top" => TileAttributes::SOLID_TOP,
                "solid_bottom" => TileAttributes::SOLID_BOTTOM,
                "solid_left" => TileAttributes::SOLID_LEFT,
                "solid_right" => TileAttributes::SOLID_RIGHT,
                "climbable" => TileAttributes::CLIMBABLE,
                "water" => TileAttributes::WATER,
                "animated" => TileAttributes::ANIMATED,
                "fast_animation" => TileAttributes::FAST_ANIMATION,
                "foreground" => TileAttributes::FOREGROUND,
                "flammable" => TileAttributes::FLAMMABLE,
                other => {
                    return Err(MapError::UnknownAttribute {
                        name: other.to_string(),
                    })
                }
            };
            attributes = attributes.union(flag);
        }
        Ok(attributes)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileAttributeDict {
    attributes: Vec<TileAttributes>,
}

impl TileAttributeDict {
    pub fn new(attributes: Vec<TileAttributes>) -> Self {
        Self { attributes }
    }

    pub fn attributes(&self, tile: TileIndex) -> TileAttributes {
        self.attributes
            .get(tile as usize)
            .copied()
            .unwrap_or(TileAttributes::NONE)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackdropScrollMode {
    #[default]
    None,
    ParallaxBoth,
    ParallaxHorizontal,
    AutoHorizontal,
    AutoVertical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackdropSwitchCondition {
    #[default]
    None,
    OnTeleportation,
    OnReactorDestruction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("layer {layer} tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch {
        layer: usize,
        expected: usize,
        actual: usize,
    },
    #[error("map dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
    #[error("unknown tile attribute '{name}'")]
    UnknownAttribute { name: String },
}

/// Two tile layers over a fixed grid. Dimensions never change after
/// construction; only cell contents do.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    width: i32,
    height: i32,
    layers: [Vec<TileIndex>; LAYER_COUNT],
    attribute_dict: TileAttributeDict,
    backdrop_scroll_mode: BackdropScrollMode,
    backdrop_switch_condition: BackdropSwitchCondition,
}

impl Map {
    pub fn new(width: i32, height: i32, attribute_dict: TileAttributeDict) -> Result<Self, MapError> {
        if width <= 0 || height <= 0 {
            return Err(MapError::InvalidDimensions { width, height });
        }
        let cell_count = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            layers: [vec![0; cell_count], vec![0; cell_count]],
            attribute_dict,
            backdrop_scroll_mode: BackdropScrollMode::None,
            backdrop_switch_condition: BackdropSwitchCondition::None,
        })
    }

    pub fn from_layers(
        width: i32,
        height: i32,
        layers: [Vec<TileIndex>; LAYER_COUNT],
        attribute_dict: TileAttributeDict,
    ) -> Result<Self, MapError> {
        let mut map = Self::new(width, height, attribute_dict)?;
        let expected = width as usize * height as usize;
        for (layer, tiles) in layers.iter().enumerate() {
            if tiles.len() != expected {
                return Err(MapError::TileCountMismatch {
                    layer,
                    expected,
                    actual: tiles.len(),
                });
            }
        }
        map.layers = layers;
        Ok(map)
    }

    pub fn with_backdrop_modes(
        mut self,
        scroll_mode: BackdropScrollMode,
        switch_condition: BackdropSwitchCondition,
    ) -> Self {
        self.backdrop_scroll_mode = scroll_mode;
        self.backdrop_switch_condition = switch_condition;
        self
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn backdrop_scroll_mode(&self) -> BackdropScrollMode {
        self.backdrop_scroll_mode
    }

    pub fn backdrop_switch_condition(&self) -> BackdropSwitchCondition {
        self.backdrop_switch_condition
    }

    pub fn attribute_dict(&self) -> &TileAttributeDict {
        &self.attribute_dict
    }

    fn cell_index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Cells outside the map read as the empty tile.
    pub fn tile_at(&self, layer: usize, x: i32, y: i32) -> TileIndex {
        self.cell_index(x, y)
            .map(|index| self.layers[layer][index])
            .unwrap_or(0)
    }

    pub fn set_tile_at(&mut self, layer: usize, x: i32, y: i32, tile: TileIndex) {
        let index = self
            .cell_index(x, y)
            .unwrap_or_else(|| panic!("set_tile_at out of bounds: ({x}, {y})"));
        self.layers[layer][index] = tile;
    }

    /// Empties both layers inside the given tile rectangle (clipped to the map).
    pub fn clear_section(&mut self, x: i32, y: i32, width: i32, height: i32) {
        for row in y.max(0)..(y + height).min(self.height) {
            for column in x.max(0)..(x + width).min(self.width) {
                for layer in 0..LAYER_COUNT {
                    self.set_tile_at(layer, column, row, 0);
                }
            }
        }
    }

    pub fn attributes(&self, layer: usize, x: i32, y: i32) -> TileAttributes {
        self.attribute_dict.attributes(self.tile_at(layer, x, y))
    }

    pub fn collision_data(&self, x: i32, y: i32) -> CollisionFlags {
        self.attributes(0, x, y)
            .collision()
            .union(self.attributes(1, x, y).collision())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> TileAttributeDict {
        TileAttributeDict::new(vec![
            TileAttributes::NONE,
            TileAttributes::SOLID,
            TileAttributes::SOLID_TOP,
            TileAttributes::CLIMBABLE,
        ])
    }

    #[test]
    fn from_layers_rejects_wrong_tile_count() {
        let error = Map::from_layers(2, 2, [vec![0; 4], vec![0; 3]], dict())
            .expect_err("must reject");
        assert_eq!(
            error,
            MapError::TileCountMismatch {
                layer: 1,
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn out_of_bounds_reads_empty() {
        let map = Map::new(4, 4, dict()).expect("map");
        assert_eq!(map.tile_at(0, -1, 0), 0);
        assert_eq!(map.tile_at(1, 4, 0), 0);
        assert_eq!(map.collision_data(10, 10), CollisionFlags::NONE);
    }

    #[test]
    fn collision_data_unions_both_layers() {
        let mut map = Map::new(4, 4, dict()).expect("map");
        map.set_tile_at(0, 1, 1, 2);
        map.set_tile_at(1, 1, 1, 3);
        let flags = map.collision_data(1, 1);
        assert!(flags.contains(CollisionFlags::SOLID_TOP));
        assert!(flags.contains(CollisionFlags::CLIMBABLE));
        assert!(!flags.contains(CollisionFlags::SOLID_BOTTOM));
    }

    #[test]
    fn clear_section_clips_to_map() {
        let mut map = Map::new(3, 3, dict()).expect("map");
        for y in 0..3 {
            for x in 0..3 {
                map.set_tile_at(0, x, y, 1);
            }
        }
        map.clear_section(1, 1, 5, 5);
        assert_eq!(map.tile_at(0, 0, 0), 1);
        assert_eq!(map.tile_at(0, 1, 1), 0);
        assert_eq!(map.tile_at(0, 2, 2), 0);
        assert_eq!(map.tile_at(0, 2, 0), 1);
    }

    #[test]
    fn attribute_names_parse_into_bits() {
        let attributes = TileAttributes::from_names(["solid_top", "foreground"]).expect("parse");
        assert!(attributes.contains(TileAttributes::SOLID_TOP));
        assert!(attributes.contains(TileAttributes::FOREGROUND));
        assert!(TileAttributes::from_names(["sticky"]).is_err());
    }
}
