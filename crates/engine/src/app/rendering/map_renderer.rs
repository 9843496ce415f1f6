use crate::base::{Color, Image, Rect, Vector, TILE_SIZE_PX};
use crate::world::{
    BackdropScrollMode, Map, TileAttributes, TileIndex, VIEWPORT_HEIGHT_TILES,
    VIEWPORT_WIDTH_TILES,
};

use super::backend::TextureData;
use super::renderer::Renderer;

const ANIMATION_FRAMES: u32 = 4;
const AUTO_SCROLL_PX_PER_TICK: i32 = 1;

/// Images the map renderer needs for one level.
#[derive(Debug, Clone)]
pub struct MapRenderData {
    pub tile_set: Image,
    pub backdrop: Image,
    pub secondary_backdrop: Option<Image>,
    pub backdrop_scroll_mode: BackdropScrollMode,
}

/// Draws backdrop and tile layers relative to the camera.
pub struct MapRenderer {
    tile_set: TextureData,
    tiles_per_row: i32,
    backdrop: TextureData,
    secondary_backdrop: Option<TextureData>,
    scroll_mode: BackdropScrollMode,
    elapsed_frames: u32,
    auto_scroll_offset: i32,
}

impl MapRenderer {
    pub fn new(renderer: &mut Renderer, data: &MapRenderData) -> Self {
        let tile_set = renderer.create_texture(&data.tile_set);
        let backdrop = renderer.create_texture(&data.backdrop);
        let secondary_backdrop = data
            .secondary_backdrop
            .as_ref()
            .map(|image| renderer.create_texture(image));
        Self {
            tiles_per_row: (tile_set.width / TILE_SIZE_PX).max(1),
            tile_set,
            backdrop,
            secondary_backdrop,
            scroll_mode: data.backdrop_scroll_mode,
            elapsed_frames: 0,
            auto_scroll_offset: 0,
        }
    }

    /// Advances tile animation and backdrop auto scrolling by one logic tick.
    pub fn update_animated_map_tiles(&mut self) {
        self.elapsed_frames = self.elapsed_frames.wrapping_add(1);
        if matches!(
            self.scroll_mode,
            BackdropScrollMode::AutoHorizontal | BackdropScrollMode::AutoVertical
        ) {
            let extent = match self.scroll_mode {
                BackdropScrollMode::AutoVertical => self.backdrop.height,
                _ => self.backdrop.width,
            };
            self.auto_scroll_offset = (self.auto_scroll_offset + AUTO_SCROLL_PX_PER_TICK) % extent.max(1);
        }
    }

    /// Swaps primary and secondary backdrop. Returns false when the level
    /// has no secondary backdrop.
    pub fn switch_backdrops(&mut self) -> bool {
        match self.secondary_backdrop.as_mut() {
            Some(secondary) => {
                std::mem::swap(&mut self.backdrop, secondary);
                true
            }
            None => false,
        }
    }

    /// Tile index to draw for `tile` this frame.
    pub fn animated_tile_index(&self, tile: TileIndex, attributes: TileAttributes) -> TileIndex {
        if !attributes.contains(TileAttributes::ANIMATED) {
            return tile;
        }
        let offset = if attributes.contains(TileAttributes::FAST_ANIMATION) {
            self.elapsed_frames % ANIMATION_FRAMES
        } else {
            (self.elapsed_frames / 2) % ANIMATION_FRAMES
        };
        tile + offset as TileIndex
    }

    pub fn render_backdrop(&self, renderer: &mut Renderer, camera_position: Vector) {
        let camera_px = camera_position * TILE_SIZE_PX;
        let offset = match self.scroll_mode {
            BackdropScrollMode::None => Vector::ZERO,
            BackdropScrollMode::ParallaxBoth => Vector::new(camera_px.x / 2, camera_px.y / 2),
            BackdropScrollMode::ParallaxHorizontal => Vector::new(camera_px.x / 2, 0),
            BackdropScrollMode::AutoHorizontal => Vector::new(self.auto_scroll_offset, 0),
            BackdropScrollMode::AutoVertical => Vector::new(0, self.auto_scroll_offset),
        };

        let width = self.backdrop.width.max(1);
        let height = self.backdrop.height.max(1);
        let start = Vector::new(-offset.x.rem_euclid(width), -offset.y.rem_euclid(height));
        let source = Rect::new(0, 0, width, height);
        let view_width = VIEWPORT_WIDTH_TILES * TILE_SIZE_PX;
        let view_height = VIEWPORT_HEIGHT_TILES * TILE_SIZE_PX;

        let mut y = start.y;
        while y < view_height {
            let mut x = start.x;
            while x < view_width {
                renderer.draw_texture(&self.backdrop, source, Rect::new(x, y, width, height));
                x += width;
            }
            y += height;
        }
    }

    pub fn render_background(&self, renderer: &mut Renderer, map: &Map, camera_position: Vector) {
        self.render_map_tiles(renderer, map, camera_position, false);
    }

    pub fn render_foreground(&self, renderer: &mut Renderer, map: &Map, camera_position: Vector) {
        self.render_map_tiles(renderer, map, camera_position, true);
    }

    /// Draws one tile whose top-left tile is `position`.
    pub fn render_single_tile(
        &self,
        renderer: &mut Renderer,
        tile: TileIndex,
        position: Vector,
        camera_position: Vector,
    ) {
        let screen = (position - camera_position) * TILE_SIZE_PX;
        renderer.draw_texture(
            &self.tile_set,
            self.tile_source_rect(tile),
            Rect::new(screen.x, screen.y, TILE_SIZE_PX, TILE_SIZE_PX),
        );
    }

    fn render_map_tiles(
        &self,
        renderer: &mut Renderer,
        map: &Map,
        camera_position: Vector,
        foreground: bool,
    ) {
        for layer in 0..crate::world::LAYER_COUNT {
            for y in 0..VIEWPORT_HEIGHT_TILES {
                for x in 0..VIEWPORT_WIDTH_TILES {
                    let column = camera_position.x + x;
                    let row = camera_position.y + y;
                    if column >= map.width() || row >= map.height() {
                        continue;
                    }
                    let tile = map.tile_at(layer, column, row);
                    if tile == 0 {
                        continue;
                    }
                    let attributes = map.attribute_dict().attributes(tile);
                    if attributes.contains(TileAttributes::FOREGROUND) != foreground {
                        continue;
                    }
                    renderer.draw_texture(
                        &self.tile_set,
                        self.tile_source_rect(self.animated_tile_index(tile, attributes)),
                        Rect::new(x * TILE_SIZE_PX, y * TILE_SIZE_PX, TILE_SIZE_PX, TILE_SIZE_PX),
                    );
                }
            }
        }
    }

    fn tile_source_rect(&self, tile: TileIndex) -> Rect {
        let tile = i32::from(tile);
        Rect::new(
            (tile % self.tiles_per_row) * TILE_SIZE_PX,
            (tile / self.tiles_per_row) * TILE_SIZE_PX,
            TILE_SIZE_PX,
            TILE_SIZE_PX,
        )
    }
}

/// Solid-colour tile set used when a level names no tile set image.
pub fn placeholder_tile_set(tile_count: usize) -> Image {
    let tiles_per_row = 40;
    let rows = tile_count.div_ceil(tiles_per_row).max(1);
    let mut image = Image::filled(
        (tiles_per_row as i32 * TILE_SIZE_PX) as u32,
        (rows as i32 * TILE_SIZE_PX) as u32,
        Color::TRANSPARENT,
    );
    for tile in 1..tile_count {
        let shade = 60 + ((tile * 37) % 160) as u8;
        let color = Color::rgb(shade, shade / 2 + 40, 90);
        let left = (tile % tiles_per_row) as u32 * TILE_SIZE_PX as u32;
        let top = (tile / tiles_per_row) as u32 * TILE_SIZE_PX as u32;
        for y in 0..TILE_SIZE_PX as u32 {
            for x in 0..TILE_SIZE_PX as u32 {
                image.set_pixel(left + x, top + y, color);
            }
        }
    }
    image
}
