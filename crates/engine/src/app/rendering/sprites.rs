use crate::base::{
    pixels_to_tiles, tile_extents_to_pixel_extents, tile_vector_to_pixel_vector, Color, Rect,
    Vector,
};
use crate::world::{
    virtual_to_real_frame, world_space, Entity, EntityWorld, Map, RenderStrategy, SpriteFrame,
    WorldPosition, IGNORE_RENDER_SLOT,
};

use super::backend::TextureData;
use super::map_renderer::MapRenderer;
use super::renderer::{RenderTargetBinder, RenderTargetTexture, Renderer};
use super::transform::INGAME_VIEWPORT_SIZE_PX;
use super::water::WATER_ANIM_STEPS;

const TRANSLUCENT_MODULATION: Color = Color::rgba(255, 255, 255, 130);

#[derive(Debug, Clone, Copy)]
struct SpriteDrawEntry {
    entity: Entity,
    position: WorldPosition,
    draw_order: i32,
    draw_top_most: bool,
}

/// Draws the in-game world: backdrop, tile layers, sprites and water.
///
/// Everything behind the foreground layer is drawn into an in-game render
/// target first, so the water effect can sample it.
pub struct RenderingSystem {
    render_target: RenderTargetTexture,
    map_renderer: MapRenderer,
    water_anim_step: i32,
    sprites_rendered: usize,
    draw_list: Vec<SpriteDrawEntry>,
}

impl RenderingSystem {
    pub fn new(renderer: &mut Renderer, map_renderer: MapRenderer) -> Self {
        let render_target = renderer.create_render_target_texture(
            INGAME_VIEWPORT_SIZE_PX.width,
            INGAME_VIEWPORT_SIZE_PX.height,
        );
        Self {
            render_target,
            map_renderer,
            water_anim_step: 0,
            sprites_rendered: 0,
            draw_list: Vec::new(),
        }
    }

    pub fn map_renderer(&self) -> &MapRenderer {
        &self.map_renderer
    }

    pub fn map_renderer_mut(&mut self) -> &mut MapRenderer {
        &mut self.map_renderer
    }

    pub fn sprites_rendered(&self) -> usize {
        self.sprites_rendered
    }

    pub fn water_anim_step(&self) -> i32 {
        self.water_anim_step
    }

    /// Per logic tick: advances map tile animation and the water surface.
    pub fn update_animations(&mut self) {
        self.map_renderer.update_animated_map_tiles();
        self.water_anim_step = (self.water_anim_step + 1) % WATER_ANIM_STEPS;
    }

    pub fn update(
        &mut self,
        renderer: &mut Renderer,
        world: &EntityWorld,
        map: &Map,
        camera_position: Vector,
        backdrop_flash_color: Option<Color>,
    ) {
        self.collect_sprites(world);
        let first_top_most = self
            .draw_list
            .iter()
            .position(|entry| entry.draw_top_most)
            .unwrap_or(self.draw_list.len());

        {
            let mut bound = RenderTargetBinder::new(renderer, self.render_target);
            match backdrop_flash_color {
                Some(color) => {
                    bound.set_overlay_color(color);
                    self.map_renderer.render_backdrop(&mut bound, camera_position);
                    bound.set_overlay_color(Color::TRANSPARENT);
                }
                None => self.map_renderer.render_backdrop(&mut bound, camera_position),
            }

            self.map_renderer
                .render_background(&mut bound, map, camera_position);

            for entry in &self.draw_list[..first_top_most] {
                render_sprite(&mut bound, world, entry, camera_position);
            }
        }

        self.render_target.render(renderer, 0, 0);

        self.render_water_effect_areas(renderer, world, camera_position);

        self.map_renderer
            .render_foreground(renderer, map, camera_position);

        for entry in &self.draw_list[first_top_most..] {
            render_sprite(renderer, world, entry, camera_position);
        }
        self.sprites_rendered = self.draw_list.len();

        for (entity, strategy) in world.render_strategies.iter(&world.registry) {
            let RenderStrategy::TileDebris { tile_index } = *strategy else {
                continue;
            };
            if let Some(position) = world.positions.get(entity) {
                self.map_renderer
                    .render_single_tile(renderer, tile_index, *position, camera_position);
            }
        }
    }

    /// Sprites sorted by (top most, draw order). The sort is stable, so
    /// equal keys keep entity index order.
    fn collect_sprites(&mut self, world: &EntityWorld) {
        self.draw_list.clear();
        for (entity, sprite) in world.sprites.iter(&world.registry) {
            let Some(position) = world.positions.get(entity) else {
                continue;
            };
            let draw_order = world
                .draw_order_overrides
                .get(entity)
                .map_or(sprite.draw_data.draw_order, |order| order.0);
            self.draw_list.push(SpriteDrawEntry {
                entity,
                position: *position,
                draw_order,
                draw_top_most: world.draw_top_most.contains(entity),
            });
        }
        self.draw_list
            .sort_by_key(|entry| (entry.draw_top_most, entry.draw_order));
    }

    fn render_water_effect_areas(
        &self,
        renderer: &mut Renderer,
        world: &EntityWorld,
        camera_position: Vector,
    ) {
        for (entity, strategy) in world.render_strategies.iter(&world.registry) {
            let RenderStrategy::WaterArea { animated_surface } = *strategy else {
                continue;
            };
            let (Some(position), Some(bbox)) =
                (world.positions.get(entity), world.bounding_boxes.get(entity))
            else {
                continue;
            };
            let screen_box = world_space(bbox, *position - camera_position);
            let top_left = tile_vector_to_pixel_vector(screen_box.top_left);
            let size = tile_extents_to_pixel_extents(screen_box.size);
            renderer.draw_water_effect(
                Rect { top_left, size },
                self.render_target.data(),
                animated_surface.then_some(self.water_anim_step),
            );
        }
    }
}

fn render_sprite(
    renderer: &mut Renderer,
    world: &EntityWorld,
    entry: &SpriteDrawEntry,
    camera_position: Vector,
) {
    let Some(sprite) = world.sprites.get(entry.entity) else {
        return;
    };
    if !sprite.show || world.render_strategies.contains(entry.entity) {
        return;
    }

    let orientation = world.orientations.get(entry.entity).copied();
    for &base_frame in &sprite.frames_to_render {
        if base_frame == IGNORE_RENDER_SLOT {
            continue;
        }
        assert!(
            base_frame < sprite.num_frames(),
            "frame {base_frame} out of range for sprite"
        );
        let frame_index = virtual_to_real_frame(base_frame, &sprite.draw_data, orientation);

        if sprite.flashing_white {
            renderer.set_overlay_color(Color::WHITE);
        } else if sprite.translucent {
            renderer.set_color_modulation(TRANSLUCENT_MODULATION);
        }

        let frame = &sprite.draw_data.frames[frame_index as usize];
        draw_sprite_frame(renderer, frame, entry.position - camera_position);

        renderer.set_overlay_color(Color::TRANSPARENT);
        renderer.set_color_modulation(Color::WHITE);
    }
}

/// Draws `frame` with its bottom-left tile at `position` (screen tiles).
pub fn draw_sprite_frame(renderer: &mut Renderer, frame: &SpriteFrame, position: Vector) {
    let height_tiles = pixels_to_tiles(frame.image.height);
    let top_left = position - Vector::new(0, height_tiles - 1);
    let top_left_px = tile_vector_to_pixel_vector(top_left + frame.draw_offset);
    render_full_texture(renderer, &frame.image, top_left_px);
}

fn render_full_texture(renderer: &mut Renderer, texture: &TextureData, top_left: Vector) {
    let source = Rect::new(0, 0, texture.width, texture.height);
    renderer.draw_texture(texture, source, source.translated(top_left));
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::app::rendering::backend::{BackendCall, CallLog, RecordingBackend, RenderMode};
    use crate::app::rendering::map_renderer::MapRenderData;
    use crate::base::{Extents, Image};
    use crate::world::{
        BackdropScrollMode, DrawTopMost, OverrideDrawOrder, Sprite, SpriteDrawData,
        TileAttributeDict, TileAttributes,
    };

    struct Fixture {
        renderer: Renderer,
        log: CallLog,
        system: RenderingSystem,
        map: Map,
        world: EntityWorld,
    }

    fn fixture() -> Fixture {
        let backend = RecordingBackend::new();
        let log = backend.log();
        let mut renderer = Renderer::new(Box::new(backend), Extents::new(640, 480));
        let map_renderer = MapRenderer::new(
            &mut renderer,
            &MapRenderData {
                tile_set: Image::filled(320, 8, Color::WHITE),
                backdrop: Image::filled(320, 200, Color::BLACK),
                secondary_backdrop: None,
                backdrop_scroll_mode: BackdropScrollMode::None,
            },
        );
        let system = RenderingSystem::new(&mut renderer, map_renderer);
        let map = Map::new(64, 32, TileAttributeDict::new(vec![TileAttributes::NONE])).expect("map");
        log.clear();
        Fixture {
            renderer,
            log,
            system,
            map,
            world: EntityWorld::default(),
        }
    }

    fn draw_data(renderer: &mut Renderer, draw_order: i32) -> Rc<SpriteDrawData> {
        let image = renderer.create_texture(&Image::filled(16, 16, Color::WHITE));
        Rc::new(SpriteDrawData {
            frames: vec![SpriteFrame {
                image,
                draw_offset: Vector::ZERO,
            }],
            draw_order,
            ..SpriteDrawData::default()
        })
    }

    fn spawn_sprite(world: &mut EntityWorld, data: &Rc<SpriteDrawData>, position: Vector) -> Entity {
        let entity = world.spawn_at(position);
        world
            .sprites
            .insert(entity, Sprite::new(Rc::clone(data), vec![0]));
        entity
    }

    fn sprite_textures(log: &CallLog) -> Vec<crate::app::rendering::TextureId> {
        log.submissions()
            .into_iter()
            .filter(|submission| submission.mode == RenderMode::SpriteBatch)
            .filter_map(|submission| submission.texture)
            .collect()
    }

    #[test]
    fn sprites_are_drawn_in_draw_order_with_top_most_last() {
        let mut f = fixture();
        let back = draw_data(&mut f.renderer, 5);
        let front = draw_data(&mut f.renderer, 1);
        let top = draw_data(&mut f.renderer, 0);
        spawn_sprite(&mut f.world, &back, Vector::new(2, 5));
        spawn_sprite(&mut f.world, &front, Vector::new(4, 5));
        let top_most = spawn_sprite(&mut f.world, &top, Vector::new(6, 5));
        f.world.draw_top_most.insert(top_most, DrawTopMost);
        f.log.clear();

        f.system
            .update(&mut f.renderer, &f.world, &f.map, Vector::ZERO, None);
        f.renderer.submit_batch();

        let textures = sprite_textures(&f.log);
        let front_index = textures.iter().position(|t| *t == front.frames[0].image.handle);
        let back_index = textures.iter().position(|t| *t == back.frames[0].image.handle);
        let top_index = textures.iter().position(|t| *t == top.frames[0].image.handle);
        assert!(front_index < back_index);
        assert!(back_index < top_index);
        assert_eq!(f.system.sprites_rendered(), 3);
    }

    #[test]
    fn override_draw_order_wins_over_draw_data() {
        let mut f = fixture();
        let a = draw_data(&mut f.renderer, 1);
        let b = draw_data(&mut f.renderer, 2);
        let first = spawn_sprite(&mut f.world, &a, Vector::new(2, 5));
        spawn_sprite(&mut f.world, &b, Vector::new(4, 5));
        f.world.draw_order_overrides.insert(first, OverrideDrawOrder(10));

        f.system.collect_sprites(&f.world);
        let order: Vec<i32> = f.system.draw_list.iter().map(|entry| entry.draw_order).collect();
        assert_eq!(order, vec![2, 10]);
    }

    #[test]
    fn hidden_sprites_and_ignored_slots_are_skipped() {
        let mut f = fixture();
        let data = draw_data(&mut f.renderer, 0);
        let hidden = spawn_sprite(&mut f.world, &data, Vector::new(2, 5));
        f.world.sprites.get_mut(hidden).expect("sprite").show = false;
        let ignored = spawn_sprite(&mut f.world, &data, Vector::new(4, 5));
        f.world.sprites.get_mut(ignored).expect("sprite").frames_to_render = vec![IGNORE_RENDER_SLOT];
        f.log.clear();

        f.system
            .update(&mut f.renderer, &f.world, &f.map, Vector::ZERO, None);
        f.renderer.submit_batch();

        assert!(!sprite_textures(&f.log).contains(&data.frames[0].image.handle));
    }

    #[test]
    fn flashing_sprite_uses_white_overlay() {
        let mut f = fixture();
        let data = draw_data(&mut f.renderer, 0);
        let entity = spawn_sprite(&mut f.world, &data, Vector::new(2, 5));
        let sprite = f.world.sprites.get_mut(entity).expect("sprite");
        sprite.flash_white();
        sprite.translucent = true;
        f.log.clear();

        f.system
            .update(&mut f.renderer, &f.world, &f.map, Vector::ZERO, None);
        f.renderer.submit_batch();

        let flashed = f
            .log
            .submissions()
            .into_iter()
            .find(|submission| submission.texture == Some(data.frames[0].image.handle))
            .expect("sprite submission");
        assert_eq!(flashed.uniforms.overlay_color, Color::WHITE);
        assert_eq!(flashed.uniforms.color_modulation, Color::WHITE);
    }

    #[test]
    fn sprite_frame_is_anchored_at_bottom_left() {
        let mut f = fixture();
        let data = draw_data(&mut f.renderer, 0);
        f.log.clear();

        draw_sprite_frame(&mut f.renderer, &data.frames[0], Vector::new(3, 5));
        f.renderer.submit_batch();

        let vertices = &f.log.submissions()[0].vertices;
        // 16px tall frame covers tile rows 4 and 5
        assert_eq!(&vertices[4..6], &[24.0, 32.0]);
    }

    #[test]
    fn water_area_is_drawn_after_in_game_target_composite() {
        let mut f = fixture();
        let water = f.world.spawn_at(Vector::new(1, 3));
        f.world.bounding_boxes.insert(water, Rect::new(0, 0, 4, 2));
        f.world
            .render_strategies
            .insert(water, RenderStrategy::WaterArea { animated_surface: true });
        f.system.update_animations();
        f.log.clear();

        f.system
            .update(&mut f.renderer, &f.world, &f.map, Vector::ZERO, None);
        f.renderer.submit_batch();

        let calls = f.log.calls();
        let unbind = calls
            .iter()
            .rposition(|call| matches!(call, BackendCall::BindRenderTarget { target: None, .. }))
            .expect("default target restored");
        let water_submit = calls
            .iter()
            .position(|call| {
                matches!(call, BackendCall::Submit(submission) if submission.mode == RenderMode::WaterEffect)
            })
            .expect("water submission");
        assert!(water_submit > unbind);

        let BackendCall::Submit(submission) = &calls[water_submit] else {
            unreachable!();
        };
        // area spans tiles (1,2)..(4,3) → pixels (8,16) size 32x16
        assert_eq!(&submission.vertices[6..8], &[8.0, 16.0]);
        assert_eq!(f.system.water_anim_step(), 1);
    }
}
