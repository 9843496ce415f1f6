mod activation;
mod animation;
mod camera;
mod collision;
mod components;
mod entity;
mod events;
mod lifetime;
mod map;
mod physics;
mod rng;

pub use activation::{
    mark_active_entities, viewport_rect, VIEWPORT_HEIGHT_TILES, VIEWPORT_WIDTH_TILES,
};
pub use animation::{synchronize_bounding_box_to_sprite, update_animated_sprites, virtual_to_real_frame};
pub use camera::{Camera, CameraInput};
pub use collision::{CollisionChecker, CollisionFlags};
pub use components::{
    world_space, ActivationPolicy, ActivationSettings, Active, AnimationLoop, AnimationSequence,
    AutoBoundingBox, AutoDestroy, BoundingBox, DrawTopMost, MovementSequence, MovingBody,
    Orientation, OverrideDrawOrder, RenderStrategy, Sprite, SpriteDrawData, SpriteFrame,
    WorldPosition, IGNORE_RENDER_SLOT,
};
pub use entity::{ComponentTable, Entity, EntityRegistry};
pub use events::{BusEvent, EventBus, EventContext, EventHandler};
pub use lifetime::{destroys_on_world_collision, update_life_times};
pub use map::{
    BackdropScrollMode, BackdropSwitchCondition, Map, MapError, TileAttributeDict, TileAttributes,
    TileIndex, LAYER_COUNT,
};
pub use physics::{
    apply_gravity, move_horizontally, move_vertically, CollidedWithWorld, MovementResult,
    PhysicsHost, PhysicsSystem, PhysicsView, GRAVITY_ACCELERATION, INITIAL_FALL_VELOCITY,
    TERMINAL_VELOCITY,
};
pub use rng::RandomNumberGenerator;

/// Entity registry plus the component tables the engine systems read.
///
/// Game code keeps its own tables next to this one and must route entity
/// destruction through a function that purges both.
#[derive(Debug, Default)]
pub struct EntityWorld {
    pub registry: EntityRegistry,
    pub positions: ComponentTable<WorldPosition>,
    pub bounding_boxes: ComponentTable<BoundingBox>,
    pub bodies: ComponentTable<MovingBody>,
    pub movement_sequences: ComponentTable<MovementSequence>,
    pub active: ComponentTable<Active>,
    pub activation: ComponentTable<ActivationSettings>,
    pub orientations: ComponentTable<Orientation>,
    pub sprites: ComponentTable<Sprite>,
    pub animation_loops: ComponentTable<AnimationLoop>,
    pub animation_sequences: ComponentTable<AnimationSequence>,
    pub draw_top_most: ComponentTable<DrawTopMost>,
    pub draw_order_overrides: ComponentTable<OverrideDrawOrder>,
    pub auto_bounding_boxes: ComponentTable<AutoBoundingBox>,
    pub render_strategies: ComponentTable<RenderStrategy>,
    pub auto_destroy: ComponentTable<AutoDestroy>,
}

impl EntityWorld {
    pub fn spawn(&mut self) -> Entity {
        self.registry.spawn()
    }

    pub fn spawn_at(&mut self, position: WorldPosition) -> Entity {
        let entity = self.registry.spawn();
        self.positions.insert(entity, position);
        entity
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    /// Destroys the entity and drops every engine component it holds.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.registry.is_alive(entity) {
            return false;
        }
        self.positions.remove(entity);
        self.bounding_boxes.remove(entity);
        self.bodies.remove(entity);
        self.movement_sequences.remove(entity);
        self.active.remove(entity);
        self.activation.remove(entity);
        self.orientations.remove(entity);
        self.sprites.remove(entity);
        self.animation_loops.remove(entity);
        self.animation_sequences.remove(entity);
        self.draw_top_most.remove(entity);
        self.draw_order_overrides.remove(entity);
        self.auto_bounding_boxes.remove(entity);
        self.render_strategies.remove(entity);
        self.auto_destroy.remove(entity);
        self.registry.destroy(entity)
    }

    pub fn end_tick(&mut self) {
        self.registry.end_tick();
    }

    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    pub fn world_bbox(&self, entity: Entity) -> Option<crate::base::Rect> {
        let position = self.positions.get(entity)?;
        let bbox = self.bounding_boxes.get(entity)?;
        Some(world_space(bbox, *position))
    }

    pub fn is_on_screen(&self, entity: Entity) -> bool {
        self.active
            .get(entity)
            .is_some_and(|active| active.is_on_screen)
    }
}
