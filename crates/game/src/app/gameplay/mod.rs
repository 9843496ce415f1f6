use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use dn2_engine::app::rendering::{
    game_screen_upscale, MapRenderer, RenderingSystem, INGAME_VIEWPORT_OFFSET,
    INGAME_VIEWPORT_SIZE_PX,
};
use dn2_engine::app::{FixedStepClock, InputAccumulator, InputSnapshot};
use dn2_engine::assets::LevelData;
use dn2_engine::base::{
    tile_extents_to_pixel_extents, tile_vector_to_pixel_vector, Color, Extents, PointF, Rect,
    Vector, TILE_SIZE_PX,
};
use dn2_engine::world::{
    destroys_on_world_collision, mark_active_entities, move_horizontally,
    synchronize_bounding_box_to_sprite, update_animated_sprites, update_life_times, world_space,
    ActivationPolicy, ActivationSettings, Active, AnimationLoop, AutoDestroy,
    BackdropSwitchCondition, BoundingBox, BusEvent, Camera, CameraInput, CollidedWithWorld,
    CollisionChecker, CollisionFlags, ComponentTable, Entity, EntityWorld, EventBus,
    EventContext, Map, MovementResult, MovementSequence, MovingBody, Orientation,
    OverrideDrawOrder, PhysicsHost, PhysicsSystem, PhysicsView, RandomNumberGenerator,
    RenderStrategy, Sprite, SpriteDrawData, SpriteFrame, TileAttributes, TileIndex,
    WorldPosition, LAYER_COUNT, VIEWPORT_HEIGHT_TILES, VIEWPORT_WIDTH_TILES,
};
use dn2_engine::{
    AssetError, AssetProvider, GameMode, InputAction, InputEvent, ModeContext, Renderer, SoundId,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::bootstrap::GameSettings;
use super::menu::MenuMode;
use super::profile::{episode_for_level, HighScoreEntry, SavedGame, SavedWeapon};

const PLAYER_MAX_HEALTH: i32 = 9;
const PLAYER_MAX_SCORE: i32 = 9_999_999;

include!("types.rs");
include!("session.rs");
include!("behaviors.rs");
include!("player.rs");
include!("interaction.rs");
include!("combat.rs");
include!("effects.rs");
include!("systems.rs");
include!("debug.rs");
include!("ingame.rs");
