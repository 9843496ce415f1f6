use super::*;
use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};

use dn2_engine::app::rendering::{placeholder_tile_set, MapRenderData, RecordingBackend};
use dn2_engine::app::{FrameOrchestrator, RecordingAudio};
use dn2_engine::assets::{ActorData, LevelActor};
use dn2_engine::base::Image;
use dn2_engine::world::{BackdropScrollMode, TileAttributeDict};
use dn2_engine::FileAssetProvider;

use crate::app::profile::UserProfile;

const MAP_WIDTH: i32 = 40;
const MAP_HEIGHT: i32 = 20;
const FLOOR_TILE: TileIndex = 1;
const WATER_TILE: TileIndex = 2;
const FLAMMABLE_TILE: TileIndex = 3;

fn test_map() -> Map {
    let dict = TileAttributeDict::new(vec![
        TileAttributes::NONE,
        TileAttributes::SOLID,
        TileAttributes::WATER,
        TileAttributes::SOLID.union(TileAttributes::FLAMMABLE),
    ]);
    let mut map = Map::new(MAP_WIDTH, MAP_HEIGHT, dict).expect("map");
    for x in 0..MAP_WIDTH {
        map.set_tile_at(0, x, MAP_HEIGHT - 1, FLOOR_TILE);
    }
    map
}

fn level_with(map: Map, actors: &[(&str, i32, i32)]) -> LevelData {
    LevelData {
        name: "test".to_string(),
        map,
        actors: actors
            .iter()
            .map(|(kind, x, y)| LevelActor {
                kind: kind.to_string(),
                position: Vector::new(*x, *y),
            })
            .collect(),
        render_data: MapRenderData {
            tile_set: placeholder_tile_set(4),
            backdrop: Image::filled(8, 8, Color::BLACK),
            secondary_backdrop: None,
            backdrop_scroll_mode: BackdropScrollMode::None,
        },
        music: None,
        earthquake: false,
    }
}

fn session_from(map: Map, actors: &[(&str, i32, i32)]) -> LevelSession {
    LevelSession::new(
        level_with(map, actors),
        ActorCatalog::default(),
        PlayerModel::default(),
        1,
    )
    .expect("session")
}

/// Player standing on the floor at (2, 18) plus `actors`.
fn session_with(actors: &[(&str, i32, i32)]) -> LevelSession {
    let mut all = vec![("duke", 2, 18)];
    all.extend_from_slice(actors);
    session_from(test_map(), &all)
}

fn input_pressing(actions: &[InputAction]) -> InputSnapshot {
    let mut accumulator = InputAccumulator::default();
    for action in actions {
        accumulator.handle_event(&InputEvent::pressed(*action));
    }
    accumulator.snapshot_for_tick()
}

fn entity_at(session: &LevelSession, position: Vector) -> Entity {
    session
        .world
        .positions
        .iter(&session.world.registry)
        .find(|(entity, at)| **at == position && *entity != session.player.entity)
        .map(|(entity, _)| entity)
        .expect("entity at position")
}

fn shoot_at(session: &mut LevelSession, position: Vector, direction: Orientation) -> Entity {
    let shot = session.spawn_player_projectile(ProjectileType::Regular, position, direction);
    update_damage_infliction(session);
    shot
}

#[test]
fn systems_run_in_fixed_order() {
    let mut session = session_with(&[]);
    let mut host = GameplaySystemsHost::default();
    host.run_once_per_tick(&mut session, InputSnapshot::empty(), None);

    let names: Vec<&str> = host.last_tick_order.iter().map(|id| id.name()).collect();
    assert_eq!(
        names,
        vec![
            "AnimatedMapTiles",
            "AnimatedSprites",
            "PlayerInteraction",
            "Player",
            "Camera",
            "MarkActiveEntities",
            "Elevator",
            "RadarComputer",
            "Behaviors",
            "PhysicsPhase1",
            "ItemCollection",
            "PlayerDamage",
            "DamageInfliction",
            "ItemContainers",
            "PlayerProjectiles",
            "Effects",
            "Lifetime",
            "PhysicsPhase2",
            "Particles",
        ]
    );
    assert_eq!(session.tick_count, 1);
    assert!(session.is_odd_frame);
}

#[test]
fn enemy_kinds_update_in_fixed_order() {
    assert_eq!(AI_UPDATE_ORDER[0], BehaviorKind::LaserTurret);
    assert_eq!(AI_UPDATE_ORDER[6], BehaviorKind::RigelatinSoldier);
    assert!(!AI_UPDATE_ORDER.contains(&BehaviorKind::Elevator));
    assert!(!AI_UPDATE_ORDER.contains(&BehaviorKind::RadarComputer));
}

#[test]
fn level_without_player_fails_to_load() {
    let level = level_with(test_map(), &[("skeleton", 5, 18)]);
    let result = LevelSession::new(level, ActorCatalog::default(), PlayerModel::default(), 1);
    assert!(matches!(
        result,
        Err(LevelLoadError::MissingPlayer { level }) if level == "test"
    ));
}

#[test]
fn unknown_level_actors_are_skipped() {
    let session = session_with(&[("flying_saucer", 5, 18)]);
    assert_eq!(session.world.entity_count(), 1);
}

#[test]
fn asset_ids_cover_every_placeable_kind() {
    let ids = ActorKind::all_asset_ids();
    for kind in ActorKind::PLACEABLE {
        assert!(ids.contains(&kind.asset_id()), "{}", kind.level_name());
        assert_eq!(ActorKind::from_level_name(kind.level_name()), Some(kind));
    }
    assert!(ids.contains(&"white_box"));
    assert!(!ids.contains(&"white_box_rapid_fire"));
}

#[test]
fn score_is_split_into_number_sprites() {
    assert_eq!(
        score_number_breakdown(2600),
        vec![
            ScoreNumberType::S2000,
            ScoreNumberType::S500,
            ScoreNumberType::S100
        ]
    );
    assert!(score_number_breakdown(50).is_empty());
}

#[test]
fn score_is_capped() {
    let mut model = PlayerModel::with_score(PLAYER_MAX_SCORE - 10);
    model.give_score(500);
    assert_eq!(model.score, PLAYER_MAX_SCORE);
}

#[test]
fn letters_in_order_give_bonus() {
    let mut session = session_with(&[]);
    let position = Vector::new(6, 10);
    for letter in [
        CollectableLetter::N,
        CollectableLetter::U,
        CollectableLetter::K,
        CollectableLetter::E,
    ] {
        collect_letter(&mut session, letter, position);
    }
    assert_eq!(session.model.score, 4 * BASIC_LETTER_COLLECTION_SCORE);
    assert!(session.messages.is_empty());

    collect_letter(&mut session, CollectableLetter::M, position);
    assert_eq!(
        session.model.score,
        4 * BASIC_LETTER_COLLECTION_SCORE + CORRECT_LETTER_COLLECTION_SCORE
    );
    assert_eq!(session.messages, vec![MESSAGE_LETTERS_IN_ORDER.to_string()]);
    assert!(session.take_sounds().contains(&SOUND_LETTERS_IN_ORDER));
}

#[test]
fn letters_out_of_order_only_give_basic_score() {
    let mut session = session_with(&[]);
    let position = Vector::new(6, 10);
    for letter in [
        CollectableLetter::U,
        CollectableLetter::N,
        CollectableLetter::K,
        CollectableLetter::E,
        CollectableLetter::M,
    ] {
        collect_letter(&mut session, letter, position);
    }
    assert_eq!(session.model.score, 5 * BASIC_LETTER_COLLECTION_SCORE);
    assert_eq!(session.messages, vec![MESSAGE_LETTERS_WRONG_ORDER.to_string()]);
    assert!(!session.take_sounds().contains(&SOUND_LETTERS_IN_ORDER));
}

#[test]
fn letters_three_in_order_then_one_wrong_get_basic_score_only() {
    let mut session = session_with(&[]);
    let position = Vector::new(6, 10);
    let mut totals = Vec::new();
    for letter in [
        CollectableLetter::N,
        CollectableLetter::U,
        CollectableLetter::K,
        CollectableLetter::M,
        CollectableLetter::E,
    ] {
        collect_letter(&mut session, letter, position);
        totals.push(session.model.score);
    }

    // In-order prefixes earn nothing extra; only a full N-U-K-E-M does.
    assert_eq!(totals, vec![10_100, 20_200, 30_300, 40_400, 50_500]);
    assert!(session.model.score < CORRECT_LETTER_COLLECTION_SCORE);
    assert_eq!(session.messages, vec![MESSAGE_LETTERS_WRONG_ORDER.to_string()]);
    assert!(!session.take_sounds().contains(&SOUND_LETTERS_IN_ORDER));
}

#[test]
fn health_molecule_scores_more_at_full_health() {
    let mut session = session_with(&[("health_molecule", 3, 18)]);
    let molecule = entity_at(&session, Vector::new(3, 18));
    update_item_collection(&mut session);

    assert_eq!(session.model.score, 500);
    assert_eq!(session.model.health, PLAYER_MAX_HEALTH);
    assert!(!session.world.is_alive(molecule));
    assert!(session.take_sounds().contains(&SOUND_HEALTH_PICKUP));
}

#[test]
fn health_molecule_heals_wounded_player() {
    let mut session = session_with(&[("health_molecule", 3, 18)]);
    session.model.health = 5;
    update_item_collection(&mut session);

    assert_eq!(session.model.score, 100);
    assert_eq!(session.model.health, 6);
}

#[test]
fn items_out_of_reach_stay() {
    let mut session = session_with(&[("blue_globe", 20, 18)]);
    let globe = entity_at(&session, Vector::new(20, 18));
    update_item_collection(&mut session);

    assert_eq!(session.model.score, 0);
    assert!(session.world.is_alive(globe));
}

#[test]
fn hint_globe_pickup_shows_message() {
    let mut session = session_with(&[("hint_globe", 3, 18)]);
    update_item_collection(&mut session);

    assert!(session.model.has_item(InventoryItem::SpecialHintGlobe));
    assert_eq!(session.messages, vec![MESSAGE_FOUND_HINT_GLOBE.to_string()]);
}

#[test]
fn hint_machine_consumes_globe() {
    let mut session = session_with(&[("hint_machine", 3, 18)]);
    session.model.give_item(InventoryItem::SpecialHintGlobe);
    update_player_interaction(&mut session);

    assert_eq!(session.model.score, HINT_MACHINE_ACTIVATION_SCORE);
    assert!(!session.model.has_item(InventoryItem::SpecialHintGlobe));
    assert!(session.components.interactables.is_empty());
    assert_eq!(session.messages, vec![MESSAGE_HINT.to_string()]);

    update_player_interaction(&mut session);
    assert_eq!(session.model.score, HINT_MACHINE_ACTIVATION_SCORE);
}

#[test]
fn hint_machine_ignores_player_without_globe() {
    let mut session = session_with(&[("hint_machine", 3, 18)]);
    session.input = input_pressing(&[InputAction::MoveUp]);
    update_player_interaction(&mut session);

    assert_eq!(session.model.score, 0);
    assert_eq!(session.components.interactables.len(), 1);
}

#[test]
fn single_teleporter_acts_as_exit() {
    let mut session = session_with(&[("teleporter", 2, 18), ("radar_dish", 20, 10)]);
    session.input = input_pressing(&[InputAction::MoveUp]);
    update_player_interaction(&mut session);

    assert_eq!(session.outcome, Some(LevelOutcome::Completed));
    assert!(session.take_sounds().contains(&SOUND_TELEPORT));
}

#[test]
fn teleporter_needs_up_press() {
    let mut session = session_with(&[("teleporter", 2, 18)]);
    update_player_interaction(&mut session);
    assert_eq!(session.outcome, None);
}

#[test]
fn teleporter_pair_moves_player() {
    let mut session = session_with(&[("teleporter", 2, 18), ("teleporter", 30, 18)]);
    session.input = input_pressing(&[InputAction::MoveUp]);
    update_player_interaction(&mut session);

    assert_eq!(session.player_position(), Vector::new(31, 18));
    assert_eq!(session.outcome, None);
    assert!(!session.backdrop_switch_pending);
}

#[test]
fn teleporting_requests_backdrop_switch_when_configured() {
    let map = test_map()
        .with_backdrop_modes(BackdropScrollMode::None, BackdropSwitchCondition::OnTeleportation);
    let mut session = session_from(
        map,
        &[("duke", 2, 18), ("teleporter", 2, 18), ("teleporter", 30, 18)],
    );
    session.input = input_pressing(&[InputAction::MoveUp]);
    update_player_interaction(&mut session);

    assert!(session.backdrop_switch_pending);
}

#[test]
fn exit_is_blocked_while_radar_dishes_remain() {
    let mut session = session_with(&[("level_exit", 3, 18), ("radar_dish", 20, 10)]);
    update_player_interaction(&mut session);
    update_player_interaction(&mut session);

    assert_eq!(session.outcome, None);
    assert_eq!(
        session.messages,
        vec![MESSAGE_RADAR_DISHES_REMAIN.to_string()]
    );

    let dish = entity_at(&session, Vector::new(20, 10));
    session.destroy_entity(dish);
    update_player_interaction(&mut session);
    assert_eq!(session.outcome, Some(LevelOutcome::Completed));
}

#[test]
fn shots_damage_then_kill_enemies() {
    let mut session = session_with(&[("skeleton", 10, 18)]);
    let skeleton = entity_at(&session, Vector::new(10, 18));

    let first = shoot_at(&mut session, Vector::new(10, 18), Orientation::Right);
    assert!(!session.world.is_alive(first));
    assert!(session.world.is_alive(skeleton));
    assert_eq!(
        session.components.shootables.get(skeleton).map(|s| s.health),
        Some(1)
    );
    assert_eq!(session.model.score, 0);
    assert!(session.take_sounds().contains(&SOUND_ENEMY_HIT));

    shoot_at(&mut session, Vector::new(10, 18), Orientation::Right);
    assert!(!session.world.is_alive(skeleton));
    assert_eq!(session.model.score, 100);
    assert!(session.take_sounds().contains(&SOUND_EXPLOSION));
    assert_eq!(session.particles.groups.len(), 1);
}

#[test]
fn invincible_shootables_ignore_shots() {
    let mut session = session_with(&[("aggressive_prisoner", 10, 18)]);
    let prisoner = entity_at(&session, Vector::new(10, 18));
    let shot = shoot_at(&mut session, Vector::new(10, 18), Orientation::Right);

    assert!(session.world.is_alive(shot));
    assert_eq!(
        session.components.shootables.get(prisoner).map(|s| s.health),
        Some(1)
    );
}

#[test]
fn laser_shots_pass_through() {
    let mut session = session_with(&[("skeleton", 10, 18)]);
    let shot =
        session.spawn_player_projectile(ProjectileType::Laser, Vector::new(10, 18), Orientation::Right);
    update_damage_infliction(&mut session);

    assert!(session.world.is_alive(shot));
    assert_eq!(session.model.score, 100);
}

#[test]
fn spike_ball_is_pushed_away_by_shots() {
    let mut session = session_with(&[("spike_ball", 10, 17)]);
    let ball = entity_at(&session, Vector::new(10, 17));

    shoot_at(&mut session, Vector::new(10, 17), Orientation::Left);
    let velocity = session.world.bodies.get(ball).map(|body| body.velocity.x);
    assert_eq!(velocity, Some(-1.0));

    shoot_at(&mut session, Vector::new(10, 17), Orientation::Right);
    let velocity = session.world.bodies.get(ball).map(|body| body.velocity.x);
    assert_eq!(velocity, Some(1.0));
}

#[test]
fn spike_ball_rebounds_off_walls_and_ceiling() {
    let mut session = session_with(&[("spike_ball", 10, 17)]);
    let ball = entity_at(&session, Vector::new(10, 17));
    assert!(session.world.movement_sequences.contains(ball));

    session.emit(GameEvent::CollidedWithWorld(CollidedWithWorld {
        entity: ball,
        left: true,
        right: false,
        top: false,
        bottom: false,
    }));
    assert_eq!(
        session.world.bodies.get(ball).map(|body| body.velocity.x),
        Some(1.0)
    );

    session.emit(GameEvent::CollidedWithWorld(CollidedWithWorld {
        entity: ball,
        left: false,
        right: false,
        top: true,
        bottom: false,
    }));
    assert!(!session.world.movement_sequences.contains(ball));
    assert_eq!(
        session.world.bodies.get(ball).map(|body| body.velocity.y),
        Some(0.0)
    );
}

#[test]
fn destroyed_box_releases_its_contents() {
    let mut session = session_with(&[("white_box_health_molecule", 10, 18)]);
    let item_box = entity_at(&session, Vector::new(10, 18));

    shoot_at(&mut session, Vector::new(10, 18), Orientation::Right);
    assert!(!session.world.is_alive(item_box));
    assert_eq!(session.model.score, ITEM_BOX_SCORE);
    assert_eq!(session.pending_container_releases.len(), 1);

    update_item_containers(&mut session);
    assert!(session.pending_container_releases.is_empty());
    let released: Vec<(Entity, CollectableItem)> = session
        .components
        .collectables
        .iter(&session.world.registry)
        .map(|(entity, item)| (entity, *item))
        .collect();
    assert_eq!(released.len(), 1);
    let (item, contents) = released[0];
    assert_eq!(contents.given_health, Some(1));
    assert_eq!(session.world.positions.get(item).copied(), Some(Vector::new(10, 18)));
    assert!(session.world.movement_sequences.contains(item));
}

#[test]
fn mercy_frames_absorb_repeated_hits() {
    let mut session = session_with(&[("skeleton", 3, 18)]);
    update_player_damage(&mut session);
    assert_eq!(session.model.health, PLAYER_MAX_HEALTH - 1);
    assert_eq!(session.player.mercy_frames_left, PLAYER_MERCY_FRAMES);

    update_player_damage(&mut session);
    assert_eq!(session.model.health, PLAYER_MAX_HEALTH - 1);

    session.player.mercy_frames_left = 0;
    update_player_damage(&mut session);
    assert_eq!(session.model.health, PLAYER_MAX_HEALTH - 2);
}

#[test]
fn enemy_projectile_is_destroyed_on_contact() {
    let mut session = session_with(&[]);
    let rocket =
        session.spawn_enemy_projectile(ActorKind::EnemyRocket, Vector::new(3, 16), PointF::ZERO);
    update_player_damage(&mut session);

    assert!(!session.world.is_alive(rocket));
    assert_eq!(session.model.health, PLAYER_MAX_HEALTH - 1);
}

#[test]
fn dying_player_ends_level_after_death_sequence() {
    let mut session = session_with(&[]);
    session.model.health = 1;
    damage_player(&mut session, 1);
    assert!(session.player.is_dead());
    assert_eq!(session.outcome, None);

    let mut host = GameplaySystemsHost::default();
    for _ in 0..PLAYER_DEATH_FRAMES {
        host.run_once_per_tick(&mut session, InputSnapshot::empty(), None);
    }
    assert_eq!(session.player.state, PlayerState::Dead);
    assert_eq!(session.outcome, Some(LevelOutcome::PlayerDied));
}

#[test]
fn camera_stops_following_once_player_dies() {
    let mut session = session_with(&[]);
    let start = session.camera.position();
    let entity = session.player.entity;

    *session.world.positions.get_mut(entity).expect("player position") = Vector::new(38, 18);
    update_camera(&mut session);
    let followed = session.camera.position();
    assert!(followed.x > start.x);

    session.model.health = 1;
    damage_player(&mut session, 1);
    *session.world.positions.get_mut(entity).expect("player position") = Vector::new(2, 18);
    update_camera(&mut session);
    assert_eq!(session.camera.position(), followed);
}

#[test]
fn sliding_door_blocks_walking() {
    let mut session = session_with(&[("sliding_door", 5, 18)]);
    assert!(!walk_player(&mut session, Orientation::Right));
    assert_eq!(session.player_position(), Vector::new(2, 18));

    assert!(walk_player(&mut session, Orientation::Left));
    assert_eq!(session.player_position(), Vector::new(1, 18));
}

#[test]
fn player_fires_in_facing_direction() {
    let mut session = session_with(&[]);
    session.input = input_pressing(&[InputAction::Fire]);
    update_player(&mut session);

    let shots = session
        .components
        .player_projectiles
        .entities(&session.world.registry);
    assert_eq!(shots.len(), 1);
    assert_eq!(
        session.world.positions.get(shots[0]).copied(),
        Some(Vector::new(2, 18) + SHOT_OFFSET_RIGHT)
    );
    assert!(session.take_sounds().contains(&SOUND_NORMAL_SHOT));
}

#[test]
fn elevator_carries_player() {
    let mut session = session_from(test_map(), &[("duke", 2, 10), ("elevator", 2, 11)]);
    let elevator = entity_at(&session, Vector::new(2, 11));

    update_behaviors(&mut session, BehaviorKind::Elevator);
    assert_eq!(session.player.attached_elevator, Some(elevator));
    assert_eq!(
        session
            .world
            .bodies
            .get(session.player.entity)
            .map(|body| body.is_active),
        Some(false)
    );

    session.input = input_pressing(&[InputAction::MoveUp]);
    update_behaviors(&mut session, BehaviorKind::Elevator);
    assert_eq!(session.world.positions.get(elevator).copied(), Some(Vector::new(2, 10)));
    assert_eq!(session.player_position(), Vector::new(2, 9));
}

#[test]
fn water_tiles_become_areas() {
    let mut map = test_map();
    for y in [10, 11] {
        for x in 5..8 {
            map.set_tile_at(0, x, y, WATER_TILE);
        }
    }
    let session = session_from(map, &[("duke", 2, 18)]);

    let mut areas: Vec<(Vector, i32, bool)> = session
        .world
        .render_strategies
        .iter(&session.world.registry)
        .filter_map(|(entity, strategy)| match strategy {
            RenderStrategy::WaterArea { animated_surface } => Some((
                session.world.positions.get(entity).copied()?,
                session.world.bounding_boxes.get(entity)?.size.width,
                *animated_surface,
            )),
            RenderStrategy::TileDebris { .. } => None,
        })
        .collect();
    areas.sort_by_key(|(position, _, _)| position.y);

    assert_eq!(
        areas,
        vec![
            (Vector::new(5, 10), 3, true),
            (Vector::new(5, 11), 3, false),
        ]
    );
}

#[test]
fn shots_burn_flammable_tiles() {
    let mut map = test_map();
    map.set_tile_at(0, 12, 16, FLAMMABLE_TILE);
    let mut session = session_from(map, &[("duke", 2, 18)]);

    let shot =
        session.spawn_player_projectile(ProjectileType::Regular, Vector::new(12, 16), Orientation::Right);
    update_player_projectiles(&mut session);
    assert!(session.world.is_alive(shot));

    update_player_projectiles(&mut session);
    assert!(!session.world.is_alive(shot));
    assert_eq!(session.map.tile_at(0, 12, 16), 0);
    let debris = session
        .world
        .render_strategies
        .iter(&session.world.registry)
        .filter(|(_, strategy)| {
            **strategy
                == RenderStrategy::TileDebris {
                    tile_index: FLAMMABLE_TILE,
                }
        })
        .count();
    assert_eq!(debris, 1);
}

#[test]
fn particles_expire() {
    let mut particles = ParticleSystem::default();
    let mut rng = RandomNumberGenerator::new(3);
    particles.spawn(&mut rng, Vector::new(40, 40), Color::WHITE);
    assert_eq!(particles.groups[0].particles.len(), PARTICLES_PER_GROUP);

    for _ in 0..PARTICLE_LIFE_TIME - 1 {
        particles.update();
    }
    assert_eq!(particles.groups.len(), 1);
    particles.update();
    assert!(particles.groups.is_empty());
}

#[test]
fn screen_flash_lasts_two_ticks() {
    let mut session = session_with(&[]);
    session.effects.flash_screen(Color::WHITE);
    update_effects(&mut session);
    assert_eq!(session.effects.backdrop_flash_color(), Some(Color::WHITE));
    update_effects(&mut session);
    assert_eq!(session.effects.backdrop_flash_color(), None);
}

#[test]
fn next_level_follows_episode_numbering() {
    assert_eq!(next_level_name("l1").as_deref(), Some("l2"));
    assert_eq!(next_level_name("m7").as_deref(), Some("m8"));
    assert_eq!(next_level_name("l8"), None);
    assert_eq!(next_level_name("intro"), None);
    assert_eq!(next_level_name(""), None);
}

#[test]
fn completed_level_carries_score_and_weapon() {
    let start = LevelStart::new_game("l3");
    let mut model = PlayerModel::with_score(1234);
    model.switch_to_weapon(WeaponType::Laser);

    let next = start.after_completing(&model).expect("next level");
    assert_eq!(next.level, "l4");
    assert_eq!(next.score, 1234);
    assert_eq!(next.weapon, SavedWeapon::Laser);
    assert_eq!(next.player_model().weapon, WeaponType::Laser);
}

struct TestAssets;

impl AssetProvider for TestAssets {
    fn load_actor(&self, id: &str) -> Result<ActorData, AssetError> {
        Ok(ActorData {
            id: id.to_string(),
            draw_order: 0,
            frames: Vec::new(),
            orientation_offset: None,
            virtual_to_real_frame_map: Vec::new(),
        })
    }

    fn load_level(&self, name: &str) -> Result<LevelData, AssetError> {
        if name != "l1" {
            return Err(AssetError::Io {
                path: PathBuf::from(format!("levels/{name}.json")),
                source: io::Error::new(io::ErrorKind::NotFound, "missing"),
            });
        }
        Ok(level_with(
            test_map(),
            &[("duke", 2, 18), ("level_exit", 3, 18)],
        ))
    }
}

struct ModeHarness {
    renderer: Renderer,
    audio: RecordingAudio,
    orchestrator: FrameOrchestrator,
    profile: Rc<RefCell<UserProfile>>,
}

impl ModeHarness {
    fn new(level: &str) -> Self {
        let mut renderer = Renderer::new(
            Box::new(RecordingBackend::new()),
            Extents::new(640, 480),
        );
        let profile = Rc::new(RefCell::new(UserProfile::default()));
        let settings = GameSettings {
            start_level: "l1".to_string(),
            seed: 1,
            profile: Rc::clone(&profile),
        };
        let mode = ingame_mode(settings, LevelStart::new_game(level));
        let orchestrator = FrameOrchestrator::new(&mut renderer, mode);
        Self {
            renderer,
            audio: RecordingAudio::new(),
            orchestrator,
            profile,
        }
    }

    fn frame(&mut self, dt: Duration) {
        self.orchestrator
            .run_frame(dt, &[], &mut self.renderer, &mut self.audio, &TestAssets);
    }

    fn settle(&mut self) {
        for _ in 0..200 {
            self.frame(Duration::from_millis(10));
            if !self.orchestrator.is_transitioning() {
                return;
            }
        }
        panic!("transition did not finish");
    }
}

#[test]
fn reaching_exit_autosaves_next_level() {
    let mut harness = ModeHarness::new("l1");
    harness.settle();
    assert_eq!(harness.orchestrator.current_mode_name(), "ingame");

    harness.frame(Duration::from_millis(200));
    let profile = harness.profile.borrow();
    let saved = profile.save_slot(AUTOSAVE_SLOT).expect("autosave");
    assert_eq!(saved.level, "l2");
    assert_eq!(saved.score, 0);
}

#[test]
fn loaded_level_draws_every_frame() {
    let mut harness = ModeHarness::new("l1");
    harness.settle();

    let before = harness.renderer.submitted_batches();
    harness.frame(Duration::ZERO);
    assert_eq!(harness.orchestrator.current_mode_name(), "ingame");
    assert!(harness.renderer.submitted_batches() > before);
}

#[test]
fn failed_level_load_returns_to_menu() {
    let mut harness = ModeHarness::new("l9");
    harness.frame(Duration::ZERO);
    harness.settle();
    assert_eq!(harness.orchestrator.current_mode_name(), "menu");
}

fn shipped_assets() -> FileAssetProvider {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets");
    FileAssetProvider::open(dir).expect("shipped assets")
}

#[test]
fn shipped_catalog_covers_every_actor() {
    let assets = shipped_assets();
    for id in ActorKind::all_asset_ids() {
        let actor = assets
            .load_actor(id)
            .unwrap_or_else(|err| panic!("{id}: {err}"));
        assert!(!actor.frames.is_empty(), "{id}");
    }
}

#[test]
fn shipped_levels_start_sessions() {
    let assets = shipped_assets();
    for name in ["l1", "l2"] {
        let level = assets
            .load_level(name)
            .unwrap_or_else(|err| panic!("{name}: {err}"));
        let session = LevelSession::new(level, ActorCatalog::default(), PlayerModel::default(), 1)
            .unwrap_or_else(|err| panic!("{name}: {err}"));
        assert!(session.world.entity_count() > 1, "{name}");
    }
}
