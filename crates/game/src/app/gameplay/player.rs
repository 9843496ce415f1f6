const PLAYER_BOUNDS: BoundingBox = BoundingBox::new(0, 0, 3, 5);
const PLAYER_DRAW_ORDER: i32 = 100;
const PLAYER_MERCY_FRAMES: i32 = 20;
const PLAYER_DEATH_FRAMES: i32 = 16;

const PLAYER_JUMP_ARC: [PointF; 8] = [
    PointF::new(0.0, -2.0),
    PointF::new(0.0, -2.0),
    PointF::new(0.0, -1.0),
    PointF::new(0.0, -1.0),
    PointF::new(0.0, -1.0),
    PointF::new(0.0, -1.0),
    PointF::new(0.0, 0.0),
    PointF::new(0.0, 0.0),
];

const PLAYER_FRAME_STANDING: i32 = 0;
const PLAYER_FRAME_WALK_FIRST: i32 = 1;
const PLAYER_FRAME_WALK_LAST: i32 = 4;
const PLAYER_FRAME_JUMPING: i32 = 5;
const PLAYER_FRAME_FALLING: i32 = 6;
const PLAYER_FRAME_DYING: i32 = 7;

/// Shot origin relative to the player's position, per facing direction.
const SHOT_OFFSET_RIGHT: Vector = Vector::new(3, -2);
const SHOT_OFFSET_LEFT: Vector = Vector::new(-2, -2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerState {
    Normal,
    Dying { frames_elapsed: i32 },
    Dead,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Player {
    entity: Entity,
    state: PlayerState,
    mercy_frames_left: i32,
    attached_elevator: Option<Entity>,
}

impl Player {
    fn new(entity: Entity) -> Self {
        Self {
            entity,
            state: PlayerState::Normal,
            mercy_frames_left: 0,
            attached_elevator: None,
        }
    }

    fn is_alive(&self) -> bool {
        self.state == PlayerState::Normal
    }

    fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    fn has_mercy_frames(&self) -> bool {
        self.mercy_frames_left > 0
    }
}

/// Walk, jump and fire from the tick's input. Also advances the death
/// sequence once health ran out.
fn update_player(session: &mut LevelSession) {
    let entity = session.player.entity;
    match session.player.state {
        PlayerState::Dead => return,
        PlayerState::Dying { frames_elapsed } => {
            let frames_elapsed = frames_elapsed + 1;
            if frames_elapsed >= PLAYER_DEATH_FRAMES {
                session.player.state = PlayerState::Dead;
                if let Some(sprite) = session.world.sprites.get_mut(entity) {
                    sprite.show = false;
                }
                session.outcome.get_or_insert(LevelOutcome::PlayerDied);
                info!(level = %session.level_name, score = session.model.score, "player_died");
            } else {
                session.player.state = PlayerState::Dying { frames_elapsed };
            }
            return;
        }
        PlayerState::Normal => {}
    }

    if session.player.mercy_frames_left > 0 {
        session.player.mercy_frames_left -= 1;
    }
    let flicker_hidden = session.player.mercy_frames_left % 2 == 1;
    if let Some(sprite) = session.world.sprites.get_mut(entity) {
        sprite.show = !flicker_hidden;
    }

    let input = session.input;
    let walk_direction = if input.is_down(InputAction::MoveLeft) {
        Some(Orientation::Left)
    } else if input.is_down(InputAction::MoveRight) {
        Some(Orientation::Right)
    } else {
        None
    };

    let mut walked = false;
    if let Some(direction) = walk_direction {
        session.world.orientations.insert(entity, direction);
        walked = walk_player(session, direction);
    }

    let on_ground = session.player.attached_elevator.is_some()
        || session
            .collision()
            .is_on_solid_ground(session.player_position(), &PLAYER_BOUNDS);
    let is_jumping = session.world.movement_sequences.contains(entity);
    if input.was_pressed(InputAction::Jump) && on_ground && !is_jumping {
        start_player_jump(session);
    }

    let wants_fire = input.was_pressed(InputAction::Fire)
        || (input.is_down(InputAction::Fire)
            && session.model.has_item(InventoryItem::RapidFire)
            && session.tick_count % 2 == 0);
    if wants_fire {
        fire_player_shot(session);
    }

    let position = session.player_position();
    if position.y - PLAYER_BOUNDS.size.height >= session.map.height() {
        kill_player(session);
        return;
    }

    let frame = if session.world.movement_sequences.contains(entity) {
        PLAYER_FRAME_JUMPING
    } else if !on_ground {
        PLAYER_FRAME_FALLING
    } else if walked {
        let current = session
            .world
            .sprites
            .get(entity)
            .and_then(|sprite| sprite.frames_to_render.first().copied())
            .unwrap_or(PLAYER_FRAME_STANDING);
        if (PLAYER_FRAME_WALK_FIRST..PLAYER_FRAME_WALK_LAST).contains(&current) {
            current + 1
        } else {
            PLAYER_FRAME_WALK_FIRST
        }
    } else {
        PLAYER_FRAME_STANDING
    };
    set_sprite_frame(&mut session.world, entity, 0, frame);
}

/// Moves the player one tile unless a wall or a solid actor is in the way.
fn walk_player(session: &mut LevelSession, direction: Orientation) -> bool {
    let entity = session.player.entity;
    let amount = direction.to_movement();
    let target = session.player_bounds().translated(Vector::new(amount, 0));

    let blocked_by_actor = session
        .components
        .solid_bodies
        .iter(&session.world.registry)
        .any(|(solid, _)| {
            session
                .world
                .world_bbox(solid)
                .is_some_and(|bounds| bounds.intersects(&target))
        });
    if blocked_by_actor {
        return false;
    }

    let mut position = session.player_position();
    let result = move_horizontally(&session.collision(), &mut position, &PLAYER_BOUNDS, amount);
    if let Some(current) = session.world.positions.get_mut(entity) {
        *current = position;
    }
    result != MovementResult::Failed
}

fn start_player_jump(session: &mut LevelSession) {
    let entity = session.player.entity;
    if session.player.attached_elevator.take().is_some() {
        if let Some(body) = session.world.bodies.get_mut(entity) {
            body.is_active = true;
        }
    }
    session.world.movement_sequences.insert(
        entity,
        MovementSequence::new(&PLAYER_JUMP_ARC, true, false),
    );
    session.play_sound(SOUND_DUKE_JUMPING);
}

fn fire_player_shot(session: &mut LevelSession) {
    let orientation = session
        .world
        .orientations
        .get(session.player.entity)
        .copied()
        .unwrap_or(Orientation::Right);
    let offset = match orientation {
        Orientation::Left => SHOT_OFFSET_LEFT,
        Orientation::Right => SHOT_OFFSET_RIGHT,
    };
    let position = session.player_position() + offset;

    let (kind, sound) = match session.model.weapon {
        WeaponType::Regular => (ProjectileType::Regular, SOUND_NORMAL_SHOT),
        WeaponType::Laser => (ProjectileType::Laser, SOUND_LASER_SHOT),
    };
    session.spawn_player_projectile(kind, position, orientation);
    session.spawn_one_shot_sprite(ActorKind::MuzzleFlash, position);
    session.play_sound(sound);
    session.emit(GameEvent::PlayerFiredShot);
}

/// Applies damage unless the player is still blinking from the last hit.
fn damage_player(session: &mut LevelSession, amount: i32) -> bool {
    if !session.player.is_alive() || session.player.has_mercy_frames() {
        return false;
    }

    session.model.take_damage(amount);
    debug!(amount, health = session.model.health, "player_damaged");
    if session.model.is_dead() {
        kill_player(session);
    } else {
        session.player.mercy_frames_left = PLAYER_MERCY_FRAMES;
        session.play_sound(SOUND_DUKE_PAIN);
    }
    true
}

fn kill_player(session: &mut LevelSession) {
    if !session.player.is_alive() {
        return;
    }
    let entity = session.player.entity;
    session.player.state = PlayerState::Dying { frames_elapsed: 0 };
    session.player.attached_elevator = None;
    session.world.movement_sequences.remove(entity);
    if let Some(body) = session.world.bodies.get_mut(entity) {
        body.is_active = false;
        body.velocity = PointF::ZERO;
    }
    if let Some(sprite) = session.world.sprites.get_mut(entity) {
        sprite.show = true;
    }
    set_sprite_frame(&mut session.world, entity, 0, PLAYER_FRAME_DYING);
    session.play_sound(SOUND_DUKE_DEATH);
}
