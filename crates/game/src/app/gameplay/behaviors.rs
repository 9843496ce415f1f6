const LASER_TURRET_ANGLES: i32 = 8;
const LASER_TURRET_ANGLE_LEFT: i32 = 0;
const LASER_TURRET_ANGLE_RIGHT: i32 = 4;
const LASER_TURRET_SPIN_STEPS: i32 = 16;
const LASER_TURRET_MIN_SHOT_DELAY: i32 = 25;
const LASER_SHOT_SPEED: f32 = 2.0;

const PRISONER_GRAB_RANGE: i32 = 4;
const PRISONER_LAST_GRAB_STEP: i32 = 4;
const PRISONER_GRAB_CHANCE: i32 = 8;

const ROCKET_TURRET_FIRE_INTERVAL: i32 = 25;
const ROCKET_TURRET_AIM_TOLERANCE: i32 = 3;
const ROCKET_SPEED: f32 = 1.0;

const SLIDING_DOOR_LAST_FRAME: i32 = 7;
const SLIDING_DOOR_TRIGGER_RANGE: i32 = 2;

const SPIKE_BALL_JUMP_ARC: [PointF; 5] = [
    PointF::new(0.0, -2.0),
    PointF::new(0.0, -2.0),
    PointF::new(0.0, -1.0),
    PointF::new(0.0, -1.0),
    PointF::new(0.0, -1.0),
];
const SPIKE_BALL_JUMP_COOLDOWN: i32 = 9;
const SPIKE_BALL_CEILING_COOLDOWN: i32 = 3;

const RIGELATIN_JUMP_ARC: [PointF; 6] = [
    PointF::new(0.0, -2.0),
    PointF::new(0.0, -2.0),
    PointF::new(0.0, -1.0),
    PointF::new(0.0, -1.0),
    PointF::new(0.0, 0.0),
    PointF::new(0.0, 0.0),
];
const RIGELATIN_DECISIONS_PER_JUMP: i32 = 3;
const RIGELATIN_WAIT_FRAMES: i32 = 8;
const RIGELATIN_SHOT_SPEED: f32 = 2.0;

const RADAR_COMPUTER_ANIMATION_STEPS: i32 = 3;
const RADAR_COMPUTER_IDLE_FRAME: i32 = 3;

/// Per-kind AI state. One variant per enemy or device kind, dispatched by
/// a single match.
#[derive(Debug, Clone, PartialEq)]
enum Behavior {
    LaserTurret(LaserTurret),
    Prisoner(Prisoner),
    RocketTurret(RocketTurret),
    SimpleWalker(SimpleWalker),
    SlidingDoor(SlidingDoor),
    SpikeBall(SpikeBall),
    RigelatinSoldier(RigelatinSoldier),
    Elevator(Elevator),
    RadarComputer(RadarComputer),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BehaviorKind {
    LaserTurret,
    Prisoner,
    RocketTurret,
    SimpleWalker,
    SlidingDoor,
    SpikeBall,
    RigelatinSoldier,
    Elevator,
    RadarComputer,
}

/// Enemy kinds update in this order, each kind as a whole.
const AI_UPDATE_ORDER: [BehaviorKind; 7] = [
    BehaviorKind::LaserTurret,
    BehaviorKind::Prisoner,
    BehaviorKind::RocketTurret,
    BehaviorKind::SimpleWalker,
    BehaviorKind::SlidingDoor,
    BehaviorKind::SpikeBall,
    BehaviorKind::RigelatinSoldier,
];

impl Behavior {
    fn kind(&self) -> BehaviorKind {
        match self {
            Behavior::LaserTurret(_) => BehaviorKind::LaserTurret,
            Behavior::Prisoner(_) => BehaviorKind::Prisoner,
            Behavior::RocketTurret(_) => BehaviorKind::RocketTurret,
            Behavior::SimpleWalker(_) => BehaviorKind::SimpleWalker,
            Behavior::SlidingDoor(_) => BehaviorKind::SlidingDoor,
            Behavior::SpikeBall(_) => BehaviorKind::SpikeBall,
            Behavior::RigelatinSoldier(_) => BehaviorKind::RigelatinSoldier,
            Behavior::Elevator(_) => BehaviorKind::Elevator,
            Behavior::RadarComputer(_) => BehaviorKind::RadarComputer,
        }
    }

    fn update(&mut self, context: &mut BehaviorContext<'_>) {
        match self {
            Behavior::LaserTurret(state) => state.update(context),
            Behavior::Prisoner(state) => state.update(context),
            Behavior::RocketTurret(state) => state.update(context),
            Behavior::SimpleWalker(state) => state.update(context),
            Behavior::SlidingDoor(state) => state.update(context),
            Behavior::SpikeBall(state) => state.update(context),
            Behavior::RigelatinSoldier(state) => state.update(context),
            Behavior::Elevator(state) => state.update(context),
            Behavior::RadarComputer(state) => state.update(context),
        }
    }

    fn on_hit(&mut self, context: &mut BehaviorContext<'_>, inflictor_velocity: PointF) {
        match self {
            Behavior::LaserTurret(state) => state.on_hit(),
            Behavior::SpikeBall(_) => SpikeBall::on_hit(context, inflictor_velocity),
            _ => {}
        }
    }

    fn on_collision(&mut self, context: &mut BehaviorContext<'_>, event: &CollidedWithWorld) {
        match self {
            Behavior::SpikeBall(state) => state.on_collision(context, event),
            Behavior::RigelatinSoldier(state) => state.on_collision(context, event),
            _ => {}
        }
    }
}

/// What a behavior may touch while it runs: the level session, its own
/// entity and whether that entity is on screen.
struct BehaviorContext<'a> {
    session: &'a mut LevelSession,
    entity: Entity,
    is_on_screen: bool,
}

impl BehaviorContext<'_> {
    fn position(&self) -> WorldPosition {
        self.session
            .world
            .positions
            .get(self.entity)
            .copied()
            .unwrap_or_default()
    }

    fn set_position(&mut self, position: WorldPosition) {
        if let Some(current) = self.session.world.positions.get_mut(self.entity) {
            *current = position;
        }
    }

    fn bbox(&self) -> BoundingBox {
        self.session
            .world
            .bounding_boxes
            .get(self.entity)
            .copied()
            .unwrap_or(BoundingBox::new(0, 0, 1, 1))
    }

    fn world_bounds(&self) -> Rect {
        world_space(&self.bbox(), self.position())
    }

    fn player_position(&self) -> WorldPosition {
        self.session.player_position()
    }

    fn player_bounds(&self) -> Rect {
        self.session.player_bounds()
    }

    fn is_odd_frame(&self) -> bool {
        self.session.is_odd_frame
    }

    fn is_on_solid_ground(&self) -> bool {
        self.session
            .collision()
            .is_on_solid_ground(self.position(), &self.bbox())
    }

    fn rng(&mut self) -> &mut RandomNumberGenerator {
        &mut self.session.rng
    }

    fn play_sound_if_on_screen(&mut self, sound: SoundId) {
        if self.is_on_screen {
            self.session.play_sound(sound);
        }
    }

    fn orientation(&self) -> Orientation {
        self.session
            .world
            .orientations
            .get(self.entity)
            .copied()
            .unwrap_or(Orientation::Left)
    }

    fn set_orientation(&mut self, orientation: Orientation) {
        self.session.world.orientations.insert(self.entity, orientation);
    }

    fn body_mut(&mut self) -> Option<&mut MovingBody> {
        self.session.world.bodies.get_mut(self.entity)
    }

    fn set_frame(&mut self, frame: i32) {
        set_sprite_frame(&mut self.session.world, self.entity, 0, frame);
    }

    fn frame(&self) -> i32 {
        self.session
            .world
            .sprites
            .get(self.entity)
            .and_then(|sprite| sprite.frames_to_render.first().copied())
            .unwrap_or(0)
    }

    fn spawn_projectile(&mut self, kind: ActorKind, offset: Vector, velocity: PointF) -> Entity {
        let position = self.position() + offset;
        self.session.spawn_enemy_projectile(kind, position, velocity)
    }
}

/// Shows `frame` in `render_slot` if the sprite has that many frames. For
/// sprites with an orientation offset, only the left-facing half counts.
fn set_sprite_frame(world: &mut EntityWorld, entity: Entity, render_slot: usize, frame: i32) {
    let Some(sprite) = world.sprites.get_mut(entity) else {
        return;
    };
    let frame_count = sprite
        .draw_data
        .orientation_offset
        .unwrap_or_else(|| sprite.num_frames());
    if frame < 0 || frame >= frame_count {
        return;
    }
    if let Some(slot) = sprite.frames_to_render.get_mut(render_slot) {
        *slot = frame;
    }
}

fn start_spike_ball_jump(world: &mut EntityWorld, entity: Entity) {
    world.movement_sequences.insert(
        entity,
        MovementSequence::new(&SPIKE_BALL_JUMP_ARC, true, false),
    );
}

/// Stationary turret with eight aim angles. It turns toward the player one
/// step per tick and spins when shot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LaserTurret {
    angle: i32,
    next_shot_countdown: i32,
    spin_steps_left: i32,
}

impl LaserTurret {
    fn update(&mut self, context: &mut BehaviorContext<'_>) {
        if self.spin_steps_left > 0 {
            self.spin_steps_left -= 1;
            self.angle = (self.angle + 1) % LASER_TURRET_ANGLES;
            context.set_frame(self.angle);
            if self.spin_steps_left == 0 {
                self.next_shot_countdown = LASER_TURRET_MIN_SHOT_DELAY;
            }
            return;
        }

        let target_angle = if context.player_position().x < context.position().x {
            LASER_TURRET_ANGLE_LEFT
        } else {
            LASER_TURRET_ANGLE_RIGHT
        };

        if self.angle != target_angle {
            let clockwise = (target_angle - self.angle).rem_euclid(LASER_TURRET_ANGLES);
            let step = if clockwise <= LASER_TURRET_ANGLES / 2 { 1 } else { -1 };
            self.angle = (self.angle + step).rem_euclid(LASER_TURRET_ANGLES);
            context.set_frame(self.angle);
            return;
        }

        if self.next_shot_countdown > 0 {
            self.next_shot_countdown -= 1;
            return;
        }

        let facing_left = self.angle == LASER_TURRET_ANGLE_LEFT;
        let (offset, velocity) = if facing_left {
            (Vector::new(-1, 0), PointF::new(-LASER_SHOT_SPEED, 0.0))
        } else {
            (Vector::new(2, 0), PointF::new(LASER_SHOT_SPEED, 0.0))
        };
        context.spawn_projectile(ActorKind::EnemyLaserShot, offset, velocity);
        let flash_position = context.position() + offset;
        context
            .session
            .spawn_one_shot_sprite(ActorKind::MuzzleFlash, flash_position);
        context.play_sound_if_on_screen(SOUND_ENEMY_LASER_SHOT);
        self.next_shot_countdown = LASER_TURRET_MIN_SHOT_DELAY + context.rng().gen_below(25);
    }

    fn on_hit(&mut self) {
        self.spin_steps_left = LASER_TURRET_SPIN_STEPS;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Prisoner {
    is_aggressive: bool,
    grab_step: i32,
    is_grabbing: bool,
}

impl Prisoner {
    fn new(is_aggressive: bool) -> Self {
        Self {
            is_aggressive,
            grab_step: 0,
            is_grabbing: false,
        }
    }

    fn update(&mut self, context: &mut BehaviorContext<'_>) {
        if !self.is_aggressive {
            // Rattles the bars now and then.
            if context.is_odd_frame() {
                let frame = if context.rng().gen_below(4) == 0 { 1 } else { 0 };
                context.set_frame(frame);
            }
            return;
        }

        if self.is_grabbing {
            if !context.is_odd_frame() {
                return;
            }
            self.grab_step += 1;
            if self.grab_step > PRISONER_LAST_GRAB_STEP {
                self.release(context);
            } else {
                context.set_frame(self.grab_step);
            }
            return;
        }

        let bounds = context.world_bounds();
        let reach = Rect::new(
            bounds.left() - PRISONER_GRAB_RANGE,
            bounds.top(),
            bounds.size.width + PRISONER_GRAB_RANGE * 2,
            bounds.size.height,
        );
        let player_in_reach = reach.intersects(&context.player_bounds());
        if player_in_reach && context.rng().gen_below(PRISONER_GRAB_CHANCE) == 0 {
            self.is_grabbing = true;
            self.grab_step = 1;
            context.set_frame(self.grab_step);
            let entity = context.entity;
            let components = &mut context.session.components;
            if let Some(shootable) = components.shootables.get_mut(entity) {
                shootable.invincible = false;
            }
            components.player_damaging.insert(
                entity,
                PlayerDamaging {
                    amount: 1,
                    destroy_on_contact: false,
                },
            );
            context.play_sound_if_on_screen(SOUND_PRISONER_GRAB);
        }
    }

    fn release(&mut self, context: &mut BehaviorContext<'_>) {
        self.is_grabbing = false;
        self.grab_step = 0;
        context.set_frame(0);
        let entity = context.entity;
        let components = &mut context.session.components;
        if let Some(shootable) = components.shootables.get_mut(entity) {
            shootable.invincible = true;
        }
        components.player_damaging.remove(entity);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum RocketTurretAim {
    #[default]
    Left,
    Top,
    Right,
}

impl RocketTurretAim {
    fn frame(self) -> i32 {
        match self {
            RocketTurretAim::Left => 0,
            RocketTurretAim::Top => 1,
            RocketTurretAim::Right => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RocketTurret {
    aim: RocketTurretAim,
    ticks_since_shot: i32,
}

impl RocketTurret {
    fn update(&mut self, context: &mut BehaviorContext<'_>) {
        let player_x = context.player_position().x;
        let turret_x = context.position().x;
        self.aim = if player_x + ROCKET_TURRET_AIM_TOLERANCE < turret_x {
            RocketTurretAim::Left
        } else if player_x > turret_x + ROCKET_TURRET_AIM_TOLERANCE {
            RocketTurretAim::Right
        } else {
            RocketTurretAim::Top
        };
        context.set_frame(self.aim.frame());

        self.ticks_since_shot += 1;
        if self.ticks_since_shot < ROCKET_TURRET_FIRE_INTERVAL {
            return;
        }
        self.ticks_since_shot = 0;

        let (offset, velocity) = match self.aim {
            RocketTurretAim::Left => (Vector::new(-2, -1), PointF::new(-ROCKET_SPEED, 0.0)),
            RocketTurretAim::Top => (Vector::new(0, -2), PointF::new(0.0, -ROCKET_SPEED)),
            RocketTurretAim::Right => (Vector::new(2, -1), PointF::new(ROCKET_SPEED, 0.0)),
        };
        context.spawn_projectile(ActorKind::EnemyRocket, offset, velocity);
        context.play_sound_if_on_screen(SOUND_ROCKET_LAUNCH);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WalkerConfig {
    anim_start: i32,
    anim_end: i32,
    walk_at_full_speed: bool,
    walk_on_ceiling: bool,
}

const SKELETON_WALKER: WalkerConfig = WalkerConfig {
    anim_start: 0,
    anim_end: 3,
    walk_at_full_speed: false,
    walk_on_ceiling: false,
};

const CEILING_CRAWLER_WALKER: WalkerConfig = WalkerConfig {
    anim_start: 0,
    anim_end: 1,
    walk_at_full_speed: true,
    walk_on_ceiling: true,
};

/// Walks back and forth, turning at walls and at the end of its floor or
/// ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SimpleWalker {
    config: WalkerConfig,
}

impl SimpleWalker {
    fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    fn update(&mut self, context: &mut BehaviorContext<'_>) {
        if !self.config.walk_at_full_speed && !context.is_odd_frame() {
            return;
        }

        let position = context.position();
        let bbox = context.bbox();
        if !self.config.walk_on_ceiling && !context.is_on_solid_ground() {
            return;
        }

        let orientation = context.orientation();
        let next_position = position + Vector::new(orientation.to_movement(), 0);
        let (blocked, supported) = {
            let checker = context.session.collision();
            let blocked = match orientation {
                Orientation::Left => checker.is_touching_left_wall(position, &bbox),
                Orientation::Right => checker.is_touching_right_wall(position, &bbox),
            };
            let supported = if self.config.walk_on_ceiling {
                checker.is_touching_ceiling(next_position, &bbox)
            } else {
                checker.is_on_solid_ground(next_position, &bbox)
            };
            (blocked, supported)
        };

        if blocked || !supported {
            context.set_orientation(orientation.opposite());
            return;
        }

        context.set_position(next_position);
        let mut frame = context.frame() + 1;
        if frame > self.config.anim_end || frame < self.config.anim_start {
            frame = self.config.anim_start;
        }
        context.set_frame(frame);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum SlidingDoorState {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

/// Opens while the player stands next to it. Blocks the player unless fully
/// open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SlidingDoor {
    state: SlidingDoorState,
    frame: i32,
}

impl SlidingDoor {
    fn update(&mut self, context: &mut BehaviorContext<'_>) {
        let bounds = context.world_bounds();
        let trigger = Rect::new(
            bounds.left() - SLIDING_DOOR_TRIGGER_RANGE,
            bounds.top(),
            bounds.size.width + SLIDING_DOOR_TRIGGER_RANGE * 2,
            bounds.size.height,
        );
        let player_near = trigger.intersects(&context.player_bounds());
        let entity = context.entity;

        match self.state {
            SlidingDoorState::Closed => {
                if player_near {
                    self.state = SlidingDoorState::Opening;
                    context.play_sound_if_on_screen(SOUND_DOOR_OPEN);
                }
            }
            SlidingDoorState::Opening => {
                self.frame += 1;
                if self.frame >= SLIDING_DOOR_LAST_FRAME {
                    self.frame = SLIDING_DOOR_LAST_FRAME;
                    self.state = SlidingDoorState::Open;
                    context.session.components.solid_bodies.remove(entity);
                }
            }
            SlidingDoorState::Open => {
                if !player_near {
                    self.state = SlidingDoorState::Closing;
                    context
                        .session
                        .components
                        .solid_bodies
                        .insert(entity, SolidBody);
                }
            }
            SlidingDoorState::Closing => {
                self.frame -= 1;
                if self.frame <= 0 {
                    self.frame = 0;
                    self.state = SlidingDoorState::Closed;
                }
            }
        }
        context.set_frame(self.frame);
    }
}

/// Bounces in place and rebounds off walls and shots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SpikeBall {
    jump_back_cooldown: i32,
}

impl SpikeBall {
    fn update(&mut self, context: &mut BehaviorContext<'_>) {
        if self.jump_back_cooldown > 0 {
            self.jump_back_cooldown -= 1;
        }

        if self.jump_back_cooldown == 0 && context.is_on_solid_ground() {
            self.jump_back_cooldown = SPIKE_BALL_JUMP_COOLDOWN;
            start_spike_ball_jump(&mut context.session.world, context.entity);
            context.play_sound_if_on_screen(SOUND_DUKE_JUMPING);
        }
    }

    fn on_hit(context: &mut BehaviorContext<'_>, inflictor_velocity: PointF) {
        if let Some(body) = context.body_mut() {
            body.velocity.x = if inflictor_velocity.x > 0.0 { 1.0 } else { -1.0 };
        }
    }

    fn on_collision(&mut self, context: &mut BehaviorContext<'_>, event: &CollidedWithWorld) {
        if let Some(body) = context.body_mut() {
            if event.left {
                body.velocity.x = 1.0;
            } else if event.right {
                body.velocity.x = -1.0;
            }
        }

        if event.top {
            context.play_sound_if_on_screen(SOUND_DUKE_JUMPING);
            self.jump_back_cooldown = SPIKE_BALL_CEILING_COOLDOWN;
            context
                .session
                .world
                .movement_sequences
                .remove(context.entity);
            if let Some(body) = context.body_mut() {
                body.velocity.y = 0.0;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum RigelatinSoldierState {
    #[default]
    Ready,
    Jumping {
        frames_elapsed: i32,
        last_horizontal_result: Option<MovementResult>,
        previous_pos_x: i32,
    },
    Waiting {
        frames_elapsed: i32,
    },
}

/// Alternates between shooting at the player and jumping toward them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RigelatinSoldier {
    state: RigelatinSoldierState,
    decision_counter: i32,
}

impl Default for RigelatinSoldier {
    fn default() -> Self {
        Self {
            state: RigelatinSoldierState::Ready,
            decision_counter: RIGELATIN_DECISIONS_PER_JUMP,
        }
    }
}

impl RigelatinSoldier {
    fn update(&mut self, context: &mut BehaviorContext<'_>) {
        match self.state {
            RigelatinSoldierState::Ready => self.update_ready(context),
            RigelatinSoldierState::Jumping {
                frames_elapsed,
                last_horizontal_result,
                previous_pos_x,
            } => {
                let frames_elapsed = frames_elapsed + 1;
                let mut position = context.position();

                // Stuck against a wall twice in a row: give up on this direction.
                let stuck = last_horizontal_result == Some(MovementResult::Failed)
                    && position.x == previous_pos_x;
                if stuck {
                    let turned = context.orientation().opposite();
                    context.set_orientation(turned);
                }

                let previous_pos_x = position.x;
                let amount = context.orientation().to_movement();
                let bbox = context.bbox();
                let result = {
                    let checker = context.session.collision();
                    move_horizontally(&checker, &mut position, &bbox, amount)
                };
                context.set_position(position);

                self.state = RigelatinSoldierState::Jumping {
                    frames_elapsed,
                    last_horizontal_result: Some(result),
                    previous_pos_x,
                };
            }
            RigelatinSoldierState::Waiting { frames_elapsed } => {
                let frames_elapsed = frames_elapsed + 1;
                if frames_elapsed >= RIGELATIN_WAIT_FRAMES {
                    self.state = RigelatinSoldierState::Ready;
                    context.set_frame(0);
                } else {
                    self.state = RigelatinSoldierState::Waiting { frames_elapsed };
                }
            }
        }
    }

    fn update_ready(&mut self, context: &mut BehaviorContext<'_>) {
        let facing = if context.player_position().x < context.position().x {
            Orientation::Left
        } else {
            Orientation::Right
        };
        context.set_orientation(facing);

        self.decision_counter -= 1;
        if self.decision_counter <= 0 {
            self.decision_counter = RIGELATIN_DECISIONS_PER_JUMP;
            self.state = RigelatinSoldierState::Jumping {
                frames_elapsed: 0,
                last_horizontal_result: None,
                previous_pos_x: context.position().x,
            };
            context.session.world.movement_sequences.insert(
                context.entity,
                MovementSequence::new(&RIGELATIN_JUMP_ARC, true, false),
            );
            context.set_frame(2);
            return;
        }

        let offset = match facing {
            Orientation::Left => Vector::new(-1, -2),
            Orientation::Right => Vector::new(context.bbox().size.width, -2),
        };
        let velocity = PointF::new(facing.to_movement() as f32 * RIGELATIN_SHOT_SPEED, 0.0);
        context.spawn_projectile(ActorKind::RigelatinShot, offset, velocity);
        context.play_sound_if_on_screen(SOUND_ENEMY_LASER_SHOT);
        context.set_frame(1);
        self.state = RigelatinSoldierState::Waiting { frames_elapsed: 0 };
    }

    fn on_collision(&mut self, context: &mut BehaviorContext<'_>, event: &CollidedWithWorld) {
        if event.top {
            context
                .session
                .world
                .movement_sequences
                .remove(context.entity);
        }

        if let RigelatinSoldierState::Jumping { frames_elapsed, .. } = self.state {
            if event.bottom && frames_elapsed > 0 {
                self.state = RigelatinSoldierState::Waiting { frames_elapsed: 0 };
                context.set_frame(0);
            }
        }
    }
}

/// Platform the player can ride. Up and Down move it while the player
/// stands on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Elevator;

impl Elevator {
    fn update(&mut self, context: &mut BehaviorContext<'_>) {
        let entity = context.entity;
        let bounds = context.world_bounds();
        let player_bounds = context.player_bounds();
        let player_entity = context.session.player.entity;
        let player_is_jumping = context
            .session
            .world
            .movement_sequences
            .contains(player_entity);

        let standing_on_top = !player_is_jumping
            && context.session.player.is_alive()
            && player_bounds.bottom() + 1 == bounds.top()
            && player_bounds.right() >= bounds.left()
            && player_bounds.left() <= bounds.right();

        if !standing_on_top {
            if context.session.player.attached_elevator == Some(entity) {
                context.session.player.attached_elevator = None;
                if let Some(body) = context.session.world.bodies.get_mut(player_entity) {
                    body.is_active = true;
                }
            }
            return;
        }

        context.session.player.attached_elevator = Some(entity);
        if let Some(body) = context.session.world.bodies.get_mut(player_entity) {
            body.is_active = false;
            body.velocity = PointF::ZERO;
        }

        let input = context.session.input;
        let step = if input.is_down(InputAction::MoveUp) {
            -1
        } else if input.is_down(InputAction::MoveDown) {
            1
        } else {
            return;
        };

        let position = context.position();
        let player_position = context.player_position();
        let can_move = {
            let checker = context.session.collision();
            if step < 0 {
                let player_box = PLAYER_BOUNDS;
                !checker.is_touching_ceiling(player_position, &player_box)
            } else {
                !checker.is_on_solid_ground(position, &context.bbox())
            }
        };
        if !can_move {
            return;
        }

        context.set_position(position + Vector::new(0, step));
        if let Some(player_position) = context.session.world.positions.get_mut(player_entity) {
            player_position.y += step;
        }
    }
}

/// Screen animation that only runs while radar dishes remain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RadarComputer {
    animation_step: i32,
}

impl RadarComputer {
    fn update(&mut self, context: &mut BehaviorContext<'_>) {
        if context.session.radar_dish_count() == 0 {
            context.set_frame(RADAR_COMPUTER_IDLE_FRAME);
            return;
        }
        if context.is_odd_frame() {
            self.animation_step = (self.animation_step + 1) % RADAR_COMPUTER_ANIMATION_STEPS;
        }
        context.set_frame(self.animation_step);
    }
}
