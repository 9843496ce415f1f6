#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameplaySystemId {
    AnimatedMapTiles,
    AnimatedSprites,
    PlayerInteraction,
    Player,
    Camera,
    MarkActiveEntities,
    Elevator,
    RadarComputer,
    Behaviors,
    PhysicsPhase1,
    ItemCollection,
    PlayerDamage,
    DamageInfliction,
    ItemContainers,
    PlayerProjectiles,
    Effects,
    Lifetime,
    PhysicsPhase2,
    Particles,
}

impl GameplaySystemId {
    #[cfg(test)]
    fn name(self) -> &'static str {
        match self {
            Self::AnimatedMapTiles => "AnimatedMapTiles",
            Self::AnimatedSprites => "AnimatedSprites",
            Self::PlayerInteraction => "PlayerInteraction",
            Self::Player => "Player",
            Self::Camera => "Camera",
            Self::MarkActiveEntities => "MarkActiveEntities",
            Self::Elevator => "Elevator",
            Self::RadarComputer => "RadarComputer",
            Self::Behaviors => "Behaviors",
            Self::PhysicsPhase1 => "PhysicsPhase1",
            Self::ItemCollection => "ItemCollection",
            Self::PlayerDamage => "PlayerDamage",
            Self::DamageInfliction => "DamageInfliction",
            Self::ItemContainers => "ItemContainers",
            Self::PlayerProjectiles => "PlayerProjectiles",
            Self::Effects => "Effects",
            Self::Lifetime => "Lifetime",
            Self::PhysicsPhase2 => "PhysicsPhase2",
            Self::Particles => "Particles",
        }
    }
}

const GAMEPLAY_SYSTEM_ORDER: [GameplaySystemId; 19] = [
    GameplaySystemId::AnimatedMapTiles,
    GameplaySystemId::AnimatedSprites,
    GameplaySystemId::PlayerInteraction,
    GameplaySystemId::Player,
    GameplaySystemId::Camera,
    GameplaySystemId::MarkActiveEntities,
    GameplaySystemId::Elevator,
    GameplaySystemId::RadarComputer,
    GameplaySystemId::Behaviors,
    GameplaySystemId::PhysicsPhase1,
    GameplaySystemId::ItemCollection,
    GameplaySystemId::PlayerDamage,
    GameplaySystemId::DamageInfliction,
    GameplaySystemId::ItemContainers,
    GameplaySystemId::PlayerProjectiles,
    GameplaySystemId::Effects,
    GameplaySystemId::Lifetime,
    GameplaySystemId::PhysicsPhase2,
    GameplaySystemId::Particles,
];

#[derive(Default)]
struct GameplaySystemsHost {
    last_tick_order: Vec<GameplaySystemId>,
}

impl GameplaySystemsHost {
    /// Runs one logic tick. `rendering` is absent in headless tests; map
    /// tile animation is then skipped.
    fn run_once_per_tick(
        &mut self,
        session: &mut LevelSession,
        input: InputSnapshot,
        mut rendering: Option<&mut RenderingSystem>,
    ) {
        session.input = input;
        session.is_odd_frame = !session.is_odd_frame;

        self.last_tick_order.clear();
        for system_id in GAMEPLAY_SYSTEM_ORDER {
            self.last_tick_order.push(system_id);
            self.run_system(system_id, session, rendering.as_deref_mut());
        }

        session.tick_count += 1;
        session.world.end_tick();
    }

    fn run_system(
        &mut self,
        system_id: GameplaySystemId,
        session: &mut LevelSession,
        rendering: Option<&mut RenderingSystem>,
    ) {
        match system_id {
            GameplaySystemId::AnimatedMapTiles => {
                if let Some(rendering) = rendering {
                    rendering.update_animations();
                }
            }
            GameplaySystemId::AnimatedSprites => update_animated_sprites(&mut session.world),
            GameplaySystemId::PlayerInteraction => update_player_interaction(session),
            GameplaySystemId::Player => update_player(session),
            GameplaySystemId::Camera => update_camera(session),
            GameplaySystemId::MarkActiveEntities => {
                mark_active_entities(&mut session.world, session.camera.position());
            }
            GameplaySystemId::Elevator => update_behaviors(session, BehaviorKind::Elevator),
            GameplaySystemId::RadarComputer => {
                update_behaviors(session, BehaviorKind::RadarComputer);
            }
            GameplaySystemId::Behaviors => {
                for kind in AI_UPDATE_ORDER {
                    update_behaviors(session, kind);
                }
            }
            GameplaySystemId::PhysicsPhase1 => {
                let mut physics = std::mem::take(&mut session.physics);
                physics.update_phase1(session);
                session.physics = physics;
            }
            GameplaySystemId::ItemCollection => update_item_collection(session),
            GameplaySystemId::PlayerDamage => update_player_damage(session),
            GameplaySystemId::DamageInfliction => update_damage_infliction(session),
            GameplaySystemId::ItemContainers => update_item_containers(session),
            GameplaySystemId::PlayerProjectiles => update_player_projectiles(session),
            GameplaySystemId::Effects => update_effects(session),
            GameplaySystemId::Lifetime => update_lifetimes(session),
            GameplaySystemId::PhysicsPhase2 => {
                let mut physics = std::mem::take(&mut session.physics);
                physics.update_phase2(session);
                session.physics = physics;
            }
            GameplaySystemId::Particles => session.particles.update(),
        }
    }
}

/// Manual look up/down only while the player stands on its own feet. The
/// view freezes once the player dies.
fn update_camera(session: &mut LevelSession) {
    if session.player.is_dead() {
        return;
    }
    let can_look = session.player.is_alive() && session.player.attached_elevator.is_none();
    let input = CameraInput {
        look_up: can_look && session.input.is_down(InputAction::MoveUp),
        look_down: can_look && session.input.is_down(InputAction::MoveDown),
        player_bounds: session.player_bounds(),
    };
    session.camera.update(&input);
}

/// Updates every active entity whose behavior is of `kind`.
fn update_behaviors(session: &mut LevelSession, kind: BehaviorKind) {
    let entities: Vec<Entity> = session
        .components
        .behaviors
        .iter(&session.world.registry)
        .filter(|(_, behavior)| behavior.kind() == kind)
        .map(|(entity, _)| entity)
        .filter(|entity| session.world.active.contains(*entity))
        .collect();

    for entity in entities {
        with_behavior(session, entity, |behavior, context| behavior.update(context));
    }
}

/// Subscription order is delivery order within one event kind.
fn register_event_handlers(bus: &mut EventBus<GameEvent, LevelSession>) {
    bus.subscribe(
        GameEventKind::CollidedWithWorld,
        on_collided_with_world_behavior,
    );
    bus.subscribe(
        GameEventKind::CollidedWithWorld,
        on_collided_with_world_player,
    );
    bus.subscribe(
        GameEventKind::CollidedWithWorld,
        on_collided_with_world_lifetime,
    );
    bus.subscribe(GameEventKind::ShootableDamaged, on_shootable_damaged);
    bus.subscribe(GameEventKind::ShootableKilled, on_shootable_killed);
    bus.subscribe(GameEventKind::PlayerFiredShot, on_player_fired_shot);
    bus.subscribe(GameEventKind::PlayerTeleported, on_player_teleported);
    bus.subscribe(GameEventKind::ExitReached, on_exit_reached);
}
