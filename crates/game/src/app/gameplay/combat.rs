const ITEM_BOX_SCORE: i32 = 100;
const REGULAR_SHOT_SPEED: f32 = 2.0;
const LASER_SHOT_PLAYER_SPEED: f32 = 5.0;
const REGULAR_SHOT_DAMAGE: i32 = 1;
const LASER_SHOT_DAMAGE: i32 = 2;
const TILE_DEBRIS_LIFE_TIME: i32 = 16;

const ITEM_BOUNCE_SEQUENCE: [PointF; 3] = [
    PointF::new(0.0, -1.0),
    PointF::new(0.0, -1.0),
    PointF::new(0.0, 0.0),
];

const EXPLOSION_PARTICLE_COLOR: Color = Color::rgb(255, 200, 80);
const RADAR_DISH_FLASH_COLOR: Color = Color::WHITE;

impl LevelSession {
    /// Player shots start inactive; the projectile system arms them on the
    /// next tick.
    fn spawn_player_projectile(
        &mut self,
        kind: ProjectileType,
        position: WorldPosition,
        direction: Orientation,
    ) -> Entity {
        let (actor, speed, damage, destroy_on_contact) = match kind {
            ProjectileType::Regular => (
                ActorKind::PlayerShot,
                REGULAR_SHOT_SPEED,
                REGULAR_SHOT_DAMAGE,
                true,
            ),
            ProjectileType::Laser => (
                ActorKind::PlayerLaserShot,
                LASER_SHOT_PLAYER_SPEED,
                LASER_SHOT_DAMAGE,
                false,
            ),
        };

        let entity = self.spawn_sprite(actor, position);
        let mut body = MovingBody::new(
            PointF::new(speed * direction.to_movement() as f32, 0.0),
            false,
        )
        .ignoring_collisions();
        body.is_active = false;
        self.world.bodies.insert(entity, body);
        self.world.active.insert(entity, Active { is_on_screen: true });
        self.world
            .auto_destroy
            .insert(entity, AutoDestroy::on_leaving_active_region());
        self.components.damage_inflicting.insert(
            entity,
            DamageInflicting {
                amount: damage,
                destroy_on_contact,
            },
        );
        self.components
            .player_projectiles
            .insert(entity, PlayerProjectile { kind });
        entity
    }
}

fn is_active(session: &LevelSession, entity: Entity) -> bool {
    session.world.active.contains(entity)
}

/// At most one hit per tick reaches the player.
fn update_player_damage(session: &mut LevelSession) {
    if !session.player.is_alive() || session.player.has_mercy_frames() {
        return;
    }

    let player_bounds = session.player_bounds();
    let hit = session
        .components
        .player_damaging
        .iter(&session.world.registry)
        .filter(|(entity, _)| is_active(session, *entity))
        .find(|(entity, _)| {
            session
                .world
                .world_bbox(*entity)
                .is_some_and(|bounds| bounds.intersects(&player_bounds))
        })
        .map(|(entity, damaging)| (entity, *damaging));

    let Some((entity, damaging)) = hit else {
        return;
    };
    if damage_player(session, damaging.amount) && damaging.destroy_on_contact {
        session.destroy_entity(entity);
    }
}

/// Resolves player shots against shootables.
fn update_damage_infliction(session: &mut LevelSession) {
    let inflictors = session
        .components
        .damage_inflicting
        .entities(&session.world.registry);

    for inflictor in inflictors {
        let Some(damage) = session.components.damage_inflicting.get(inflictor).copied() else {
            continue;
        };
        let Some(inflictor_bounds) = session.world.world_bbox(inflictor) else {
            continue;
        };
        let inflictor_velocity = session
            .world
            .bodies
            .get(inflictor)
            .map_or(PointF::ZERO, |body| body.velocity);

        let targets = session.components.shootables.entities(&session.world.registry);
        for target in targets {
            if target == inflictor || !is_active(session, target) {
                continue;
            }
            let Some(shootable) = session.components.shootables.get(target).copied() else {
                continue;
            };
            if shootable.invincible {
                continue;
            }
            let hits = session
                .world
                .world_bbox(target)
                .is_some_and(|bounds| bounds.intersects(&inflictor_bounds));
            if !hits {
                continue;
            }

            inflict_damage(session, target, shootable, damage.amount, inflictor_velocity);

            if damage.destroy_on_contact {
                session.destroy_entity(inflictor);
                break;
            }
        }
    }
}

fn inflict_damage(
    session: &mut LevelSession,
    target: Entity,
    shootable: Shootable,
    amount: i32,
    inflictor_velocity: PointF,
) {
    let health = shootable.health - amount;
    if let Some(stored) = session.components.shootables.get_mut(target) {
        stored.health = health;
    }

    if health > 0 {
        if let Some(sprite) = session.world.sprites.get_mut(target) {
            sprite.flash_white();
        }
        session.play_sound(SOUND_ENEMY_HIT);
        session.emit(GameEvent::ShootableDamaged {
            entity: target,
            inflictor_velocity,
        });
        return;
    }

    session.model.give_score(shootable.given_score);
    session.emit(GameEvent::ShootableKilled {
        entity: target,
        inflictor_velocity,
    });
    if shootable.destroy_when_killed {
        session.destroy_entity(target);
    } else {
        session.components.shootables.remove(target);
    }
}

/// Spawns the contents of boxes destroyed earlier this tick.
fn update_item_containers(session: &mut LevelSession) {
    let releases = std::mem::take(&mut session.pending_container_releases);
    for (position, contents) in releases {
        let item = session.spawn_actor(contents, position);
        session.world.movement_sequences.insert(
            item,
            MovementSequence::new(&ITEM_BOUNCE_SEQUENCE, true, false),
        );
        session.world.active.insert(item, Active::default());
        debug!(contents = contents.level_name(), "item_container_opened");
    }
}

/// Arms shots fired last tick and stops shots at walls, burning away
/// flammable tiles they hit.
fn update_player_projectiles(session: &mut LevelSession) {
    for entity in session
        .components
        .player_projectiles
        .entities(&session.world.registry)
    {
        let Some(body) = session.world.bodies.get_mut(entity) else {
            continue;
        };
        if !body.is_active {
            body.is_active = true;
            continue;
        }

        let Some(bounds) = session.world.world_bbox(entity) else {
            continue;
        };
        let collision = session.collision().collision_at(&bounds);
        if collision.is_empty() || collision == CollisionFlags::WATER {
            continue;
        }
        let solid = collision.contains(CollisionFlags::SOLID_LEFT)
            || collision.contains(CollisionFlags::SOLID_RIGHT)
            || collision.contains(CollisionFlags::SOLID_TOP)
            || collision.contains(CollisionFlags::SOLID_BOTTOM);
        if !solid {
            continue;
        }

        burn_flammable_tiles(session, &bounds);
        session.destroy_entity(entity);
    }
}

fn burn_flammable_tiles(session: &mut LevelSession, bounds: &Rect) {
    let mut burned = Vec::new();
    for y in bounds.top()..=bounds.bottom() {
        for x in bounds.left()..=bounds.right() {
            for layer in 0..LAYER_COUNT {
                if session
                    .map
                    .attributes(layer, x, y)
                    .contains(TileAttributes::FLAMMABLE)
                {
                    burned.push((layer, x, y, session.map.tile_at(layer, x, y)));
                }
            }
        }
    }

    for (layer, x, y, tile) in burned {
        session.map.set_tile_at(layer, x, y, 0);
        spawn_tile_debris(session, Vector::new(x, y), tile);
    }
}

fn spawn_tile_debris(session: &mut LevelSession, position: WorldPosition, tile: TileIndex) {
    let entity = session.world.spawn_at(position);
    let horizontal = session.rng.gen_range_inclusive(-1, 1) as f32;
    session
        .world
        .bounding_boxes
        .insert(entity, BoundingBox::new(0, 0, 1, 1));
    session.world.bodies.insert(
        entity,
        MovingBody::new(PointF::new(horizontal, -1.0), true).ignoring_collisions(),
    );
    session.world.render_strategies.insert(
        entity,
        RenderStrategy::TileDebris {
            tile_index: tile.into(),
        },
    );
    session
        .world
        .auto_destroy
        .insert(entity, AutoDestroy::after_timeout(TILE_DEBRIS_LIFE_TIME));
    session
        .world
        .activation
        .insert(entity, ActivationSettings::new(ActivationPolicy::Always));
    session.world.active.insert(entity, Active::default());
}

/// Runs `handle` on the entity's behavior, if it has one. The behavior is
/// taken out of its table for the call and put back while the entity lives.
fn with_behavior(
    session: &mut LevelSession,
    entity: Entity,
    handle: impl FnOnce(&mut Behavior, &mut BehaviorContext<'_>),
) {
    if !session.world.is_alive(entity) {
        return;
    }
    let Some(mut behavior) = session.components.behaviors.remove(entity) else {
        return;
    };
    let is_on_screen = session.world.is_on_screen(entity);
    {
        let mut context = BehaviorContext {
            session: &mut *session,
            entity,
            is_on_screen,
        };
        handle(&mut behavior, &mut context);
    }
    if session.world.is_alive(entity) && !session.components.behaviors.contains(entity) {
        session.components.behaviors.insert(entity, behavior);
    }
}

fn on_collided_with_world_behavior(session: &mut LevelSession, event: &GameEvent) {
    let GameEvent::CollidedWithWorld(collision) = event else {
        return;
    };
    with_behavior(session, collision.entity, |behavior, context| {
        behavior.on_collision(context, collision);
    });
}

fn on_collided_with_world_player(session: &mut LevelSession, event: &GameEvent) {
    let GameEvent::CollidedWithWorld(collision) = event else {
        return;
    };
    if collision.entity == session.player.entity && collision.top {
        session.world.movement_sequences.remove(collision.entity);
    }
}

fn on_collided_with_world_lifetime(session: &mut LevelSession, event: &GameEvent) {
    let GameEvent::CollidedWithWorld(collision) = event else {
        return;
    };
    if destroys_on_world_collision(&session.world, collision.entity) {
        session.destroy_entity(collision.entity);
    }
}

fn on_shootable_damaged(session: &mut LevelSession, event: &GameEvent) {
    let GameEvent::ShootableDamaged {
        entity,
        inflictor_velocity,
    } = event
    else {
        return;
    };
    let inflictor_velocity = *inflictor_velocity;
    with_behavior(session, *entity, |behavior, context| {
        behavior.on_hit(context, inflictor_velocity);
    });
}

/// Explosion, particles and follow-up effects of a destroyed shootable. Runs
/// before the entity is removed.
fn on_shootable_killed(session: &mut LevelSession, event: &GameEvent) {
    let GameEvent::ShootableKilled { entity, .. } = event else {
        return;
    };
    let entity = *entity;
    let Some(position) = session.world.positions.get(entity).copied() else {
        return;
    };

    if let Some(container) = session.components.item_containers.get(entity).copied() {
        session
            .pending_container_releases
            .push((position, container.contents));
    }

    let center = session
        .world
        .world_bbox(entity)
        .map_or(tile_vector_to_pixel_vector(position), |bounds| {
            tile_vector_to_pixel_vector(bounds.top_left)
                + Vector::new(
                    bounds.size.width * TILE_SIZE_PX / 2,
                    bounds.size.height * TILE_SIZE_PX / 2,
                )
        });
    session
        .particles
        .spawn(&mut session.rng, center, EXPLOSION_PARTICLE_COLOR);
    session.spawn_one_shot_sprite(ActorKind::SmallExplosion, position);
    session.play_sound(SOUND_EXPLOSION);

    if session.components.radar_dishes.contains(entity) {
        session.effects.flash_screen(RADAR_DISH_FLASH_COLOR);
        info!(
            remaining = session.radar_dish_count().saturating_sub(1),
            "radar_dish_destroyed"
        );
    }
}
