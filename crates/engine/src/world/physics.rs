use std::collections::HashSet;

use crate::base::Vector;

use super::collision::CollisionChecker;
use super::components::{BoundingBox, WorldPosition};
use super::entity::Entity;
use super::map::Map;
use super::EntityWorld;

pub const INITIAL_FALL_VELOCITY: f32 = 1.0;
pub const GRAVITY_ACCELERATION: f32 = 0.56;
pub const TERMINAL_VELOCITY: f32 = 2.0;

/// Vertical velocity for the next tick of a gravity-affected body.
pub fn apply_gravity(on_ground: bool, velocity_y: f32) -> f32 {
    if on_ground {
        return 0.0;
    }
    if velocity_y == 0.0 {
        INITIAL_FALL_VELOCITY
    } else {
        (velocity_y + GRAVITY_ACCELERATION).min(TERMINAL_VELOCITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementResult {
    Failed,
    MovedPartially,
    Completed,
}

impl MovementResult {
    fn from_steps(taken: i32, requested: i32) -> Self {
        if taken == requested {
            MovementResult::Completed
        } else if taken == 0 {
            MovementResult::Failed
        } else {
            MovementResult::MovedPartially
        }
    }
}

/// Moves one tile at a time until `amount` tiles are covered or a wall
/// blocks the next step.
pub fn move_horizontally(
    checker: &CollisionChecker<'_>,
    position: &mut WorldPosition,
    bbox: &BoundingBox,
    amount: i32,
) -> MovementResult {
    let direction = amount.signum();
    let requested = amount.abs();
    let mut taken = 0;
    while taken < requested {
        let blocked = if direction < 0 {
            checker.is_touching_left_wall(*position, bbox)
        } else {
            checker.is_touching_right_wall(*position, bbox)
        };
        if blocked {
            break;
        }
        position.x += direction;
        taken += 1;
    }
    MovementResult::from_steps(taken, requested)
}

/// Vertical counterpart of [`move_horizontally`]: ground stops downward
/// steps, ceilings stop upward ones.
pub fn move_vertically(
    checker: &CollisionChecker<'_>,
    position: &mut WorldPosition,
    bbox: &BoundingBox,
    amount: i32,
) -> MovementResult {
    let direction = amount.signum();
    let requested = amount.abs();
    let mut taken = 0;
    while taken < requested {
        let blocked = if direction < 0 {
            checker.is_touching_ceiling(*position, bbox)
        } else {
            checker.is_on_solid_ground(*position, bbox)
        };
        if blocked {
            break;
        }
        position.y += direction;
        taken += 1;
    }
    MovementResult::from_steps(taken, requested)
}

/// Emitted when a body's motion was cut short by the map. Each flag names
/// the side that hit something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollidedWithWorld {
    pub entity: Entity,
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl CollidedWithWorld {
    fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }
}

pub struct PhysicsView<'a> {
    pub world: &'a mut EntityWorld,
    pub map: &'a Map,
}

/// Owner of the world that physics runs against. Collision events leave
/// the engine through here.
pub trait PhysicsHost {
    fn physics_view(&mut self) -> PhysicsView<'_>;
    fn on_collided_with_world(&mut self, event: CollidedWithWorld);
}

/// Integrates moving bodies in two passes per tick.
///
/// Phase 1 runs before the damage/projectile systems; phase 2 picks up
/// bodies that did not exist yet when phase 1 ran, such as shots spawned
/// later in the same tick.
#[derive(Debug, Default)]
pub struct PhysicsSystem {
    processed_in_phase1: HashSet<Entity>,
}

impl PhysicsSystem {
    pub fn update_phase1<H: PhysicsHost>(&mut self, host: &mut H) {
        self.processed_in_phase1.clear();
        for entity in body_snapshot(host) {
            self.processed_in_phase1.insert(entity);
            let collision = integrate(host.physics_view(), entity);
            if let Some(event) = collision {
                host.on_collided_with_world(event);
            }
        }
    }

    pub fn update_phase2<H: PhysicsHost>(&mut self, host: &mut H) {
        for entity in body_snapshot(host) {
            if self.processed_in_phase1.contains(&entity) {
                continue;
            }
            let collision = integrate(host.physics_view(), entity);
            if let Some(event) = collision {
                host.on_collided_with_world(event);
            }
        }
        self.processed_in_phase1.clear();
    }
}

fn body_snapshot<H: PhysicsHost>(host: &mut H) -> Vec<Entity> {
    let view = host.physics_view();
    view.world.bodies.entities(&view.world.registry)
}

fn integrate(view: PhysicsView<'_>, entity: Entity) -> Option<CollidedWithWorld> {
    let PhysicsView { world, map } = view;
    if !world.is_alive(entity) || !world.active.contains(entity) {
        return None;
    }
    let body = *world.bodies.get(entity)?;
    if !body.is_active {
        return None;
    }
    let mut position = *world.positions.get(entity)?;
    let bbox = *world.bounding_boxes.get(entity)?;
    assert!(
        bbox.is_valid(),
        "moving body {entity:?} has a degenerate bounding box {bbox:?}"
    );

    let checker = CollisionChecker::new(map);
    let mut velocity = body.velocity;
    let mut reset_after_move: Option<bool> = None;

    if let Some(sequence) = world.movement_sequences.get_mut(entity) {
        let step = sequence.velocities[sequence.current];
        velocity.y = step.y;
        if sequence.update_x {
            velocity.x = step.x;
        }
        sequence.current += 1;
        if sequence.current >= sequence.velocities.len() {
            if sequence.reset_velocity_after {
                reset_after_move = Some(sequence.update_x);
            }
            world.movement_sequences.remove(entity);
        }
    } else if body.gravity_affected {
        velocity.y = apply_gravity(checker.is_on_solid_ground(position, &bbox), velocity.y);
    }

    let mut collision = CollidedWithWorld {
        entity,
        left: false,
        right: false,
        top: false,
        bottom: false,
    };

    if body.ignore_collisions {
        position += Vector::new(velocity.x as i32, velocity.y as i32);
    } else {
        let amount_x = velocity.x as i32;
        if amount_x != 0
            && move_horizontally(&checker, &mut position, &bbox, amount_x) != MovementResult::Completed
        {
            velocity.x = 0.0;
            collision.left = amount_x < 0;
            collision.right = amount_x > 0;
        }

        let amount_y = velocity.y as i32;
        if amount_y != 0
            && move_vertically(&checker, &mut position, &bbox, amount_y) != MovementResult::Completed
        {
            velocity.y = 0.0;
            collision.top = amount_y < 0;
            collision.bottom = amount_y > 0;
        }
    }

    if let Some(reset_x) = reset_after_move {
        velocity.y = 0.0;
        if reset_x {
            velocity.x = 0.0;
        }
    }

    if let Some(stored) = world.positions.get_mut(entity) {
        *stored = position;
    }
    if let Some(stored) = world.bodies.get_mut(entity) {
        stored.velocity = velocity;
    }

    collision.any().then_some(collision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{PointF, Rect};
    use crate::world::components::{Active, MovementSequence, MovingBody};
    use crate::world::map::{TileAttributeDict, TileAttributes};

    struct TestHost {
        world: EntityWorld,
        map: Map,
        collisions: Vec<CollidedWithWorld>,
    }

    impl PhysicsHost for TestHost {
        fn physics_view(&mut self) -> PhysicsView<'_> {
            PhysicsView {
                world: &mut self.world,
                map: &self.map,
            }
        }

        fn on_collided_with_world(&mut self, event: CollidedWithWorld) {
            self.collisions.push(event);
        }
    }

    fn host_with_ground_row(row: i32) -> TestHost {
        let dict = TileAttributeDict::new(vec![TileAttributes::NONE, TileAttributes::SOLID_TOP]);
        let mut map = Map::new(32, 32, dict).expect("map");
        for x in 0..32 {
            map.set_tile_at(0, x, row, 1);
        }
        TestHost {
            world: EntityWorld::default(),
            map,
            collisions: Vec::new(),
        }
    }

    fn spawn_body(host: &mut TestHost, position: Vector, body: MovingBody) -> Entity {
        let entity = host.world.spawn_at(position);
        host.world.bounding_boxes.insert(entity, Rect::new(0, 0, 2, 2));
        host.world.bodies.insert(entity, body);
        host.world.active.insert(entity, Active::default());
        entity
    }

    #[test]
    fn gravity_starts_at_initial_velocity_and_caps_at_terminal() {
        assert_eq!(apply_gravity(false, 0.0), INITIAL_FALL_VELOCITY);
        assert!((apply_gravity(false, 1.0) - 1.56).abs() < 1e-6);
        assert_eq!(apply_gravity(false, 1.9), TERMINAL_VELOCITY);
        assert_eq!(apply_gravity(true, 1.9), 0.0);
    }

    #[test]
    fn airborne_velocity_rises_every_tick_until_terminal() {
        for start in [0.0, -2.0] {
            let mut velocity: f32 = start;
            let mut ticks_below_terminal = 0;
            for _ in 0..12 {
                let next = apply_gravity(false, velocity);
                if velocity < TERMINAL_VELOCITY {
                    assert!(next > velocity, "{velocity} -> {next}");
                    ticks_below_terminal += 1;
                } else {
                    assert_eq!(next, TERMINAL_VELOCITY);
                }
                assert!(next <= TERMINAL_VELOCITY);
                velocity = next;
            }
            assert_eq!(velocity, TERMINAL_VELOCITY);
            assert!(ticks_below_terminal < 12);
        }
    }

    #[test]
    fn falling_body_lands_on_solid_top() {
        let mut host = host_with_ground_row(12);
        let entity = spawn_body(
            &mut host,
            Vector::new(5, 10),
            MovingBody::new(PointF::new(0.0, 3.0), false),
        );
        let mut physics = PhysicsSystem::default();

        physics.update_phase1(&mut host);

        assert_eq!(host.world.positions.get(entity), Some(&Vector::new(5, 11)));
        assert_eq!(host.world.bodies.get(entity).map(|body| body.velocity.y), Some(0.0));
        assert_eq!(
            host.collisions,
            vec![CollidedWithWorld {
                entity,
                left: false,
                right: false,
                top: false,
                bottom: true
            }]
        );
    }

    #[test]
    fn unobstructed_motion_emits_nothing() {
        let mut host = host_with_ground_row(30);
        let entity = spawn_body(
            &mut host,
            Vector::new(5, 5),
            MovingBody::new(PointF::new(1.0, 0.0), false),
        );
        PhysicsSystem::default().update_phase1(&mut host);
        assert_eq!(host.world.positions.get(entity), Some(&Vector::new(6, 5)));
        assert!(host.collisions.is_empty());
    }

    #[test]
    fn inactive_entities_do_not_move() {
        let mut host = host_with_ground_row(30);
        let entity = spawn_body(
            &mut host,
            Vector::new(5, 5),
            MovingBody::new(PointF::new(1.0, 0.0), false),
        );
        host.world.active.remove(entity);
        PhysicsSystem::default().update_phase1(&mut host);
        assert_eq!(host.world.positions.get(entity), Some(&Vector::new(5, 5)));
    }

    #[test]
    fn ignoring_collisions_passes_through_ground() {
        let mut host = host_with_ground_row(6);
        let entity = spawn_body(
            &mut host,
            Vector::new(5, 5),
            MovingBody::new(PointF::new(0.0, 2.0), false).ignoring_collisions(),
        );
        PhysicsSystem::default().update_phase1(&mut host);
        assert_eq!(host.world.positions.get(entity), Some(&Vector::new(5, 7)));
        assert!(host.collisions.is_empty());
    }

    #[test]
    fn phase2_only_moves_bodies_spawned_after_phase1() {
        let mut host = host_with_ground_row(30);
        let early = spawn_body(
            &mut host,
            Vector::new(2, 5),
            MovingBody::new(PointF::new(1.0, 0.0), false),
        );
        let mut physics = PhysicsSystem::default();
        physics.update_phase1(&mut host);

        let late = spawn_body(
            &mut host,
            Vector::new(10, 5),
            MovingBody::new(PointF::new(-1.0, 0.0), false),
        );
        physics.update_phase2(&mut host);

        assert_eq!(host.world.positions.get(early), Some(&Vector::new(3, 5)));
        assert_eq!(host.world.positions.get(late), Some(&Vector::new(9, 5)));
    }

    static HOP: [PointF; 2] = [PointF::new(1.0, -1.0), PointF::new(1.0, -1.0)];

    #[test]
    fn movement_sequence_overrides_velocity_and_resets_after() {
        let mut host = host_with_ground_row(30);
        let entity = spawn_body(
            &mut host,
            Vector::new(5, 10),
            MovingBody::new(PointF::ZERO, true),
        );
        host.world
            .movement_sequences
            .insert(entity, MovementSequence::new(&HOP, true, true));
        let mut physics = PhysicsSystem::default();

        physics.update_phase1(&mut host);
        physics.update_phase2(&mut host);
        assert_eq!(host.world.positions.get(entity), Some(&Vector::new(6, 9)));
        assert!(host.world.movement_sequences.contains(entity));

        physics.update_phase1(&mut host);
        assert_eq!(host.world.positions.get(entity), Some(&Vector::new(7, 8)));
        assert!(!host.world.movement_sequences.contains(entity));
        assert_eq!(
            host.world.bodies.get(entity).map(|body| body.velocity),
            Some(PointF::ZERO)
        );
    }

    #[test]
    #[should_panic(expected = "degenerate bounding box")]
    fn degenerate_bounding_box_is_rejected() {
        let mut host = host_with_ground_row(30);
        let entity = spawn_body(
            &mut host,
            Vector::new(5, 5),
            MovingBody::new(PointF::new(1.0, 0.0), false),
        );
        host.world.bounding_boxes.insert(entity, Rect::new(0, 0, 0, 2));
        PhysicsSystem::default().update_phase1(&mut host);
    }

    #[test]
    fn stepwise_moves_report_partial_progress() {
        let host = host_with_ground_row(8);
        let checker = CollisionChecker::new(&host.map);
        let bbox = Rect::new(0, 0, 1, 1);
        let mut position = Vector::new(3, 5);
        assert_eq!(
            move_vertically(&checker, &mut position, &bbox, 5),
            MovementResult::MovedPartially
        );
        assert_eq!(position, Vector::new(3, 7));
        assert_eq!(
            move_vertically(&checker, &mut position, &bbox, 1),
            MovementResult::Failed
        );
        assert_eq!(
            move_horizontally(&checker, &mut position, &bbox, -2),
            MovementResult::Completed
        );
        assert_eq!(position, Vector::new(1, 7));
    }
}
