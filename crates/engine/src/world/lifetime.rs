use super::entity::Entity;
use super::EntityWorld;

/// Ticks `AutoDestroy` timers and returns the entities whose lifetime ended.
///
/// The caller destroys them, so tables owned outside the engine are purged
/// as well. A timeout of `n` keeps the entity alive for `n` updates.
pub fn update_life_times(world: &mut EntityWorld) -> Vec<Entity> {
    let mut expired = Vec::new();
    for entity in world.auto_destroy.entities(&world.registry) {
        let is_active = world.active.contains(entity);
        let Some(auto_destroy) = world.auto_destroy.get_mut(entity) else {
            continue;
        };

        if auto_destroy.on_leaving_active_region && !is_active {
            expired.push(entity);
            continue;
        }

        if let Some(remaining) = auto_destroy.on_timeout.as_mut() {
            if *remaining <= 0 {
                expired.push(entity);
            } else {
                *remaining -= 1;
            }
        }
    }
    expired
}

pub fn destroys_on_world_collision(world: &EntityWorld, entity: Entity) -> bool {
    world
        .auto_destroy
        .get(entity)
        .is_some_and(|auto_destroy| auto_destroy.on_world_collision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Vector;
    use crate::world::components::{Active, AutoDestroy};

    #[test]
    fn timeout_keeps_entity_for_given_updates() {
        let mut world = EntityWorld::default();
        let entity = world.spawn_at(Vector::ZERO);
        world.auto_destroy.insert(entity, AutoDestroy::after_timeout(2));

        assert!(update_life_times(&mut world).is_empty());
        assert!(update_life_times(&mut world).is_empty());
        assert_eq!(update_life_times(&mut world), vec![entity]);
    }

    #[test]
    fn leaving_active_region_expires_immediately() {
        let mut world = EntityWorld::default();
        let entity = world.spawn_at(Vector::ZERO);
        world
            .auto_destroy
            .insert(entity, AutoDestroy::on_leaving_active_region());
        world.active.insert(entity, Active { is_on_screen: true });
        assert!(update_life_times(&mut world).is_empty());

        world.active.remove(entity);
        assert_eq!(update_life_times(&mut world), vec![entity]);
    }

    #[test]
    fn world_collision_flag_is_reported() {
        let mut world = EntityWorld::default();
        let entity = world.spawn_at(Vector::ZERO);
        assert!(!destroys_on_world_collision(&world, entity));
        world.auto_destroy.insert(
            entity,
            AutoDestroy {
                on_timeout: None,
                on_world_collision: true,
                on_leaving_active_region: false,
            },
        );
        assert!(destroys_on_world_collision(&world, entity));
    }
}
